use std::collections::HashSet;

use tracing::debug;

use crate::dataset::{Dataset, Dimension, View};

/// The values chosen in one multi-select control, in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    values: Vec<String>,
}

impl Selection {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Selection::default();
        for value in values {
            let value = value.into();
            if !selection.contains(&value) {
                selection.values.push(value);
            }
        }
        selection
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Adds or removes `value`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, value: &str) -> bool {
        if let Some(pos) = self.values.iter().position(|v| v == value) {
            self.values.remove(pos);
            false
        } else {
            self.values.push(value.to_string());
            true
        }
    }
}

/// Current state of the three filter controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    selections: [Selection; 3],
}

impl Filters {
    pub fn new(jobs: Selection, companies: Selection, locations: Selection) -> Self {
        Filters {
            selections: [jobs, companies, locations],
        }
    }

    /// First `n` distinct values of each column, in the order they first appear.
    pub fn with_defaults(dataset: &Dataset, n: usize) -> Self {
        let pick = |dimension| Selection::new(dataset.distinct(dimension).into_iter().take(n));
        Filters::new(
            pick(Dimension::JobTitle),
            pick(Dimension::Company),
            pick(Dimension::Location),
        )
    }

    pub fn selection(&self, dimension: Dimension) -> &Selection {
        &self.selections[usize::from(dimension)]
    }

    pub fn toggle(&mut self, dimension: Dimension, value: &str) -> bool {
        self.selections[usize::from(dimension)].toggle(value)
    }

    pub fn select_all(&mut self, dimension: Dimension, dataset: &Dataset) {
        self.selections[usize::from(dimension)] = Selection::new(dataset.distinct(dimension));
    }

    pub fn clear(&mut self, dimension: Dimension) {
        self.selections[usize::from(dimension)] = Selection::default();
    }

    /// Narrows `view` to rows whose value in `dimension` is selected.
    pub fn narrow<'a>(&self, view: &View<'a>, dimension: Dimension) -> View<'a> {
        let wanted: HashSet<&str> = self
            .selection(dimension)
            .values()
            .iter()
            .map(String::as_str)
            .collect();
        view.retain(|row| wanted.contains(view.category(dimension, row)))
    }

    /// Rows matching every selection at once, in source order.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> View<'a> {
        let view = Dimension::ALL
            .iter()
            .fold(dataset.all(), |view, dimension| self.narrow(&view, *dimension));
        debug!("Filters matched {} of {} records", view.len(), dataset.len());
        view
    }
}
