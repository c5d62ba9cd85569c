use chrono::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

pub const JOB_TITLE: &'static str = "job_title";
pub const COMPANY_NAME: &'static str = "company_name";
pub const COMPANY_LOCATION: &'static str = "company_location";
pub const WORK_YEAR: &'static str = "work_year";
pub const SALARY_IN_USD: &'static str = "salary_in_usd";

pub const REQUIRED_COLUMNS: &'static [&'static str] =
    &[JOB_TITLE, COMPANY_NAME, COMPANY_LOCATION, WORK_YEAR, SALARY_IN_USD];

/// One salary observation, restricted to the columns the dashboard needs by name.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Record {
    pub job_title: String,
    pub company_name: String,
    pub company_location: String,
    pub work_year: i64,
    pub salary_in_usd: f64,
}

/// The three categorical columns a user can filter on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    JobTitle,
    Company,
    Location,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::JobTitle, Dimension::Company, Dimension::Location];

    pub fn column(self) -> &'static str {
        match self {
            Dimension::JobTitle => JOB_TITLE,
            Dimension::Company => COMPANY_NAME,
            Dimension::Location => COMPANY_LOCATION,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::JobTitle => "Select Job Titles",
            Dimension::Company => "Select Companies",
            Dimension::Location => "Select Locations",
        }
    }
}

impl From<Dimension> for usize {
    fn from(input: Dimension) -> usize {
        match input {
            Dimension::JobTitle => 0,
            Dimension::Company => 1,
            Dimension::Location => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericColumn {
    pub name: String,
    /// Missing cells are NaN.
    pub values: Vec<f64>,
}

/// The full record set. Built once at startup and only ever read afterwards.
#[derive(Debug)]
pub struct Dataset {
    pub source: Option<PathBuf>,
    pub loaded_at: DateTime<Local>,
    job_title: Vec<String>,
    company_name: Vec<String>,
    company_location: Vec<String>,
    work_year: Vec<i64>,
    salary_in_usd: Vec<f64>,
    numeric: Vec<NumericColumn>,
}

impl Dataset {
    /// `numeric` holds every numeric column of the source in header order.
    pub fn new(records: Vec<Record>, numeric: Vec<NumericColumn>) -> Self {
        let mut dataset = Dataset {
            source: None,
            loaded_at: Local::now(),
            job_title: Vec::with_capacity(records.len()),
            company_name: Vec::with_capacity(records.len()),
            company_location: Vec::with_capacity(records.len()),
            work_year: Vec::with_capacity(records.len()),
            salary_in_usd: Vec::with_capacity(records.len()),
            numeric,
        };
        for record in records {
            dataset.job_title.push(record.job_title);
            dataset.company_name.push(record.company_name);
            dataset.company_location.push(record.company_location);
            dataset.work_year.push(record.work_year);
            dataset.salary_in_usd.push(record.salary_in_usd);
        }
        dataset
    }

    pub fn len(&self) -> usize {
        self.salary_in_usd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn category(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::JobTitle => &self.job_title,
            Dimension::Company => &self.company_name,
            Dimension::Location => &self.company_location,
        }
    }

    pub fn numeric_columns(&self) -> &[NumericColumn] {
        &self.numeric
    }

    /// Distinct values of a filterable column, in first-seen order.
    pub fn distinct(&self, dimension: Dimension) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.category(dimension)
            .iter()
            .map(String::as_str)
            .filter(|value| seen.insert(*value))
            .collect()
    }

    /// Every row, in source order.
    pub fn all(&self) -> View<'_> {
        View::new(self, (0..self.len()).collect())
    }
}

/// A read-only row subset of a [`Dataset`], in source order.
#[derive(Debug, Clone)]
pub struct View<'a> {
    dataset: &'a Dataset,
    rows: Vec<usize>,
}

impl<'a> View<'a> {
    pub(crate) fn new(dataset: &'a Dataset, rows: Vec<usize>) -> Self {
        View { dataset, rows }
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn category(&self, dimension: Dimension, row: usize) -> &'a str {
        &self.dataset.category(dimension)[row]
    }

    pub fn salary(&self, row: usize) -> f64 {
        self.dataset.salary_in_usd[row]
    }

    pub fn work_year(&self, row: usize) -> i64 {
        self.dataset.work_year[row]
    }

    /// Keeps only the rows matching `predicate`.
    pub fn retain<F>(&self, mut predicate: F) -> View<'a>
    where
        F: FnMut(usize) -> bool,
    {
        let rows = self.rows.iter().copied().filter(|row| predicate(*row)).collect();
        View::new(self.dataset, rows)
    }
}
