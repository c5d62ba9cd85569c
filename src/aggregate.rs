//! Group-by summaries feeding the dashboard charts.
//!
//! Every function here is a pure function of its input rows. The year trend
//! and the correlation matrix are computed over the whole dataset, the rest
//! over the filtered view.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::dataset::{Dataset, Dimension, View};
use crate::filter::Filters;
use crate::stats::{self, BoxStats};

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub key: String,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyDistribution {
    pub company: String,
    pub stats: BoxStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearMean {
    pub year: i64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` squared cells. NaN where undefined.
    pub values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.columns.len() + col]
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Rows of `view` grouped by their value in `dimension`, groups in first-seen order.
fn group_rows<'a>(view: &View<'a>, dimension: Dimension) -> Vec<(&'a str, Vec<usize>)> {
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(&'a str, Vec<usize>)> = Vec::new();
    for &row in view.rows() {
        let key = view.category(dimension, row);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(row);
    }
    groups
}

/// Mean salary per value of `dimension`, in first-seen order.
pub fn mean_by(view: &View, dimension: Dimension) -> Vec<GroupMean> {
    group_rows(view, dimension)
        .into_iter()
        .filter_map(|(key, rows)| {
            let salaries: Vec<f64> = rows.iter().map(|row| view.salary(*row)).collect();
            Some(GroupMean {
                key: key.to_string(),
                mean: stats::mean(&salaries)?,
                count: rows.len(),
            })
        })
        .collect()
}

fn sort_by_mean_desc(groups: &mut [GroupMean]) {
    // Stable, so equal means keep their first-seen order.
    groups.sort_by(|a, b| b.mean.total_cmp(&a.mean));
}

pub fn avg_salary_by_job(view: &View) -> Vec<GroupMean> {
    let mut groups = mean_by(view, Dimension::JobTitle);
    sort_by_mean_desc(&mut groups);
    groups
}

/// The `n` companies with the highest mean salary, best first.
pub fn top_companies(view: &View, n: usize) -> Vec<GroupMean> {
    let mut groups = mean_by(view, Dimension::Company);
    sort_by_mean_desc(&mut groups);
    groups.truncate(n);
    groups
}

/// Salary spread for each of `companies`, in the order they first appear in `view`.
pub fn salary_distribution(view: &View, companies: &[String]) -> Vec<CompanyDistribution> {
    let restricted = view.retain(|row| {
        let company = view.category(Dimension::Company, row);
        companies.iter().any(|c| c == company)
    });
    group_rows(&restricted, Dimension::Company)
        .into_iter()
        .filter_map(|(company, rows)| {
            let salaries: Vec<f64> = rows.iter().map(|row| view.salary(*row)).collect();
            Some(CompanyDistribution {
                company: company.to_string(),
                stats: BoxStats::from_samples(&salaries)?,
            })
        })
        .collect()
}

/// Row count per company location, largest first.
pub fn jobs_by_location(view: &View) -> Vec<GroupCount> {
    let mut counts: Vec<GroupCount> = group_rows(view, Dimension::Location)
        .into_iter()
        .map(|(key, rows)| GroupCount {
            key: key.to_string(),
            count: rows.len(),
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Mean salary per work year, oldest year first.
pub fn avg_salary_by_year(view: &View) -> Vec<YearMean> {
    let mut totals: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for &row in view.rows() {
        let entry = totals.entry(view.work_year(row)).or_insert((0.0, 0));
        entry.0 += view.salary(row);
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(year, (sum, count))| YearMean {
            year,
            mean: sum / count as f64,
        })
        .collect()
}

/// Pairwise Pearson correlation over every numeric column of the dataset.
///
/// The diagonal is 1 for any column with at least one value, even a
/// constant one. Off-diagonal cells involving a constant column are NaN.
pub fn correlation(dataset: &Dataset) -> CorrelationMatrix {
    let columns = dataset.numeric_columns();
    let n = columns.len();
    let mut values = vec![f64::NAN; n * n];
    for i in 0..n {
        if columns[i].values.iter().any(|v| !v.is_nan()) {
            values[i * n + i] = 1.0;
        }
        for j in (i + 1)..n {
            let r = stats::pearson(&columns[i].values, &columns[j].values);
            values[i * n + j] = r;
            values[j * n + i] = r;
        }
    }
    CorrelationMatrix {
        columns: columns.iter().map(|c| c.name.clone()).collect(),
        values,
    }
}

/// Everything the screen shows for one filter state.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub total_records: usize,
    pub record_count: usize,
    pub by_job: Vec<GroupMean>,
    pub top_companies: Vec<GroupMean>,
    pub distributions: Vec<CompanyDistribution>,
    pub by_location: Vec<GroupCount>,
    pub by_year: Vec<YearMean>,
    pub correlation: CorrelationMatrix,
}

impl Dashboard {
    pub fn build(dataset: &Dataset, filters: &Filters, top_n: usize) -> Dashboard {
        let view = filters.apply(dataset);
        if view.is_empty() {
            debug!("No records match the current filters");
        }
        let top = top_companies(&view, top_n);
        let top_names: Vec<String> = top.iter().map(|g| g.key.clone()).collect();
        let dashboard = Dashboard {
            total_records: dataset.len(),
            record_count: view.len(),
            by_job: avg_salary_by_job(&view),
            distributions: salary_distribution(&view, &top_names),
            top_companies: top,
            by_location: jobs_by_location(&view),
            by_year: avg_salary_by_year(&dataset.all()),
            correlation: correlation(dataset),
        };
        debug!(
            "Recomputed dashboard: {} records, {} job titles, {} locations",
            dashboard.record_count,
            dashboard.by_job.len(),
            dashboard.by_location.len()
        );
        dashboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{from_records, record, three_rows};
    use crate::dataset::NumericColumn;
    use crate::filter::Selection;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn scenario_filters() -> Filters {
        Filters::new(
            Selection::new(["jobA"]),
            Selection::new(["compX"]),
            Selection::new(["locY"]),
        )
    }

    fn random_dataset(seed: u64, rows: usize) -> Dataset {
        let mut rng = StdRng::seed_from_u64(seed);
        let records = (0..rows)
            .map(|_| {
                record(
                    &format!("job{}", rng.gen_range(0..5)),
                    &format!("comp{}", rng.gen_range(0..9)),
                    &format!("loc{}", rng.gen_range(0..4)),
                    rng.gen_range(2020..2025),
                    rng.gen_range(40_000.0..300_000.0),
                )
            })
            .collect();
        from_records(records)
    }

    #[test]
    fn scenario_filtered_aggregates() {
        let dataset = three_rows();
        let view = scenario_filters().apply(&dataset);

        let by_job = avg_salary_by_job(&view);
        assert_eq!(
            by_job,
            vec![GroupMean {
                key: "jobA".to_string(),
                mean: 110000.0,
                count: 2
            }]
        );
        assert_eq!(
            jobs_by_location(&view),
            vec![GroupCount {
                key: "locY".to_string(),
                count: 2
            }]
        );
    }

    #[test]
    fn averages_sort_descending_with_stable_ties() {
        let dataset = from_records(vec![
            record("low", "a", "l", 2023, 10.0),
            record("tieA", "a", "l", 2023, 50.0),
            record("high", "a", "l", 2023, 90.0),
            record("tieB", "a", "l", 2023, 50.0),
        ]);
        let keys: Vec<_> = avg_salary_by_job(&dataset.all()).into_iter().map(|g| g.key).collect();
        assert_eq!(keys, vec!["high", "tieA", "tieB", "low"]);
    }

    #[test]
    fn locations_sort_by_count_with_stable_ties() {
        let dataset = from_records(vec![
            record("j", "c", "DE", 2023, 1.0),
            record("j", "c", "US", 2023, 1.0),
            record("j", "c", "GB", 2023, 1.0),
            record("j", "c", "US", 2023, 1.0),
            record("j", "c", "FR", 2023, 1.0),
            record("j", "c", "US", 2023, 1.0),
            record("j", "c", "FR", 2023, 1.0),
            record("j", "c", "IN", 2023, 1.0),
            record("j", "c", "FR", 2023, 1.0),
            record("j", "c", "US", 2023, 1.0),
            record("j", "c", "IN", 2023, 1.0),
        ]);
        let counts: Vec<(String, usize)> = jobs_by_location(&dataset.all())
            .into_iter()
            .map(|g| (g.key, g.count))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("US".to_string(), 4),
                ("FR".to_string(), 3),
                ("IN".to_string(), 2),
                ("DE".to_string(), 1),
                ("GB".to_string(), 1),
            ]
        );
    }

    #[test]
    fn top_companies_with_fewer_than_n() {
        let dataset = three_rows();
        let top = top_companies(&dataset.all(), 5);
        let keys: Vec<_> = top.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["compX", "compZ"]);
    }

    #[test]
    fn top_companies_dominate_the_rest() {
        for seed in 0..20 {
            let dataset = random_dataset(seed, 120);
            let view = dataset.all();
            let top = top_companies(&view, 5);
            assert!(top.len() <= 5);

            let lowest_kept = top.iter().map(|g| g.mean).fold(f64::INFINITY, f64::min);
            for group in mean_by(&view, Dimension::Company) {
                if !top.iter().any(|t| t.key == group.key) {
                    assert!(group.mean <= lowest_kept);
                }
            }
        }
    }

    #[test]
    fn weighted_group_means_equal_overall_mean() {
        for seed in 0..10 {
            let dataset = random_dataset(100 + seed, 200);
            let view = dataset.all();
            let groups = mean_by(&view, Dimension::JobTitle);
            let weighted: f64 = groups.iter().map(|g| g.mean * g.count as f64).sum::<f64>()
                / groups.iter().map(|g| g.count).sum::<usize>() as f64;
            let salaries: Vec<f64> = view.rows().iter().map(|row| view.salary(*row)).collect();
            let overall = stats::mean(&salaries).unwrap();
            assert!((weighted - overall).abs() < 1e-6 * overall);
        }
    }

    #[test]
    fn distribution_covers_only_selected_companies() {
        let dataset = from_records(vec![
            record("j", "b", "l", 2023, 5.0),
            record("j", "a", "l", 2023, 1.0),
            record("j", "c", "l", 2023, 100.0),
            record("j", "a", "l", 2023, 3.0),
        ]);
        let view = dataset.all();
        let dists = salary_distribution(&view, &["a".to_string(), "b".to_string()]);
        let names: Vec<_> = dists.iter().map(|d| d.company.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(dists[1].stats.median, 2.0);
        assert_eq!(dists[1].stats.whisker_low, 1.0);
        assert_eq!(dists[1].stats.whisker_high, 3.0);
    }

    #[test]
    fn year_trend_is_ascending() {
        let dataset = from_records(vec![
            record("j", "c", "l", 2024, 30.0),
            record("j", "c", "l", 2022, 10.0),
            record("j", "c", "l", 2024, 50.0),
        ]);
        assert_eq!(
            avg_salary_by_year(&dataset.all()),
            vec![
                YearMean { year: 2022, mean: 10.0 },
                YearMean { year: 2024, mean: 40.0 }
            ]
        );
    }

    #[test]
    fn empty_view_yields_no_groups() {
        let dataset = three_rows();
        let view = Filters::default().apply(&dataset);
        assert!(avg_salary_by_job(&view).is_empty());
        assert!(top_companies(&view, 5).is_empty());
        assert!(salary_distribution(&view, &[]).is_empty());
        assert!(jobs_by_location(&view).is_empty());
        assert!(avg_salary_by_year(&view).is_empty());
    }

    #[test]
    fn correlation_is_symmetric_with_unit_diagonal() {
        let dataset = random_dataset(3, 150);
        let matrix = correlation(&dataset);
        assert_eq!(matrix.columns, vec!["work_year", "salary_in_usd"]);
        for i in 0..matrix.len() {
            assert_eq!(matrix.get(i, i), 1.0);
            for j in 0..matrix.len() {
                assert_eq!(matrix.get(i, j).to_bits(), matrix.get(j, i).to_bits());
                assert!(matrix.get(i, j).abs() <= 1.0);
            }
        }
    }

    #[test]
    fn constant_columns_correlate_to_nan() {
        let records = vec![
            record("j", "c", "l", 2023, 10.0),
            record("j", "c", "l", 2023, 20.0),
            record("j", "c", "l", 2023, 40.0),
        ];
        let numeric = vec![
            NumericColumn {
                name: "work_year".to_string(),
                values: vec![2023.0, 2023.0, 2023.0],
            },
            NumericColumn {
                name: "salary_in_usd".to_string(),
                values: vec![10.0, 20.0, 40.0],
            },
            NumericColumn {
                name: "remote_ratio".to_string(),
                values: vec![0.0, 0.0, 0.0],
            },
        ];
        let matrix = correlation(&Dataset::new(records, numeric));
        assert_eq!(matrix.get(0, 0), 1.0);
        assert_eq!(matrix.get(2, 2), 1.0);
        assert!(matrix.get(0, 1).is_nan());
        assert!(matrix.get(0, 2).is_nan());
        assert!(matrix.get(2, 1).is_nan());
    }

    #[test]
    fn empty_dataset_correlation_is_undefined() {
        let matrix = correlation(&from_records(Vec::new()));
        assert_eq!(matrix.len(), 2);
        assert!(matrix.get(0, 0).is_nan());
        assert!(matrix.get(0, 1).is_nan());
    }

    #[test]
    fn dashboard_scenario() {
        let dataset = three_rows();
        let dashboard = Dashboard::build(&dataset, &scenario_filters(), 5);
        assert_eq!(dashboard.total_records, 3);
        assert_eq!(dashboard.record_count, 2);
        assert_eq!(dashboard.top_companies.len(), 1);
        assert_eq!(dashboard.distributions.len(), 1);
        assert_eq!(dashboard.by_year.len(), 2);
    }

    #[test]
    fn empty_filter_leaves_unfiltered_charts_alone() {
        let dataset = three_rows();
        let mut filters = scenario_filters();
        let full = Dashboard::build(&dataset, &filters, 5);
        filters.clear(Dimension::JobTitle);
        let empty = Dashboard::build(&dataset, &filters, 5);

        assert_eq!(empty.record_count, 0);
        assert!(empty.by_job.is_empty());
        assert!(empty.top_companies.is_empty());
        assert!(empty.distributions.is_empty());
        assert!(empty.by_location.is_empty());
        assert_eq!(empty.by_year, full.by_year);
        assert_eq!(empty.correlation.columns, full.correlation.columns);
        assert_eq!(empty.by_year[0], YearMean { year: 2023, mean: 90000.0 });
    }
}
