use std::fs::File;
use std::io;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::dataset::{Dataset, NumericColumn, Record, REQUIRED_COLUMNS};
use crate::error::DashboardError;

/// Cells read as missing when inferring numeric columns.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None",
    "n/a", "nan", "null",
];

pub fn read_dataset(path: &Path) -> Result<Dataset, DashboardError> {
    let file = File::open(path)?;
    let mut dataset = read_from(file)?;
    dataset.source = Some(path.to_path_buf());
    info!(
        "Loaded {} records with {} numeric columns from {}",
        dataset.len(),
        dataset.numeric_columns().len(),
        path.display()
    );
    Ok(dataset)
}

pub fn read_from<R: io::Read>(reader: R) -> Result<Dataset, DashboardError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *required) {
            return Err(DashboardError::MissingColumn(*required));
        }
    }

    let mut rows = Vec::<StringRecord>::new();
    let mut records = Vec::<Record>::new();
    for result in rdr.records() {
        let row = result?;
        // Extra columns are ignored by the typed record and kept for inference below.
        let record: Record = row.deserialize(Some(&headers))?;
        records.push(record);
        rows.push(row);
    }

    let numeric = numeric_columns(&headers, &rows);
    debug!(
        "Numeric columns: {:?}",
        numeric.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
    );
    Ok(Dataset::new(records, numeric))
}

/// A column is numeric when it has at least one present cell and every
/// present cell parses as a number. Empty cells and the usual NA markers
/// (`NA`, `N/A`, `null`, ...) become NaN.
fn numeric_columns(headers: &StringRecord, rows: &[StringRecord]) -> Vec<NumericColumn> {
    headers
        .iter()
        .enumerate()
        .filter_map(|(index, name)| {
            let mut values = Vec::with_capacity(rows.len());
            let mut present = 0usize;
            for row in rows {
                let cell = row.get(index).unwrap_or("").trim();
                if MISSING_TOKENS.contains(&cell) {
                    values.push(f64::NAN);
                    continue;
                }
                values.push(cell.parse::<f64>().ok()?);
                present += 1;
            }
            if present == 0 {
                return None;
            }
            Some(NumericColumn {
                name: name.to_string(),
                values,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dimension;
    use std::io::Write;

    const SAMPLE: &str = "\
work_year,experience_level,job_title,salary,salary_in_usd,remote_ratio,company_name,company_location
2023,SE,Data Scientist,90000,100000,100,Acme,US
2024,MI,Data Scientist,110000,120000,,Acme,US
2023,EN,ML Engineer,70000,80000,50,Globex,DE
";

    #[test]
    fn reads_required_columns() {
        let dataset = read_from(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.category(Dimension::JobTitle)[2], "ML Engineer");
        assert_eq!(dataset.category(Dimension::Location), &["US", "US", "DE"]);
        let view = dataset.all();
        let years: Vec<i64> = view.rows().iter().map(|row| view.work_year(*row)).collect();
        let salaries: Vec<f64> = view.rows().iter().map(|row| view.salary(*row)).collect();
        assert_eq!(years, vec![2023, 2024, 2023]);
        assert_eq!(salaries, vec![100000.0, 120000.0, 80000.0]);
    }

    #[test]
    fn infers_numeric_columns_in_header_order() {
        let dataset = read_from(SAMPLE.as_bytes()).unwrap();
        let names: Vec<_> = dataset.numeric_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["work_year", "salary", "salary_in_usd", "remote_ratio"]);

        let remote = &dataset.numeric_columns()[3];
        assert_eq!(remote.values[0], 100.0);
        assert!(remote.values[1].is_nan());
    }

    #[test]
    fn na_markers_count_as_missing() {
        let data = "\
work_year,job_title,company_name,company_location,salary_in_usd,remote_ratio,bonus
2023,a,b,c,1,NA,null
2024,a,b,c,2,50,N/A
2025,a,b,c,3,100,
";
        let dataset = read_from(data.as_bytes()).unwrap();
        let names: Vec<_> = dataset.numeric_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["work_year", "salary_in_usd", "remote_ratio"]);

        let remote = &dataset.numeric_columns()[2];
        assert!(remote.values[0].is_nan());
        assert_eq!(&remote.values[1..], &[50.0, 100.0]);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let data = "work_year,job_title,company_name,salary_in_usd\n2023,a,b,1\n";
        match read_from(data.as_bytes()) {
            Err(DashboardError::MissingColumn(column)) => assert_eq!(column, "company_location"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn non_numeric_salary_is_an_error() {
        let data = "work_year,job_title,company_name,company_location,salary_in_usd\n2023,a,b,c,lots\n";
        assert!(matches!(read_from(data.as_bytes()), Err(DashboardError::Csv(_))));
    }

    #[test]
    fn header_only_file_is_empty() {
        let data = "work_year,job_title,company_name,company_location,salary_in_usd\n";
        let dataset = read_from(data.as_bytes()).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.numeric_columns().is_empty());
    }

    #[test]
    fn reads_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let dataset = read_dataset(file.path()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_dataset(&dir.path().join("nope.csv"));
        assert!(matches!(result, Err(DashboardError::Io(_))));
    }
}
