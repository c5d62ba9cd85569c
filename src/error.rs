use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("error reading the data file: {0}")]
    Io(#[from] std::io::Error),
    #[error("error parsing the data file: {0}")]
    Csv(#[from] csv::Error),
    #[error("required column `{0}` is missing from the data file")]
    MissingColumn(&'static str),
    #[error("error parsing the config file: {0}")]
    Config(#[from] toml::de::Error),
}
