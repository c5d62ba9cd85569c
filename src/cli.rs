use clap::Parser;
use std::path::PathBuf;

/// Terminal dashboard for exploring job salary records
///
/// Filter by job title, company and location in the sidebar; the charts
/// update as the selection changes.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CSV file to load (overrides the config file)
    #[arg(short, long, value_name = "FILE", env = "SALARY_DASH_DATA")]
    pub data: Option<PathBuf>,

    /// Path to the configuration file
    ///
    /// If not specified, looks for salary_dash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// File that receives log output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Args {
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }
        Ok(())
    }

    /// Log level requested on the command line, if any.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.quiet {
            Some(tracing::Level::ERROR)
        } else if self.verbose {
            Some(tracing::Level::DEBUG)
        } else {
            None
        }
    }
}
