use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

use stride_core::ledger::LedgerOptions;

const CATALOG_FILE: &str = "food_calories.csv";

pub struct Config {
    pub data_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub ledger: LedgerOptions,
}

impl Config {
    /// Resolve the data directory: an explicit override (flag or
    /// `STRIDE_DATA_DIR`) wins, otherwise the platform data dir. Nothing is
    /// created here; opening a session creates the directory.
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => ProjectDirs::from("", "", "stride")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        let catalog_path = data_dir.join(CATALOG_FILE);

        Ok(Config {
            data_dir,
            catalog_path,
            ledger: LedgerOptions::default(),
        })
    }
}
