use std::path::PathBuf;

use dqf_clean::PromotionReport;
use dqf_cli::workflow::CleanRun;
use dqf_ingest::TextEncoding;
use dqf_map::MappingSummary;
use dqf_model::HeaderMapping;

/// How the raw input was read.
#[derive(Debug, Clone)]
pub struct InputInfo {
    pub path: PathBuf,
    pub delimiter: u8,
    pub encoding: TextEncoding,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct MapReport {
    pub input: InputInfo,
    pub mappings: Vec<HeaderMapping>,
    pub summary: MappingSummary,
}

#[derive(Debug, Clone)]
pub struct CleanReport {
    pub input: InputInfo,
    pub run: CleanRun,
    pub output: Option<PathBuf>,
    pub issues_file: Option<PathBuf>,
    /// Present when `--promote` was given.
    pub promotion: Option<PromotionReport>,
    /// Learning candidates left unpromoted.
    pub pending: usize,
}
