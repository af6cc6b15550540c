//! extscan: API usage scanner for browser extension packages.
//!
//! Counts literal call-site signatures of sensitive platform APIs (file
//! system, network, rendering, user interaction) across the `.js`/`.json`
//! entries of extension zip archives, and extracts the manifest's
//! permissions block. A sampling mode draws a random subset of a corpus and
//! aggregates every sampled archive into one CSV report.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use extscan::{scan_archive, ScanOptions};
//!
//! let options = ScanOptions::default();
//! let report = scan_archive(Path::new("./extension.zip"), &options).unwrap();
//! println!("fetch calls: {}", report.table.count("fetch"));
//! ```

pub mod archive;
pub mod catalogue;
pub mod config;
pub mod detector;
pub mod error;
pub mod manifest;
pub mod output;
pub mod sampler;
pub mod table;

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;

use archive::{ArchiveSummary, ArchiveWalker};
use catalogue::{Catalogue, CatalogueSet};
use config::Config;
use detector::Detector;
use error::Result;
use output::OutputFormat;
use sampler::{SampleRun, Sampler};
use table::FrequencyTable;

/// Options for a single-archive scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Path to config file (defaults to `.extscan.toml` in the working directory).
    pub config_path: Option<PathBuf>,
    /// CLI override for the built-in catalogue.
    pub catalogue_override: Option<CatalogueSet>,
}

/// Options for a sampling run. `None` fields fall back to config values.
#[derive(Debug, Clone, Default)]
pub struct SampleOptions {
    pub config_path: Option<PathBuf>,
    pub catalogue_override: Option<CatalogueSet>,
    pub sample_size: Option<usize>,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    /// Also write the per-archive sensitive permission CSV here.
    pub permissions_output: Option<PathBuf>,
    pub max_depth: Option<usize>,
}

/// Result of scanning one archive.
#[derive(Debug)]
pub struct ScanReport {
    pub archive: ArchiveSummary,
    pub table: FrequencyTable,
    pub catalogue: Catalogue,
}

/// Result of a sampling run. The CSV has already been written to `output`,
/// and the permission CSV to `permissions_output` when one was requested.
#[derive(Debug)]
pub struct SampleReport {
    pub run: SampleRun,
    pub table: FrequencyTable,
    pub catalogue: Catalogue,
    pub output: PathBuf,
    pub permissions_output: Option<PathBuf>,
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_FILE));
    Config::load(&path)
}

/// Scan one extension archive with a fresh frequency table.
pub fn scan_archive(path: &Path, options: &ScanOptions) -> Result<ScanReport> {
    let config = load_config(options.config_path.as_deref())?;
    let set = options.catalogue_override.unwrap_or(config.scan.catalogue);
    let catalogue = config.resolve_catalogue(set)?;

    let mut table = FrequencyTable::new();
    let archive = ArchiveWalker::new(Detector::new(&catalogue))
        .with_max_entry_size(config.scan.max_entry_size)
        .walk(path, &mut table)?;

    tracing::info!(
        path = %path.display(),
        files = archive.files_analyzed.len(),
        distinct = table.len(),
        "scan complete"
    );

    Ok(ScanReport {
        archive,
        table,
        catalogue,
    })
}

/// Sample archives from `folder`, aggregate them into one table and write
/// the CSV report.
///
/// `on_archive` is called with each sampled path before it is walked.
/// Fails without writing anything when the folder cannot be listed or holds
/// fewer archives than the sample size.
pub fn run_sampling<F>(folder: &Path, options: &SampleOptions, on_archive: F) -> Result<SampleReport>
where
    F: FnMut(&Path),
{
    let config = load_config(options.config_path.as_deref())?;
    let set = options.catalogue_override.unwrap_or(config.sample.catalogue);
    let catalogue = config.resolve_catalogue(set)?;

    let sample_size = options.sample_size.unwrap_or(config.sample.size);
    let max_depth = options.max_depth.unwrap_or(config.sample.max_depth);
    let output_path = options
        .output
        .clone()
        .unwrap_or_else(|| config.sample.output.clone());
    let permissions_path = options
        .permissions_output
        .clone()
        .or_else(|| config.sample.permissions_output.clone());
    let mut rng = match options.seed.or(config.sample.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let walker = ArchiveWalker::new(Detector::new(&catalogue))
        .with_max_entry_size(config.scan.max_entry_size);
    let sampler = Sampler::new(walker)
        .with_sample_size(sample_size)
        .with_pool_limit(config.sample.pool_limit)
        .with_max_depth(max_depth);

    let mut table = FrequencyTable::new();
    let run = sampler.run(folder, &mut rng, &mut table, on_archive)?;

    std::fs::write(&output_path, output::csv::render(&table, &catalogue))?;
    tracing::info!(
        output = %output_path.display(),
        analyzed = run.analyzed,
        failed = run.failed.len(),
        "sampling report written"
    );
    if let Some(path) = &permissions_path {
        std::fs::write(path, output::csv::render_permissions(&run.permissions))?;
        tracing::info!(
            output = %path.display(),
            archives = run.permissions.len(),
            "permission report written"
        );
    }

    Ok(SampleReport {
        run,
        table,
        catalogue,
        output: output_path,
        permissions_output: permissions_path,
    })
}

/// Render a scan report in the specified format.
pub fn render_report(report: &ScanReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(output::console::render(report)),
        OutputFormat::Json => output::json::render(report),
        OutputFormat::Csv => Ok(output::csv::render(&report.table, &report.catalogue)),
    }
}
