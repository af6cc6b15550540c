use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use extscan::catalogue::{Catalogue, CatalogueSet};
use extscan::config::{Config, DEFAULT_CONFIG_FILE};
use extscan::error::ScanError;
use extscan::output::OutputFormat;
use extscan::{SampleOptions, ScanOptions};

#[derive(Parser)]
#[command(
    name = "extscan",
    about = "API usage scanner for browser extension packages",
    version,
    author
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one extension zip and print permissions and API usage
    Scan {
        /// Path to the extension zip
        path: PathBuf,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (console, json, csv)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Built-in catalogue (full, batch)
        #[arg(long)]
        catalogue: Option<String>,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Randomly sample zips from a folder and write aggregate counts to CSV
    Sample {
        /// Folder containing extension zips
        folder: PathBuf,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Number of archives to sample
        #[arg(long, short = 'n')]
        size: Option<usize>,

        /// RNG seed for a reproducible sample
        #[arg(long)]
        seed: Option<u64>,

        /// CSV report path (default: extension_analysis.csv)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Also write each sampled archive's sensitive permissions to this CSV
        #[arg(long)]
        permissions_csv: Option<PathBuf>,

        /// Built-in catalogue (full, batch)
        #[arg(long)]
        catalogue: Option<String>,

        /// Directory depth to search for zips (1 = folder only)
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// List the API signatures of a catalogue
    ListApis {
        /// Built-in catalogue (full, batch)
        #[arg(long, default_value = "full")]
        catalogue: String,

        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .extscan.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Scan {
            path,
            config,
            format,
            catalogue,
            output,
        } => cmd_scan(path, config, format, catalogue, output),
        Commands::Sample {
            folder,
            config,
            size,
            seed,
            output,
            permissions_csv,
            catalogue,
            max_depth,
        } => cmd_sample(SampleArgs {
            folder,
            config,
            size,
            seed,
            output,
            permissions_csv,
            catalogue,
            max_depth,
        }),
        Commands::ListApis { catalogue, format } => cmd_list_apis(catalogue, format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_catalogue(name: Option<String>) -> Result<Option<CatalogueSet>, ScanError> {
    name.map(|s| {
        CatalogueSet::from_str_lenient(&s)
            .ok_or_else(|| ScanError::Usage(format!("unknown catalogue '{}' (full, batch)", s)))
    })
    .transpose()
}

fn cmd_scan(
    path: PathBuf,
    config: Option<PathBuf>,
    format_str: String,
    catalogue: Option<String>,
    output_path: Option<PathBuf>,
) -> Result<i32, ScanError> {
    let format = OutputFormat::from_str_lenient(&format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    });

    let options = ScanOptions {
        config_path: config,
        catalogue_override: parse_catalogue(catalogue)?,
    };

    let report = extscan::scan_archive(&path, &options)?;
    let rendered = extscan::render_report(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    Ok(0)
}

struct SampleArgs {
    folder: PathBuf,
    config: Option<PathBuf>,
    size: Option<usize>,
    seed: Option<u64>,
    output: Option<PathBuf>,
    permissions_csv: Option<PathBuf>,
    catalogue: Option<String>,
    max_depth: Option<usize>,
}

fn cmd_sample(args: SampleArgs) -> Result<i32, ScanError> {
    let options = SampleOptions {
        config_path: args.config,
        catalogue_override: parse_catalogue(args.catalogue)?,
        sample_size: args.size,
        seed: args.seed,
        output: args.output,
        permissions_output: args.permissions_csv,
        max_depth: args.max_depth,
    };

    let report = extscan::run_sampling(&args.folder, &options, |path| {
        println!("[Analyzing] {}", path.display());
    })?;

    println!(
        "Analyzed {} of {} sampled archives ({} failed, {} candidates); results saved to {}",
        report.run.analyzed,
        report.run.sample.len(),
        report.run.failed.len(),
        report.run.pool_size,
        report.output.display()
    );
    if let Some(path) = &report.permissions_output {
        println!("Sensitive permissions saved to {}", path.display());
    }

    Ok(0)
}

fn cmd_list_apis(catalogue: String, format_str: String) -> Result<i32, ScanError> {
    let set = parse_catalogue(Some(catalogue))?.unwrap_or(CatalogueSet::Full);
    let config = Config::load(&PathBuf::from(DEFAULT_CONFIG_FILE))?;
    let catalogue: Catalogue = config.resolve_catalogue(set)?;

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(catalogue.all_signatures())?;
            println!("{}", json);
        }
        _ => {
            println!("{:<18} SIGNATURE", "CATEGORY");
            println!("{}", "-".repeat(80));
            for entry in &catalogue {
                println!("{:<18} {}", entry.category.to_string(), entry.signature);
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, ScanError> {
    let path = PathBuf::from(DEFAULT_CONFIG_FILE);

    if path.exists() && !force {
        eprintln!("{} already exists. Use --force to overwrite.", DEFAULT_CONFIG_FILE);
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created {}", DEFAULT_CONFIG_FILE);

    Ok(0)
}
