use clap::{Parser, Subcommand};
use image_variants::config;
use image_variants::generator::{MatrixReport, VariantMatrixGenerator};
use image_variants::imaging::Quality;
use image_variants::output::{self, Action};
use image_variants::scan::{self, Missing};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Shared arguments for commands that take source images.
#[derive(clap::Args, Clone)]
struct SourceArgs {
    /// Source images, or directories to search recursively
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Write a JSON report of every leg to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "image-variants")]
#[command(about = "Generate JPEG/WebP size variants of source images")]
#[command(long_about = "\
Generate JPEG/WebP size variants of source images

Every source image `name.ext` produces six derivatives under the output
directory:

  images/name.jpg          1920x1080
  mediums/name.jpg         512 wide, aspect preserved
  thumbnails/name.jpg      200 wide, aspect preserved
  webp/name.webp           1920x1080
  webp/medium/name.webp    512 wide, aspect preserved
  webp/thumb/name.webp     200 wide, aspect preserved

An image that fails to decode or encode is reported as a warning and skipped;
the run still succeeds. Failing to create an output directory fails the run.

Run 'image-variants gen-config' to print a documented derivatives.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Output directory (overrides `output_dir` from the config file)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Log progress at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate all six derivatives for each source image
    Generate(SourceArgs),
    /// Remove all six derivatives for each source image
    Remove(SourceArgs),
    /// Print a stock derivatives.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Generate(args) => run(&cli, args, Action::Generate),
        Command::Remove(args) => run(&cli, args, Action::Remove),
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run(
    cli: &Cli,
    args: &SourceArgs,
    action: Action,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = load_config(cli)?;
    init_thread_pool(&config.processing);

    let missing = match action {
        Action::Generate => Missing::Reject,
        Action::Remove => Missing::Allow,
    };
    let sources = scan::collect_sources(&args.paths, missing)?;
    let base = PathBuf::from(&config.output_dir);
    let generator = VariantMatrixGenerator::new(&base)
        .with_quality(Quality::new(config.encoding.jpeg_quality));

    info!(sources = sources.len(), output = %base.display(), "start");
    let reports = match action {
        Action::Generate => generator.generate_all(&sources),
        Action::Remove => generator.remove_all(&sources),
    };

    finish(&reports, &base, action, args.report.as_deref())
}

/// Print results, write the optional JSON report and pick the exit code.
///
/// Only infrastructure failures (unwritable output tree) fail the run.
fn finish(
    reports: &[MatrixReport],
    base: &Path,
    action: Action,
    report_path: Option<&Path>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    output::print_reports(reports, base);
    output::print_summary(reports, action);
    if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
        output::print_annotations(reports);
    }

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(reports)?;
        std::fs::write(path, json)?;
    }

    if reports.iter().any(MatrixReport::has_infrastructure_failure) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Stock defaults ← config file ← `--output`.
fn load_config(cli: &Cli) -> Result<config::Config, config::ConfigError> {
    let overrides = cli.output.as_ref().map(|dir| {
        let mut table = toml::Table::new();
        table.insert(
            "output_dir".into(),
            toml::Value::String(dir.to_string_lossy().into_owned()),
        );
        toml::Value::Table(table)
    });
    config::load_config(&cli.config, overrides)
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,image_variants=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
