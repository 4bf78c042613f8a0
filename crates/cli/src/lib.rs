use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use config::FileConfig;
use report::BatchReport;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

pub mod config;
pub mod records;
pub mod report;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "ztrend")]
#[command(about = "Find trending tokens in JSONL event streams", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// TOML config file (overrides ZTREND_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Window size in seconds (overrides the config file)
    #[arg(long, global = true)]
    window_size: Option<i64>,

    /// Spacing between window starts in seconds (overrides the config file)
    #[arg(long, global = true)]
    granularity: Option<i64>,

    /// Leave windows with no activity out of every baseline
    #[arg(long, global = true)]
    ignore_empty_windows: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one batch of current events against a history file
    Score(ScoreArgs),

    /// Score successive batches, each becoming the baseline for the next
    Roll(RollArgs),
}

#[derive(Args)]
struct OutputArgs {
    /// Emit JSON instead of a text table (implies --quiet)
    #[arg(long)]
    json: bool,

    /// Show at most this many tokens per batch
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct ScoreArgs {
    /// JSONL file with historical events
    #[arg(long)]
    history: PathBuf,

    /// JSONL file with the current batch
    #[arg(long)]
    current: PathBuf,

    /// Extend the baseline with empty windows up to this unix timestamp
    #[arg(long)]
    until: Option<i64>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct RollArgs {
    /// JSONL file with the initial history
    #[arg(long)]
    history: PathBuf,

    /// JSONL batch files, scored in order
    #[arg(required = true)]
    batches: Vec<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
}

pub fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Score(args) => args.output.json,
        Commands::Roll(args) => args.output.json,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Score(args) => run_score(args, &config),
        Commands::Roll(args) => run_roll(args, &config),
    }
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let path = cli
        .config
        .clone()
        .or_else(|| env::var("ZTREND_CONFIG").ok().map(PathBuf::from));
    let mut config = match path {
        Some(path) => FileConfig::load(&path)?,
        None => FileConfig::default(),
    };

    if let Some(window_size) = cli.window_size {
        config.engine.window_size_seconds = window_size;
    }
    if let Some(granularity) = cli.granularity {
        config.engine.granularity_seconds = granularity;
    }
    if cli.ignore_empty_windows {
        config.engine.ignore_empty_windows = true;
    }
    config.validate().context("Invalid window settings")?;

    log::debug!(
        "Windows: {}s every {}s, ignore_empty_windows={}",
        config.engine.window_size_seconds,
        config.engine.granularity_seconds,
        config.engine.ignore_empty_windows
    );
    Ok(config)
}

fn run_score(args: ScoreArgs, config: &FileConfig) -> Result<()> {
    let mut trending = records::build_engine(config)?;

    let history = records::read_records(&args.history)?;
    trending
        .add_historical_documents(&history)
        .with_context(|| format!("Failed to ingest {}", args.history.display()))?;
    if let Some(until) = args.until {
        trending
            .extend_history_to(until)
            .with_context(|| format!("Failed to extend history to {until}"))?;
    }
    log::info!(
        "Baseline built from {} event(s), {} token(s)",
        history.len(),
        trending.tokens().len()
    );

    let current = records::read_records(&args.current)?;
    let scores = trending
        .get_trending(&current)
        .with_context(|| format!("Failed to score {}", args.current.display()))?;

    let mut report = BatchReport::new(batch_name(&args.current), scores);
    report.truncate(args.output.limit);
    emit(&[report], &args.output)
}

fn run_roll(args: RollArgs, config: &FileConfig) -> Result<()> {
    let mut trending = records::build_engine(config)?;

    let history = records::read_records(&args.history)?;
    trending
        .add_historical_documents(&history)
        .with_context(|| format!("Failed to ingest {}", args.history.display()))?;

    let mut reports = Vec::with_capacity(args.batches.len());
    for path in &args.batches {
        let batch = records::read_records(path)?;
        let scores = trending
            .get_trending_and_ingest(&batch)
            .with_context(|| format!("Failed to score {}", path.display()))?;
        let mut report = BatchReport::new(batch_name(path), scores);
        report.truncate(args.output.limit);
        reports.push(report);
    }

    emit(&reports, &args.output)
}

fn emit(reports: &[BatchReport], output: &OutputArgs) -> Result<()> {
    let text = if output.json {
        report::render_json(reports)?
    } else {
        report::render_text(reports)
    };
    print_stdout(&text)
}

fn batch_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}
