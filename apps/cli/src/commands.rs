//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use llmsforge_core::{BuildOptions, BuildReport, ProgressReporter, default_jobs};
use llmsforge_shared::{BuildConfig, DEFAULT_CONFIG_FILE, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// llmsforge: documentation to LLM-ready artifacts.
#[derive(Parser)]
#[command(
    name = "llmsforge",
    version,
    about = "Resolve a documentation tree into LLM-ready page files, bundles, a JSONL corpus, and llms.txt.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Path to the build config.
    #[arg(long, short, default_value = DEFAULT_CONFIG_FILE, env = "LLMSFORGE_CONFIG", global = true)]
    pub config: PathBuf,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build every artifact and replace the artifacts directory.
    Build {
        /// Site output root; artifacts land in `<site-dir>/<ai_artifacts_path>`.
        #[arg(long, default_value = "site")]
        site_dir: PathBuf,

        #[command(flatten)]
        resolve: ResolveArgs,
    },

    /// Discover, resolve, and classify pages without writing anything.
    Check {
        #[command(flatten)]
        resolve: ResolveArgs,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags shared by commands that resolve pages.
#[derive(clap::Args)]
pub(crate) struct ResolveArgs {
    /// Pages resolved in parallel (defaults to available CPUs).
    #[arg(long, short)]
    pub jobs: Option<usize>,

    /// Allow `--8<--` includes of http(s) URLs.
    #[arg(long)]
    pub allow_remote: bool,
}

impl ResolveArgs {
    fn jobs(&self) -> usize {
        self.jobs.filter(|&n| n > 0).unwrap_or_else(default_jobs)
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Print the validated configuration as JSON.
    Show,
    /// Validate the configuration and exit.
    Validate,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "llmsforge=info",
        1 => "llmsforge=debug",
        _ => "llmsforge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build { site_dir, resolve } => cmd_build(&cli.config, site_dir, &resolve).await,
        Command::Check { resolve } => cmd_check(&cli.config, &resolve).await,
        Command::Config { action } => match action {
            ConfigAction::Show => cmd_config_show(&cli.config),
            ConfigAction::Validate => cmd_config_validate(&cli.config),
        },
    }
}

/// Load and validate the config, applying flag overrides.
fn load(path: &Path, resolve: Option<&ResolveArgs>) -> Result<BuildConfig> {
    let mut config = load_config_from(path)
        .wrap_err_with(|| format!("failed to load {}", path.display()))?;
    if resolve.is_some_and(|r| r.allow_remote) {
        config.snippets.allow_remote = true;
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(config_path: &Path, site_dir: PathBuf, resolve: &ResolveArgs) -> Result<()> {
    let config = load(config_path, Some(resolve))?;
    let options = BuildOptions {
        site_dir,
        jobs: resolve.jobs(),
    };

    info!(
        project = %config.project.name,
        site_dir = %options.site_dir.display(),
        jobs = options.jobs,
        "building artifacts"
    );

    let reporter = CliProgress::new();
    let result = llmsforge_core::run_build(config, &options, &reporter).await;
    reporter.spinner.finish_and_clear();
    let report = result.wrap_err("build failed")?;

    let non_empty = report.categories.iter().filter(|(_, m)| !m.is_empty()).count();

    println!();
    println!("  Artifacts built!");
    println!("  Pages:      {}", report.pages.len());
    println!("  Categories: {non_empty}");
    println!("  Excluded:   {}", report.excluded.len());
    println!("  Artifacts:  {}", report.artifacts.len());
    println!("  Output:     {}", report.output_dir.display());
    if let Some(raw) = &report.raw_copy {
        println!("  Raw copy:   {}", raw.display());
    }
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_check(config_path: &Path, resolve: &ResolveArgs) -> Result<()> {
    let config = load(config_path, Some(resolve))?;

    let reporter = CliProgress::new();
    let result = llmsforge_core::check(config, resolve.jobs(), &reporter).await;
    reporter.spinner.finish_and_clear();
    let report = result.wrap_err("check failed")?;

    println!();
    for (name, members) in &report.categories {
        println!("  {name} ({})", members.len());
        for slug in members {
            println!("    {slug}");
        }
    }
    if !report.excluded.is_empty() {
        println!("  Excluded ({})", report.excluded.len());
        for path in &report.excluded {
            println!("    {path}");
        }
    }
    println!();
    println!(
        "  {} pages resolved in {:.1}s",
        report.pages.len(),
        report.elapsed.as_secs_f64()
    );
    println!();

    Ok(())
}

fn cmd_config_show(config_path: &Path) -> Result<()> {
    let config = load(config_path, None)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_validate(config_path: &Path) -> Result<()> {
    let config = load(config_path, None)?;
    println!(
        "{}: ok ({} categories)",
        config_path.display(),
        config.content.categories_order.len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_resolved(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Resolving [{current}/{total}] {path}"));
    }

    fn done(&self, _report: &BuildReport) {
        self.spinner.finish_and_clear();
    }
}
