//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use nbtoc_core::{TocOutcome, TocRequest, generate_toc, resolve_notebook};
use nbtoc_discovery::{LocatorOptions, SessionLocator};
use nbtoc_notebook::IpynbLoader;
use nbtoc_shared::{
    AppConfig, NO_DOCUMENT_MESSAGE, OutputFormat, TocConfig, TocEntry, init_config, load_config,
    validate_max_depth,
};
use tracing::info;

/// Crates whose log output the verbosity flags control.
const LOG_TARGETS: &[&str] = &[
    "nbtoc",
    "nbtoc_core",
    "nbtoc_discovery",
    "nbtoc_notebook",
    "nbtoc_shared",
];

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// nbtoc: generate a table of contents for a Jupyter notebook.
#[derive(Parser)]
#[command(
    name = "nbtoc",
    version,
    about = "Generate a Markdown table of contents from a notebook's headings.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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
    /// Print the table of contents for a notebook.
    Toc {
        /// Notebook path (auto-detected from the running session if omitted).
        notebook: Option<PathBuf>,

        /// Deepest heading level to include (1 = H1 only).
        #[arg(short = 'd', long)]
        max_depth: Option<usize>,

        /// Output format: markdown or json.
        #[arg(short, long)]
        format: Option<OutputFormat>,

        #[command(flatten)]
        locate: LocateArgs,
    },

    /// Print the path of the notebook attached to the current kernel.
    Locate {
        #[command(flatten)]
        locate: LocateArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags controlling notebook auto-detection.
#[derive(Args, Debug, Default)]
pub(crate) struct LocateArgs {
    /// Kernel connection file (kernel-<id>.json) of the active kernel.
    #[arg(long, env = "NBTOC_CONNECTION_FILE")]
    pub connection_file: Option<PathBuf>,

    /// Jupyter runtime directory holding jpserver-*.json files.
    #[arg(long, env = "JUPYTER_RUNTIME_DIR")]
    pub runtime_dir: Option<PathBuf>,

    /// Timeout for each Jupyter server request, in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl LocateArgs {
    /// Overlay flags onto the config-derived settings.
    fn apply(self, config: &mut TocConfig) {
        if let Some(file) = self.connection_file {
            config.connection_file = Some(file);
        }
        if let Some(dir) = self.runtime_dir {
            config.runtime_dir = Some(dir);
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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
        Command::Toc {
            notebook,
            max_depth,
            format,
            locate,
        } => cmd_toc(notebook, max_depth, format, locate).await,
        Command::Locate { locate } => cmd_locate(locate).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Merge the config file with command-line overrides.
fn resolve_toc_config(
    config: &AppConfig,
    notebook: Option<PathBuf>,
    max_depth: Option<usize>,
    format: Option<OutputFormat>,
    locate: LocateArgs,
) -> Result<TocConfig> {
    let mut toc_config = TocConfig::from(config);
    toc_config.notebook = notebook;
    if let Some(depth) = max_depth {
        toc_config.max_depth = validate_max_depth(depth)?;
    }
    if let Some(format) = format {
        toc_config.format = format;
    }
    locate.apply(&mut toc_config);
    Ok(toc_config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_toc(
    notebook: Option<PathBuf>,
    max_depth: Option<usize>,
    format: Option<OutputFormat>,
    locate: LocateArgs,
) -> Result<()> {
    let config = load_config()?;
    let toc_config = resolve_toc_config(&config, notebook, max_depth, format, locate)?;

    info!(
        notebook = ?toc_config.notebook,
        max_depth = toc_config.max_depth,
        format = %toc_config.format,
        "generating table of contents"
    );

    let locator = SessionLocator::new(LocatorOptions::from(&toc_config));
    let request = TocRequest::from(&toc_config);
    let outcome = generate_toc(&request, &locator, &IpynbLoader).await;

    match toc_config.format {
        OutputFormat::Markdown => println!("{}", outcome.render()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json_report(&outcome))?),
    }

    Ok(())
}

/// Machine-readable form of a pipeline outcome.
fn json_report(outcome: &TocOutcome) -> serde_json::Value {
    let entries: &[TocEntry] = match outcome {
        TocOutcome::Toc(result) => result.entries(),
        TocOutcome::DocumentNotFound => &[],
    };

    serde_json::json!({
        "status": outcome.status(),
        "entries": entries,
    })
}

async fn cmd_locate(locate: LocateArgs) -> Result<()> {
    let config = load_config()?;
    let toc_config = resolve_toc_config(&config, None, None, None, locate)?;
    let locator = SessionLocator::new(LocatorOptions::from(&toc_config));

    match resolve_notebook(None, &locator).await {
        Some(path) => println!("{}", path.display()),
        None => println!("{NO_DOCUMENT_MESSAGE}"),
    }

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
