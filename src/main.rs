// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use cuebatch::app_config::{self, Config};
use cuebatch::app_controller::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a subtitle file (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for cuebatch
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct TranslateArgs {
    /// SRT file, or directory holding one
    #[arg(value_name = "INPUT_PATH", env = "INPUT_SRT", default_value = ".")]
    input_path: PathBuf,

    /// Source language code, or 'auto'
    #[arg(short, long, env = "SOURCE_LANG")]
    source_language: Option<String>,

    /// Target language code (e.g., 'fr', 'es', 'zh-TW')
    #[arg(short, long, env = "TARGET_LANG")]
    target_language: Option<String>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Provider endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Maximum provider calls in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Larger groups and moderate concurrency
    #[arg(long)]
    fast: bool,

    /// Translate cue by cue instead of in groups
    #[arg(long)]
    no_grouping: bool,

    /// Do not read or write the persistent cache
    #[arg(long)]
    no_cache: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// cuebatch - batched subtitle translation with caching
#[derive(Parser, Debug)]
#[command(name = "cuebatch")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(about = "Batched, cached subtitle translation")]
#[command(long_about = "cuebatch groups subtitle cues into batches, translates them with bounded
concurrency and caches every translation so repeated text is never sent twice.

EXAMPLES:
    cuebatch movie.srt -t fr                     # Translate to French
    cuebatch -s en -t es movie.srt               # Translate from English to Spanish
    cuebatch --fast -t de /movies/show/          # Translate the source SRT of a directory
    cuebatch --no-cache --log-level debug x.srt  # Skip the persistent cache, verbose
    cuebatch completions bash > cuebatch.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // The level is adjusted at runtime through log::set_max_level
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Start at info; the configured level is applied once the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "cuebatch", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    }
}

/// Load the configuration file, creating a default one when missing
fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        return Config::from_file(config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    config
        .save(config_path)
        .context(format!("Failed to write default config to file: {}", config_path))?;
    Ok(config)
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let mut config = load_config(&options.config_path)?;

    // Override config with CLI options if provided
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(model) = &options.model {
        config.provider.model = model.clone();
    }
    if let Some(endpoint) = &options.endpoint {
        config.provider.endpoint = endpoint.clone();
    }
    if let Some(concurrency) = options.concurrency {
        config.concurrency = Some(concurrency);
    }
    if options.fast {
        config.fast_mode = true;
    }
    if options.no_grouping {
        config.deep_grouping = false;
    }
    if options.no_cache {
        config.cache_enabled = false;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let controller = Controller::with_config(config)?;
    match controller.run(&options.input_path, None, None).await {
        Ok(summary) => {
            info!(
                "Translated {} ({}) -> {}: {}",
                summary.input_file.display(),
                summary.dominant_language,
                summary.output_file.display(),
                summary.report
            );
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            Err(e.into())
        }
    }
}
