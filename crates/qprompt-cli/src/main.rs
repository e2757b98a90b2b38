//! CLI for qprompt — prompt variations chosen by quantum randomness.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "qprompt")]
#[command(about = "qprompt — transform your prompts using true quantum randomness")]
#[command(version = qprompt_core::VERSION)]
struct Cli {
    /// JSON config file (default: $QPROMPT_CONFIG, else built-in providers)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log provider attempts and fallbacks (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate prompt variations with techniques selected by quantum randomness
    Generate {
        /// Prompt to optimize
        prompt: String,

        /// Number of variations (3-10)
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,

        /// Perform the entropy draws concurrently
        #[arg(long)]
        parallel: bool,

        /// Write the variations as a text document to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the text document to quantum_prompts_<timestamp>.txt
        #[arg(long, conflicts_with = "output")]
        save: bool,

        /// Print the generation as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Draw raw integers through the provider fallback chain
    Draw {
        /// Inclusive lower bound
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        min: i64,

        /// Inclusive upper bound
        #[arg(long, default_value = "255", allow_hyphen_values = true)]
        max: i64,

        /// Number of draws
        #[arg(long, default_value = "1")]
        count: usize,
    },

    /// Probe every configured entropy provider once and show its status
    Providers,

    /// List the technique catalog in selection order
    Techniques,

    /// Print the effective configuration as JSON
    Config {
        /// Print the built-in defaults instead
        #[arg(long)]
        default: bool,
    },

    /// Start the HTTP generation server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8043")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Generate {
            prompt,
            count,
            parallel,
            output,
            save,
            json,
        } => commands::generate::run(commands::generate::GenerateCommandConfig {
            config_path: config,
            prompt: &prompt,
            count,
            parallel,
            output: output.as_deref(),
            save,
            json,
        }),
        Commands::Draw { min, max, count } => commands::draw::run(config, min, max, count),
        Commands::Providers => commands::providers::run(config),
        Commands::Techniques => commands::techniques::run(config),
        Commands::Config { default } => commands::config::run(config, default),
        Commands::Serve { port, host } => commands::serve::run(config, &host, port),
    }
}
