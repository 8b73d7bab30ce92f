mod cmd;
mod output;
mod settings;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;
use wizard_core::config::RunMode;

#[derive(Parser)]
#[command(
    name = "sdlc-wizard",
    about = "Step-by-step SDLC documentation wizard backed by Claude",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./wizard.yaml when present)
    #[arg(long, global = true, env = "WIZARD_CONFIG")]
    config: Option<PathBuf>,

    /// Anthropic API key
    #[arg(long, global = true, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model used for every step
    #[arg(long, global = true, env = "CLAUDE_MODEL")]
    model: Option<String>,

    /// Messages API host (proxies, local testing)
    #[arg(long, global = true, env = "ANTHROPIC_BASE_URL")]
    api_base_url: Option<String>,

    /// development or production
    #[arg(long, global = true, env = "WIZARD_MODE")]
    mode: Option<RunMode>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the wizard interactively in the terminal
    Run {
        /// System description (prompted for when omitted)
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Directory for step files and the combined document
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,
    },

    /// Start the WebSocket + HTTP server
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Allowed CORS origin (default: any)
        #[arg(long, env = "FRONTEND_URL")]
        frontend_url: Option<String>,

        /// Don't open browser automatically
        #[arg(long)]
        no_open: bool,
    },

    /// List the wizard steps
    Steps,

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    // Missing .env is normal; a malformed one is worth a warning once logging is up.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = &dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, "failed to load .env");
        }
    }

    let mut overrides = settings::Overrides {
        config: cli.config,
        api_key: cli.api_key,
        model: cli.model,
        api_base_url: cli.api_base_url,
        mode: cli.mode,
        ..settings::Overrides::default()
    };
    match &cli.command {
        Commands::Run { output_dir, .. } => overrides.output_dir = output_dir.clone(),
        Commands::Serve {
            port, frontend_url, ..
        } => {
            overrides.port = *port;
            overrides.frontend_url = frontend_url.clone();
        }
        _ => {}
    }

    let result = settings::resolve(&overrides).and_then(|config| match cli.command {
        Commands::Run { description, .. } => cmd::run::run(&config, description),
        Commands::Serve { no_open, .. } => cmd::serve::run(&config, no_open),
        Commands::Steps => cmd::steps::run(cli.json),
        Commands::Config { subcommand } => cmd::config::run(&config, subcommand, cli.json),
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
