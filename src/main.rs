// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use moodcam::app::TriggerPolicy;
use moodcam::config::Config;
use moodcam::errors::AppResult;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "moodcam")]
#[command(about = "Real-time facial expression overlay")]
#[command(version = moodcam::constants::app_info::version())]
struct Cli {
    /// Configuration file (default: <config dir>/moodcam/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the trigger policy from the configuration
    #[arg(long, global = true)]
    policy: Option<PolicyArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a detection script offline and print each tick
    Replay {
        /// Detection script (JSON)
        script: PathBuf,

        /// Print one JSON object per tick
        #[arg(long)]
        json: bool,

        /// Viewport width in pixels
        #[arg(long, default_value = "1280")]
        width: f32,

        /// Viewport height in pixels
        #[arg(long, default_value = "720")]
        height: f32,
    },

    /// Run a detection script in real time without a display (Ctrl+C stops)
    Watch {
        /// Detection script (JSON)
        script: PathBuf,

        /// Start over when the script ends
        #[arg(short, long = "loop")]
        looping: bool,
    },

    /// Live overlay preview in the terminal
    Terminal {
        /// Detection script (JSON)
        script: PathBuf,

        /// Start over when the script ends
        #[arg(short, long = "loop")]
        looping: bool,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Sequence,
    Combo,
}

impl From<PolicyArg> for TriggerPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Sequence => TriggerPolicy::Sequence,
            PolicyArg::Combo => TriggerPolicy::Combo,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=moodcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())?;
    Ok(())
}

fn run(cli: Cli) -> AppResult<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(policy) = cli.policy {
        config.trigger.policy = policy.into();
    }

    match cli.command {
        Commands::Replay {
            script,
            json,
            width,
            height,
        } => cli::replay(&config, &script, json, width, height),
        Commands::Watch { script, looping } => cli::watch(config, &script, looping),
        Commands::Terminal { script, looping } => {
            let script = cli::load_script(&script)?;
            moodcam::terminal::run(config, script, looping)
        }
        Commands::Config => cli::print_config(&config),
    }
}
