//! Glide CLI
//!
//! Start an animation, redirect it mid-flight, and watch it settle.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use glide_animation::Easing;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod runner;

use config::Scenario;

#[derive(Parser)]
#[command(name = "glide")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interruptible value animation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in redirect demo
    Demo {
        /// Sampling interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Starting value
        #[arg(long, allow_negative_numbers = true)]
        from: Option<f64>,

        /// Initial target
        #[arg(long, allow_negative_numbers = true)]
        to: Option<f64>,

        /// Initial run duration in milliseconds
        #[arg(long)]
        duration_ms: Option<u64>,

        /// Delay before redirecting, in milliseconds
        #[arg(long)]
        redirect_after_ms: Option<u64>,

        /// Target after the redirect
        #[arg(long, allow_negative_numbers = true)]
        redirect_to: Option<f64>,

        /// Duration of the redirected run in milliseconds
        #[arg(long)]
        redirect_duration_ms: Option<u64>,

        /// Curve for both runs (linear-drive, linear-decay, exp-drive, exp-decay)
        #[arg(short, long)]
        easing: Option<Easing>,
    },

    /// Run a scenario from a TOML file
    Run {
        /// Scenario file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let scenario = match cli.command {
        Commands::Demo {
            tick_ms,
            from,
            to,
            duration_ms,
            redirect_after_ms,
            redirect_to,
            redirect_duration_ms,
            easing,
        } => {
            let mut scenario = Scenario::demo();
            if let Some(tick_ms) = tick_ms {
                if tick_ms == 0 {
                    anyhow::bail!("--tick-ms must be greater than zero");
                }
                scenario.worker.tick_ms = tick_ms;
            }
            if let Some(from) = from {
                scenario.initial.from = Some(from);
            }
            if let Some(to) = to {
                scenario.initial.to = to;
            }
            if let Some(duration_ms) = duration_ms {
                scenario.initial.duration_ms = duration_ms;
            }
            if let Some(redirect) = scenario.redirect.as_mut() {
                if let Some(after_ms) = redirect_after_ms {
                    redirect.after_ms = after_ms;
                }
                if let Some(to) = redirect_to {
                    redirect.run.to = to;
                }
                if let Some(duration_ms) = redirect_duration_ms {
                    redirect.run.duration_ms = duration_ms;
                }
                if let Some(easing) = easing {
                    redirect.run.easing = easing;
                }
            }
            if let Some(easing) = easing {
                scenario.initial.easing = easing;
            }
            scenario
        }
        Commands::Run { path } => Scenario::load(&path)?,
    };

    let position = runner::run(&scenario, |snapshot| {
        println!("{}", runner::progress_line(snapshot))
    })
    .await?;

    info!("Settled at {}", position);
    Ok(())
}
