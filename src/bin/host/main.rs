//! eurorack-host - run the signal engine on the default audio devices
//!
//! Run with: cargo run --bin eurorack-host -- --config module.toml --input

mod audio;
mod console;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use tracing_subscriber::EnvFilter;

use eurorack_dsp::{mixer::control_channel, EngineConfig};

#[derive(Parser, Debug)]
#[command(
    name = "eurorack-host",
    about = "Run the Eurorack signal engine with a line-based control console"
)]
struct Cli {
    /// Engine config (TOML). Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Feed the channels from the default input device.
    #[arg(long)]
    input: bool,

    /// Don't open an output stream; the console still runs.
    #[arg(long)]
    no_output: bool,

    /// Sine test tone on channel 0, in Hz. Ignored with --input.
    #[arg(long)]
    tone: Option<f32>,

    /// Capacity of the control event queue.
    #[arg(long, default_value_t = 256)]
    queue: usize,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)
            .wrap_err_with(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let (handle, controls) = control_channel(&config, cli.queue);

    let session = if cli.no_output {
        None
    } else {
        let options = audio::AudioOptions {
            input: cli.input,
            tone_hz: cli.tone,
        };
        Some(audio::start(&mut config, controls, &options)?)
    };

    console::run(handle, &config)?;

    drop(session);
    tracing::info!("stopped");
    Ok(())
}
