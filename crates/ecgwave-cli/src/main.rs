//! CLI for ecgwave: a simulated 12-lead ECG you can watch, pipe or serve.

mod commands;
mod tui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ecgwave_core::GeneratorKind;

#[derive(Parser)]
#[command(name = "ecgwave")]
#[command(about = "ecgwave: simulated 12-lead ECG monitor, stream and server")]
#[command(version = ecgwave_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve live samples over WebSocket and accept saved recordings over HTTP
    Server {
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = ecgwave_server::DEFAULT_PORT)]
        port: u16,

        /// Bind address
        #[arg(long, env = "HOST", default_value = ecgwave_server::DEFAULT_HOST)]
        host: String,

        /// Allowed CORS origin (any origin when unset)
        #[arg(long, env = "ORIGIN")]
        origin: Option<String>,

        /// JSON-lines file for saved recordings (in-memory when unset)
        #[arg(long, env = "ECGWAVE_STORE")]
        store: Option<PathBuf>,

        /// Signal broadcast on /ws: noise (4 Hz) or waveform (25 Hz)
        #[arg(long, default_value = "noise")]
        generator: GeneratorKind,
    },

    /// Live 12-lead dashboard (TUI)
    Monitor {
        /// Signal to display: waveform (25 Hz) or noise (4 Hz)
        #[arg(long, default_value = "waveform")]
        generator: GeneratorKind,

        /// Patient label shown in the header and used for saved recordings
        #[arg(long, default_value = "SUPTECH SANTE M 55")]
        patient: String,

        /// Starting heart rate in bpm (clamped to 50-120)
        #[arg(long, default_value_t = ecgwave_core::heart_rate::DEFAULT_HEART_RATE)]
        heart_rate: u32,

        /// JSON-lines file that `s` saves the current window to
        #[arg(long, env = "ECGWAVE_STORE")]
        store: Option<PathBuf>,
    },

    /// Print samples as JSON lines to stdout (pipe-friendly)
    Stream {
        /// Signal to emit: waveform or noise
        #[arg(long, default_value = "waveform")]
        generator: GeneratorKind,

        /// Number of samples (0 = until Ctrl-C)
        #[arg(long, default_value = "0")]
        count: u64,

        /// Fix the random draws
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Server {
            port,
            host,
            origin,
            store,
            generator,
        } => commands::server::run(ecgwave_server::ServerConfig {
            host,
            port,
            allowed_origin: origin,
            generator,
            store_path: store,
        }),
        Commands::Monitor {
            generator,
            patient,
            heart_rate,
            store,
        } => commands::monitor::run(commands::monitor::MonitorConfig {
            generator,
            patient,
            heart_rate,
            store_path: store,
        }),
        Commands::Stream {
            generator,
            count,
            seed,
        } => commands::stream::run(generator, count, seed),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn server_flags_parse() {
        let cli = Cli::try_parse_from([
            "ecgwave",
            "server",
            "--port",
            "6000",
            "--origin",
            "http://localhost:5173",
            "--generator",
            "waveform",
        ])
        .unwrap();
        match cli.command {
            Commands::Server {
                port,
                origin,
                generator,
                ..
            } => {
                assert_eq!(port, 6000);
                assert_eq!(origin.as_deref(), Some("http://localhost:5173"));
                assert_eq!(generator, GeneratorKind::Waveform);
            }
            _ => panic!("expected server"),
        }
    }

    #[test]
    fn unknown_generator_is_rejected() {
        assert!(Cli::try_parse_from(["ecgwave", "stream", "--generator", "sine"]).is_err());
    }
}
