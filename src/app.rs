//! Application orchestration and command routing.
//!
//! Parses the command line and delegates to the command handlers.

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

use crate::commands::{self, RecordOptions};
use crate::config::RecorderOverrides;
use crate::logging;

/// Capture a short microphone clip with a live waveform
#[derive(Parser)]
#[command(name = "tunecap")]
#[command(version)]
#[command(long_about = "Capture a short microphone clip with a live waveform, ready for music recognition.\n\nDEFAULT COMMAND:\n    If no command is given, 'record' is used.\n\nKEYS:\n    r       start recording\n    space   pause / resume\n    s       stop\n    enter   accept the clip\n    n       discard and record again\n    q, esc  quit\n\nEXAMPLES:\n    # Record up to 10 seconds and save to the current directory\n    $ tunecap\n\n    # Record up to 20 seconds into a specific file\n    $ tunecap --max-duration 20 -o clip.wav\n\n    # Stop a running recording from another process\n    $ pkill -USR1 tunecap")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/tunecap/tunecap.toml\n    Logs:               ~/.local/state/tunecap/tunecap.log.*"
)]
struct Cli {
    #[command(flatten)]
    record: RecordArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for recording a clip.
#[derive(Args, Debug, Clone, Default)]
struct RecordArgs {
    /// Write the accepted clip to this file or directory
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Input device: "default", an index, or a name from `tunecap list-devices`
    #[arg(short, long)]
    device: Option<String>,

    /// Stop automatically after this many seconds
    #[arg(long, value_name = "SECONDS")]
    max_duration: Option<u32>,

    /// Warn when the clip is shorter than this many seconds
    #[arg(long, value_name = "SECONDS")]
    min_duration: Option<u32>,

    /// Requested capture rate in Hz
    #[arg(long, value_name = "HZ")]
    sample_rate: Option<u32>,

    /// Clip format: "wav" or "codec [ffmpeg options]", e.g. "mp3 -ab 64k"
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,
}

impl From<RecordArgs> for RecordOptions {
    fn from(args: RecordArgs) -> Self {
        RecordOptions {
            output: args.output,
            device: args.device,
            overrides: RecorderOverrides {
                max_duration: args.max_duration,
                sample_rate: args.sample_rate,
                min_duration: args.min_duration,
                format: args.format,
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Record a clip with live waveform (default)
    #[command(visible_alias = "r")]
    Record(RecordArgs),

    /// List available audio input devices
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries
    Logs,

    /// Generate shell completion script
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If the selected command fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            generate(shell, &mut Cli::command(), "tunecap", &mut io::stdout());
            Ok(())
        }
        Some(Commands::ListDevices) => commands::handle_list_devices(),
        Some(Commands::Logs) => commands::handle_logs(),
        Some(Commands::Record(args)) => {
            logging::init_logging()?;
            commands::handle_record(args.into()).await
        }
        None => {
            logging::init_logging()?;
            commands::handle_record(cli.record.into()).await
        }
    }
}
