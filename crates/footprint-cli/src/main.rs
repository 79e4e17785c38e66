mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{ffi::OsString, path::PathBuf};

use commands::{
    data::ExportFormat,
    privacy::{PrivacyActionType, Toggle},
};
use footprint_core::config::get_data_dir;

/// Origin prefix browsers pass as the first argument when launching a host
const EXTENSION_ORIGIN_PREFIX: &str = "chrome-extension://";

#[derive(Parser)]
#[command(name = "footprint")]
#[command(about = "Browser activity session tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as the browser's native messaging host
    Host {
        /// Calling extension origin, passed by the browser
        origin: Option<String>,
        /// Extra arguments some browsers append (e.g. --parent-window)
        #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
        rest: Vec<String>,
    },
    /// Initialize footprint (first-time setup)
    Init,
    /// Print the native messaging host manifest
    Manifest {
        /// Id of the extension allowed to connect
        #[arg(long)]
        extension_id: String,
        /// Host executable path (defaults to this binary)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show host status and the current session
    Status,
    /// Pause tracking in the running host
    Pause,
    /// Resume tracking in the running host
    Resume,
    /// Stop the running host
    Stop,
    /// List stored events
    Events {
        /// Only events of this kind: session_start, session_end, engagement
        #[arg(short, long)]
        kind: Option<String>,
        /// Only events from the last N hours
        #[arg(short, long)]
        since: Option<u32>,
        /// Show only the newest N events
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Export stored events
    Export {
        /// Output format
        #[arg(value_enum)]
        format: ExportFormat,
        /// Output file path
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Privacy settings
    Privacy {
        #[command(subcommand)]
        action: Option<PrivacyAction>,
    },
}

#[derive(Subcommand, Debug)]
enum PrivacyAction {
    /// Never track URLs containing this substring
    Exclude { pattern: String },
    /// Remove a pattern from the exclusion list
    Include { pattern: String },
    /// Turn page content scanning on or off
    ContentScanning {
        #[arg(value_enum)]
        state: Toggle,
    },
}

/// Browsers start hosts as `<exe> chrome-extension://<id>/ [...]`; route that to `host`
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().collect();
    let launched_by_browser = args
        .get(1)
        .and_then(|arg| arg.to_str())
        .is_some_and(|arg| arg.starts_with(EXTENSION_ORIGIN_PREFIX));
    if launched_by_browser {
        args.insert(1, OsString::from("host"));
    }
    args
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    if matches!(cli.command, Commands::Host { .. }) {
        commands::host::setup_host_logging()?;
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_secs()
            .init();
    }

    let data_dir = get_data_dir()?;

    match cli.command {
        Commands::Host { origin, rest } => {
            if !rest.is_empty() {
                log::debug!("Ignoring extra host arguments: {rest:?}");
            }
            commands::host::run_host(origin).await
        }
        Commands::Init => commands::init::init_command().await,
        Commands::Manifest { extension_id, path } => {
            commands::manifest::handle_manifest(&extension_id, path)
        }
        Commands::Status => commands::control::show_status(&data_dir).await,
        Commands::Pause => commands::control::set_paused(&data_dir, true).await,
        Commands::Resume => commands::control::set_paused(&data_dir, false).await,
        Commands::Stop => commands::control::stop_host(&data_dir).await,
        Commands::Events { kind, since, limit } => {
            commands::events::handle_events(kind, since, limit).await
        }
        Commands::Export { format, output } => {
            commands::data::handle_data_export(format, output).await
        }
        Commands::Privacy { action } => {
            let action = action.map(|a| match a {
                PrivacyAction::Exclude { pattern } => PrivacyActionType::Exclude { pattern },
                PrivacyAction::Include { pattern } => PrivacyActionType::Include { pattern },
                PrivacyAction::ContentScanning { state } => {
                    PrivacyActionType::ContentScanning(state)
                }
            });
            commands::privacy::handle_privacy_command(action).await
        }
    }
}
