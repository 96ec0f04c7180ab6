// tunedeck - folder music player for the terminal
// Pick a folder, pick a song, or let auto-play run through the lot

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn, Subscriber};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use tunedeck::audio::{PlaybackController, PlaybackSettings, RodioBackend, SongScanner};
use tunedeck::config::Config;
use tunedeck::ui::{App, TerminalManager};

#[derive(Parser)]
#[command(name = "tunedeck")]
#[command(about = "Play the songs in a folder, one at a time or straight through")]
struct Args {
    /// Folder to open at startup (overrides the configured music directory)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Start with auto-play switched on
    #[arg(long)]
    auto_play: bool,

    /// Read settings from this file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable developer logging (keeps stderr + debug output)
    #[arg(long)]
    dev: bool,
}

fn init_logging(config: &Config, dev: bool) -> Result<()> {
    std::fs::create_dir_all(&config.log_directory)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(&config.log_directory, "tunedeck.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = if dev { "debug" } else { "info,tunedeck=debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // --dev mirrors everything to stderr as well
    let console = dev.then_some(std::io::stderr);
    tracing::subscriber::set_global_default(build_subscriber(file_writer, console, filter))?;

    // Keep the writer alive for the whole process
    std::mem::forget(guard);

    Ok(())
}

fn build_subscriber<F, C>(file: F, console: Option<C>, filter: EnvFilter) -> impl Subscriber + Send + Sync
where
    F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(file)
                .with_target(true)
                .with_level(true)
                .with_ansi(false),
        )
        .with(console.map(|writer| fmt::layer().with_writer(writer).with_target(true)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    init_logging(&config, args.dev)?;
    info!("tunedeck starting up");

    // Audio backends like to chatter on stderr, which wrecks the TUI
    if !args.dev {
        debug!("Redirecting stderr to suppress backend noise");
        if let Err(e) = redirect_stderr_to_null() {
            warn!("Could not redirect stderr: {}", e);
        }
    }

    // The output stream is not Send; it lives here for the whole run
    let (_stream, backend) = RodioBackend::try_default()?;

    let controller = PlaybackController::new(
        Arc::new(backend),
        SongScanner::new(config.supported_extensions.as_slice()),
        PlaybackSettings::from(&config),
    );

    let start_dir = args.dir.clone().or_else(|| config.music_directory.clone());
    let auto_play = args.auto_play || config.ui.auto_play;

    let mut app = App::new(controller, config);
    if let Some(dir) = start_dir {
        app.open_folder(dir);
    }
    // opening a folder always clears auto-play, so apply the preference after
    app.controller().set_auto_play(auto_play);

    let mut terminal = TerminalManager::new()?;
    let result = app.run(&mut terminal).await;
    drop(terminal);

    info!("tunedeck shutting down");
    result
}

#[cfg(unix)]
fn redirect_stderr_to_null() -> Result<()> {
    unsafe {
        let null_fd = libc::open(
            b"/dev/null\0".as_ptr() as *const libc::c_char,
            libc::O_WRONLY,
        );

        if null_fd == -1 {
            return Err(anyhow::anyhow!("Failed to open /dev/null"));
        }

        if libc::dup2(null_fd, libc::STDERR_FILENO) == -1 {
            libc::close(null_fd);
            return Err(anyhow::anyhow!("Failed to redirect stderr"));
        }

        libc::close(null_fd);
    }

    Ok(())
}

#[cfg(not(unix))]
fn redirect_stderr_to_null() -> Result<()> {
    Ok(())
}
