//! figma-icon-export - export Figma icon sets to disk

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use figma_icon_export::config::DEFAULT_CONFIG_FILE;
use figma_icon_export::extract::DUPLICATE_SUFFIX;
use figma_icon_export::gitignore::ensure_config_ignored;
use figma_icon_export::{
    Config, DownloadResult, Event, ExportMode, FrameSelector, IconExporter, ImageFormat,
    export_with_shutdown,
};

#[derive(Parser)]
#[command(name = "figma-icon-export")]
#[command(version, about = "Export icon sets from a Figma file", long_about = None)]
#[command(after_help = "EXAMPLES:
    figma-icon-export                          Export using ./icons-config.json
    figma-icon-export --page Icons --frame Library/Outline
    figma-icon-export -p                       Export PNG images instead of icons")]
struct Cli {
    /// Config file (JSON)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Export PNG images: keeps existing files, skips names containing '_', writes no manifest
    #[arg(short = 'p', long = "png")]
    png: bool,

    /// Personal access token
    #[arg(long, env = "FIGMA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Figma file key
    #[arg(long)]
    file_id: Option<String>,

    /// Page to export (replaces `page`/`pages` from the config file)
    #[arg(long)]
    page: Option<String>,

    /// Frame path inside the page, e.g. "Library/Outline" (-1 for none)
    #[arg(long, allow_hyphen_values = true)]
    frame: Option<String>,

    /// Output directory for icon files
    #[arg(long, value_name = "DIR")]
    icons_path: Option<PathBuf>,

    /// Output directory for icons.json
    #[arg(long, value_name = "DIR")]
    meta_path: Option<PathBuf>,

    /// Icon format (svg, png, jpg, pdf)
    #[arg(long)]
    format: Option<ImageFormat>,

    /// Maximum concurrent downloads (default: all at once)
    #[arg(short = 'j', long, value_name = "N")]
    jobs: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress progress and the results table
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> figma_icon_export::Result<()> {
    if let Err(e) = ensure_config_ignored(Path::new(".gitignore"), &cli.config).await {
        tracing::warn!(error = %e, "could not update .gitignore");
    }

    let config = load_config(&cli).await?;
    let mode = if cli.png {
        ExportMode::Images
    } else {
        ExportMode::Icons
    };

    let exporter = IconExporter::new(config)?;
    let progress = (!cli.quiet)
        .then(|| tokio::spawn(relay_events(exporter.subscribe(), print_progress)));

    let result = export_with_shutdown(&exporter, mode).await;
    // the last sender goes with the exporter, so the relay drains and stops
    drop(exporter);
    if let Some(progress) = progress {
        progress.await.ok();
    }
    let report = result?;

    if !cli.quiet {
        println!("{}", results_table(&report.results));
    }
    Ok(())
}

/// Config file values, overridden by command-line flags
async fn load_config(cli: &Cli) -> figma_icon_export::Result<Config> {
    let mut config = if tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
        Config::from_file(&cli.config).await?
    } else {
        tracing::info!(path = ?cli.config, "no config file, using command-line settings only");
        Config::default()
    };

    if let Some(token) = &cli.token {
        config.figma_personal_token = Some(token.clone());
    }
    if let Some(file_id) = &cli.file_id {
        config.file_id = file_id.clone();
    }
    if let Some(page) = &cli.page {
        config.page = Some(page.clone());
        config.pages.clear();
    }
    if let Some(frame) = &cli.frame {
        config.frame = Some(FrameSelector(frame.clone()));
    }
    if let Some(path) = &cli.icons_path {
        config.icons_path = path.clone();
    }
    if let Some(path) = &cli.meta_path {
        config.meta_path = path.clone();
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if cli.jobs.is_some() {
        config.max_concurrent_downloads = cli.jobs;
    }

    config.validate()?;
    Ok(config)
}

/// Feed every event to `print` until all senders are gone
///
/// Returns the number of events handled. A lagging receiver skips ahead and keeps going.
async fn relay_events(mut events: broadcast::Receiver<Event>, print: fn(&Event)) -> usize {
    let mut handled = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                print(&event);
                handled += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "progress output lagged, skipped events");
            }
            Err(RecvError::Closed) => return handled,
        }
    }
}

fn print_progress(event: &Event) {
    match event {
        Event::DocumentFetched { elapsed_ms } => {
            eprintln!("Fetched Figma file in {:.2}s", *elapsed_ms as f64 / 1000.0);
        }
        Event::DuplicateName { name } => {
            eprintln!("Duplicate icon name: {name}. Please fix figma file");
        }
        Event::UrlsResolved { count } => eprintln!("Api returned {count} icons"),
        Event::OutputCleared { path } => eprintln!("Cleared {}", path.display()),
        Event::DownloadFailed { name, error } => {
            eprintln!("Something went wrong fetching {name}: {error}");
        }
        Event::ManifestWritten { path } => eprintln!("Wrote {}", path.display()),
        Event::ManifestFailed { error } => eprintln!("Could not write manifest: {error}"),
        Event::Finished { count } => eprintln!("Download finished! ({count} files)\n"),
        Event::IconsExtracted { .. } | Event::IconDownloaded { .. } => {}
    }
}

fn format_size(size: u64) -> String {
    format!("{:.2} KiB", size as f64 / 1024.0)
}

fn results_table(results: &[DownloadResult]) -> String {
    let mut table = String::from("  File\t    Size\t\n\n");
    for result in results {
        let marker = if result.name.contains(DUPLICATE_SUFFIX) {
            " (duplicate)"
        } else {
            ""
        };
        table.push_str(&format!(
            "  {}{}\t    {}\t\n",
            result.name,
            marker,
            format_size(result.size)
        ));
    }
    table
}
