//! mdlive - Live Markdown preview with diagram support and PDF export

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mdlive_core::config::{PreviewConfig, SurfaceKind};
use mdlive_core::{Config, Document, HtmlGenerator};
use mdlive_preview::{FileSurface, PreviewSurface, SessionRegistry};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Live Markdown preview with mermaid and markmap diagrams
#[derive(Parser, Debug)]
#[command(name = "mdlive")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a live preview for each file, refreshed as the files change
    Preview {
        /// Markdown files to preview
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Where to show the preview
        #[arg(long, value_enum)]
        surface: Option<SurfaceArg>,

        /// Quiet period after the last change before refreshing
        #[arg(long, value_name = "MS")]
        debounce_ms: Option<u64>,

        /// Port for the preview server (0 picks a free one)
        #[arg(long)]
        port: Option<u16>,

        /// Don't open the preview in a browser
        #[arg(long)]
        no_open: bool,
    },

    /// Render a file to PDF through a headless browser
    #[cfg(feature = "pdf")]
    Export {
        /// Markdown file to export
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output path (defaults to the source path with a .pdf extension)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Write the standalone HTML document for a file
    Render {
        /// Markdown file to render
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output path (defaults to stdout)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SurfaceArg {
    Http,
    File,
}

impl From<SurfaceArg> for SurfaceKind {
    fn from(arg: SurfaceArg) -> Self {
        match arg {
            SurfaceArg::Http => SurfaceKind::Http,
            SurfaceArg::File => SurfaceKind::File,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    match args.command {
        Command::Preview {
            files,
            surface,
            debounce_ms,
            port,
            no_open,
        } => {
            let mut preview = config.preview.clone();
            if let Some(surface) = surface {
                preview.surface = surface.into();
            }
            if let Some(debounce_ms) = debounce_ms {
                preview.debounce_ms = debounce_ms;
            }
            if let Some(port) = port {
                preview.port = port;
            }
            if no_open {
                preview.open_browser = false;
            }
            run_preview(&config, &preview, &files).context("Preview error")
        }
        #[cfg(feature = "pdf")]
        Command::Export { file, output } => export(&config, &file, output),
        Command::Render { file, output } => render(&config, &file, output.as_deref()),
    }
}

fn run_preview(config: &Config, preview: &PreviewConfig, files: &[PathBuf]) -> Result<()> {
    let generator = HtmlGenerator::from_config(config);
    let mut registry = SessionRegistry::new(generator, Duration::from_millis(preview.debounce_ms));
    let (tx, rx) = crossbeam_channel::unbounded();

    #[cfg(feature = "watch")]
    let mut watcher = mdlive_preview::DocumentWatcher::new(tx.clone())?;
    #[cfg(not(feature = "watch"))]
    log::warn!("Built without file watching; previews show the initial render only");

    for file in files {
        let doc = Document::load(file)
            .with_context(|| format!("Failed to load document: {}", file.display()))?;
        let surface = make_surface(preview, doc.path())?;

        #[cfg(feature = "watch")]
        watcher.watch(doc.path())?;

        let session = registry.open(doc, surface)?;
        println!("{} -> {}", session.id(), session.surface().location());

        if preview.open_browser {
            open_browser(session.surface());
        }
    }

    // Keep a sender alive so the loop only ends on Shutdown
    let _tx = tx;
    mdlive_preview::run(&mut registry, &rx)
}

fn make_surface(preview: &PreviewConfig, source: &Path) -> Result<Box<dyn PreviewSurface>> {
    match preview.surface {
        SurfaceKind::File => Ok(Box::new(FileSurface::beside(source))),
        #[cfg(feature = "http")]
        SurfaceKind::Http => Ok(Box::new(mdlive_preview::HttpSurface::bind_preferred(
            &preview.bind,
            preview.port,
        )?)),
        #[cfg(not(feature = "http"))]
        SurfaceKind::Http => anyhow::bail!("Built without the http feature; use --surface file"),
    }
}

#[cfg(feature = "http")]
fn open_browser(surface: &dyn PreviewSurface) {
    // A missing browser shouldn't stop the preview
    if let Err(e) = mdlive_preview::surface::open_in_browser(surface) {
        log::warn!("{:#}", e);
    }
}

#[cfg(not(feature = "http"))]
fn open_browser(surface: &dyn PreviewSurface) {
    log::info!("Open {} to view the preview", surface.location());
}

#[cfg(feature = "pdf")]
fn export(config: &Config, file: &Path, output: Option<PathBuf>) -> Result<()> {
    use mdlive_core::export::{default_output_path, ChromeEngine, Exporter, PdfOptions};

    let doc = Document::load(file)
        .with_context(|| format!("Failed to load document: {}", file.display()))?;
    let output = output.unwrap_or_else(|| default_output_path(doc.path()));

    let generator = HtmlGenerator::from_config(config);
    let exporter = Exporter::new(
        &generator,
        ChromeEngine::from(&config.export),
        PdfOptions::from(&config.export),
    );
    let bytes = exporter
        .export(&doc.text(), &output)
        .with_context(|| format!("Failed to export {}", doc.id))?;

    println!("Exported {} ({} bytes)", output.display(), bytes);
    Ok(())
}

fn render(config: &Config, file: &Path, output: Option<&Path>) -> Result<()> {
    let doc = Document::load(file)
        .with_context(|| format!("Failed to load document: {}", file.display()))?;
    let html = HtmlGenerator::from_config(config).generate(&doc.text())?;

    match output {
        Some(path) => std::fs::write(path, &html)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(html.as_bytes())?;
            lock.flush()?;
        }
    }

    Ok(())
}
