//! PDF export through a headless Chrome instance.
//!
//! The document is rendered to a standalone HTML page, loaded into a fresh
//! browser as a `data:` URL and printed with fixed page options. Every export
//! launches its own browser; it is torn down when the export returns, on
//! success and on error.

use anyhow::{anyhow, Context, Result};
use base64::Engine as _;
use headless_chrome::browser::tab::EventListener;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ExportConfig;
use crate::generator::HtmlGenerator;

/// Leading bytes of every PDF file
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// CSS pixels per inch, used for margin conversion
const PX_PER_INCH: f64 = 96.0;

/// Chrome lifecycle event fired once at most two connections stay open for 500ms
const NETWORK_ALMOST_IDLE: &str = "networkAlmostIdle";

/// Page layout passed to the browser's print-to-PDF call. Lengths in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub print_background: bool,
    pub display_header_footer: bool,
    pub header_template: String,
    pub footer_template: String,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl From<&ExportConfig> for PdfOptions {
    fn from(config: &ExportConfig) -> Self {
        let (paper_width, paper_height) = config.page_format.dimensions_in();
        Self {
            paper_width,
            paper_height,
            margin_top: f64::from(config.margin_top_px) / PX_PER_INCH,
            margin_bottom: f64::from(config.margin_bottom_px) / PX_PER_INCH,
            print_background: config.print_background,
            display_header_footer: config.display_header_footer,
            header_template: config.header_template.clone(),
            footer_template: config.footer_template.clone(),
        }
    }
}

impl PdfOptions {
    fn to_print_options(&self) -> PrintToPdfOptions {
        PrintToPdfOptions {
            display_header_footer: Some(self.display_header_footer),
            print_background: Some(self.print_background),
            paper_width: Some(self.paper_width),
            paper_height: Some(self.paper_height),
            margin_top: Some(self.margin_top),
            margin_bottom: Some(self.margin_bottom),
            header_template: Some(self.header_template.clone()),
            footer_template: Some(self.footer_template.clone()),
            ..Default::default()
        }
    }
}

/// Something that can turn a standalone HTML page into PDF bytes
pub trait PdfEngine {
    fn print(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>>;
}

/// Headless Chrome, launched once per `print` call
#[derive(Debug, Clone)]
pub struct ChromeEngine {
    pub sandbox: bool,
    pub chrome_path: Option<PathBuf>,
    pub network_idle_timeout: Duration,
}

impl Default for ChromeEngine {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl From<&ExportConfig> for ChromeEngine {
    fn from(config: &ExportConfig) -> Self {
        Self {
            sandbox: config.sandbox,
            chrome_path: config.chrome_path.clone(),
            network_idle_timeout: Duration::from_secs(config.network_idle_timeout_secs),
        }
    }
}

impl ChromeEngine {
    fn launch(&self) -> Result<Browser> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.sandbox)
            .path(self.chrome_path.clone())
            .idle_browser_timeout(self.network_idle_timeout + Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow!("Invalid browser launch options: {e}"))?;

        Browser::new(launch_options).context("Failed to launch headless browser")
    }
}

impl PdfEngine for ChromeEngine {
    fn print(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>> {
        let browser = self.launch()?;
        log::info!("Launched headless browser for PDF export");

        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_default_timeout(self.network_idle_timeout);

        let (idle_tx, idle_rx) = crossbeam_channel::bounded(1);
        // Lifecycle events from the tab's initial blank page are ignored
        let navigating = Arc::new(AtomicBool::new(false));
        let listening = Arc::clone(&navigating);
        let listener: Arc<dyn EventListener<Event> + Send + Sync> =
            Arc::new(move |event: &Event| {
                if let Event::PageLifecycleEvent(lifecycle) = event {
                    if listening.load(Ordering::SeqCst) && lifecycle.params.name == NETWORK_ALMOST_IDLE {
                        let _ = idle_tx.try_send(());
                    }
                }
            });
        let registered = tab
            .add_event_listener(listener)
            .context("Failed to subscribe to page lifecycle events")?;

        navigating.store(true, Ordering::SeqCst);
        tab.navigate_to(&html_data_url(html))
            .context("Failed to navigate to rendered document")?
            .wait_until_navigated()
            .context("Timed out loading rendered document")?;

        idle_rx
            .recv_timeout(self.network_idle_timeout)
            .map_err(|_| {
                anyhow!(
                    "Network did not become idle within {}s",
                    self.network_idle_timeout.as_secs()
                )
            })?;
        tab.remove_event_listener(&registered)
            .context("Failed to unsubscribe from page lifecycle events")?;

        let pdf = tab
            .print_to_pdf(Some(options.to_print_options()))
            .context("Browser failed to print PDF")?;
        log::debug!("Browser produced {} PDF bytes", pdf.len());

        Ok(pdf)
    }
}

/// `data:` URL carrying a whole HTML page
pub fn html_data_url(html: &str) -> String {
    format!(
        "data:text/html;charset=utf-8;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(html)
    )
}

/// `notes.md` exports to `notes.pdf` next to it
pub fn default_output_path(source: &Path) -> PathBuf {
    source.with_extension("pdf")
}

/// Markdown to PDF file
pub struct Exporter<'a, E: PdfEngine> {
    generator: &'a HtmlGenerator,
    engine: E,
    options: PdfOptions,
}

impl<'a, E: PdfEngine> Exporter<'a, E> {
    pub fn new(generator: &'a HtmlGenerator, engine: E, options: PdfOptions) -> Self {
        Self {
            generator,
            engine,
            options,
        }
    }

    /// Render `markdown`, print it and write the PDF to `output`.
    ///
    /// Returns the number of bytes written. An existing file is overwritten.
    pub fn export(&self, markdown: &str, output: &Path) -> Result<u64> {
        let html = self.generator.generate(markdown)?;
        let pdf = self.engine.print(&html, &self.options)?;

        if !pdf.starts_with(PDF_SIGNATURE) {
            anyhow::bail!("PDF engine returned {} bytes without a PDF signature", pdf.len());
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
        }
        fs::write(output, &pdf)
            .with_context(|| format!("Failed to write PDF: {}", output.display()))?;

        log::info!("Exported {} bytes to {}", pdf.len(), output.display());
        Ok(pdf.len() as u64)
    }
}
