//! Configuration management for mdlive

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::render::RenderOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderOptions,
    pub assets: AssetConfig,
    pub preview: PreviewConfig,
    pub export: ExportConfig,
}

/// External stylesheets and scripts referenced by the document shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub title: String,
    pub markdown_css: String,
    pub highlight_css: String,
    pub mermaid_js: String,
    pub markmap_js: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// Local HTTP page with live reload
    Http,
    /// HTML file rewritten on every refresh
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub debounce_ms: u64,
    pub surface: SurfaceKind,
    pub bind: String,
    pub port: u16,
    pub open_browser: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageFormat {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl PageFormat {
    /// Paper size in inches as (width, height)
    pub fn dimensions_in(self) -> (f64, f64) {
        match self {
            PageFormat::A3 => (11.69, 16.54),
            PageFormat::A4 => (8.27, 11.69),
            PageFormat::A5 => (5.83, 8.27),
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::Legal => (8.5, 14.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub page_format: PageFormat,
    pub margin_top_px: u32,
    pub margin_bottom_px: u32,
    pub print_background: bool,
    pub display_header_footer: bool,
    pub header_template: String,
    pub footer_template: String,
    pub network_idle_timeout_secs: u64,
    pub sandbox: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            title: "Markdown Preview".to_string(),
            markdown_css: "https://unpkg.com/github-markdown-css/github-markdown.css".to_string(),
            highlight_css: "https://unpkg.com/@highlightjs/cdn-assets/styles/1c-light.min.css"
                .to_string(),
            mermaid_js: "https://unpkg.com/mermaid/dist/mermaid.min.js".to_string(),
            markmap_js: "https://unpkg.com/markmap-autoloader/dist/index.js".to_string(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            surface: SurfaceKind::Http,
            bind: "127.0.0.1".to_string(),
            port: 0,
            open_browser: true,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_format: PageFormat::A4,
            margin_top_px: 40,
            margin_bottom_px: 100,
            print_background: true,
            display_header_footer: false,
            header_template: "<p></p>".to_string(),
            footer_template: "<p></p>".to_string(),
            network_idle_timeout_secs: 30,
            sandbox: false,
            chrome_path: None,
        }
    }
}

impl Config {
    /// Get the platform-specific config file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mdlive")
            .map(|proj_dirs| proj_dirs.config_dir().join("mdlive.toml"))
    }

    /// Load configuration from the platform config file, falling back to defaults if missing
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        // Asset URLs from the config are injected into every rendered page
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat config file: {}", path.display()))?;
            if metadata.permissions().mode() & 0o002 != 0 {
                anyhow::bail!(
                    "Config file {} is world-writable (insecure permissions)",
                    path.display()
                );
            }
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.preview.debounce_ms, 500);
        assert_eq!(config.preview.surface, SurfaceKind::Http);
        assert_eq!(config.preview.port, 0);
        assert!(config.render.html);
        assert!(config.render.linkify);
        assert!(config.render.typographer);
        assert_eq!(config.assets.title, "Markdown Preview");
    }

    #[test]
    fn export_defaults_match_print_layout() {
        let export = ExportConfig::default();
        assert_eq!(export.page_format, PageFormat::A4);
        assert_eq!(export.margin_top_px, 40);
        assert_eq!(export.margin_bottom_px, 100);
        assert!(export.print_background);
        assert!(!export.display_header_footer);
        assert_eq!(export.header_template, "<p></p>");
        assert!(!export.sandbox);
        assert!(export.chrome_path.is_none());
    }

    #[test]
    fn test_page_format_dimensions() {
        assert_eq!(PageFormat::A4.dimensions_in(), (8.27, 11.69));
        assert_eq!(PageFormat::Letter.dimensions_in(), (8.5, 11.0));
    }

    #[test]
    fn test_load_valid_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        let toml_content = "[render]\n\
emoji = false\n\
\n\
[preview]\n\
debounce_ms = 250\n\
surface = \"File\"\n\
port = 8123\n\
open_browser = false\n\
\n\
[export]\n\
page_format = \"Letter\"\n\
margin_top_px = 20\n\
chrome_path = \"/usr/bin/chromium\"\n";
        file.write_all(toml_content.as_bytes())?;

        let config = Config::load_from(file.path())?;
        assert!(!config.render.emoji);
        assert!(config.render.highlight);
        assert_eq!(config.preview.debounce_ms, 250);
        assert_eq!(config.preview.surface, SurfaceKind::File);
        assert_eq!(config.preview.port, 8123);
        assert!(!config.preview.open_browser);
        assert_eq!(config.export.page_format, PageFormat::Letter);
        assert_eq!(config.export.margin_top_px, 20);
        assert_eq!(config.export.margin_bottom_px, 100);
        assert_eq!(
            config.export.chrome_path.as_deref(),
            Some(Path::new("/usr/bin/chromium"))
        );

        Ok(())
    }

    #[test]
    fn test_load_partial_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"[assets]\ntitle = \"Notes\"\n")?;

        let config = Config::load_from(file.path())?;
        assert_eq!(config.assets.title, "Notes");
        assert_eq!(config.assets, AssetConfig {
            title: "Notes".to_string(),
            ..AssetConfig::default()
        });
        assert_eq!(config.preview.debounce_ms, 500);

        Ok(())
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"invalid toml [[[syntax").unwrap();

        let result = Config::load_from(file.path());
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn world_writable_config_is_rejected() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new()?;
        file.write_all(b"[preview]\nport = 1\n")?;
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o666))?;

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("world-writable"));

        Ok(())
    }

    #[test]
    fn test_config_path_returns_some() {
        let path = Config::config_path();
        assert!(path.is_some());
        if let Some(p) = path {
            assert!(p.to_string_lossy().contains("mdlive"));
            assert!(p.to_string_lossy().ends_with("mdlive.toml"));
        }
    }

    #[test]
    fn test_surface_kind_serialization() -> Result<()> {
        let mut config = Config::default();
        config.preview.surface = SurfaceKind::File;

        let toml_str = toml::to_string(&config)?;
        assert!(toml_str.contains("File"));

        let parsed: Config = toml::from_str(&toml_str)?;
        assert_eq!(parsed.preview.surface, SurfaceKind::File);

        Ok(())
    }
}
