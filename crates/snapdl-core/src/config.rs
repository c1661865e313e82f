use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Resolver endpoints and the marker that identifies a genuine media link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Landing page that carries the session token.
    pub base_url: String,
    /// Path of the submit endpoint, appended to `base_url`.
    pub submit_path: String,
    /// Substring a decoded link must contain to be accepted.
    pub link_marker: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "https://snaptik.app".to_string(),
            submit_path: "/abc2.php".to_string(),
            link_marker: "snaptik".to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn submit_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.submit_path.trim_start_matches('/')
        )
    }
}

/// Settings shared by every HTTP request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Connect timeout, and how long a transfer may stall before it fails.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 ",
                "(KHTML, like Gecko) Chrome/124.0 Safari/537.36"
            )
            .to_string(),
        }
    }
}

/// Where and how downloaded media is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Output directory, relative to the working directory unless absolute.
    pub output_dir: PathBuf,
    pub filename_prefix: String,
    pub file_extension: String,
    /// Write granularity in bytes; one progress update per chunk.
    pub chunk_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("Tiktok Videos"),
            filename_prefix: "Snaptik.app_".to_string(),
            file_extension: ".mp4".to_string(),
            chunk_size: 1024,
        }
    }
}

/// Global configuration loaded from `~/.config/snapdl/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    pub resolver: ResolverConfig,
    pub transport: TransportConfig,
    pub download: DownloadConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("snapdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SnapConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SnapConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: SnapConfig = toml::from_str(&data)?;
    Ok(cfg)
}
