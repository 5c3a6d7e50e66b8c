//! Configuration for complib
//!
//! Settings live in `~/.complib/config.toml` (home overridable with
//! `COMPLIB_HOME`). A missing file means defaults: the in-memory backend.
//!
//! ```toml
//! [backend]
//! kind = "supabase"
//! url = "https://abc.supabase.co"
//! api_key = "..."
//! bucket = "component-images"
//! table = "components"
//! request_timeout_secs = 15
//! ```
//!
//! The memory backend accepts `otp_code = "123456"` to replace its fixed
//! sign-in code.

use complib_gateway::timed::DEFAULT_REQUEST_TIMEOUT;
use complib_gateway::{BackendGateway, HttpGateway, HttpGatewayConfig, MemoryGateway, TimedGateway};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub use complib_logging::{complib_home, logs_dir};

use super::error::HelpfulError;

pub const DEFAULT_BUCKET: &str = "component-images";
pub const DEFAULT_TABLE: &str = "components";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Supabase,
    #[default]
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Supabase => "supabase",
            BackendKind::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub kind: BackendKind,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub bucket: String,
    pub table: String,
    pub request_timeout_secs: u64,
    /// Sign-in code accepted by the memory backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_code: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            url: None,
            api_key: None,
            bucket: DEFAULT_BUCKET.to_string(),
            table: DEFAULT_TABLE.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            otp_code: None,
        }
    }
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Fold in values given on the command line or environment.
    ///
    /// A backend URL from outside the file selects the supabase backend.
    pub fn apply_overrides(&mut self, url: Option<String>, api_key: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.kind = BackendKind::Supabase;
            self.url = Some(url);
        }
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    fn http_config(&self) -> Result<HttpGatewayConfig, HelpfulError> {
        let url = self
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| HelpfulError::backend_incomplete("url"))?;
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| HelpfulError::backend_incomplete("api_key"))?;
        Ok(HttpGatewayConfig {
            url,
            api_key,
            bucket: self.bucket.clone(),
            table: self.table.clone(),
        })
    }

    /// Build the configured gateway, wrapped so every call has a deadline.
    pub fn build_gateway(&self) -> anyhow::Result<Arc<dyn BackendGateway>> {
        let inner: Arc<dyn BackendGateway> = match self.kind {
            BackendKind::Memory => {
                info!("using in-memory backend");
                let gateway = match &self.otp_code {
                    Some(code) => MemoryGateway::new().with_otp_code(code.trim()),
                    None => MemoryGateway::new(),
                };
                Arc::new(gateway)
            }
            BackendKind::Supabase => {
                let config = self.http_config()?;
                info!(url = %config.url, table = %config.table, "using supabase backend");
                Arc::new(HttpGateway::new(config)?)
            }
        };
        Ok(Arc::new(TimedGateway::new(inner, self.request_timeout())))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendSettings,
}

pub fn config_path() -> PathBuf {
    complib_home().join("config.toml")
}

/// Load settings from `path`, or defaults when the file does not exist.
pub fn load_from(path: &Path) -> Result<AppConfig, HelpfulError> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| HelpfulError::config_unreadable(path, e))?;
    toml::from_str(&content).map_err(|e| HelpfulError::config_invalid(path, e))
}

pub fn load() -> Result<AppConfig, HelpfulError> {
    load_from(&config_path())
}

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved settings in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run the config command - shows resolved paths and backend settings
pub fn run(args: ConfigArgs, settings: &BackendSettings) -> anyhow::Result<()> {
    let home = complib_home();
    let config_file = config_path();
    let logs = logs_dir();
    let api_key = if settings.api_key.is_some() { "set" } else { "not set" };

    if args.json {
        let config = serde_json::json!({
            "home": home.to_string_lossy(),
            "config_file": {
                "path": config_file.to_string_lossy(),
                "exists": config_file.exists(),
            },
            "logs": logs.to_string_lossy(),
            "backend": {
                "kind": settings.kind.as_str(),
                "url": settings.url,
                "api_key": api_key,
                "bucket": settings.bucket,
                "table": settings.table,
                "request_timeout_secs": settings.request_timeout().as_secs(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("COMPLIB CONFIGURATION");
        println!("=====================");
        println!();
        println!("Home:     {}", home.display());
        println!(
            "Config:   {} ({})",
            config_file.display(),
            if config_file.exists() { "exists" } else { "not found, using defaults" }
        );
        println!("Logs:     {}", logs.display());
        println!();
        println!("Backend:  {}", settings.kind.as_str());
        if let Some(url) = &settings.url {
            println!("  URL:     {}", url);
        }
        println!("  API key: {}", api_key);
        println!("  Bucket:  {}", settings.bucket);
        println!("  Table:   {}", settings.table);
        println!("  Timeout: {}s", settings.request_timeout().as_secs());
    }

    Ok(())
}
