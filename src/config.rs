use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::AppError;
use crate::operator::OperatorConfig;

pub const DEFAULT_PER_PAGE: u32 = 5;
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;

pub fn project_dirs() -> anyhow::Result<ProjectDirs> {
    ProjectDirs::from("", "submissions-admin", "submissions-admin")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

pub fn db_path() -> anyhow::Result<PathBuf> {
    let dirs = project_dirs()?;
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;
    Ok(data_dir.join("submissions.db"))
}

pub fn settings_path() -> anyhow::Result<PathBuf> {
    let dirs = project_dirs()?;
    Ok(dirs.config_dir().join("settings.toml"))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub bind: SocketAddr,
    pub database_path: Option<PathBuf>,
    pub default_per_page: u32,
    /// When unset a secret is generated on first use and kept in the database.
    pub token_secret: Option<String>,
    pub token_lifetime_secs: u64,
    pub operators: Vec<OperatorConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_path: None,
            default_per_page: DEFAULT_PER_PAGE,
            token_secret: None,
            token_lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
            operators: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let settings = Self::parse(&raw)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let settings: Self = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        if !(1..=crate::listing::MAX_PER_PAGE).contains(&self.default_per_page) {
            return Err(AppError::Config(format!(
                "default_per_page must be between 1 and {}",
                crate::listing::MAX_PER_PAGE
            )));
        }
        if self.token_lifetime_secs < 2 {
            return Err(AppError::Config(
                "token_lifetime_secs must be at least 2".into(),
            ));
        }
        let mut keys: Vec<&str> = self.operators.iter().map(|o| o.key.as_str()).collect();
        keys.sort_unstable();
        if keys.windows(2).any(|w| w[0] == w[1]) {
            return Err(AppError::Config("operator keys must be unique".into()));
        }
        if self.operators.iter().any(|o| o.key.is_empty()) {
            return Err(AppError::Config("operator keys must not be empty".into()));
        }
        // The key doubles as the session cookie value
        if let Some(o) = self
            .operators
            .iter()
            .find(|o| !o.key.bytes().all(is_cookie_octet))
        {
            return Err(AppError::Config(format!(
                "key for operator '{}' may only use printable ASCII without spaces, quotes, commas, semicolons or backslashes",
                o.name
            )));
        }
        Ok(())
    }

    pub fn resolve_db_path(&self) -> anyhow::Result<PathBuf> {
        match &self.database_path {
            Some(path) => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent)?;
                }
                Ok(path.clone())
            }
            None => db_path(),
        }
    }
}

/// Bytes allowed in a cookie value (RFC 6265 `cookie-octet`).
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}
