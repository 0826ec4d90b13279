//! Application configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/meetsched/config.toml` by default:
//!
//! ```toml
//! [google]
//! client_id = "xxx.apps.googleusercontent.com"
//! client_secret = "pass::google/meetsched"
//! redirect_uri = "http://localhost:3000/auth/google"
//! calendar_id = "primary"
//! timeout_secs = 30
//!
//! [server]
//! bind = "127.0.0.1:3000"
//!
//! [consent]
//! delivery = "browser"
//! ```
//!
//! `client_id`, `client_secret` and `redirect_uri` support secret references
//! (see [`crate::secret`]). Command-line flags and `GOOGLE_*` environment
//! variables override the file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use meetsched_providers::ConsentMode;
use meetsched_providers::google::{GoogleConfig, GoogleEndpoints, OAuthConfig};
use meetsched_server::{ServerConfig, default_bind_addr};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::GoogleArgs;
use crate::error::{CliError, CliResult};
use crate::secret;

/// Configuration for meetsched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Google OAuth and API settings.
    pub google: GoogleSettings,

    /// HTTP server settings.
    pub server: ServerSettings,

    /// Consent URL delivery.
    pub consent: ConsentSettings,
}

impl AppConfig {
    /// Loads configuration from `path`, or from the default path if it exists.
    ///
    /// An explicitly given file must exist; a missing default file yields
    /// the defaults.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!(path = %path.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| CliError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns the file `load` reads: the explicit path, else the default.
    pub fn resolve_path(path: Option<&Path>) -> PathBuf {
        path.map_or_else(Self::default_path, Path::to_path_buf)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meetsched")
            .join("config.toml")
    }
}

/// `[google]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// Redirect URI registered for the client.
    pub redirect_uri: Option<String>,

    /// Google Cloud Console credentials JSON, used for whatever the
    /// fields above leave unset.
    pub credentials_file: Option<PathBuf>,

    /// Calendar meetings are created in.
    pub calendar_id: String,

    /// Timeout for each remote call, in seconds.
    pub timeout_secs: u64,

    /// Serve every Google endpoint from this base URL instead.
    pub api_base: Option<String>,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            credentials_file: None,
            calendar_id: "primary".to_string(),
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
            api_base: None,
        }
    }
}

impl GoogleSettings {
    /// Applies command-line and environment overrides.
    pub fn apply_overrides(&mut self, args: &GoogleArgs) {
        if let Some(ref id) = args.client_id {
            self.client_id = Some(id.clone());
        }
        if let Some(ref secret) = args.client_secret {
            self.client_secret = Some(secret.clone());
        }
        if let Some(ref redirect) = args.redirect_uri {
            self.redirect_uri = Some(redirect.clone());
        }
        if let Some(ref file) = args.credentials_file {
            self.credentials_file = Some(file.clone());
        }
    }

    /// Resolves secrets and builds the provider configuration.
    ///
    /// Fails with a configuration error naming every missing value.
    pub fn to_provider_config(&self) -> CliResult<GoogleConfig> {
        let oauth = self.resolve_oauth()?;

        let mut config = GoogleConfig::new(oauth)
            .with_calendar_id(self.calendar_id.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(ref base) = self.api_base {
            config = config.with_endpoints(GoogleEndpoints::with_base(base));
        }

        config.validate()?;
        Ok(config)
    }

    fn resolve_oauth(&self) -> CliResult<OAuthConfig> {
        let client_id = resolve_field("client_id", self.client_id.as_deref())?;
        let client_secret = resolve_field("client_secret", self.client_secret.as_deref())?;
        let redirect_uri = resolve_field("redirect_uri", self.redirect_uri.as_deref())?;

        if let Some(ref path) = self.credentials_file
            && (client_id.is_none() || client_secret.is_none())
        {
            let mut oauth = OAuthConfig::from_file(path, redirect_uri)?;
            if let Some(id) = client_id {
                oauth.client_id = id;
            }
            if let Some(secret) = client_secret {
                oauth.client_secret = secret;
            }
            oauth.validate()?;
            return Ok(oauth);
        }

        Ok(OAuthConfig::from_parts(client_id, client_secret, redirect_uri)?)
    }
}

fn resolve_field(field: &'static str, value: Option<&str>) -> CliResult<Option<String>> {
    secret::resolve_opt(value).map_err(|message| CliError::Secret { field, message })
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the HTTP server listens on.
    pub bind: SocketAddr,

    /// Seconds in-flight requests get after shutdown was requested.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind_addr(),
            shutdown_grace_secs: 10,
        }
    }
}

impl ServerSettings {
    /// Builds the server configuration, with an optional bind override.
    pub fn to_server_config(&self, bind: Option<SocketAddr>) -> ServerConfig {
        ServerConfig::new(bind.unwrap_or(self.bind))
            .with_shutdown_grace(Duration::from_secs(self.shutdown_grace_secs))
    }
}

/// `[consent]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentSettings {
    /// How the consent URL reaches the organizer.
    pub delivery: ConsentMode,
}
