//! Application configuration management.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Object storage configuration. Only storage commands need it.
    #[serde(default)]
    pub storage: Option<StorageSettings>,
    /// Outgoing email configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// Google service-account configuration.
    #[serde(default)]
    pub google: GoogleConfig,
}

/// S3-compatible object storage settings.
#[derive(Clone, Deserialize)]
pub struct StorageSettings {
    /// Endpoint, either `host[:port]` or a full `http(s)://` URL.
    pub endpoint: String,
    /// Bucket that receives uploads.
    pub bucket: String,
    /// Static access key.
    #[serde(default)]
    pub access_key: String,
    /// Static secret key.
    #[serde(default)]
    pub secret_key: String,
    /// Signing region. MinIO and most S3 clones accept any value.
    #[serde(default = "default_region")]
    pub region: String,
    /// Use TLS when the endpoint has no explicit scheme.
    #[serde(default = "default_secure")]
    pub secure: bool,
    /// Lifetime of presigned download URLs in seconds.
    #[serde(default = "default_presign_ttl")]
    pub presign_ttl_secs: u64,
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_key", &"[hidden]")
            .field("secret_key", &"[hidden]")
            .field("region", &self.region)
            .field("secure", &self.secure)
            .field("presign_ttl_secs", &self.presign_ttl_secs)
            .finish()
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_secure() -> bool {
    true
}

fn default_presign_ttl() -> u64 {
    3600 // 1 hour
}

/// SMTP configuration for transactional email.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP relay port.
    pub smtp_port: u16,
    /// SMTP username.
    pub smtp_username: String,
    /// SMTP password.
    pub smtp_password: String,
    /// Sender mailbox, e.g. `Uploads <noreply@example.com>`.
    pub from: String,
    /// Transport timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.mailgun.org".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from: "bucketgate <noreply@localhost>".to_string(),
            timeout_secs: 10,
        }
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[hidden]")
            .field("from", &self.from)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Google service-account configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleConfig {
    /// Path to the service-account JSON key file.
    pub credentials_path: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `BUCKETGATE__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BUCKETGATE").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// The `storage` section.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no storage endpoint and bucket are configured.
    pub fn storage(&self) -> Result<&StorageSettings, config::ConfigError> {
        self.storage
            .as_ref()
            .ok_or_else(|| config::ConfigError::NotFound("storage".to_string()))
    }
}
