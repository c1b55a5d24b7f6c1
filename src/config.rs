// Configuration for the edge gateway
//
// Configuration is loaded in order of precedence:
// 1. Environment variables (highest priority)
// 2. Config file (~/.config/studio-edge/config.toml)
// 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Deployment environment
///
/// `Preview` deployments must never touch the legacy origin and must never be
/// indexed, so the forwarding shims answer 404 there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Preview,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Preview,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Preview => "preview",
        }
    }

    /// Whether legacy-origin forwarding is active in this environment
    pub fn forwarding_enabled(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Object storage settings for the upload broker
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// GCS bucket that receives questionnaire uploads (empty = broker disabled)
    pub bucket: String,

    /// Key prefix under which uploads are filed
    pub namespace: String,

    /// Lifetime of a presigned upload URL, in seconds
    pub signed_url_ttl_secs: u64,
}

impl StorageConfig {
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            namespace: "questionnaire".to_string(),
            signed_url_ttl_secs: 900,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the gateway to
    pub bind_addr: SocketAddr,

    /// Public-facing site URL; redirects and bodies are rewritten to this
    pub public_url: String,

    /// Legacy origin base URL that shim routes forward to
    pub origin_url: String,

    /// Additional hostnames recognized as "the legacy system" in redirects
    pub legacy_hosts: Vec<String>,

    /// Rewrite origin hostnames inside proxied response bodies (best effort)
    pub rewrite_body: bool,

    /// Deployment environment (production | preview)
    pub environment: Environment,

    /// URL of the external send-email submission endpoint
    pub submission_url: String,

    /// Object storage settings
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Storage settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
struct FileStorage {
    bucket: Option<String>,
    namespace: Option<String>,
    signed_url_ttl_secs: Option<u64>,
}

/// Logging settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
struct FileLogging {
    level: Option<String>,
}

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    bind_addr: Option<String>,
    public_url: Option<String>,
    origin_url: Option<String>,
    legacy_hosts: Option<Vec<String>>,
    rewrite_body: Option<bool>,
    environment: Option<String>,
    submission_url: Option<String>,

    /// Optional [storage] section
    storage: Option<FileStorage>,

    /// Optional [logging] section
    logging: Option<FileLogging>,
}

impl Config {
    /// Get the config file path: ~/.config/studio-edge/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("studio-edge").join("config.toml"))
    }

    /// Create config template if it doesn't exist
    /// Called during startup to help operators discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        let template = r#"# studio-edge configuration
# Uncomment and modify options as needed

# Gateway bind address (default: 127.0.0.1:8080)
# bind_addr = "127.0.0.1:8080"

# Public site URL; legacy redirects and bodies are rewritten to it
# public_url = "https://www.example.com"

# Legacy origin that shim routes forward to
# origin_url = "https://legacy.example.com"

# Extra hostnames recognized as the legacy system in Location headers
# legacy_hosts = []

# Rewrite origin hostnames inside proxied response bodies (best effort)
# rewrite_body = true

# Deployment environment: production | preview
# Preview disables origin forwarding entirely
# environment = "preview"

# External endpoint the questionnaire submission is relayed to
# submission_url = "https://www.example.com/api/questionnaire/send-email/"

# Upload broker storage
# [storage]
# bucket = ""                  # GCS bucket (empty = broker answers 500)
# namespace = "questionnaire"  # Object key prefix
# signed_url_ttl_secs = 900    # Presigned URL lifetime

# Logging configuration
# [logging]
# level = "info"  # trace, debug, info, warn, error (RUST_LOG env var overrides this)
"#;

        // Write template (ignore errors - config is optional)
        let _ = std::fs::write(&path, template);
    }

    /// Load file config if it exists
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                FileConfig::default()
            }),
            Err(_) => FileConfig::default(), // File doesn't exist, use defaults
        }
    }

    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        let legacy_hosts = self
            .legacy_hosts
            .iter()
            .map(|h| format!("{:?}", h))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"# studio-edge configuration

# Gateway bind address
bind_addr = "{bind}"

# Public site URL; legacy redirects and bodies are rewritten to it
public_url = "{public}"

# Legacy origin that shim routes forward to
origin_url = "{origin}"

# Extra hostnames recognized as the legacy system in Location headers
legacy_hosts = [{legacy_hosts}]

# Rewrite origin hostnames inside proxied response bodies (best effort)
rewrite_body = {rewrite}

# Deployment environment: production | preview
environment = "{env}"

# External endpoint the questionnaire submission is relayed to
submission_url = "{submission}"

# Upload broker storage
[storage]
bucket = "{bucket}"
namespace = "{namespace}"
signed_url_ttl_secs = {ttl}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
"#,
            bind = self.bind_addr,
            public = self.public_url,
            origin = self.origin_url,
            legacy_hosts = legacy_hosts,
            rewrite = self.rewrite_body,
            env = self.environment.as_str(),
            submission = self.submission_url,
            bucket = self.storage.bucket,
            namespace = self.storage.namespace,
            ttl = self.storage.signed_url_ttl_secs,
            log_level = self.logging.level,
        )
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config path",
            ));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml())
    }

    /// Load configuration: file -> env vars -> defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();

        // Bind address: env > file > default
        let bind_addr = std::env::var("STUDIO_EDGE_BIND")
            .ok()
            .or(file.bind_addr)
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid bind address");

        // Public site URL: env > file > default
        let public_url = std::env::var("STUDIO_EDGE_PUBLIC_URL")
            .ok()
            .or(file.public_url)
            .unwrap_or_else(|| "https://www.example.com".to_string());

        // Legacy origin URL: env > file > default
        let origin_url = std::env::var("STUDIO_EDGE_ORIGIN_URL")
            .ok()
            .or(file.origin_url)
            .unwrap_or_else(|| "https://legacy.example.com".to_string());

        // Extra legacy hostnames: env (comma-separated) > file > none
        let legacy_hosts = std::env::var("STUDIO_EDGE_LEGACY_HOSTS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .or(file.legacy_hosts)
            .unwrap_or_default();

        // Body rewriting: env > file > default (on)
        let rewrite_body = std::env::var("STUDIO_EDGE_REWRITE_BODY")
            .ok()
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .or(file.rewrite_body)
            .unwrap_or(true);

        // Environment: env > file > default (preview is the safe default)
        let environment = std::env::var("STUDIO_EDGE_ENV")
            .ok()
            .or(file.environment)
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Preview);

        // Submission endpoint: env > file > default
        let submission_url = std::env::var("STUDIO_EDGE_SUBMISSION_URL")
            .ok()
            .or(file.submission_url)
            .unwrap_or_else(|| {
                "https://www.example.com/api/questionnaire/send-email/".to_string()
            });

        // Storage: env > file > default
        let file_storage = file.storage.unwrap_or_default();
        let storage = StorageConfig {
            bucket: std::env::var("STUDIO_EDGE_BUCKET")
                .ok()
                .or(file_storage.bucket)
                .unwrap_or_default(),
            namespace: file_storage
                .namespace
                .unwrap_or_else(|| "questionnaire".to_string()),
            signed_url_ttl_secs: file_storage.signed_url_ttl_secs.unwrap_or(900),
        };

        // Logging settings: file config only (RUST_LOG env var handled in main.rs)
        let file_logging = file.logging.unwrap_or_default();
        let logging = LoggingConfig {
            level: file_logging.level.unwrap_or_else(|| "info".to_string()),
        };

        Self {
            bind_addr,
            public_url,
            origin_url,
            legacy_hosts,
            rewrite_body,
            environment,
            submission_url,
            storage,
            logging,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            public_url: "https://www.example.com".to_string(),
            origin_url: "https://legacy.example.com".to_string(),
            legacy_hosts: Vec::new(),
            rewrite_body: true,
            environment: Environment::Preview,
            submission_url: "https://www.example.com/api/questionnaire/send-email/".to_string(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
