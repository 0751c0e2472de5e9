//! Collector configuration.

use std::path::PathBuf;

use benchrelay_core::protocol::RESULTS_ROOT;

/// Built-in secret used when none is configured. Matches the default
/// workers ship with, so a zero-config lab setup works out of the box;
/// the collector warns loudly at startup when it is in effect.
pub const DEFAULT_SECRET: &str = "password12345";

/// Default cap on uploaded result bundle size (512 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Collector configuration.
///
/// Constructed explicitly (from CLI arguments or by tests) and passed to
/// each component at construction; there is no ambient global state.
#[derive(Clone)]
pub struct Config {
    /// HTTP port to bind.
    pub port: u16,
    /// Shared secret workers must present. `None` means the built-in
    /// default is in effect.
    pub secret: Option<String>,
    /// Root directory result bundles are persisted under.
    pub storage_root: PathBuf,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// Emit JSON logs instead of pretty ones.
    pub json_logs: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("storage_root", &self.storage_root)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("json_logs", &self.json_logs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            secret: None,
            storage_root: PathBuf::from(RESULTS_ROOT),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            json_logs: false,
        }
    }
}

impl Config {
    /// Returns the effective shared secret: the configured one, or the
    /// built-in default.
    #[must_use]
    pub fn effective_secret(&self) -> &str {
        self.secret.as_deref().unwrap_or(DEFAULT_SECRET)
    }

    /// Returns true when the built-in default secret is in effect.
    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.secret.is_none()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage root is empty or the upload cap
    /// is zero.
    pub fn validate(&self) -> benchrelay_core::Result<()> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(benchrelay_core::Error::InvalidConfig(
                "storage root must not be empty".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(benchrelay_core::Error::InvalidConfig(
                "max upload size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
