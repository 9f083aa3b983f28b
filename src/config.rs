//! # Configuration Module
//!
//! Settings used when opening the engine through the Linux UIO framework.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `uio_name` | `String` | `"VEU"` | Name published by the UIO driver in `/sys/class/uio/uioN/name` |
//! | `sysfs_root` | `PathBuf` | `/sys/class/uio` | Where UIO devices are enumerated |
//! | `dev_root` | `PathBuf` | `/dev` | Where the `uioN` device nodes live |
//! | `hang_timeout` | `Option<Duration>` | `None` | Upper bound on the post-interrupt busy-poll |
//!
//! With `hang_timeout` left at `None` the driver trusts the hardware and polls
//! the busy bit until it clears, however long that takes.
//!
//! ## Examples
//!
//! ```rust
//! use std::time::Duration;
//! use shveu::config::VeuConfig;
//!
//! let config = VeuConfig::default()
//!     .with_uio_name("VEU3F")
//!     .with_hang_timeout(Duration::from_millis(500));
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{VeuError, VeuResult};

/// Configuration for locating and driving one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VeuConfig {
    /// UIO device name to match, compared after trimming whitespace.
    pub uio_name: String,

    /// Directory holding one `uioN` entry per registered UIO device.
    pub sysfs_root: PathBuf,

    /// Directory holding the `uioN` character devices.
    pub dev_root: PathBuf,

    /// Give up waiting for the busy bit after this long.
    ///
    /// The lock is still released when the limit trips.
    pub hang_timeout: Option<Duration>,
}

impl Default for VeuConfig {
    fn default() -> Self {
        Self {
            uio_name: "VEU".to_string(),
            sysfs_root: PathBuf::from("/sys/class/uio"),
            dev_root: PathBuf::from("/dev"),
            hang_timeout: None,
        }
    }
}

impl VeuConfig {
    pub fn with_uio_name(mut self, name: impl Into<String>) -> Self {
        self.uio_name = name.into();
        self
    }

    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    pub fn with_dev_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.dev_root = root.into();
        self
    }

    pub fn with_hang_timeout(mut self, timeout: Duration) -> Self {
        self.hang_timeout = Some(timeout);
        self
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> VeuResult<()> {
        if self.uio_name.trim().is_empty() {
            return Err(VeuError::config(
                "uio_name",
                self.uio_name.clone(),
                "must not be empty",
            ));
        }
        if self.hang_timeout == Some(Duration::ZERO) {
            return Err(VeuError::config(
                "hang_timeout",
                "0ms",
                "must be greater than zero when set",
            ));
        }
        Ok(())
    }
}
