//! Logging initialization.
//!
//! The client logs through `tracing`. The subscriber is installed once per
//! process; later calls are no-ops.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Mutex, Once};

use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Where log events go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    /// Plain text appended to a log file, info level by default.
    File(PathBuf),
    /// Warnings and errors on stderr, so they do not mix with results.
    Stderr,
    /// Bare registry for tests.
    Test,
}

static INIT_ONCE: Once = Once::new();

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize the logging facility.
///
/// `RUST_LOG` overrides the default filter of every profile.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::File(path) => {
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => {
                    let _ = tracing_subscriber::fmt()
                        .with_env_filter(filter("sqlcli=info"))
                        .with_ansi(false)
                        .with_writer(Mutex::new(file))
                        .try_init();
                }
                Err(e) => {
                    eprintln!("Could not open log file {}: {}", path.display(), e);
                    let _ = tracing_subscriber::fmt()
                        .with_env_filter(filter("sqlcli=warn"))
                        .with_writer(std::io::stderr)
                        .try_init();
                }
            }
        }
        Profile::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter("sqlcli=warn"))
                .with_writer(std::io::stderr)
                .try_init();
        }
        Profile::Test => {
            let _ = tracing_subscriber::registry().try_init();
        }
    });
}
