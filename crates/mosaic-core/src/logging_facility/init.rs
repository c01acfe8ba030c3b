//! Logging initialization

use mosaic_core_types::PassId;
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, `mosaic=debug`
    Development,
    /// JSON output, `mosaic=info`
    Production,
    /// Installs nothing; tests install the capture layer instead
    Test,
}

impl Profile {
    fn default_filter(&self) -> &'static str {
        match self {
            Profile::Development => "mosaic=debug",
            Profile::Production => "mosaic=info",
            Profile::Test => "off",
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Install the global subscriber for `profile`.
///
/// Only the first call has any effect. `RUST_LOG` overrides the profile's
/// default filter.
///
/// ```
/// use mosaic_core::logging_facility::{init, Profile};
///
/// init(Profile::Production);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(profile.default_filter()));
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .finish()
                .try_init(),
            Profile::Test => return,
        };
        // A subscriber installed by the host application wins.
        if installed.is_err() {
            tracing::debug!(profile = ?profile, "global subscriber already set");
        }
    });
}

/// Span correlating every event emitted during one resolution pass.
pub fn pass_span(pass_id: &PassId) -> tracing::Span {
    tracing::info_span!("resolve_pass", pass_id = %pass_id)
}
