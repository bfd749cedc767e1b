use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

/// Arguments to [`ApiModeConfig::configure`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApiOptions {
    pub use_mock_api: Option<bool>,
}

/// Whether facades dispatch to the mock or the remote backend.
///
/// Clones share the same flag, so every facade built from one handle sees a
/// change immediately, while separately constructed handles stay independent.
/// [`ApiModeConfig::configure`] is the only way the flag changes after startup.
#[derive(Debug, Clone)]
pub struct ApiModeConfig {
    default_use_mock: bool,
    use_mock: Arc<AtomicBool>,
}

impl ApiModeConfig {
    pub fn new(default_use_mock: bool) -> Self {
        Self {
            default_use_mock,
            use_mock: Arc::new(AtomicBool::new(default_use_mock)),
        }
    }

    pub fn use_mock(&self) -> bool {
        self.use_mock.load(Ordering::SeqCst)
    }

    /// The startup value the flag falls back to.
    pub fn default_use_mock(&self) -> bool {
        self.default_use_mock
    }

    /// Sets the flag (or restores the default when unspecified) and returns the effective value.
    pub fn configure(&self, options: ApiOptions) -> bool {
        let value = options.use_mock_api.unwrap_or(self.default_use_mock);
        let previous = self.use_mock.swap(value, Ordering::SeqCst);
        if previous != value {
            info!("API mode switched to {}", if value { "mock" } else { "remote" });
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_and_restore_default() {
        let mode = ApiModeConfig::new(true);
        assert!(!mode.configure(ApiOptions { use_mock_api: Some(false) }));
        assert!(!mode.use_mock());
        assert!(mode.configure(ApiOptions::default()));
        assert!(mode.use_mock());
    }

    #[test]
    fn test_clones_share_and_instances_do_not() {
        let a = ApiModeConfig::new(true);
        let shared = a.clone();
        let other = ApiModeConfig::new(true);

        a.configure(ApiOptions { use_mock_api: Some(false) });
        assert!(!shared.use_mock());
        assert!(other.use_mock());
    }
}
