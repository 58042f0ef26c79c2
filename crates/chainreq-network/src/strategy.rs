//! Strategy Selector
//!
//! Picks the backend for HTTP-shaped calls. Settings are read on every
//! selection, so toggling a flag takes effect on the next request.

use crate::backend::InterceptorAgent;
use chainreq_types::Settings;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Backend choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Intercepting extension
    Extension,
    /// Forwarding proxy
    Proxy,
    /// Direct outbound call
    Direct,
}

impl Strategy {
    /// Display name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extension => "extension",
            Self::Proxy => "proxy",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, mutable feature flags
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<Settings>>,
}

impl SettingsHandle {
    /// Handle over initial settings
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Current settings
    #[must_use]
    pub fn get(&self) -> Settings {
        *self.inner.read()
    }

    /// Replace the settings
    pub fn set(&self, settings: Settings) {
        *self.inner.write() = settings;
    }

    /// Change the settings in place
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.inner.write());
    }
}

/// Chooses among extension, proxy and direct
#[derive(Clone)]
pub struct StrategySelector {
    settings: SettingsHandle,
    extension: Arc<dyn InterceptorAgent>,
}

impl StrategySelector {
    /// Selector over shared settings and the extension agent
    #[must_use]
    pub fn new(settings: SettingsHandle, extension: Arc<dyn InterceptorAgent>) -> Self {
        Self {
            settings,
            extension,
        }
    }

    /// Shared settings
    #[must_use]
    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    /// Extension first when installed and enabled, then proxy when enabled,
    /// else direct
    #[must_use]
    pub fn select(&self) -> Strategy {
        let settings = self.settings.get();
        if settings.extensions_enabled && self.extension.is_installed() {
            Strategy::Extension
        } else if settings.proxy_enabled {
            Strategy::Proxy
        } else {
            Strategy::Direct
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::http::{HttpRequest, HttpResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Agent(AtomicBool);

    #[async_trait]
    impl InterceptorAgent for Agent {
        fn is_installed(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }

        async fn send_request(&self, _: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Extension("unused".into()))
        }

        fn cancel_request(&self) {}
    }

    fn selector(installed: bool, settings: Settings) -> StrategySelector {
        StrategySelector::new(
            SettingsHandle::new(settings),
            Arc::new(Agent(AtomicBool::new(installed))),
        )
    }

    #[test]
    fn extension_wins_over_proxy() {
        let s = selector(
            true,
            Settings {
                extensions_enabled: true,
                proxy_enabled: true,
            },
        );
        assert_eq!(s.select(), Strategy::Extension);
    }

    #[test]
    fn disabled_extension_falls_back_to_proxy() {
        let s = selector(
            true,
            Settings {
                extensions_enabled: false,
                proxy_enabled: true,
            },
        );
        assert_eq!(s.select(), Strategy::Proxy);
    }

    #[test]
    fn missing_extension_falls_back_to_direct() {
        let s = selector(false, Settings::default());
        assert_eq!(s.select(), Strategy::Direct);
    }

    #[test]
    fn toggling_takes_effect_on_next_select() {
        let s = selector(false, Settings::default());
        assert_eq!(s.select(), Strategy::Direct);
        s.settings().update(|st| st.proxy_enabled = true);
        assert_eq!(s.select(), Strategy::Proxy);
        s.settings().set(Settings {
            extensions_enabled: true,
            proxy_enabled: false,
        });
        assert_eq!(s.select(), Strategy::Direct);
    }
}
