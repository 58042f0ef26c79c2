//! Live vs archival routing by block age

use chainreq_types::config::DEFAULT_RETENTION_WINDOW_BLOCKS;

/// Blocks a live node keeps before pruning state
pub const DEFAULT_RETENTION_WINDOW: u64 = DEFAULT_RETENTION_WINDOW_BLOCKS;

/// Connection a read is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Recent blocks
    Live,
    /// Blocks beyond the retention window
    Archival,
}

impl Route {
    /// Display name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Archival => "archival",
        }
    }
}

/// Pure router over a fixed retention window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRouter {
    retention_window: u64,
}

impl Default for BlockRouter {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_WINDOW)
    }
}

impl BlockRouter {
    /// Router with a retention window in blocks
    #[inline]
    #[must_use]
    pub fn new(retention_window: u64) -> Self {
        Self { retention_window }
    }

    /// Retention window in blocks
    #[inline]
    #[must_use]
    pub fn retention_window(&self) -> u64 {
        self.retention_window
    }

    /// Archival iff `target + window < observed`; the boundary stays live
    ///
    /// The sum saturates, so targets near `u64::MAX` always route live.
    #[inline]
    #[must_use]
    pub fn route(&self, target: u64, observed: u64) -> Route {
        if target.saturating_add(self.retention_window) < observed {
            Route::Archival
        } else {
            Route::Live
        }
    }
}

/// Source of the last observed block height
pub trait BlockHeightSource: Send + Sync {
    /// Last observed height
    fn last_block_height(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_epochs() {
        assert_eq!(DEFAULT_RETENTION_WINDOW, 172_800);
    }

    #[test]
    fn old_block_goes_archival() {
        let router = BlockRouter::default();
        assert_eq!(router.route(100, 100 + 4 * 12 * 3600 + 1), Route::Archival);
    }

    #[test]
    fn boundary_stays_live() {
        let router = BlockRouter::default();
        assert_eq!(router.route(100, 100 + 4 * 12 * 3600), Route::Live);
        assert_eq!(router.route(500, 100), Route::Live);
    }

    #[test]
    fn saturates_near_max() {
        let router = BlockRouter::new(10);
        assert_eq!(router.route(u64::MAX - 1, u64::MAX), Route::Live);
    }
}
