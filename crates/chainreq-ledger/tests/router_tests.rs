//! Block router properties

use chainreq_ledger::{BlockRouter, Route, DEFAULT_RETENTION_WINDOW};
use proptest::prelude::*;

#[test]
fn fresh_and_future_blocks_stay_live() {
    let router = BlockRouter::default();
    assert_eq!(router.route(1_000, 1_000), Route::Live);
    assert_eq!(router.route(2_000, 1_000), Route::Live);
    assert_eq!(router.route(0, DEFAULT_RETENTION_WINDOW), Route::Live);
    assert_eq!(router.route(0, DEFAULT_RETENTION_WINDOW + 1), Route::Archival);
}

#[test]
fn window_is_configurable() {
    let router = BlockRouter::new(10);
    assert_eq!(router.route(5, 15), Route::Live);
    assert_eq!(router.route(5, 16), Route::Archival);
    assert_eq!(BlockRouter::new(0).route(5, 6), Route::Archival);
}

proptest! {
    #[test]
    fn archival_iff_older_than_window(
        target in 0u64..10_000_000,
        observed in 0u64..10_000_000,
        window in 0u64..1_000_000,
    ) {
        let route = BlockRouter::new(window).route(target, observed);
        prop_assert_eq!(route == Route::Archival, target + window < observed);
    }

    #[test]
    fn routing_is_monotonic_in_age(
        target in 0u64..10_000_000,
        observed in 0u64..10_000_000,
        later in 0u64..1_000,
    ) {
        let router = BlockRouter::default();
        if router.route(target, observed) == Route::Archival {
            prop_assert_eq!(router.route(target, observed + later), Route::Archival);
        }
        if router.route(target, observed) == Route::Live {
            prop_assert_eq!(router.route(target + later, observed), Route::Live);
        }
    }

    #[test]
    fn never_overflows(target in any::<u64>(), observed in any::<u64>(), window in any::<u64>()) {
        let _ = BlockRouter::new(window).route(target, observed);
    }
}
