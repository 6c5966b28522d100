//! Reconciliation: decide what to do with a tile given its local and
//! remote state.
//!
//! | remote  | local   | outcome                                          |
//! |---------|---------|--------------------------------------------------|
//! | absent  | absent  | skip                                             |
//! | absent  | present | skip, ambiguous origin                           |
//! | present | absent  | download                                         |
//! | present | present | download if remote newer or sizes differ         |
//! |         |         | otherwise copy (if requested) or skip            |
//!
//! [`decide`] is a pure function: no I/O, no clock, no hidden state.

use crate::probe::LocalState;
use crate::remote::RemoteState;

/// What a worker should do with a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Fetch the remote tile into the output directory.
    Download,
    /// Copy the up-to-date local tile into the output directory.
    Copy,
    /// Copy requested but mirror and output are the same directory;
    /// nothing to move, counts as a successful copy.
    CopyInPlace,
    /// Nothing to do.
    Skip,
}

/// Why a tile ended up where it did, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// Present locally but not at the source.
    AmbiguousOrigin,
    /// Neither side has the tile.
    NotFound,
    /// Local copy matches the remote.
    UpToDate,
}

/// Copy behaviour for up-to-date tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyPolicy {
    /// Copy up-to-date tiles from the mirror to the output directory.
    pub requested: bool,
    /// Mirror and output directory are the same.
    pub in_place: bool,
}

/// Outcome of reconciling one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub local_existed: bool,
    pub diagnostic: Option<Diagnostic>,
}

impl Decision {
    pub fn download(&self) -> bool {
        self.action == Action::Download
    }

    /// Whether a copy was called for, physical or not.
    pub fn copy(&self) -> bool {
        matches!(self.action, Action::Copy | Action::CopyInPlace)
    }
}

/// Whether the remote tile should replace the local one.
///
/// Modification times compare strictly: equal timestamps keep the local
/// tile, and a remote without `Last-Modified` is never considered newer.
/// A size mismatch wins regardless of timestamps, but only when the remote
/// reported a size.
pub fn is_stale(local: &LocalState, remote: &RemoteState) -> bool {
    let newer = match (remote.modified_at, local.modified_at) {
        (Some(remote_at), Some(local_at)) => remote_at > local_at,
        (Some(_), None) => true,
        (None, _) => false,
    };
    let resized = remote.size.is_some() && remote.size != local.size;
    newer || resized
}

/// Decide the action for a tile.
pub fn decide(local: &LocalState, remote: &RemoteState, copy: CopyPolicy) -> Decision {
    let local_existed = local.exists;

    if !remote.exists {
        let diagnostic = if local.exists {
            Diagnostic::AmbiguousOrigin
        } else {
            Diagnostic::NotFound
        };
        return Decision {
            action: Action::Skip,
            local_existed,
            diagnostic: Some(diagnostic),
        };
    }

    if !local.exists || is_stale(local, remote) {
        return Decision {
            action: Action::Download,
            local_existed,
            diagnostic: None,
        };
    }

    let action = match (copy.requested, copy.in_place) {
        (false, _) => Action::Skip,
        (true, true) => Action::CopyInPlace,
        (true, false) => Action::Copy,
    };
    Decision {
        action,
        local_existed,
        diagnostic: Some(Diagnostic::UpToDate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 3, 1, 12, 0, 0).unwrap()
    }

    fn local(size: u64, at: DateTime<Utc>) -> LocalState {
        LocalState::present(size, at)
    }

    fn remote(size: u64, at: DateTime<Utc>) -> RemoteState {
        RemoteState::present(Some(at), Some(size))
    }

    const NO_COPY: CopyPolicy = CopyPolicy {
        requested: false,
        in_place: false,
    };

    #[test]
    fn test_local_absent_remote_present_downloads() {
        let d = decide(&LocalState::absent(), &remote(100, t()), NO_COPY);
        assert!(d.download());
        assert!(!d.local_existed);
    }

    #[test]
    fn test_same_size_same_time_skips() {
        let d = decide(&local(100, t()), &remote(100, t()), NO_COPY);
        assert_eq!(d.action, Action::Skip);
        assert_eq!(d.diagnostic, Some(Diagnostic::UpToDate));
        assert!(d.local_existed);
    }

    #[test]
    fn test_newer_remote_downloads() {
        let d = decide(
            &local(100, t()),
            &remote(100, t() + Duration::seconds(1)),
            NO_COPY,
        );
        assert!(d.download());
    }

    #[test]
    fn test_older_remote_skips() {
        let d = decide(
            &local(100, t()),
            &remote(100, t() - Duration::seconds(1)),
            NO_COPY,
        );
        assert!(!d.download());
    }

    #[test]
    fn test_size_mismatch_overrides_timestamps() {
        let d = decide(&local(50, t()), &remote(100, t()), NO_COPY);
        assert!(d.download());

        let d = decide(
            &local(50, t()),
            &remote(100, t() - Duration::days(30)),
            NO_COPY,
        );
        assert!(d.download());
    }

    #[test]
    fn test_unknown_remote_size_is_ignored() {
        let d = decide(
            &local(50, t()),
            &RemoteState::present(Some(t()), None),
            NO_COPY,
        );
        assert_eq!(d.action, Action::Skip);
    }

    #[test]
    fn test_unknown_remote_time_is_not_newer() {
        let d = decide(
            &local(100, t()),
            &RemoteState::present(None, Some(100)),
            NO_COPY,
        );
        assert_eq!(d.action, Action::Skip);
    }

    #[test]
    fn test_remote_absent_local_present_is_ambiguous() {
        let d = decide(&local(100, t()), &RemoteState::absent(), NO_COPY);
        assert_eq!(d.action, Action::Skip);
        assert_eq!(d.diagnostic, Some(Diagnostic::AmbiguousOrigin));
        assert!(d.local_existed);
    }

    #[test]
    fn test_both_absent_skips() {
        let d = decide(&LocalState::absent(), &RemoteState::absent(), NO_COPY);
        assert_eq!(d.action, Action::Skip);
        assert_eq!(d.diagnostic, Some(Diagnostic::NotFound));
    }

    #[test]
    fn test_copy_requested_for_up_to_date_tile() {
        let policy = CopyPolicy {
            requested: true,
            in_place: false,
        };
        let d = decide(&local(100, t()), &remote(100, t()), policy);
        assert_eq!(d.action, Action::Copy);
        assert!(d.copy());
        assert!(!d.download());
    }

    #[test]
    fn test_copy_in_place() {
        let policy = CopyPolicy {
            requested: true,
            in_place: true,
        };
        let d = decide(&local(100, t()), &remote(100, t()), policy);
        assert_eq!(d.action, Action::CopyInPlace);
        assert!(d.copy());
    }

    #[test]
    fn test_copy_never_combined_with_download() {
        let policy = CopyPolicy {
            requested: true,
            in_place: false,
        };
        let d = decide(&local(50, t()), &remote(100, t()), policy);
        assert!(d.download());
        assert!(!d.copy());
    }

    #[test]
    fn test_copy_not_attempted_when_remote_absent() {
        let policy = CopyPolicy {
            requested: true,
            in_place: false,
        };
        let d = decide(&local(100, t()), &RemoteState::absent(), policy);
        assert!(!d.copy());
    }

    fn arb_time() -> impl Strategy<Value = Option<DateTime<Utc>>> {
        proptest::option::of((0i64..2_000_000_000).prop_map(|s| Utc.timestamp_opt(s, 0).unwrap()))
    }

    fn arb_local() -> impl Strategy<Value = LocalState> {
        (any::<bool>(), proptest::option::of(0u64..1000), arb_time()).prop_map(
            |(exists, size, modified_at)| LocalState {
                exists,
                size,
                modified_at,
            },
        )
    }

    fn arb_remote() -> impl Strategy<Value = RemoteState> {
        (any::<bool>(), arb_time(), proptest::option::of(0u64..1000)).prop_map(
            |(exists, modified_at, size)| RemoteState {
                exists,
                modified_at,
                size,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_decide_is_deterministic(
            l in arb_local(),
            r in arb_remote(),
            requested in any::<bool>(),
            in_place in any::<bool>(),
        ) {
            let policy = CopyPolicy { requested, in_place };
            prop_assert_eq!(decide(&l, &r, policy), decide(&l, &r, policy));
        }

        #[test]
        fn prop_download_and_copy_exclusive(
            l in arb_local(),
            r in arb_remote(),
            requested in any::<bool>(),
            in_place in any::<bool>(),
        ) {
            let d = decide(&l, &r, CopyPolicy { requested, in_place });
            prop_assert!(!(d.download() && d.copy()));
            prop_assert_eq!(d.local_existed, l.exists);
            if !r.exists {
                prop_assert_eq!(d.action, Action::Skip);
            }
            if d.copy() {
                prop_assert!(requested && l.exists);
            }
        }
    }
}
