//! The named animation-timeline interface consumed from the host.
//!
//! The host's animation primitive interpolates a value over `[0, 1]` on
//! its own time base. The toolkit identifies every animation it starts by
//! a [`TimelineId`] so a later transition can abort it by name, and
//! receives progress back as [`TimelineEvent`]s fed into the controller.
//! The toolkit never owns a clock.
//!
//! # Invariants
//!
//! 1. `Frame` progress is monotonically non-decreasing within one run of a
//!    timeline and lies in `[0, 1]`.
//! 2. Every started timeline produces exactly one `Finished` event, with
//!    `aborted: true` when it was cut short by [`TimelineHost::abort`] or
//!    by restarting the same id.
//! 3. Ids are namespaced by an owner scope so independent controllers
//!    (e.g. a nested modal controller) never collide.

use web_time::Duration;

/// What a timeline animates; one per abort group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimelineKind {
    /// Push, pop, and pan-settle animations. One shared group: starting
    /// any of these aborts whichever of them is running.
    Transition,
    /// Modal presentation and dismissal against the host.
    Modal,
}

/// A host-facing animation name.
///
/// `(scope, kind)` is the abort group; `run` makes every started
/// timeline unique, so a completion event is unambiguously bound to the
/// run that produced it even when the host reports aborts
/// asynchronously. This is the event-stream equivalent of a per-run
/// completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelineId {
    /// Opaque namespace distinguishing independent animation owners.
    pub scope: u64,
    pub kind: TimelineKind,
    /// Monotonic per-owner run counter.
    pub run: u64,
}

impl TimelineId {
    pub const fn new(scope: u64, kind: TimelineKind, run: u64) -> Self {
        Self { scope, kind, run }
    }

    /// Whether two ids belong to the same abort group.
    pub fn same_group(&self, other: &TimelineId) -> bool {
        self.scope == other.scope && self.kind == other.kind
    }
}

/// Easing applied by the host when mapping elapsed time to progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    /// Map raw progress `t` in `[0, 1]` through the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - 2.0 * (1.0 - t) * (1.0 - t)
                }
            }
        }
    }
}

/// A request to run one named timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineSpec {
    pub id: TimelineId,
    pub duration: Duration,
    pub easing: Easing,
}

impl TimelineSpec {
    pub const fn new(id: TimelineId, duration: Duration, easing: Easing) -> Self {
        Self {
            id,
            duration,
            easing,
        }
    }
}

/// Progress reported back from the host, keyed by timeline id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineEvent {
    /// Eased progress in `[0, 1]`.
    Frame { id: TimelineId, progress: f32 },
    /// The timeline ended; `aborted` is true when it did not run to
    /// completion.
    Finished { id: TimelineId, aborted: bool },
}

impl TimelineEvent {
    pub fn id(&self) -> TimelineId {
        match *self {
            Self::Frame { id, .. } | Self::Finished { id, .. } => id,
        }
    }
}

/// The host's animation scheduler.
///
/// Starting a spec whose exact id is already running restarts it; the
/// host reports the interrupted run as `Finished { aborted: true }`
/// first.
pub trait TimelineHost {
    fn start(&mut self, spec: TimelineSpec);

    /// Abort the named timeline. Returns false when nothing by that name
    /// is running (not an error).
    fn abort(&mut self, id: TimelineId) -> bool;

    fn is_running(&self, id: TimelineId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn easing_endpoints_are_fixed() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
        ] {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?} at 0");
            assert_eq!(easing.apply(1.0), 1.0, "{easing:?} at 1");
        }
    }

    #[test]
    fn easing_clamps_out_of_range_input() {
        assert_eq!(Easing::EaseOut.apply(-0.5), 0.0);
        assert_eq!(Easing::EaseIn.apply(1.5), 1.0);
    }

    #[test]
    fn ids_distinguish_scope_kind_and_run() {
        let a = TimelineId::new(1, TimelineKind::Transition, 1);
        let b = TimelineId::new(1, TimelineKind::Modal, 1);
        let c = TimelineId::new(2, TimelineKind::Transition, 1);
        let restarted = TimelineId::new(1, TimelineKind::Transition, 2);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, restarted);
        assert_eq!(a, TimelineId::new(1, TimelineKind::Transition, 1));
    }

    #[test]
    fn runs_of_one_owner_share_an_abort_group() {
        let first = TimelineId::new(1, TimelineKind::Transition, 1);
        let second = TimelineId::new(1, TimelineKind::Transition, 2);
        let modal = TimelineId::new(1, TimelineKind::Modal, 3);
        assert!(first.same_group(&second));
        assert!(!first.same_group(&modal));
    }

    proptest! {
        #[test]
        fn easing_stays_in_unit_range(t in -1.0f32..2.0) {
            for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
                let v = easing.apply(t);
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }

        #[test]
        fn easing_is_monotonic(a in 0.0f32..1.0, b in 0.0f32..1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
                prop_assert!(easing.apply(lo) <= easing.apply(hi) + f32::EPSILON);
            }
        }
    }
}
