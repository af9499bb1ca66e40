//! The back-pan state machine.
//!
//! `Idle → PanStarted → PanUpdating → {PanCommitted | PanCancelled} →
//! Idle`. The machine is pure: it turns host pan events into
//! [`PanAction`]s and leaves every stack and container mutation to the
//! controller, which keeps abort/re-entry testable without a gesture
//! recognizer.
//!
//! Splitting commit from start is deliberate: the authoritative page
//! stack is not touched until the user's intent is certain, while the
//! drag still gets immediate visual feedback.
//!
//! # Failure Modes
//!
//! - `Updated`/`Completed`/`Canceled` with no active gesture are ignored.
//! - A `Started` while the hot-zone is not armed is ignored.

use portico_core::PanEvent;

/// Current phase of the back gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PanPhase {
    #[default]
    Idle,
    /// Touch landed; no movement processed yet.
    Started,
    /// Scrubbing; `distance` is the clamped horizontal travel.
    Updating { distance: f32 },
}

/// What the controller should do in response to one pan event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PanAction {
    Ignore,
    /// Abort any running transition and stage the peek.
    Begin,
    /// Drive visuals to `fraction` of the viewport width.
    Scrub { fraction: f32 },
    /// Release past the threshold: pop and settle forward.
    Commit { fraction: f32 },
    /// Release short of the threshold (or platform cancel): settle back.
    Cancel { fraction: f32 },
}

/// The back-pan state machine.
#[derive(Debug, Default)]
pub struct BackPan {
    phase: PanPhase,
}

impl BackPan {
    pub fn phase(&self) -> PanPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, PanPhase::Idle)
    }

    /// Drop any gesture in progress without emitting an action. Used
    /// when a programmatic transition takes over.
    pub(crate) fn reset(&mut self) {
        self.phase = PanPhase::Idle;
    }

    /// Advance the machine with one host event.
    ///
    /// `armed` reflects the hot-zone condition at event time (stack depth
    /// ≥ 2, no modal open). `viewport_width` maps deltas onto fractions;
    /// `commit_fraction` is the release threshold.
    pub(crate) fn on_event(
        &mut self,
        event: PanEvent,
        viewport_width: f32,
        armed: bool,
        commit_fraction: f32,
    ) -> PanAction {
        match (self.phase, event) {
            (PanPhase::Idle, PanEvent::Started) if armed => {
                self.phase = PanPhase::Started;
                PanAction::Begin
            }
            (PanPhase::Idle, _) => PanAction::Ignore,
            (PanPhase::Started | PanPhase::Updating { .. }, PanEvent::Updated { delta_x }) => {
                let distance = if viewport_width > 0.0 {
                    delta_x.clamp(0.0, viewport_width)
                } else {
                    0.0
                };
                self.phase = PanPhase::Updating { distance };
                PanAction::Scrub {
                    fraction: fraction_of(distance, viewport_width),
                }
            }
            (phase, PanEvent::Completed) => {
                self.phase = PanPhase::Idle;
                let fraction = phase_fraction(phase, viewport_width);
                if fraction > commit_fraction {
                    PanAction::Commit { fraction }
                } else {
                    PanAction::Cancel { fraction }
                }
            }
            (_, PanEvent::Canceled) => {
                let fraction = phase_fraction(self.phase, viewport_width);
                self.phase = PanPhase::Idle;
                PanAction::Cancel { fraction }
            }
            (_, PanEvent::Started) => PanAction::Ignore,
        }
    }
}

fn fraction_of(distance: f32, viewport_width: f32) -> f32 {
    if viewport_width > 0.0 {
        (distance / viewport_width).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn phase_fraction(phase: PanPhase, viewport_width: f32) -> f32 {
    match phase {
        PanPhase::Updating { distance } => fraction_of(distance, viewport_width),
        PanPhase::Idle | PanPhase::Started => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: f32 = 400.0;

    fn drive(pan: &mut BackPan, event: PanEvent) -> PanAction {
        pan.on_event(event, W, true, 0.5)
    }

    #[test]
    fn full_commit_sequence() {
        let mut pan = BackPan::default();
        assert_eq!(drive(&mut pan, PanEvent::Started), PanAction::Begin);
        assert_eq!(
            drive(&mut pan, PanEvent::Updated { delta_x: 100.0 }),
            PanAction::Scrub { fraction: 0.25 }
        );
        assert_eq!(
            drive(&mut pan, PanEvent::Updated { delta_x: 300.0 }),
            PanAction::Scrub { fraction: 0.75 }
        );
        assert_eq!(
            drive(&mut pan, PanEvent::Completed),
            PanAction::Commit { fraction: 0.75 }
        );
        assert_eq!(pan.phase(), PanPhase::Idle);
    }

    #[test]
    fn release_at_exactly_half_cancels() {
        let mut pan = BackPan::default();
        drive(&mut pan, PanEvent::Started);
        drive(&mut pan, PanEvent::Updated { delta_x: 200.0 });
        assert_eq!(
            drive(&mut pan, PanEvent::Completed),
            PanAction::Cancel { fraction: 0.5 }
        );
    }

    #[test]
    fn platform_cancel_settles_back() {
        let mut pan = BackPan::default();
        drive(&mut pan, PanEvent::Started);
        drive(&mut pan, PanEvent::Updated { delta_x: 300.0 });
        assert_eq!(
            drive(&mut pan, PanEvent::Canceled),
            PanAction::Cancel { fraction: 0.75 }
        );
        assert_eq!(pan.phase(), PanPhase::Idle);
    }

    #[test]
    fn unarmed_start_is_ignored() {
        let mut pan = BackPan::default();
        assert_eq!(
            pan.on_event(PanEvent::Started, W, false, 0.5),
            PanAction::Ignore
        );
        assert_eq!(pan.phase(), PanPhase::Idle);
    }

    #[test]
    fn stray_events_without_start_are_ignored() {
        let mut pan = BackPan::default();
        assert_eq!(
            drive(&mut pan, PanEvent::Updated { delta_x: 50.0 }),
            PanAction::Ignore
        );
        assert_eq!(drive(&mut pan, PanEvent::Canceled), PanAction::Ignore);
        assert_eq!(drive(&mut pan, PanEvent::Completed), PanAction::Ignore);
    }

    #[test]
    fn deltas_clamp_to_viewport() {
        let mut pan = BackPan::default();
        drive(&mut pan, PanEvent::Started);
        assert_eq!(
            drive(&mut pan, PanEvent::Updated { delta_x: -60.0 }),
            PanAction::Scrub { fraction: 0.0 }
        );
        assert_eq!(
            drive(&mut pan, PanEvent::Updated { delta_x: 900.0 }),
            PanAction::Scrub { fraction: 1.0 }
        );
    }

    #[test]
    fn release_before_any_movement_cancels_at_zero() {
        let mut pan = BackPan::default();
        drive(&mut pan, PanEvent::Started);
        assert_eq!(
            drive(&mut pan, PanEvent::Completed),
            PanAction::Cancel { fraction: 0.0 }
        );
    }

    #[test]
    fn reset_drops_gesture_silently() {
        let mut pan = BackPan::default();
        drive(&mut pan, PanEvent::Started);
        drive(&mut pan, PanEvent::Updated { delta_x: 100.0 });
        pan.reset();
        assert!(!pan.is_active());
        assert_eq!(
            drive(&mut pan, PanEvent::Updated { delta_x: 200.0 }),
            PanAction::Ignore
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any event sequence leaves the machine idle after a
            /// release or cancel, and fractions stay in `[0, 1]`.
            #[test]
            fn releases_always_return_to_idle(events in proptest::collection::vec(0u8..4, 0..40)) {
                let mut pan = BackPan::default();
                for code in events {
                    let event = match code {
                        0 => PanEvent::Started,
                        1 => PanEvent::Updated { delta_x: 137.0 },
                        2 => PanEvent::Completed,
                        _ => PanEvent::Canceled,
                    };
                    let action = pan.on_event(event, W, true, 0.5);
                    if let PanAction::Scrub { fraction }
                        | PanAction::Commit { fraction }
                        | PanAction::Cancel { fraction } = action
                    {
                        prop_assert!((0.0..=1.0).contains(&fraction));
                    }
                    if matches!(event, PanEvent::Completed | PanEvent::Canceled) {
                        prop_assert!(!pan.is_active());
                    }
                }
            }
        }
    }
}
