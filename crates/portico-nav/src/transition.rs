//! Transition animation definitions attached to pages.
//!
//! An [`AnimationGroup`] names one optional [`AnimationDef`] per
//! transition role. Defs are declarative property tracks over normalized
//! progress; the controller samples them with host-reported timeline
//! progress and writes the results into container properties. Horizontal
//! and vertical translations are expressed in viewport fractions so a
//! def is independent of device size.

use portico_core::{Easing, Size};
use web_time::Duration;

use crate::container::ContainerProps;

/// Fraction of the viewport the underlying page travels during a
/// push/pop, giving the stacked-cards parallax.
pub const PARALLAX_FRACTION: f32 = 1.0 / 3.0;

/// The six transition roles a page can animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionRole {
    /// Page entering on push.
    In,
    /// Page re-entering on pop of the page above it.
    BackIn,
    /// Page leaving underneath a push.
    Out,
    /// Page leaving on pop.
    BackOut,
    /// Modal presentation.
    ModalIn,
    /// Modal dismissal.
    ModalOut,
}

/// Animatable container property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimProperty {
    /// Horizontal translation in viewport widths.
    TranslationX,
    /// Vertical translation in viewport heights.
    TranslationY,
    Opacity,
    Scale,
}

/// One linear property tween over the def's progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub property: AnimProperty,
    pub from: f32,
    pub to: f32,
}

impl Track {
    fn value_at(&self, t: f32) -> f32 {
        self.from + (self.to - self.from) * t
    }
}

/// A named animation: duration, easing, and property tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDef {
    pub duration: Duration,
    pub easing: Easing,
    pub tracks: Vec<Track>,
}

impl AnimationDef {
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            easing,
            tracks: Vec::new(),
        }
    }

    pub fn translate_x(mut self, from: f32, to: f32) -> Self {
        self.tracks.push(Track {
            property: AnimProperty::TranslationX,
            from,
            to,
        });
        self
    }

    pub fn translate_y(mut self, from: f32, to: f32) -> Self {
        self.tracks.push(Track {
            property: AnimProperty::TranslationY,
            from,
            to,
        });
        self
    }

    pub fn opacity(mut self, from: f32, to: f32) -> Self {
        self.tracks.push(Track {
            property: AnimProperty::Opacity,
            from,
            to,
        });
        self
    }

    pub fn scale(mut self, from: f32, to: f32) -> Self {
        self.tracks.push(Track {
            property: AnimProperty::Scale,
            from,
            to,
        });
        self
    }

    /// Sample every track at eased progress `t` and write the values
    /// into `props`. Translations scale by the viewport.
    pub fn apply(&self, props: &mut ContainerProps, t: f32, viewport: Size) {
        for track in &self.tracks {
            let value = track.value_at(t);
            match track.property {
                AnimProperty::TranslationX => props.translation_x = value * viewport.width,
                AnimProperty::TranslationY => props.translation_y = value * viewport.height,
                AnimProperty::Opacity => props.opacity = value,
                AnimProperty::Scale => props.scale = value,
            }
        }
    }
}

/// An [`AnimationDef`] scheduled on a shared transition timeline.
///
/// When the in- and out-animations of a transition have different
/// durations, the shared timeline is clocked at the longer one and the
/// shorter def's curve endpoint becomes `min(duration) / max(duration)`:
/// it completes its curve at its own natural time on the shared clock
/// and holds, so entry and exit stay visually synchronized.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlannedDef {
    pub(crate) def: AnimationDef,
    pub(crate) end_fraction: f32,
}

impl PlannedDef {
    /// Map raw shared-timeline progress through the normalized endpoint
    /// and the def's own easing.
    pub(crate) fn eased(&self, raw: f32) -> f32 {
        let scaled = if self.end_fraction > 0.0 {
            (raw / self.end_fraction).min(1.0)
        } else {
            1.0
        };
        self.def.easing.apply(scaled)
    }

    pub(crate) fn apply(&self, props: &mut ContainerProps, raw: f32, viewport: Size) {
        self.def.apply(props, self.eased(raw), viewport);
    }
}

/// Normalize a pair of defs onto one shared timeline.
///
/// Returns the shared duration (the longer of the two) and the planned
/// defs with their curve endpoints adjusted.
pub(crate) fn plan_pair(
    a: Option<AnimationDef>,
    b: Option<AnimationDef>,
) -> (Duration, Option<PlannedDef>, Option<PlannedDef>) {
    let longest = a
        .iter()
        .chain(b.iter())
        .map(|d| d.duration)
        .max()
        .unwrap_or(Duration::ZERO);
    let plan = |def: Option<AnimationDef>| {
        def.map(|def| {
            let end_fraction = if longest.is_zero() {
                1.0
            } else {
                def.duration.as_secs_f32() / longest.as_secs_f32()
            };
            PlannedDef { def, end_fraction }
        })
    };
    (longest, plan(a), plan(b))
}

/// Named animation definitions for the six transition roles, plus the
/// chrome-visual flags and the override hooks letting an incoming page
/// dictate how the outgoing page animates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimationGroup {
    pub r#in: Option<AnimationDef>,
    pub back_in: Option<AnimationDef>,
    pub out: Option<AnimationDef>,
    pub back_out: Option<AnimationDef>,
    pub modal_in: Option<AnimationDef>,
    pub modal_out: Option<AnimationDef>,
    pub dark_overlay_enabled: bool,
    pub shadow_enabled: bool,
    /// Replaces the outgoing page's `Out` when this page pushes over it.
    pub previous_page_out_override: Option<AnimationDef>,
    /// Replaces the revealed page's `BackIn` when this page pops.
    pub previous_page_back_in_override: Option<AnimationDef>,
}

impl AnimationGroup {
    /// No animations at all; every transition assigns synchronously.
    pub fn none() -> Self {
        Self::default()
    }

    /// The standard horizontal slide with parallax: pages enter from the
    /// trailing edge, the page underneath trails at a third of the
    /// distance, modals rise from the bottom.
    pub fn slide() -> Self {
        let d = Duration::from_millis(350);
        Self {
            r#in: Some(AnimationDef::new(d, Easing::EaseOut).translate_x(1.0, 0.0)),
            back_in: Some(AnimationDef::new(d, Easing::EaseOut).translate_x(-PARALLAX_FRACTION, 0.0)),
            out: Some(AnimationDef::new(d, Easing::EaseOut).translate_x(0.0, -PARALLAX_FRACTION)),
            back_out: Some(AnimationDef::new(d, Easing::EaseOut).translate_x(0.0, 1.0)),
            modal_in: Some(
                AnimationDef::new(Duration::from_millis(300), Easing::EaseOut).translate_y(1.0, 0.0),
            ),
            modal_out: Some(
                AnimationDef::new(Duration::from_millis(250), Easing::EaseIn).translate_y(0.0, 1.0),
            ),
            dark_overlay_enabled: true,
            shadow_enabled: true,
            previous_page_out_override: None,
            previous_page_back_in_override: None,
        }
    }

    /// Cross-fade instead of slide.
    pub fn fade() -> Self {
        let d = Duration::from_millis(250);
        Self {
            r#in: Some(AnimationDef::new(d, Easing::EaseInOut).opacity(0.0, 1.0)),
            back_in: Some(AnimationDef::new(d, Easing::EaseInOut).opacity(0.0, 1.0)),
            out: Some(AnimationDef::new(d, Easing::EaseInOut).opacity(1.0, 0.0)),
            back_out: Some(AnimationDef::new(d, Easing::EaseInOut).opacity(1.0, 0.0)),
            modal_in: Some(AnimationDef::new(d, Easing::EaseOut).opacity(0.0, 1.0)),
            modal_out: Some(AnimationDef::new(d, Easing::EaseIn).opacity(1.0, 0.0)),
            dark_overlay_enabled: false,
            shadow_enabled: false,
            previous_page_out_override: None,
            previous_page_back_in_override: None,
        }
    }

    /// Look up the def for a role.
    pub fn def(&self, role: TransitionRole) -> Option<&AnimationDef> {
        match role {
            TransitionRole::In => self.r#in.as_ref(),
            TransitionRole::BackIn => self.back_in.as_ref(),
            TransitionRole::Out => self.out.as_ref(),
            TransitionRole::BackOut => self.back_out.as_ref(),
            TransitionRole::ModalIn => self.modal_in.as_ref(),
            TransitionRole::ModalOut => self.modal_out.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Size {
        Size::new(400.0, 800.0)
    }

    #[test]
    fn track_sampling_scales_translations_by_viewport() {
        let def = AnimationDef::new(Duration::from_millis(100), Easing::Linear)
            .translate_x(1.0, 0.0)
            .opacity(0.0, 1.0);
        let mut props = ContainerProps::default();
        def.apply(&mut props, 0.5, viewport());
        assert_eq!(props.translation_x, 200.0);
        assert_eq!(props.opacity, 0.5);
    }

    #[test]
    fn plan_pair_clocks_shared_timeline_at_longer_duration() {
        let slow = AnimationDef::new(Duration::from_millis(400), Easing::Linear);
        let fast = AnimationDef::new(Duration::from_millis(100), Easing::Linear);
        let (shared, a, b) = plan_pair(Some(slow), Some(fast));
        assert_eq!(shared, Duration::from_millis(400));
        assert_eq!(a.unwrap().end_fraction, 1.0);
        assert_eq!(b.unwrap().end_fraction, 0.25);
    }

    #[test]
    fn shorter_def_completes_at_normalized_endpoint_and_holds() {
        let fast = AnimationDef::new(Duration::from_millis(100), Easing::Linear);
        let slow = AnimationDef::new(Duration::from_millis(400), Easing::Linear);
        let (_, fast_planned, _) = plan_pair(Some(fast), Some(slow));
        let planned = fast_planned.unwrap();
        assert_eq!(planned.eased(0.125), 0.5);
        assert_eq!(planned.eased(0.25), 1.0);
        assert_eq!(planned.eased(0.9), 1.0);
    }

    #[test]
    fn plan_pair_with_no_defs_is_instant() {
        let (shared, a, b) = plan_pair(None, None);
        assert_eq!(shared, Duration::ZERO);
        assert!(a.is_none());
        assert!(b.is_none());
    }

    #[test]
    fn slide_group_covers_all_six_roles() {
        let group = AnimationGroup::slide();
        for role in [
            TransitionRole::In,
            TransitionRole::BackIn,
            TransitionRole::Out,
            TransitionRole::BackOut,
            TransitionRole::ModalIn,
            TransitionRole::ModalOut,
        ] {
            assert!(group.def(role).is_some(), "{role:?} missing");
        }
        assert!(group.dark_overlay_enabled);
        assert!(group.shadow_enabled);
    }

    #[test]
    fn none_group_has_no_defs() {
        let group = AnimationGroup::none();
        assert!(group.def(TransitionRole::In).is_none());
        assert!(!group.dark_overlay_enabled);
    }
}
