#![forbid(unsafe_code)]

//! Host-facing primitives for the portico navigation toolkit.
//!
//! This crate defines the seams between the navigation controller and the
//! host GUI framework: f32 geometry in device-independent units, the
//! measure/arrange protocol for visual nodes, the named animation-timeline
//! interface, horizontal pan gesture events, and the visual-effect toggles
//! the controller flips on and off. It has no dependency on the controller
//! itself.

pub mod effects;
pub mod geometry;
pub mod gesture;
pub mod timeline;
pub mod visual;

pub use effects::{BackdropConfig, Rgba, VisualEffects};
pub use geometry::{Point, Rect, Size};
pub use gesture::{EdgeHotZone, PanEvent};
pub use timeline::{Easing, TimelineEvent, TimelineHost, TimelineId, TimelineKind, TimelineSpec};
pub use visual::Visual;
