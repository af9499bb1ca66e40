//! Visual-effect toggles and the modal backdrop configuration.
//!
//! Rendering these effects is the host's job; the controller only flips
//! them on and off around transitions.

use bitflags::bitflags;

bitflags! {
    /// Named effects a transition may enable on a container.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct VisualEffects: u8 {
        /// Darken the page underneath during transitions and modals.
        const DARK_OVERLAY = 1 << 0;
        /// Drop shadow along the leading edge of the moving page.
        const SHADOW = 1 << 1;
    }
}

/// A straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Backdrop configuration (color + opacity) for overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackdropConfig {
    /// Backdrop color (alpha will be scaled by `opacity`).
    pub color: Rgba,
    /// Opacity in `[0.0, 1.0]`.
    pub opacity: f32,
}

impl BackdropConfig {
    pub fn new(color: Rgba, opacity: f32) -> Self {
        Self { color, opacity }
    }

    pub fn color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            color: Rgba::rgb(0, 0, 0),
            opacity: 0.6,
        }
    }
}
