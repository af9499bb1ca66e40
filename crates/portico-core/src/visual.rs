//! The measure/arrange seam between the toolkit and the host view tree.

use crate::geometry::{Rect, Size};

/// A node in the host framework's view hierarchy.
///
/// The navigation controller never renders; it measures and arranges the
/// pages it hosts and raises them in the host's z-order during
/// transitions. Hosts implement this for their native view handles.
pub trait Visual {
    /// Measure the desired size under the given constraints.
    fn measure(&mut self, available: Size) -> Size;

    /// Arrange the node into `rect`.
    fn arrange(&mut self, rect: Rect);

    /// Raise the node above its siblings in the host z-order.
    fn raise_to_front(&mut self);
}
