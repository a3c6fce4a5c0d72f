//! Pure geometry for the panzoom controller
//!
//! Points, sizes, rectangles, edge margins and the small affine transform
//! the compositor applies on top of painted content.

mod geometry;
mod transform;

pub use geometry::*;
pub use transform::*;

pub mod prelude {
    pub use crate::geometry::{EdgeInsets, Point, Rect, Size};
    pub use crate::transform::Transform2D;
}
