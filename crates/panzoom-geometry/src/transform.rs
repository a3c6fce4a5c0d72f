use crate::Point;

/// Axis-aligned scale followed by a translation.
///
/// This is the whole family of transforms the controller hands to the
/// compositor: async pan/zoom, overscroll stretch and the correction towards
/// the last dispatched paint. Rotation and skew never occur.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    pub scale_x: f32,
    pub scale_y: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D {
        scale_x: 1.0,
        scale_y: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    pub fn scale(scale_x: f32, scale_y: f32) -> Self {
        Self {
            scale_x,
            scale_y,
            ..Self::IDENTITY
        }
    }

    pub fn translation(offset: Point) -> Self {
        Self {
            translate_x: offset.x,
            translate_y: offset.y,
            ..Self::IDENTITY
        }
    }

    /// Applies `self` first, then `next`.
    pub fn then(&self, next: &Transform2D) -> Self {
        Self {
            scale_x: self.scale_x * next.scale_x,
            scale_y: self.scale_y * next.scale_y,
            translate_x: self.translate_x * next.scale_x + next.translate_x,
            translate_y: self.translate_y * next.scale_y + next.translate_y,
        }
    }

    pub fn transform_point(&self, point: Point) -> Point {
        Point::new(
            point.x * self.scale_x + self.translate_x,
            point.y * self.scale_y + self.translate_y,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn then_applies_left_to_right() {
        let scale = Transform2D::scale(2.0, 3.0);
        let shift = Transform2D::translation(Point::new(10.0, 20.0));
        let combined = scale.then(&shift);
        assert_eq!(
            combined.transform_point(Point::new(1.0, 1.0)),
            Point::new(12.0, 23.0)
        );

        let reversed = shift.then(&scale);
        assert_eq!(
            reversed.transform_point(Point::new(1.0, 1.0)),
            Point::new(22.0, 63.0)
        );
    }
}
