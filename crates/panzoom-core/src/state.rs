/// Gesture and animation state of one controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PanZoomState {
    /// Nothing happening.
    #[default]
    Idle,
    /// A finger is down but has not moved far enough to pan.
    Touching,
    /// Panning freely in both directions.
    Panning,
    /// Panning, locked to the horizontal axis.
    PanningLockedX,
    /// Panning, locked to the vertical axis.
    PanningLockedY,
    /// Horizontal swipe over content that cannot scroll horizontally.
    CrossSlidingX,
    /// Vertical swipe over content that cannot scroll vertically.
    CrossSlidingY,
    Pinching,
    Fling,
    AnimatingZoom,
    SmoothScroll,
    /// Overscroll is springing back to the edge.
    SnapBack,
}

impl PanZoomState {
    /// Whether content sees the surface moving under an async transform.
    pub fn is_transforming(self) -> bool {
        !matches!(self, PanZoomState::Idle | PanZoomState::Touching)
    }

    pub fn is_panning(self) -> bool {
        matches!(
            self,
            PanZoomState::Panning | PanZoomState::PanningLockedX | PanZoomState::PanningLockedY
        )
    }

    pub fn is_cross_sliding(self) -> bool {
        matches!(self, PanZoomState::CrossSlidingX | PanZoomState::CrossSlidingY)
    }

    /// States driven by an [`Animation`](crate::Animation).
    pub fn is_animating(self) -> bool {
        matches!(
            self,
            PanZoomState::Fling
                | PanZoomState::AnimatingZoom
                | PanZoomState::SmoothScroll
                | PanZoomState::SnapBack
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_and_touching_are_not_transforming() {
        assert!(!PanZoomState::Idle.is_transforming());
        assert!(!PanZoomState::Touching.is_transforming());
        assert!(PanZoomState::Panning.is_transforming());
        assert!(PanZoomState::CrossSlidingY.is_transforming());
        assert!(PanZoomState::SnapBack.is_transforming());
    }

    #[test]
    fn classification() {
        assert!(PanZoomState::PanningLockedY.is_panning());
        assert!(!PanZoomState::CrossSlidingX.is_panning());
        assert!(PanZoomState::Fling.is_animating());
        assert!(!PanZoomState::Pinching.is_animating());
    }
}
