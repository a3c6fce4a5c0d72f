//! Builders for input events.

use panzoom_core::{
    FrameMetrics, InputEvent, MultiTouchInput, MultiTouchKind, PanGestureInput, PanKind,
    PinchGestureInput, PinchKind, TapGestureInput, TapKind, TouchPoint,
};
use panzoom_geometry::{Point, Rect, Size};
use web_time::Instant;

pub fn touch(kind: MultiTouchKind, time: Instant, point: Point) -> InputEvent {
    InputEvent::MultiTouch(MultiTouchInput::single(kind, time, point))
}

/// Two-finger touch event.
pub fn touch2(kind: MultiTouchKind, time: Instant, first: Point, second: Point) -> InputEvent {
    InputEvent::MultiTouch(
        MultiTouchInput::new(kind, time)
            .with_touch(TouchPoint::new(0, first))
            .with_touch(TouchPoint::new(1, second)),
    )
}

pub fn pinch(kind: PinchKind, time: Instant, focus: Point, current: f32, previous: f32) -> InputEvent {
    InputEvent::Pinch(PinchGestureInput::new(kind, time, focus, current, previous))
}

pub fn tap(kind: TapKind, time: Instant, point: Point) -> InputEvent {
    InputEvent::Tap(TapGestureInput::new(kind, time, point))
}

pub fn trackpad(kind: PanKind, time: Instant, point: Point, displacement: Point) -> InputEvent {
    InputEvent::Pan(PanGestureInput::new(kind, time, point, displacement))
}

/// Viewport at zoom 1 showing `composition` of a page of `page` size,
/// scrolled to the origin.
pub fn scrollable_metrics(composition: Size, page: Size) -> FrameMetrics {
    FrameMetrics {
        composition_bounds: Rect::from_size(composition),
        scrollable_rect: Rect::from_size(page),
        viewport: Rect::from_size(composition),
        scroll_id: 1,
        ..FrameMetrics::default()
    }
}
