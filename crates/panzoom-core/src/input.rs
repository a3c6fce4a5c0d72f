//! Input event types consumed by the controller.
//!
//! All points are in screen pixels. Timestamps come from the same clock as
//! [`ApzContext::now`](crate::ApzContext::now).

use bitflags::bitflags;
use panzoom_geometry::{Point, Size};
use smallvec::SmallVec;
use web_time::Instant;

bitflags! {
    /// Keyboard modifiers held while the input event was generated.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

/// What the controller did with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventStatus {
    /// Not handled here; the caller should deliver it elsewhere.
    Ignore,
    /// Handled; content should not perform its default action.
    ConsumeNoDefault,
    /// Handled, but content may still act on it.
    ConsumeDoDefault,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    pub identifier: i32,
    pub screen_point: Point,
    pub radius: Size,
    pub force: f32,
}

impl TouchPoint {
    pub fn new(identifier: i32, screen_point: Point) -> Self {
        Self {
            identifier,
            screen_point,
            radius: Size::new(1.0, 1.0),
            force: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MultiTouchKind {
    Start,
    Move,
    End,
    Cancel,
}

pub type TouchList = SmallVec<[TouchPoint; 2]>;

#[derive(Clone, Debug, PartialEq)]
pub struct MultiTouchInput {
    pub kind: MultiTouchKind,
    pub time: Instant,
    pub touches: TouchList,
    pub modifiers: Modifiers,
}

impl MultiTouchInput {
    pub fn new(kind: MultiTouchKind, time: Instant) -> Self {
        Self {
            kind,
            time,
            touches: TouchList::new(),
            modifiers: Modifiers::empty(),
        }
    }

    /// Single-finger event at `point`.
    pub fn single(kind: MultiTouchKind, time: Instant, point: Point) -> Self {
        Self::new(kind, time).with_touch(TouchPoint::new(0, point))
    }

    pub fn with_touch(mut self, touch: TouchPoint) -> Self {
        self.touches.push(touch);
        self
    }

    pub fn first_point(&self) -> Option<Point> {
        self.touches.first().map(|touch| touch.screen_point)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinchKind {
    Start,
    Scale,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchGestureInput {
    pub kind: PinchKind,
    pub time: Instant,
    pub focus_point: Point,
    pub current_span: f32,
    pub previous_span: f32,
    pub modifiers: Modifiers,
}

impl PinchGestureInput {
    pub fn new(
        kind: PinchKind,
        time: Instant,
        focus_point: Point,
        current_span: f32,
        previous_span: f32,
    ) -> Self {
        Self {
            kind,
            time,
            focus_point,
            current_span,
            previous_span,
            modifiers: Modifiers::empty(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapKind {
    LongTap,
    LongTapUp,
    SingleTapUp,
    SingleTapConfirmed,
    DoubleTap,
    CancelTap,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TapGestureInput {
    pub kind: TapKind,
    pub time: Instant,
    pub point: Point,
    pub modifiers: Modifiers,
}

impl TapGestureInput {
    pub fn new(kind: TapKind, time: Instant, point: Point) -> Self {
        Self {
            kind,
            time,
            point,
            modifiers: Modifiers::empty(),
        }
    }
}

/// Trackpad pan phases. Momentum phases are synthesized by the platform
/// after the fingers lift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanKind {
    MayStart,
    Cancelled,
    Start,
    Pan,
    End,
    MomentumStart,
    MomentumPan,
    MomentumEnd,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanGestureInput {
    pub kind: PanKind,
    pub time: Instant,
    pub panning_point: Point,
    /// Movement of the fingers since the previous event, in screen pixels.
    pub displacement: Point,
    pub modifiers: Modifiers,
}

impl PanGestureInput {
    pub fn new(kind: PanKind, time: Instant, panning_point: Point, displacement: Point) -> Self {
        Self {
            kind,
            time,
            panning_point,
            displacement,
            modifiers: Modifiers::empty(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    MultiTouch(MultiTouchInput),
    Pinch(PinchGestureInput),
    Tap(TapGestureInput),
    Pan(PanGestureInput),
}

impl InputEvent {
    pub fn time(&self) -> Instant {
        match self {
            InputEvent::MultiTouch(event) => event.time,
            InputEvent::Pinch(event) => event.time,
            InputEvent::Tap(event) => event.time,
            InputEvent::Pan(event) => event.time,
        }
    }
}
