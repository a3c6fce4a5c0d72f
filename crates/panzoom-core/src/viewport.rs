//! Viewport state shared between the controller and content.

use panzoom_geometry::{EdgeInsets, Point, Rect, Size};

use crate::config::{ApzConfig, MAX_ZOOM, MIN_ZOOM};

/// Distances smaller than this are treated as zero when comparing
/// positions against scroll bounds.
pub const COORDINATE_EPSILON: f32 = 0.01;

/// Tolerance used to drop repaint requests that match the last one.
pub const EPSILON: f32 = 0.0001;

/// Identifies one scrollable surface across the controller and content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScrollGuid {
    pub layers_id: u64,
    pub pres_shell_id: u32,
    pub scroll_id: u64,
}

/// Everything the controller knows about one scrollable surface.
///
/// Offsets and the scrollable rect are in content (CSS) pixels; the
/// composition bounds and display-port margins are in screen pixels.
/// `zoom` maps content pixels to screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameMetrics {
    pub scroll_offset: Point,
    pub zoom: f32,
    pub composition_bounds: Rect,
    pub scrollable_rect: Rect,
    pub viewport: Rect,
    /// Painted display port, relative to `scroll_offset`.
    pub display_port: Rect,
    pub display_port_margins: EdgeInsets,
    pub scroll_generation: u32,
    pub scroll_offset_updated: bool,
    pub do_smooth_scroll: bool,
    pub smooth_scroll_offset: Point,
    pub scroll_id: u64,
    pub pres_shell_id: u32,
    pub is_root: bool,
    pub may_have_touch_listeners: bool,
}

impl Default for FrameMetrics {
    fn default() -> Self {
        Self {
            scroll_offset: Point::ZERO,
            zoom: 1.0,
            composition_bounds: Rect::default(),
            scrollable_rect: Rect::default(),
            viewport: Rect::default(),
            display_port: Rect::default(),
            display_port_margins: EdgeInsets::default(),
            scroll_generation: 0,
            scroll_offset_updated: false,
            do_smooth_scroll: false,
            smooth_scroll_offset: Point::ZERO,
            scroll_id: 0,
            pres_shell_id: 0,
            is_root: false,
            may_have_touch_listeners: false,
        }
    }
}

impl FrameMetrics {
    pub fn is_default(&self) -> bool {
        *self == FrameMetrics::default()
    }

    /// Visible size in content pixels.
    pub fn composition_size_css(&self) -> Size {
        if self.zoom <= 0.0 {
            return Size::ZERO;
        }
        self.composition_bounds.size() / self.zoom
    }

    /// Visible rect in content pixels.
    pub fn composited_rect_css(&self) -> Rect {
        Rect::from_origin_size(self.scroll_offset, self.composition_size_css())
    }

    /// Scrollable rect grown to at least the composition size, extending
    /// towards the origin when there is room.
    pub fn expanded_scrollable_rect(&self) -> Rect {
        let mut rect = self.scrollable_rect;
        let composition = self.composition_size_css();
        if rect.width < composition.width {
            rect.x = (rect.x - (composition.width - rect.width)).max(0.0);
            rect.width = composition.width;
        }
        if rect.height < composition.height {
            rect.y = (rect.y - (composition.height - rect.height)).max(0.0);
            rect.height = composition.height;
        }
        rect
    }

    /// Range of valid scroll offsets.
    pub fn scroll_range(&self) -> Rect {
        let scrollable = self.expanded_scrollable_rect();
        let composition = self.composition_size_css();
        Rect::new(
            scrollable.x,
            scrollable.y,
            (scrollable.width - composition.width).max(0.0),
            (scrollable.height - composition.height).max(0.0),
        )
    }

    pub fn scroll_by(&mut self, delta: Point) {
        self.scroll_offset += delta;
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.zoom *= factor;
    }

    /// Adopts the scroll offset and generation of a content-side update.
    pub fn copy_scroll_info_from(&mut self, other: &FrameMetrics) {
        self.scroll_offset = other.scroll_offset;
        self.scroll_generation = other.scroll_generation;
    }

    pub fn copy_smooth_scroll_info_from(&mut self, other: &FrameMetrics) {
        self.smooth_scroll_offset = other.smooth_scroll_offset;
        self.scroll_generation = other.scroll_generation;
    }

    /// Painted display port in absolute content coordinates.
    pub fn painted_rect(&self) -> Rect {
        self.display_port + self.scroll_offset
    }

    pub fn guid(&self, layers_id: u64) -> ScrollGuid {
        ScrollGuid {
            layers_id,
            pres_shell_id: self.pres_shell_id,
            scroll_id: self.scroll_id,
        }
    }

    /// True when a repaint for `self` would paint what `other` already asked for.
    pub fn is_repaint_equivalent(&self, other: &FrameMetrics) -> bool {
        self.display_port_margins
            .fuzzy_eq(&other.display_port_margins, EPSILON)
            && (self.scroll_offset.x - other.scroll_offset.x).abs() < EPSILON
            && (self.scroll_offset.y - other.scroll_offset.y).abs() < EPSILON
            && self.zoom == other.zoom
            && (self.viewport.width - other.viewport.width).abs() < EPSILON
            && (self.viewport.height - other.viewport.height).abs() < EPSILON
    }
}

/// Zoom policy requested by content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomConstraints {
    pub allow_zoom: bool,
    pub allow_double_tap_zoom: bool,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for ZoomConstraints {
    fn default() -> Self {
        Self {
            allow_zoom: false,
            allow_double_tap_zoom: false,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl ZoomConstraints {
    pub fn new(allow_zoom: bool, allow_double_tap_zoom: bool, min_zoom: f32, max_zoom: f32) -> Self {
        Self {
            allow_zoom,
            allow_double_tap_zoom,
            min_zoom,
            max_zoom,
        }
    }

    /// Clamps both bounds into the hard limits. Infinite values clamp like
    /// any other; max is raised to min when they cross.
    pub fn sanitized(&self) -> ZoomConstraints {
        let min_zoom = self.min_zoom.max(MIN_ZOOM).min(MAX_ZOOM);
        let mut max_zoom = self.max_zoom.max(MIN_ZOOM).min(MAX_ZOOM);
        if max_zoom < min_zoom {
            max_zoom = min_zoom;
        }
        ZoomConstraints {
            min_zoom,
            max_zoom,
            ..*self
        }
    }
}

fn display_port_size(composition: Size, velocity: Point, config: &ApzConfig) -> Size {
    let x_multiplier = if velocity.x.abs() < config.min_skate_speed {
        config.x_stationary_size_multiplier
    } else {
        config.x_skate_size_multiplier
    };
    let y_multiplier = if velocity.y.abs() < config.min_skate_speed {
        config.y_stationary_size_multiplier
    } else {
        config.y_skate_size_multiplier
    };
    Size::new(
        (composition.width * x_multiplier).max(composition.width + 2.0 * config.danger_zone_x),
        (composition.height * y_multiplier).max(composition.height + 2.0 * config.danger_zone_y),
    )
}

/// Moves display-port area that the scrollable rect would clip onto the
/// other axis, keeping the total area.
fn redistribute_excess(size: &mut Size, scrollable: &Rect) {
    let x_slack = (size.width - scrollable.width).max(0.0);
    let y_slack = (size.height - scrollable.height).max(0.0);

    if y_slack > 0.0 {
        size.height -= y_slack;
        if size.height > 0.0 {
            size.width += y_slack * size.width / size.height;
        }
    } else if x_slack > 0.0 {
        size.width -= x_slack;
        if size.width > 0.0 {
            size.height += x_slack * size.height / size.width;
        }
    }
}

/// Display-port margins, in screen pixels, to request for `metrics` while
/// moving at `velocity` (screen pixels per millisecond).
///
/// The port is enlarged along each axis depending on speed, pushed ahead in
/// the direction of motion by the time a paint is expected to take, and kept
/// inside the scrollable rect.
pub fn calculate_pending_display_port(
    metrics: &FrameMetrics,
    velocity: Point,
    estimated_paint_duration_ms: f32,
    config: &ApzConfig,
) -> EdgeInsets {
    let zoom = if metrics.zoom > 0.0 { metrics.zoom } else { 1.0 };
    let composition = metrics.composition_size_css();
    let velocity = velocity / zoom;
    let scroll_offset = metrics.scroll_offset;
    let scrollable = metrics.expanded_scrollable_rect();

    let mut size = display_port_size(composition, velocity, config);
    if config.enlarge_displayport_when_clipped {
        redistribute_excess(&mut size, &scrollable);
    }

    let paint_factor = if config.use_paint_duration {
        estimated_paint_duration_ms
    } else {
        50.0
    };
    let mut port = Rect::from_origin_size(
        scroll_offset + velocity * paint_factor * config.velocity_bias,
        size,
    );
    port = port.translate(
        (composition.width - port.width) / 2.0,
        (composition.height - port.height) / 2.0,
    );
    let port = port.force_inside(&scrollable) - scroll_offset;

    let left = -port.x;
    let top = -port.y;
    let margins = EdgeInsets::from_components(
        left,
        top,
        port.width - composition.width - left,
        port.height - composition.height - top,
    );
    log::trace!(
        "display port {:?} from velocity {:?} paint time {}",
        port,
        velocity,
        estimated_paint_duration_ms
    );
    margins * zoom
}

#[cfg(test)]
#[path = "tests/viewport_tests.rs"]
mod tests;
