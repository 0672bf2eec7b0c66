//! Overlay sizing and clamping.
//!
//! Everything here is pure: (content box, monitor bounds, previous position)
//! in, window geometry out.

use serde::{Deserialize, Serialize};

/// Natural size of the overlay content in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentBox {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

/// Visible monitor area in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorBounds {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayGeometry {
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

impl ContentBox {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whole-pixel window size for this content, rounded up so nothing is
    /// clipped by a sub-pixel remainder.
    pub fn window_size(&self) -> (u32, u32) {
        (ceil_px(self.width), ceil_px(self.height))
    }
}

impl LogicalPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn from_physical(position: PhysicalPosition, scale_factor: f64) -> Self {
        let scale = valid_scale(scale_factor);
        Self {
            x: (position.x / scale).floor() as i32,
            y: (position.y / scale).floor() as i32,
        }
    }
}

impl MonitorBounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn from_physical(size: PhysicalSize, scale_factor: f64) -> Self {
        let scale = valid_scale(scale_factor);
        Self {
            width: (size.width as f64 / scale).floor() as i32,
            height: (size.height as f64 / scale).floor() as i32,
        }
    }
}

impl OverlayGeometry {
    pub fn position(&self) -> LogicalPosition {
        LogicalPosition::new(self.x, self.y)
    }

    pub fn size(&self) -> LogicalSize {
        LogicalSize {
            width: self.width as f64,
            height: self.height as f64,
        }
    }
}

/// Compute the overlay geometry for `content`.
///
/// Returns `None` while auto-resize is disabled. Without monitor bounds the
/// previous position is kept as-is.
pub fn layout(
    content: ContentBox,
    monitor: Option<MonitorBounds>,
    previous: LogicalPosition,
    auto_resize: bool,
) -> Option<OverlayGeometry> {
    if !auto_resize {
        return None;
    }

    let (width, height) = content.window_size();
    let position = match monitor {
        Some(bounds) => clamp_position(previous, width, height, bounds),
        None => previous,
    };

    Some(OverlayGeometry {
        width,
        height,
        x: position.x,
        y: position.y,
    })
}

/// Keep a `width`×`height` window at `position` fully inside `bounds`.
pub fn clamp_position(
    position: LogicalPosition,
    width: u32,
    height: u32,
    bounds: MonitorBounds,
) -> LogicalPosition {
    let max_x = (bounds.width as i64 - width as i64).max(0);
    let max_y = (bounds.height as i64 - height as i64).max(0);
    LogicalPosition {
        x: (position.x as i64).clamp(0, max_x) as i32,
        y: (position.y as i64).clamp(0, max_y) as i32,
    }
}

fn ceil_px(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.ceil().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

fn valid_scale(scale_factor: f64) -> f64 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_box_rounds_up() {
        assert_eq!(ContentBox::new(259.2, 63.01).window_size(), (260, 64));
        assert_eq!(ContentBox::new(260.0, 64.0).window_size(), (260, 64));
    }

    #[test]
    fn test_layout_clamps_bottom_right() {
        let geometry = layout(
            ContentBox::new(260.0, 64.0),
            Some(MonitorBounds::new(1920, 1080)),
            LogicalPosition::new(1900, 1000),
            true,
        )
        .unwrap();
        assert_eq!(geometry.position(), LogicalPosition::new(1660, 1016));
        assert_eq!((geometry.width, geometry.height), (260, 64));
    }

    #[test]
    fn test_layout_clamps_negative_to_zero() {
        let geometry = layout(
            ContentBox::new(170.0, 50.0),
            Some(MonitorBounds::new(1280, 720)),
            LogicalPosition::new(-30, -5),
            true,
        )
        .unwrap();
        assert_eq!(geometry.position(), LogicalPosition::new(0, 0));
    }

    #[test]
    fn test_layout_oversized_content_pins_to_origin() {
        let geometry = layout(
            ContentBox::new(900.0, 600.0),
            Some(MonitorBounds::new(800, 500)),
            LogicalPosition::new(120, 40),
            true,
        )
        .unwrap();
        assert_eq!(geometry.position(), LogicalPosition::new(0, 0));
    }

    #[test]
    fn test_layout_without_monitor_keeps_position() {
        let previous = LogicalPosition::new(5000, -20);
        let geometry = layout(ContentBox::new(170.0, 50.0), None, previous, true).unwrap();
        assert_eq!(geometry.position(), previous);
    }

    #[test]
    fn test_layout_disabled_while_auto_resize_off() {
        assert!(layout(
            ContentBox::new(170.0, 50.0),
            Some(MonitorBounds::new(1920, 1080)),
            LogicalPosition::new(0, 0),
            false,
        )
        .is_none());
    }

    #[test]
    fn test_physical_conversions_use_scale_factor() {
        let bounds = MonitorBounds::from_physical(
            PhysicalSize {
                width: 3840,
                height: 2160,
            },
            2.0,
        );
        assert_eq!(bounds, MonitorBounds::new(1920, 1080));

        let position = LogicalPosition::from_physical(PhysicalPosition { x: 301.0, y: 99.0 }, 2.0);
        assert_eq!(position, LogicalPosition::new(150, 49));
    }
}
