//! The floating overlay window: geometry, window management and the
//! expanded/compact dance around permission prompts.

pub mod controller;
pub mod expand;
pub mod geometry;
pub mod window;

pub use controller::{GeometryController, OverlayHandle};
pub use expand::{restore_compact, ExpandGuard};
pub use geometry::{
    clamp_position, layout, ContentBox, LogicalPosition, LogicalSize, MonitorBounds,
    OverlayGeometry, PhysicalPosition, PhysicalSize,
};
pub use window::{ManagedWindow, OverlayWindow, WindowError, WindowSnapshot};
