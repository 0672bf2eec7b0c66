//! Window-management interface for the overlay, and the in-process window
//! model the overlay shell mirrors.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

use super::geometry::{LogicalPosition, LogicalSize, PhysicalPosition, PhysicalSize};
use crate::config::OverlayConfig;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window query failed: {0}")]
    Query(String),
    #[error("window command failed: {0}")]
    Command(String),
}

#[async_trait]
pub trait OverlayWindow: Send + Sync {
    async fn show(&self) -> Result<(), WindowError>;

    async fn hide(&self) -> Result<(), WindowError>;

    async fn set_size(&self, size: LogicalSize) -> Result<(), WindowError>;

    /// Outer position as placed by the OS, in physical pixels.
    async fn outer_position(&self) -> Result<PhysicalPosition, WindowError>;

    async fn set_position(&self, position: LogicalPosition) -> Result<(), WindowError>;

    async fn scale_factor(&self) -> Result<f64, WindowError>;

    /// Physical size of the monitor the window is on, if known.
    async fn current_monitor(&self) -> Result<Option<PhysicalSize>, WindowError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct WindowSnapshot {
    pub visible: bool,
    pub size: LogicalSize,
    pub position: LogicalPosition,
    pub scale_factor: f64,
    pub monitor: Option<PhysicalSize>,
}

#[derive(Debug)]
struct WindowModel {
    visible: bool,
    size: LogicalSize,
    position: PhysicalPosition,
    scale_factor: f64,
    monitor: Option<PhysicalSize>,
}

/// Window state held in-process. The shell rendering the overlay reads it
/// through the control API and applies it to the real window.
#[derive(Clone)]
pub struct ManagedWindow {
    model: Arc<Mutex<WindowModel>>,
}

impl ManagedWindow {
    pub fn from_config(config: &OverlayConfig) -> Self {
        let monitor = match (config.monitor_width, config.monitor_height) {
            (Some(width), Some(height)) => Some(PhysicalSize { width, height }),
            _ => None,
        };
        let scale_factor = config.scale_factor;

        Self {
            model: Arc::new(Mutex::new(WindowModel {
                visible: false,
                size: LogicalSize {
                    width: config.compact_width,
                    height: config.compact_height,
                },
                position: PhysicalPosition {
                    x: config.initial_x as f64 * scale_factor,
                    y: config.initial_y as f64 * scale_factor,
                },
                scale_factor,
                monitor,
            })),
        }
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        let model = self.lock();
        WindowSnapshot {
            visible: model.visible,
            size: model.size,
            position: LogicalPosition::from_physical(model.position, model.scale_factor),
            scale_factor: model.scale_factor,
            monitor: model.monitor,
        }
    }

    /// The user dragged the window; positions arrive in logical units.
    pub fn moved_to(&self, position: LogicalPosition) {
        let mut model = self.lock();
        model.position = PhysicalPosition {
            x: position.x as f64 * model.scale_factor,
            y: position.y as f64 * model.scale_factor,
        };
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WindowModel> {
        self.model
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl OverlayWindow for ManagedWindow {
    async fn show(&self) -> Result<(), WindowError> {
        self.lock().visible = true;
        debug!("Overlay window shown");
        Ok(())
    }

    async fn hide(&self) -> Result<(), WindowError> {
        self.lock().visible = false;
        debug!("Overlay window hidden");
        Ok(())
    }

    async fn set_size(&self, size: LogicalSize) -> Result<(), WindowError> {
        if !(size.width.is_finite() && size.height.is_finite()) {
            return Err(WindowError::Command(format!("invalid size {size:?}")));
        }
        self.lock().size = size;
        Ok(())
    }

    async fn outer_position(&self) -> Result<PhysicalPosition, WindowError> {
        Ok(self.lock().position)
    }

    async fn set_position(&self, position: LogicalPosition) -> Result<(), WindowError> {
        self.moved_to(position);
        Ok(())
    }

    async fn scale_factor(&self) -> Result<f64, WindowError> {
        Ok(self.lock().scale_factor)
    }

    async fn current_monitor(&self) -> Result<Option<PhysicalSize>, WindowError> {
        Ok(self.lock().monitor)
    }
}
