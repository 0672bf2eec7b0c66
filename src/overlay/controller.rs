//! Keeps the visible overlay sized to its content and inside its monitor.
//!
//! The shell reports content-size changes through [`OverlayHandle`]; the
//! [`GeometryController`] task observes them while the overlay is visible
//! with auto-resize enabled and applies the resulting geometry. Rapid
//! successive changes collapse to the latest one.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::geometry::{layout, ContentBox, LogicalPosition, LogicalSize, MonitorBounds, OverlayGeometry};
use super::window::{OverlayWindow, WindowError};

struct OverlayShared {
    window: Arc<dyn OverlayWindow>,
    visible: watch::Sender<bool>,
    auto_resize: watch::Sender<bool>,
    content: watch::Sender<Option<ContentBox>>,
    applied: watch::Sender<Option<OverlayGeometry>>,
}

/// Shared handle to the overlay window and its observable state.
#[derive(Clone)]
pub struct OverlayHandle {
    shared: Arc<OverlayShared>,
}

impl OverlayHandle {
    pub fn new(window: Arc<dyn OverlayWindow>) -> Self {
        Self {
            shared: Arc::new(OverlayShared {
                window,
                visible: watch::channel(false).0,
                auto_resize: watch::channel(true).0,
                content: watch::channel(None).0,
                applied: watch::channel(None).0,
            }),
        }
    }

    pub fn window(&self) -> Arc<dyn OverlayWindow> {
        Arc::clone(&self.shared.window)
    }

    /// Show or hide the window. Observers only hear about actual changes.
    pub async fn set_visible(&self, visible: bool) {
        let result = if visible {
            self.shared.window.show().await
        } else {
            self.shared.window.hide().await
        };
        if let Err(e) = result {
            warn!("Failed to {} overlay: {}", if visible { "show" } else { "hide" }, e);
        }

        let changed = self.shared.visible.send_if_modified(|current| {
            if *current == visible {
                false
            } else {
                *current = visible;
                true
            }
        });
        if changed {
            info!("Overlay {}", if visible { "shown" } else { "hidden" });
        }
    }

    pub fn is_visible(&self) -> bool {
        *self.shared.visible.borrow()
    }

    pub fn set_auto_resize(&self, enabled: bool) {
        self.shared.auto_resize.send_if_modified(|current| {
            let changed = *current != enabled;
            *current = enabled;
            changed
        });
    }

    pub fn auto_resize(&self) -> bool {
        *self.shared.auto_resize.borrow()
    }

    /// The overlay content was measured at a new size.
    pub fn content_resized(&self, content: ContentBox) {
        self.shared.content.send_replace(Some(content));
    }

    pub fn content(&self) -> Option<ContentBox> {
        *self.shared.content.borrow()
    }

    /// Geometry most recently applied by the controller.
    pub fn applied_geometry(&self) -> Option<OverlayGeometry> {
        *self.shared.applied.borrow()
    }

    /// Re-run layout against the current content box, even if it has not
    /// changed since the last pass.
    pub fn relayout(&self) {
        self.shared.content.send_modify(|_| {});
    }
}

pub struct GeometryController {
    overlay: OverlayHandle,
}

impl GeometryController {
    pub fn spawn(overlay: OverlayHandle) -> JoinHandle<()> {
        tokio::spawn(Self { overlay }.run())
    }

    async fn run(self) {
        let shared = &self.overlay.shared;
        let mut visible_rx = shared.visible.subscribe();
        let mut auto_rx = shared.auto_resize.subscribe();
        let mut content_rx = shared.content.subscribe();

        loop {
            // Dormant until the overlay is visible with auto-resize on.
            loop {
                let visible = *visible_rx.borrow_and_update();
                let auto_resize = *auto_rx.borrow_and_update();
                if visible && auto_resize {
                    break;
                }
                tokio::select! {
                    changed = visible_rx.changed() => if changed.is_err() { return },
                    changed = auto_rx.changed() => if changed.is_err() { return },
                }
            }

            let monitor = self.monitor_bounds().await;
            debug!("Geometry observation started (monitor: {:?})", monitor);
            self.apply(&mut content_rx, monitor).await;

            loop {
                // Suspension wins over a pending measurement.
                tokio::select! {
                    biased;
                    changed = visible_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if !*visible_rx.borrow_and_update() {
                            break;
                        }
                    }
                    changed = auto_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if !*auto_rx.borrow_and_update() {
                            break;
                        }
                    }
                    changed = content_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        self.apply(&mut content_rx, monitor).await;
                    }
                }
            }
            debug!("Geometry observation stopped");
        }
    }

    /// Resize to the latest content box, then clamp the position.
    async fn apply(
        &self,
        content_rx: &mut watch::Receiver<Option<ContentBox>>,
        monitor: Option<MonitorBounds>,
    ) {
        let Some(content) = *content_rx.borrow_and_update() else {
            return;
        };
        if !self.overlay.is_visible() || !self.overlay.auto_resize() {
            debug!("Overlay suspended, not applying {:?}", content);
            return;
        }
        let window = &self.overlay.shared.window;

        let (width, height) = content.window_size();
        let size = LogicalSize {
            width: width as f64,
            height: height as f64,
        };
        if let Err(e) = window.set_size(size).await {
            warn!("Failed to resize overlay to {}x{}: {}", width, height, e);
            return;
        }

        // A newer measurement arrived while resizing; it will be applied next.
        if content_rx.has_changed().unwrap_or(false) {
            debug!("Skipping stale geometry for {}x{}", width, height);
            return;
        }

        let current = match self.current_position().await {
            Ok(position) => position,
            Err(e) => {
                debug!("Position unavailable, leaving overlay in place: {}", e);
                return;
            }
        };

        let Some(mut geometry) = layout(content, monitor, current, true) else {
            return;
        };

        if geometry.position() != current {
            if let Err(e) = window.set_position(geometry.position()).await {
                debug!("Failed to reposition overlay: {}", e);
                geometry.x = current.x;
                geometry.y = current.y;
            }
        }

        self.overlay.shared.applied.send_replace(Some(geometry));
    }

    async fn current_position(&self) -> Result<LogicalPosition, WindowError> {
        let window = &self.overlay.shared.window;
        let scale = window.scale_factor().await?;
        let outer = window.outer_position().await?;
        Ok(LogicalPosition::from_physical(outer, scale))
    }

    async fn monitor_bounds(&self) -> Option<MonitorBounds> {
        let window = &self.overlay.shared.window;
        let scale = match window.scale_factor().await {
            Ok(scale) => scale,
            Err(e) => {
                debug!("Scale factor unavailable, skipping clamping: {}", e);
                return None;
            }
        };
        match window.current_monitor().await {
            Ok(Some(size)) => Some(MonitorBounds::from_physical(size, scale)),
            Ok(None) => None,
            Err(e) => {
                debug!("Monitor size unavailable, skipping clamping: {}", e);
                None
            }
        }
    }
}
