//! Temporary "expanded" overlay while OS permission prompts may be shown.

use std::sync::Arc;
use tracing::{debug, warn};

use super::controller::OverlayHandle;
use crate::host::HostBridge;

/// Holds the overlay expanded with auto-resize off. Compact sizing is
/// restored by [`ExpandGuard::restore`], or on drop if the holder never got
/// there (error or cancellation).
pub struct ExpandGuard {
    host: Arc<dyn HostBridge>,
    overlay: OverlayHandle,
    restored: bool,
}

impl ExpandGuard {
    /// Best effort: a failing expand is logged and acquisition goes on.
    pub async fn enter(host: Arc<dyn HostBridge>, overlay: OverlayHandle) -> Self {
        overlay.set_auto_resize(false);
        if let Err(e) = host.expand_overlay().await {
            debug!("expand_overlay failed, continuing compact: {}", e);
        }
        Self {
            host,
            overlay,
            restored: false,
        }
    }

    pub async fn restore(mut self) {
        self.restored = true;
        restore_compact(self.host.as_ref(), &self.overlay).await;
    }
}

impl Drop for ExpandGuard {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        warn!("Overlay left expanded, restoring compact size");
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let host = Arc::clone(&self.host);
                let overlay = self.overlay.clone();
                runtime.spawn(async move {
                    restore_compact(host.as_ref(), &overlay).await;
                });
            }
            Err(_) => self.overlay.set_auto_resize(true),
        }
    }
}

/// Return to compact size, then hand sizing back to the geometry controller.
///
/// The host's compact size is fixed, so a layout pass is always requested
/// afterwards to bring the window back to its content.
pub async fn restore_compact(host: &dyn HostBridge, overlay: &OverlayHandle) {
    if let Err(e) = host.restore_overlay().await {
        debug!("restore_overlay failed: {}", e);
    }
    overlay.set_auto_resize(true);
    overlay.relayout();
}
