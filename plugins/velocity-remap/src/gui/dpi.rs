use clack_extensions::gui::{GuiApiType, GuiSize};
use wry::dpi::{LogicalSize, Size};

/// Whether [GuiSize] values exchanged with the host are in logical pixels
/// on this platform. Physical pixels are assumed otherwise.
pub(super) fn host_uses_logical_size() -> bool {
    GuiApiType::default_for_current_platform().is_some_and(|api| api.uses_logical_size())
}

pub(super) trait LogicalSizeExtensions {
    /// Converts into the host's pixel format.
    fn to_host_size(&self, scale_factor: f64) -> GuiSize;
    /// Converts into the size given to the web view bounds.
    fn to_webview_size(&self, scale_factor: f64) -> Size;
}

pub(super) trait GuiSizeExtensions {
    /// Converts from the host's pixel format.
    fn to_logical(&self, scale_factor: f64) -> LogicalSize<f64>;
}

impl LogicalSizeExtensions for LogicalSize<f64> {
    fn to_host_size(&self, scale_factor: f64) -> GuiSize {
        let scale = if host_uses_logical_size() { 1.0 } else { scale_factor };

        GuiSize {
            width: (self.width * scale).round() as u32,
            height: (self.height * scale).round() as u32,
        }
    }

    fn to_webview_size(&self, scale_factor: f64) -> Size {
        if host_uses_logical_size() {
            Size::Logical(*self)
        } else {
            Size::Physical(self.to_physical(scale_factor))
        }
    }
}

impl GuiSizeExtensions for GuiSize {
    fn to_logical(&self, scale_factor: f64) -> LogicalSize<f64> {
        let scale = if host_uses_logical_size() || scale_factor <= 0.0 {
            1.0
        } else {
            scale_factor
        };

        LogicalSize {
            width: self.width as f64 / scale,
            height: self.height as f64 / scale,
        }
    }
}
