use crate::directories::global_data_dir;
use crate::gui::dpi::{GuiSizeExtensions, LogicalSizeExtensions};
use crate::main_thread::VelocityRemapMainThread;
use clack_extensions::gui::{
    AspectRatioStrategy, GuiApiType, GuiConfiguration, GuiResizeHints, GuiSize, PluginGuiImpl,
    Window,
};
use clack_extensions::params::HostParams;
use clack_extensions::timer::{HostTimer, PluginTimerImpl, TimerId};
use clack_plugin::prelude::*;
use std::env;
use std::num::{NonZeroIsize, NonZeroU32};
use std::ptr::NonNull;
use wry::dpi::{LogicalSize, PhysicalPosition, Position};
use wry::raw_window_handle::{
    AppKitWindowHandle, RawWindowHandle, Win32WindowHandle, WindowHandle, XcbWindowHandle,
};
use wry::{Rect, WebViewBuilder};

mod dpi;
pub mod editor;

pub const DEFAULT_GUI_SIZE: LogicalSize<f64> = LogicalSize::new(500.0, 500.0);
pub const MIN_GUI_SIZE: LogicalSize<f64> = LogicalSize::new(300.0, 200.0);
pub const MAX_GUI_SIZE: LogicalSize<f64> = LogicalSize::new(4000.0, 4000.0);

/// How often the editor pulls fresh values from the processor.
const REFRESH_PERIOD_MS: u32 = 33;

impl VelocityRemapMainThread<'_> {
    /// Redraws the page with the processor's current values.
    fn refresh_editor(&mut self) {
        let Some(web_view) = &self.web_view else {
            return;
        };

        let result = editor::update_script(&self.shared.readout(), self.gui_size)
            .map_err(|e| e.to_string())
            .and_then(|script| web_view.evaluate_script(&script).map_err(|e| e.to_string()));

        if let Err(error) = result {
            tracing::warn!(%error, "failed to refresh editor");
        }
    }

    /// Asks the host for a params flush so editor changes reach it
    /// even while no audio is being processed.
    fn request_param_flush(&mut self) {
        if !self.shared.take_flush_request() {
            return;
        }

        let host = self.host.shared();
        match host.get_extension::<HostParams>() {
            Some(params) => params.request_flush(&host),
            None => tracing::warn!("host has no params support, editor changes wait for processing"),
        }
    }

    fn start_refresh_timer(&mut self) {
        let Some(timer) = self.host.shared().get_extension::<HostTimer>() else {
            tracing::warn!("host has no timer support, editor will not refresh");
            return;
        };

        match timer.register_timer(&mut self.host, REFRESH_PERIOD_MS) {
            Ok(id) => self.refresh_timer = Some(id),
            Err(error) => tracing::warn!(?error, "failed to register editor timer"),
        }
    }

    fn stop_refresh_timer(&mut self) {
        let Some(id) = self.refresh_timer.take() else {
            return;
        };

        if let Some(timer) = self.host.shared().get_extension::<HostTimer>() {
            if let Err(error) = timer.unregister_timer(&mut self.host, id) {
                tracing::warn!(?error, "failed to unregister editor timer");
            }
        }
    }
}

impl PluginTimerImpl for VelocityRemapMainThread<'_> {
    fn on_timer(&mut self, timer_id: TimerId) {
        if self.refresh_timer == Some(timer_id) {
            self.request_param_flush();
            self.refresh_editor();
        }
    }
}

/// Implements the CLAP GUI extension.
///
/// This implementation allows for resizing
/// between [MIN_GUI_SIZE] and [MAX_GUI_SIZE].
impl PluginGuiImpl for VelocityRemapMainThread<'_> {
    fn is_api_supported(&mut self, configuration: GuiConfiguration) -> bool {
        self.get_preferred_api() == Some(configuration)
    }

    fn get_preferred_api(&mut self) -> Option<GuiConfiguration> {
        Some(GuiConfiguration {
            api_type: GuiApiType::default_for_current_platform()?,
            // no known host supports floating mode at this time
            is_floating: false,
        })
    }

    fn create(&mut self, configuration: GuiConfiguration) -> Result<(), PluginError> {
        if !self.is_api_supported(configuration) {
            tracing::warn!(?configuration, "rejected GUI configuration");
            return Err(PluginError::Message("Unsupported GUI configuration"));
        }

        // the web view is built in set_parent,
        // since wry needs the parent window.
        Ok(())
    }

    fn destroy(&mut self) {
        self.stop_refresh_timer();
        self.web_view.take();
    }

    fn set_scale(&mut self, scale: f64) -> Result<(), PluginError> {
        self.scale_factor = scale;
        Ok(())
    }

    fn get_size(&mut self) -> Option<GuiSize> {
        Some(self.gui_size.to_host_size(self.scale_factor))
    }

    fn can_resize(&mut self) -> bool {
        true
    }

    fn get_resize_hints(&mut self) -> Option<GuiResizeHints> {
        Some(GuiResizeHints {
            can_resize_horizontally: true,
            can_resize_vertically: true,
            strategy: AspectRatioStrategy::Disregard,
        })
    }

    fn adjust_size(&mut self, size: GuiSize) -> Option<GuiSize> {
        let mut size = size.to_logical(self.scale_factor);

        size.width = size.width.clamp(MIN_GUI_SIZE.width, MAX_GUI_SIZE.width);
        size.height = size.height.clamp(MIN_GUI_SIZE.height, MAX_GUI_SIZE.height);

        Some(size.to_host_size(self.scale_factor))
    }

    fn set_size(&mut self, size: GuiSize) -> Result<(), PluginError> {
        self.gui_size = size.to_logical(self.scale_factor);
        if let Some(web_view) = &mut self.web_view {
            web_view.set_bounds(Rect {
                position: Position::Physical(PhysicalPosition::new(0, 0)),
                size: self.gui_size.to_webview_size(self.scale_factor),
            })?;
        }

        // slider positions depend on the size
        self.refresh_editor();
        Ok(())
    }

    fn set_parent(&mut self, parent: Window) -> Result<(), PluginError> {
        let raw = if cfg!(target_os = "macos") {
            parent
                .as_cocoa_nsview()
                .and_then(NonNull::new)
                .map(|view| RawWindowHandle::AppKit(AppKitWindowHandle::new(view)))
        } else if cfg!(target_os = "windows") {
            parent
                .as_win32_hwnd()
                .and_then(|hwnd| NonZeroIsize::new(hwnd as isize))
                .map(|hwnd| RawWindowHandle::Win32(Win32WindowHandle::new(hwnd)))
        } else {
            parent
                .as_x11_handle()
                .and_then(|window| NonZeroU32::new(window as u32))
                .map(|window| RawWindowHandle::Xcb(XcbWindowHandle::new(window)))
        };
        let raw = raw.ok_or(PluginError::Message("Unsupported parent window"))?;

        // SAFETY: the host keeps the parent window alive
        // until destroy is called, which drops the web view.
        let parent = unsafe { WindowHandle::borrow_raw(raw) };

        if cfg!(target_os = "windows") {
            // WebView2 crashes on Windows if no valid data directory is set.
            // The environment variable only changes for this process.
            match global_data_dir() {
                Some(dir) => env::set_var("WEBVIEW2_USER_DATA_FOLDER", dir.join("webview2")),
                None => tracing::warn!("no data directory available for WebView2"),
            }
        }

        let readout = self.shared.readout();
        let initial_frame = editor::initialization_script(&readout, self.gui_size)?;
        let shared = self.shared.clone();

        self.web_view = Some(
            WebViewBuilder::new()
                .with_html(include_str!("index.html"))
                .with_initialization_script(initial_frame.as_str())
                .with_devtools(cfg!(debug_assertions))
                .with_bounds(Rect {
                    position: Position::Physical(PhysicalPosition::new(0, 0)),
                    size: self.gui_size.to_webview_size(self.scale_factor),
                })
                .with_ipc_handler(move |request| {
                    if let Err(error) = editor::handle_message(&shared, request.body()) {
                        tracing::warn!(%error, "ignoring editor message");
                    }
                })
                // open any website links in the browser instead of the UI webview
                .with_navigation_handler(|url| {
                    if url.starts_with("http") {
                        if let Err(error) = open::that(&url) {
                            tracing::warn!(%error, %url, "failed to open link");
                        }
                        false
                    } else {
                        true
                    }
                })
                .build_as_child(&parent)?,
        );

        self.start_refresh_timer();
        tracing::info!(size = ?self.gui_size, "editor opened");
        Ok(())
    }

    fn set_transient(&mut self, _window: Window) -> Result<(), PluginError> {
        // does not apply to parented windows
        Ok(())
    }

    fn show(&mut self) -> Result<(), PluginError> {
        // does not apply to parented windows
        Ok(())
    }

    fn hide(&mut self) -> Result<(), PluginError> {
        // does not apply to parented windows
        Ok(())
    }
}
