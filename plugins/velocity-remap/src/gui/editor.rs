//! Layout and messaging for the web-based editor.
//!
//! The page itself lives in `index.html`. It reports slider changes
//! through the IPC channel and is redrawn by evaluating [update_script]
//! on every editor timer tick.

use crate::params::ParamId;
use crate::shared::{Readout, VelocityRemapShared};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wry::dpi::LogicalSize;

pub const EDITOR_LABEL: &str = "Editor";
pub const TITLE_LABEL: &str = "Midi Volume 3";
pub const PROCESSOR_LABEL: &str = "Processor";

const SLIDER_MARGIN_X: f64 = 40.0;
const SLIDER_MARGIN_Y: f64 = 30.0;
const SLIDER_WIDTH: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliderBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where the two sliders sit inside the editor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EditorLayout {
    pub velocity: SliderBounds,
    pub bypass: SliderBounds,
}

impl EditorLayout {
    /// The velocity slider hugs the left edge, the bypass slider the right one.
    /// Both span the full height minus the vertical margins.
    pub fn for_size(size: LogicalSize<f64>) -> Self {
        let height = (size.height - 2.0 * SLIDER_MARGIN_Y).max(0.0);

        Self {
            velocity: SliderBounds {
                x: SLIDER_MARGIN_X,
                y: SLIDER_MARGIN_Y,
                width: SLIDER_WIDTH,
                height,
            },
            bypass: SliderBounds {
                x: size.width - (SLIDER_MARGIN_X + SLIDER_WIDTH),
                y: SLIDER_MARGIN_Y,
                width: SLIDER_WIDTH,
                height,
            },
        }
    }
}

/// Messages sent by the page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorMessage {
    /// The page finished loading.
    Ready,
    /// A slider moved.
    Set { param: String, value: f32 },
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("malformed editor message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown parameter '{0}'")]
    UnknownParam(String),
}

/// What the page sees on every redraw.
#[derive(Debug, Serialize)]
struct EditorFrame<'a> {
    editor: &'static str,
    title: &'static str,
    processor: &'static str,
    layout: EditorLayout,
    meter: MeterFrame,
    #[serde(flatten)]
    readout: &'a Readout,
}

#[derive(Debug, Serialize)]
struct MeterFrame {
    left: f32,
    right: f32,
}

/// Applies a message from the page.
pub fn handle_message(shared: &VelocityRemapShared, body: &str) -> Result<(), EditorError> {
    match serde_json::from_str(body)? {
        EditorMessage::Ready => tracing::debug!("editor page loaded"),
        EditorMessage::Set { param, value } => {
            let id = ParamId::from_key(&param).ok_or(EditorError::UnknownParam(param))?;
            tracing::debug!(param = id.key(), value, "parameter changed in editor");
            shared.set_from_editor(id, value);
        }
    }

    Ok(())
}

/// Builds the script that redraws the page with the current values.
pub fn update_script(readout: &Readout, size: LogicalSize<f64>) -> Result<String, EditorError> {
    Ok(format!(
        "window.velocityRemap && window.velocityRemap.update({});",
        frame_json(readout, size)?
    ))
}

/// Builds the script that hands the first frame to the page before it loads.
pub fn initialization_script(
    readout: &Readout,
    size: LogicalSize<f64>,
) -> Result<String, EditorError> {
    Ok(format!(
        "window.velocityRemapInitialFrame = {};",
        frame_json(readout, size)?
    ))
}

fn frame_json(readout: &Readout, size: LogicalSize<f64>) -> Result<String, EditorError> {
    use crate::meter::{gain_to_db, meter_fill};

    let frame = EditorFrame {
        editor: EDITOR_LABEL,
        title: TITLE_LABEL,
        processor: PROCESSOR_LABEL,
        layout: EditorLayout::for_size(size),
        meter: MeterFrame {
            left: meter_fill(gain_to_db(readout.rms_left)),
            right: meter_fill(gain_to_db(readout.rms_right)),
        },
        readout,
    };

    Ok(serde_json::to_string(&frame)?)
}
