//! The document saved into host projects.
//!
//! ```json
//! {"version":1,"note_on_velocity":64.0,"bypass":0.0,"gui":{"width":500.0,"height":500.0}}
//! ```

use crate::gui::{DEFAULT_GUI_SIZE, MAX_GUI_SIZE, MIN_GUI_SIZE};
use crate::params::ParamId;
use crate::shared::VelocityRemapShared;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;
use wry::dpi::LogicalSize;

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read state: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write state: {0}")]
    Write(#[source] std::io::Error),

    #[error("malformed state document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported state version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiState {
    pub width: f64,
    pub height: f64,
}

impl Default for GuiState {
    fn default() -> Self {
        Self {
            width: DEFAULT_GUI_SIZE.width,
            height: DEFAULT_GUI_SIZE.height,
        }
    }
}

impl GuiState {
    pub fn from_size(size: LogicalSize<f64>) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }

    /// The stored size, constrained to the editor's limits.
    pub fn size(&self) -> LogicalSize<f64> {
        let clamp = |value: f64, min: f64, max: f64, default: f64| {
            if value.is_finite() {
                value.clamp(min, max)
            } else {
                default
            }
        };

        LogicalSize::new(
            clamp(self.width, MIN_GUI_SIZE.width, MAX_GUI_SIZE.width, DEFAULT_GUI_SIZE.width),
            clamp(self.height, MIN_GUI_SIZE.height, MAX_GUI_SIZE.height, DEFAULT_GUI_SIZE.height),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginStateDocument {
    pub version: u32,
    pub note_on_velocity: f32,
    pub bypass: f32,
    pub gui: GuiState,
}

impl Default for PluginStateDocument {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            note_on_velocity: ParamId::NoteOnVelocity.descriptor().default,
            bypass: ParamId::Bypass.descriptor().default,
            gui: GuiState::default(),
        }
    }
}

impl PluginStateDocument {
    pub fn capture(shared: &VelocityRemapShared, gui_size: LogicalSize<f64>) -> Self {
        Self {
            version: STATE_VERSION,
            note_on_velocity: shared.note_on_velocity(),
            bypass: shared.bypass(),
            gui: GuiState::from_size(gui_size),
        }
    }

    /// Writes the parameter values back. Out-of-range values are clamped.
    pub fn apply(&self, shared: &VelocityRemapShared) {
        shared.set(ParamId::NoteOnVelocity, self.note_on_velocity);
        shared.set(ParamId::Bypass, self.bypass);
    }

    pub fn write_to(&self, output: &mut impl Write) -> Result<(), StateError> {
        let json = serde_json::to_vec(self)?;
        output.write_all(&json).map_err(StateError::Write)
    }

    pub fn read_from(input: &mut impl Read) -> Result<Self, StateError> {
        let mut buf = Vec::new();
        input.read_to_end(&mut buf).map_err(StateError::Read)?;

        let document: Self = serde_json::from_slice(&buf)?;
        if document.version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion(document.version));
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_values_are_restored() {
        let shared = VelocityRemapShared::new();
        shared.set(ParamId::NoteOnVelocity, 100.0);
        shared.set(ParamId::Bypass, 0.0);

        let mut bytes = Vec::new();
        PluginStateDocument::capture(&shared, LogicalSize::new(800.0, 600.0))
            .write_to(&mut bytes)
            .unwrap();

        let restored = VelocityRemapShared::new();
        let document = PluginStateDocument::read_from(&mut bytes.as_slice()).unwrap();
        document.apply(&restored);

        assert_eq!(restored.note_on_velocity(), 100.0);
        assert_eq!(restored.bypass(), 0.0);
        assert_eq!(document.gui.size(), LogicalSize::new(800.0, 600.0));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let document = PluginStateDocument::read_from(&mut &b"{\"note_on_velocity\":12}"[..]).unwrap();
        assert_eq!(document.note_on_velocity, 12.0);
        assert_eq!(document.bypass, ParamId::Bypass.descriptor().default);
        assert_eq!(document.gui, GuiState::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let document = PluginStateDocument {
            note_on_velocity: 1000.0,
            gui: GuiState {
                width: 1.0,
                height: f64::INFINITY,
            },
            ..Default::default()
        };

        let shared = VelocityRemapShared::new();
        document.apply(&shared);
        assert_eq!(shared.note_on_velocity(), 127.0);
        assert_eq!(
            document.gui.size(),
            LogicalSize::new(MIN_GUI_SIZE.width, DEFAULT_GUI_SIZE.height)
        );
    }

    #[test]
    fn rejects_garbage_and_unknown_versions() {
        assert!(matches!(
            PluginStateDocument::read_from(&mut &b"not json"[..]),
            Err(StateError::Json(_))
        ));
        assert!(matches!(
            PluginStateDocument::read_from(&mut &b"{\"version\":7}"[..]),
            Err(StateError::UnsupportedVersion(7))
        ));
    }
}
