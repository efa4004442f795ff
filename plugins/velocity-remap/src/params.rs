//! The plugin's parameter table.

use std::fmt;

/// Stable parameter identifiers, as exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    NoteOnVelocity = 0,
    Bypass = 1,
}

impl ParamId {
    pub const ALL: [ParamId; 2] = [ParamId::NoteOnVelocity, ParamId::Bypass];

    pub fn from_raw(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|param| param.raw() == id)
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn raw(self) -> u32 {
        self as u32
    }

    /// The key used for this parameter in editor messages.
    pub fn key(self) -> &'static str {
        match self {
            ParamId::NoteOnVelocity => "velocity",
            ParamId::Bypass => "bypass",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|param| param.key() == key)
    }

    pub fn descriptor(self) -> &'static ParamDescriptor {
        match self {
            ParamId::NoteOnVelocity => &NOTE_ON_VELOCITY,
            ParamId::Bypass => &BYPASS,
        }
    }
}

/// Static metadata for one parameter.
#[derive(Debug)]
pub struct ParamDescriptor {
    pub id: ParamId,
    pub name: &'static str,
    pub module: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub stepped: bool,
    /// Appended to the value when shown to the user.
    pub suffix: &'static str,
}

pub const NOTE_ON_VELOCITY: ParamDescriptor = ParamDescriptor {
    id: ParamId::NoteOnVelocity,
    name: "Note On Velocity",
    module: "MIDI",
    min: 0.0,
    max: 127.0,
    default: 1.0,
    stepped: true,
    suffix: " Volume",
};

pub const BYPASS: ParamDescriptor = ParamDescriptor {
    id: ParamId::Bypass,
    name: "Bypass",
    module: "",
    min: 0.0,
    max: 1.0,
    default: 1.0,
    stepped: true,
    suffix: " Bypass",
};

impl ParamDescriptor {
    /// Constrains a value to the parameter's range.
    ///
    /// Stepped values are stored as given. The processor truncates them
    /// when it reads them, so `0.6` bypass still engages the override.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }

        value.clamp(self.min, self.max)
    }

    pub fn display(&self, value: f32) -> ParamDisplay<'_> {
        ParamDisplay {
            descriptor: self,
            value,
        }
    }

    /// Parses user text such as `"64"` or `"64 Volume"`.
    pub fn parse(&self, text: &str) -> Option<f32> {
        let text = text.trim();
        let number = text
            .strip_suffix(self.suffix.trim())
            .unwrap_or(text)
            .trim();
        let value: f32 = number.parse().ok()?;
        Some(self.clamp(value))
    }
}

/// Formats a parameter value the way the editor's popups show it.
pub struct ParamDisplay<'a> {
    descriptor: &'a ParamDescriptor,
    value: f32,
}

impl fmt::Display for ParamDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descriptor.stepped {
            write!(f, "{}{}", self.value.trunc(), self.descriptor.suffix)
        } else {
            write!(f, "{:.2}{}", self.value, self.descriptor.suffix)
        }
    }
}
