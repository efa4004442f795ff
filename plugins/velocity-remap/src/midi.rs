//! The note-on velocity override.
//!
//! Everything in here works on plain values so that it can run
//! on the audio thread and be tested without a host.

/// Highest valid 7-bit MIDI data value.
pub const MAX_VELOCITY: u8 = 127;

const STATUS_NOTE_OFF: u8 = 0x80;
const STATUS_NOTE_ON: u8 = 0x90;

/// A coarse classification of a 3-byte MIDI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    Other,
}

impl MidiMessage {
    /// Classifies a raw message.
    ///
    /// A note-on with velocity 0 is a note-off by MIDI convention.
    pub fn parse(data: [u8; 3]) -> Self {
        let [status, key, velocity] = data;
        let channel = status & 0x0F;
        let (key, velocity) = (key & 0x7F, velocity & 0x7F);

        match status & 0xF0 {
            STATUS_NOTE_ON if velocity > 0 => MidiMessage::NoteOn {
                channel,
                key,
                velocity,
            },
            STATUS_NOTE_ON | STATUS_NOTE_OFF => MidiMessage::NoteOff {
                channel,
                key,
                velocity,
            },
            _ => MidiMessage::Other,
        }
    }

    pub fn is_note_on(&self) -> bool {
        matches!(self, MidiMessage::NoteOn { .. })
    }
}

/// Whether the override is active for the given bypass value.
///
/// The value is truncated towards zero into a byte first,
/// so anything below `1.0` engages the override.
/// Negative values and NaN saturate to zero.
pub fn is_engaged(bypass: f32) -> bool {
    bypass as u8 == 0
}

/// Truncates a stored velocity to a 7-bit MIDI velocity.
pub fn velocity_byte(velocity: f32) -> u8 {
    (velocity as u8).min(MAX_VELOCITY)
}

/// Maps a 7-bit velocity onto the 0..1 range used by CLAP note events.
pub fn normalized_velocity(velocity: u8) -> f64 {
    f64::from(velocity.min(MAX_VELOCITY)) / f64::from(MAX_VELOCITY)
}

/// Rewrites the velocity of a note-on message, keeping channel and key.
/// Every other message is returned as is.
pub fn remap_midi(data: [u8; 3], velocity: u8) -> [u8; 3] {
    match MidiMessage::parse(data) {
        MidiMessage::NoteOn { .. } => [data[0], data[1], velocity.min(MAX_VELOCITY)],
        _ => data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engaged_only_when_bypass_truncates_to_zero() {
        assert!(is_engaged(0.0));
        assert!(is_engaged(0.99));
        assert!(is_engaged(-3.0));
        assert!(is_engaged(f32::NAN));
        assert!(!is_engaged(1.0));
        assert!(!is_engaged(1.5));
        assert!(!is_engaged(300.0));
    }

    #[test]
    fn velocity_byte_truncates_and_clamps() {
        assert_eq!(velocity_byte(64.9), 64);
        assert_eq!(velocity_byte(127.0), 127);
        assert_eq!(velocity_byte(200.0), 127);
        assert_eq!(velocity_byte(-1.0), 0);
    }

    #[test]
    fn note_on_velocity_is_replaced() {
        assert_eq!(remap_midi([0x93, 60, 100], 42), [0x93, 60, 42]);
    }

    #[test]
    fn note_on_with_zero_velocity_is_a_note_off() {
        assert_eq!(
            MidiMessage::parse([0x90, 60, 0]),
            MidiMessage::NoteOff {
                channel: 0,
                key: 60,
                velocity: 0
            }
        );
        assert_eq!(remap_midi([0x90, 60, 0], 42), [0x90, 60, 0]);
    }

    #[test]
    fn other_messages_pass_through() {
        // note off, control change, pitch bend
        for message in [[0x80, 60, 64], [0xB2, 7, 100], [0xE0, 0, 64]] {
            assert_eq!(remap_midi(message, 42), message);
        }
    }

    #[test]
    fn normalized_velocity_spans_unit_range() {
        assert_eq!(normalized_velocity(0), 0.0);
        assert_eq!(normalized_velocity(127), 1.0);
    }
}
