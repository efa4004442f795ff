//! The velocity override on raw MIDI, driven by the shared parameter state,
//! checked against arbitrary MIDI traffic.

use proptest::prelude::*;
use velocity_remap::midi::{self, MidiMessage};
use velocity_remap::params::ParamId;
use velocity_remap::shared::VelocityRemapShared;

/// Applies the override to a block of raw MIDI as configured in `shared`.
fn remap_block(shared: &VelocityRemapShared, block: &[[u8; 3]]) -> Vec<[u8; 3]> {
    if !midi::is_engaged(shared.bypass()) {
        return block.to_vec();
    }

    let velocity = midi::velocity_byte(shared.note_on_velocity());
    block
        .iter()
        .map(|message| midi::remap_midi(*message, velocity))
        .collect()
}

fn midi_message() -> impl Strategy<Value = [u8; 3]> {
    (0x80u8..=0xEF, 0u8..=127, 0u8..=127).prop_map(|(status, a, b)| [status, a, b])
}

proptest! {
    #[test]
    fn engaged_override_rewrites_only_note_ons(
        block in prop::collection::vec(midi_message(), 0..64),
        velocity in 0.0f32..=127.0,
        bypass in 0.0f32..1.0,
    ) {
        let shared = VelocityRemapShared::new();
        shared.set(ParamId::NoteOnVelocity, velocity);
        shared.set(ParamId::Bypass, bypass);
        prop_assert!(midi::is_engaged(shared.bypass()));

        let stored = midi::velocity_byte(shared.note_on_velocity());
        let output = remap_block(&shared, &block);

        prop_assert_eq!(output.len(), block.len());
        for (before, after) in block.iter().zip(&output) {
            if MidiMessage::parse(*before).is_note_on() {
                prop_assert_eq!(&after[..2], &before[..2]);
                prop_assert_eq!(after[2], stored);
            } else {
                prop_assert_eq!(after, before);
            }
        }
    }

    #[test]
    fn stored_velocity_is_truncated(velocity in 0.0f32..=127.0) {
        let shared = VelocityRemapShared::new();
        shared.set(ParamId::NoteOnVelocity, velocity);
        shared.set(ParamId::Bypass, 0.0);

        let out = remap_block(&shared, &[[0x90, 60, 100]]);
        prop_assert_eq!(out[0][2], velocity.trunc() as u8);
    }

    #[test]
    fn bypassed_blocks_are_untouched(
        block in prop::collection::vec(midi_message(), 0..64),
        velocity in 0.0f32..=127.0,
    ) {
        let shared = VelocityRemapShared::new();
        shared.set(ParamId::NoteOnVelocity, velocity);
        shared.set(ParamId::Bypass, 1.0);

        prop_assert_eq!(remap_block(&shared, &block), block);
    }
}

#[test]
fn defaults_leave_the_plugin_bypassed() {
    let shared = VelocityRemapShared::new();
    let block = [[0x90, 60, 100], [0x80, 60, 0]];
    assert_eq!(remap_block(&shared, &block), block.to_vec());
}

#[test]
fn fractional_bypass_engages() {
    let shared = VelocityRemapShared::new();
    shared.set(ParamId::NoteOnVelocity, 64.9);
    shared.set(ParamId::Bypass, 0.6);

    assert_eq!(remap_block(&shared, &[[0x90, 60, 100]]), vec![[0x90, 60, 64]]);
}

#[test]
fn engaging_forces_the_stored_velocity() {
    let shared = VelocityRemapShared::new();
    shared.set(ParamId::NoteOnVelocity, 42.0);
    shared.set(ParamId::Bypass, 0.0);

    let block = [[0x90, 60, 100], [0x91, 64, 1], [0x90, 67, 0], [0xB0, 64, 127]];
    assert_eq!(
        remap_block(&shared, &block),
        vec![[0x90, 60, 42], [0x91, 64, 42], [0x90, 67, 0], [0xB0, 64, 127]]
    );
}
