//! This module handles all CLAP callbacks that run on the audio thread.

use crate::main_thread::VelocityRemapMainThread;
use crate::meter;
use crate::midi;
use crate::params::ParamId;
use crate::shared::{DebugLines, VelocityRemapShared};
use clack_extensions::params::PluginAudioProcessorParams;
use clack_plugin::events::event_types::{MidiEvent, NoteOnEvent, ParamValueEvent};
use clack_plugin::events::spaces::CoreEventSpace;
use clack_plugin::events::{EventFlags, UnknownEvent};
use clack_plugin::prelude::*;
use clack_plugin::utils::Cookie;

pub struct VelocityRemapProcessor<'a> {
    #[allow(dead_code)] // only kept for the lifetime of the processor
    host: HostAudioProcessorHandle<'a>,

    shared: &'a VelocityRemapShared,

    /// The debug strings, refreshed every block.
    debug: DebugLines,
}

impl<'a> PluginAudioProcessor<'a, VelocityRemapShared, VelocityRemapMainThread<'a>>
    for VelocityRemapProcessor<'a>
{
    fn activate(
        host: HostAudioProcessorHandle<'a>,
        main_thread: &mut VelocityRemapMainThread<'a>,
        shared: &'a VelocityRemapShared,
        audio_config: PluginAudioConfiguration,
    ) -> Result<Self, PluginError> {
        if !main_thread.bus_layout.is_supported() {
            tracing::warn!(layout = ?main_thread.bus_layout, "refusing to activate");
            return Err(PluginError::Message("Unsupported bus layout"));
        }

        tracing::info!(
            sample_rate = audio_config.sample_rate,
            max_frames = audio_config.max_frames_count,
            layout = main_thread.bus_layout.name(),
            "activating audio processor"
        );

        shared.reset_block_count();
        let mut debug = DebugLines::new();
        debug.update(shared.note_on_velocity(), shared.bypass());

        Ok(Self {
            host,
            shared,
            debug,
        })
    }

    fn deactivate(self, _main_thread: &mut VelocityRemapMainThread<'a>) {
        tracing::info!(blocks = self.shared.block_count(), "deactivating audio processor");
    }

    /// While engaged, the audio is silenced and note-ons are forced
    /// to the stored velocity. Otherwise everything passes through.
    fn process(
        &mut self,
        _process: Process,
        mut audio: Audio,
        events: Events,
    ) -> Result<ProcessStatus, PluginError> {
        self.handle_param_events(events.input);
        report_editor_changes(self.shared, |event| events.output.try_push(event).is_ok());

        self.shared.count_block();
        let note_on_velocity = self.shared.note_on_velocity();
        let bypass = self.shared.bypass();
        self.debug.update(note_on_velocity, bypass);

        let engaged = midi::is_engaged(bypass);
        self.process_audio(&mut audio, engaged)?;

        let override_velocity = engaged.then(|| midi::velocity_byte(note_on_velocity));
        forward_note_events(events.input, override_velocity, |event| {
            events.output.try_push(event).is_ok()
        });

        Ok(ProcessStatus::ContinueIfNotQuiet)
    }
}

impl VelocityRemapProcessor<'_> {
    /// Applies parameter automation coming from the host.
    fn handle_param_events(&mut self, input: &InputEvents) {
        apply_param_events(self.shared, input);
    }

    fn process_audio(&mut self, audio: &mut Audio, engaged: bool) -> Result<(), PluginError> {
        let mut levels = [0.0f32; 2];
        let mut is_main_port = true;

        for mut port_pair in audio {
            let Some(channel_pairs) = port_pair.channels()?.into_f32() else {
                continue;
            };

            for (channel, pair) in channel_pairs.into_iter().enumerate() {
                let level = render_pair(pair, engaged);
                if is_main_port && channel < levels.len() {
                    levels[channel] = level;
                }
            }

            is_main_port = false;
        }

        self.shared.set_levels(levels[0], levels[1]);
        Ok(())
    }
}

impl PluginAudioProcessorParams for VelocityRemapProcessor<'_> {
    fn flush(&mut self, input: &InputEvents, output: &mut OutputEvents) {
        self.handle_param_events(input);
        report_editor_changes(self.shared, |event| output.try_push(event).is_ok());
    }
}

/// Writes every known parameter value event into the shared state.
pub(crate) fn apply_param_events(shared: &VelocityRemapShared, input: &InputEvents) {
    for event in input {
        let Some(CoreEventSpace::ParamValue(ev)) = event.as_core_event() else {
            continue;
        };
        if let Some(param) = ev.param_id().and_then(|id| ParamId::from_raw(id.get())) {
            shared.set(param, ev.value() as f32);
        }
    }
}

/// Reports parameter values changed in the editor back to the host.
///
/// `push` returns whether the host accepted the event. If any event is
/// refused, the change stays pending and is reported again next time.
pub(crate) fn report_editor_changes(
    shared: &VelocityRemapShared,
    mut push: impl FnMut(&UnknownEvent) -> bool,
) {
    if !shared.take_edited() {
        return;
    }

    for param in ParamId::ALL {
        let ev = ParamValueEvent::new(
            0,
            ClapId::new(param.raw()),
            Pckn::match_all(),
            f64::from(shared.get(param)),
            Cookie::empty(),
        )
        .with_flags(EventFlags::IS_LIVE);

        if !push(ev.as_ref()) {
            shared.mark_edited();
            return;
        }
    }
}

/// Renders one channel and returns the RMS level of its input.
pub(crate) fn render_pair(pair: ChannelPair<'_, f32>, engaged: bool) -> f32 {
    match pair {
        ChannelPair::InputOutput(input, output) => {
            let level = meter::rms(input);
            render_channel(input, output, engaged);
            level
        }
        ChannelPair::InPlace(buffer) => {
            let level = meter::rms(buffer);
            if engaged {
                buffer.fill(0.0);
            }
            level
        }
        ChannelPair::InputOnly(input) => meter::rms(input),
        ChannelPair::OutputOnly(output) => {
            output.fill(0.0);
            0.0
        }
    }
}

/// Writes one output channel: silence while engaged, the input otherwise.
pub(crate) fn render_channel(input: &[f32], output: &mut [f32], engaged: bool) {
    if engaged {
        output.fill(0.0);
    } else {
        for (out, sample) in output.iter_mut().zip(input) {
            *out = *sample;
        }
    }
}

/// Forwards all note and MIDI events through `push`.
///
/// With an override velocity, note-ons are rewritten to it on the way,
/// keeping their time, target and flags. Parameter events are consumed by
/// the plugin and not forwarded. Forwarding stops at the first event
/// `push` refuses.
pub(crate) fn forward_note_events(
    input: &InputEvents,
    override_velocity: Option<u8>,
    mut push: impl FnMut(&UnknownEvent) -> bool,
) {
    for event in input {
        let accepted = match (event.as_core_event(), override_velocity) {
            (Some(CoreEventSpace::ParamValue(_)), _) => continue,
            (Some(CoreEventSpace::NoteOn(note)), Some(velocity)) if note.velocity() > 0.0 => {
                let rewritten = NoteOnEvent::new(
                    note.header().time(),
                    note.pckn(),
                    midi::normalized_velocity(velocity),
                )
                .with_flags(note.header().flags());
                push(rewritten.as_ref())
            }
            (Some(CoreEventSpace::Midi(message)), Some(velocity)) => {
                let rewritten = MidiEvent::new(
                    message.header().time(),
                    message.port_index(),
                    midi::remap_midi(message.data(), velocity),
                )
                .with_flags(message.header().flags());
                push(rewritten.as_ref())
            }
            _ => push(event),
        };

        // the host's output queue is full, nothing more will fit this block
        if !accepted {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clack_plugin::events::event_types::NoteOffEvent;
    use clack_plugin::events::io::EventBuffer;
    use proptest::prelude::*;

    /// What reached the host, reduced to the fields the override touches.
    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        NoteOn { velocity: f64, flags: EventFlags },
        NoteOff { velocity: f64 },
        Midi([u8; 3]),
        Param { id: u32, value: f64 },
    }

    fn sent(event: &UnknownEvent) -> Sent {
        match event.as_core_event() {
            Some(CoreEventSpace::NoteOn(note)) => Sent::NoteOn {
                velocity: note.velocity(),
                flags: note.header().flags(),
            },
            Some(CoreEventSpace::NoteOff(note)) => Sent::NoteOff {
                velocity: note.velocity(),
            },
            Some(CoreEventSpace::Midi(message)) => Sent::Midi(message.data()),
            Some(CoreEventSpace::ParamValue(ev)) => Sent::Param {
                id: ev.param_id().map_or(u32::MAX, |id| id.get()),
                value: ev.value(),
            },
            _ => panic!("unexpected event forwarded"),
        }
    }

    fn forward(buffer: &EventBuffer, override_velocity: Option<u8>) -> Vec<Sent> {
        let mut out = Vec::new();
        forward_note_events(&InputEvents::from_buffer(buffer), override_velocity, |event| {
            out.push(sent(event));
            true
        });
        out
    }

    fn param_event(param: ParamId, value: f64) -> ParamValueEvent {
        ParamValueEvent::new(
            0,
            ClapId::new(param.raw()),
            Pckn::match_all(),
            value,
            Cookie::empty(),
        )
    }

    fn mixed_block() -> EventBuffer {
        let mut buffer = EventBuffer::new();
        buffer.push(&NoteOnEvent::new(0, Pckn::match_all(), 0.8).with_flags(EventFlags::IS_LIVE));
        buffer.push(&NoteOnEvent::new(1, Pckn::match_all(), 0.0));
        buffer.push(&param_event(ParamId::NoteOnVelocity, 12.0));
        buffer.push(&MidiEvent::new(2, 0, [0x90, 60, 100]));
        buffer.push(&MidiEvent::new(3, 0, [0x80, 60, 64]));
        buffer.push(&NoteOffEvent::new(4, Pckn::match_all(), 0.5));
        buffer
    }

    #[test]
    fn engaged_forwarding_rewrites_note_ons() {
        let out = forward(&mixed_block(), Some(64));

        assert_eq!(
            out,
            vec![
                Sent::NoteOn {
                    velocity: midi::normalized_velocity(64),
                    flags: EventFlags::IS_LIVE,
                },
                Sent::NoteOn {
                    velocity: 0.0,
                    flags: EventFlags::empty(),
                },
                Sent::Midi([0x90, 60, 64]),
                Sent::Midi([0x80, 60, 64]),
                Sent::NoteOff { velocity: 0.5 },
            ]
        );
    }

    #[test]
    fn bypassed_forwarding_changes_nothing() {
        let out = forward(&mixed_block(), None);

        assert_eq!(
            out,
            vec![
                Sent::NoteOn {
                    velocity: 0.8,
                    flags: EventFlags::IS_LIVE,
                },
                Sent::NoteOn {
                    velocity: 0.0,
                    flags: EventFlags::empty(),
                },
                Sent::Midi([0x90, 60, 100]),
                Sent::Midi([0x80, 60, 64]),
                Sent::NoteOff { velocity: 0.5 },
            ]
        );
    }

    #[test]
    fn forwarding_stops_when_the_queue_is_full() {
        let buffer = mixed_block();
        let mut offered = 0;
        forward_note_events(&InputEvents::from_buffer(&buffer), Some(64), |_| {
            offered += 1;
            offered < 2
        });
        assert_eq!(offered, 2);
    }

    #[test]
    fn param_events_update_shared_state() {
        let shared = VelocityRemapShared::new();
        let mut buffer = EventBuffer::new();
        buffer.push(&param_event(ParamId::NoteOnVelocity, 99.0));
        buffer.push(&param_event(ParamId::Bypass, 0.0));
        buffer.push(&MidiEvent::new(0, 0, [0x90, 60, 100]));

        apply_param_events(&shared, &InputEvents::from_buffer(&buffer));
        assert_eq!(shared.note_on_velocity(), 99.0);
        assert_eq!(shared.bypass(), 0.0);
    }

    #[test]
    fn editor_changes_are_reported_once() {
        let shared = VelocityRemapShared::new();
        shared.set_from_editor(ParamId::NoteOnVelocity, 42.0);

        let mut out = Vec::new();
        report_editor_changes(&shared, |event| {
            out.push(sent(event));
            true
        });
        assert_eq!(
            out,
            vec![
                Sent::Param { id: 0, value: 42.0 },
                Sent::Param { id: 1, value: 1.0 },
            ]
        );

        out.clear();
        report_editor_changes(&shared, |event| {
            out.push(sent(event));
            true
        });
        assert!(out.is_empty());
    }

    #[test]
    fn refused_editor_changes_stay_pending() {
        let shared = VelocityRemapShared::new();
        shared.set_from_editor(ParamId::Bypass, 0.0);

        report_editor_changes(&shared, |_| false);

        let mut reported = 0;
        report_editor_changes(&shared, |_| {
            reported += 1;
            true
        });
        assert_eq!(reported, ParamId::ALL.len());
    }

    #[test]
    fn engaged_channel_is_silenced() {
        let input = [0.5f32; 8];
        let mut output = [1.0f32; 8];
        render_channel(&input, &mut output, true);
        assert_eq!(output, [0.0; 8]);
    }

    #[test]
    fn pass_through_channel_copies_input() {
        let input = [0.1, -0.2, 0.3, -0.4];
        let mut output = [0.0f32; 4];
        render_channel(&input, &mut output, false);
        assert_eq!(output, input);
    }

    #[test]
    fn in_place_buffers_are_silenced_only_when_engaged() {
        let mut buffer = [0.5f32; 4];
        assert_eq!(render_pair(ChannelPair::InPlace(&mut buffer), false), 0.5);
        assert_eq!(buffer, [0.5; 4]);

        assert_eq!(render_pair(ChannelPair::InPlace(&mut buffer), true), 0.5);
        assert_eq!(buffer, [0.0; 4]);
    }

    #[test]
    fn output_only_channels_are_cleared() {
        let mut output = [0.7f32; 4];
        assert_eq!(render_pair(ChannelPair::OutputOnly(&mut output), false), 0.0);
        assert_eq!(output, [0.0; 4]);
    }

    #[test]
    fn input_only_channels_are_measured() {
        let input = [-0.25f32; 4];
        assert_eq!(render_pair(ChannelPair::InputOnly(&input), true), 0.25);
    }

    fn midi_message() -> impl Strategy<Value = [u8; 3]> {
        (0x80u8..=0xEF, 0u8..=127, 0u8..=127).prop_map(|(status, a, b)| [status, a, b])
    }

    proptest! {
        #[test]
        fn override_touches_only_note_on_velocities(
            block in prop::collection::vec(midi_message(), 0..64),
            velocity in 0u8..=127,
            engaged in any::<bool>(),
        ) {
            let mut buffer = EventBuffer::new();
            for (time, data) in block.iter().enumerate() {
                buffer.push(&MidiEvent::new(time as u32, 0, *data));
            }

            let out = forward(&buffer, engaged.then_some(velocity));
            prop_assert_eq!(out.len(), block.len());

            for (before, after) in block.iter().zip(&out) {
                let expected = if engaged && midi::MidiMessage::parse(*before).is_note_on() {
                    [before[0], before[1], velocity]
                } else {
                    *before
                };
                prop_assert_eq!(after, &Sent::Midi(expected));
            }
        }
    }
}
