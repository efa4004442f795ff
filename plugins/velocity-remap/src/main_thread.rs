//! This module handles all CLAP callbacks that run on the main thread.

use crate::audio_thread::{apply_param_events, report_editor_changes};
use crate::bus::{BusLayout, ChannelSet};
use crate::gui::DEFAULT_GUI_SIZE;
use crate::params::{ParamDescriptor, ParamId};
use crate::shared::VelocityRemapShared;
use crate::state::PluginStateDocument;
use clack_extensions::audio_ports::{
    AudioPortFlags, AudioPortInfo, AudioPortInfoWriter, AudioPortType, PluginAudioPortsImpl,
};
use clack_extensions::audio_ports_config::{
    AudioPortConfigWriter, AudioPortsConfiguration, MainPortInfo, PluginAudioPortsConfigImpl,
};
use clack_extensions::note_ports::{
    NoteDialect, NoteDialects, NotePortInfo, NotePortInfoWriter, PluginNotePortsImpl,
};
use clack_extensions::params::{
    ParamDisplayWriter, ParamInfo, ParamInfoFlags, ParamInfoWriter, PluginMainThreadParams,
};
use clack_extensions::state::PluginStateImpl;
use clack_extensions::timer::TimerId;
use clack_plugin::prelude::*;
use clack_plugin::stream::{InputStream, OutputStream};
use clack_plugin::utils::Cookie;
use std::ffi::CStr;
use wry::dpi::LogicalSize;
use wry::WebView;

pub struct VelocityRemapMainThread<'a> {
    pub(crate) host: HostMainThreadHandle<'a>,

    pub(crate) shared: &'a VelocityRemapShared,

    /// The layout declared on the audio ports,
    /// as last selected by the host.
    pub(crate) bus_layout: BusLayout,

    // --- GUI fields ---
    /// The web view displaying the editor.
    pub(crate) web_view: Option<WebView>,

    /// The scale factor of the window hosting the GUI.
    /// Only used when dealing in physical pixels.
    pub(crate) scale_factor: f64,

    /// The GUI size, in logical pixels.
    pub(crate) gui_size: LogicalSize<f64>,

    /// The host timer driving editor refreshes while the editor is open.
    pub(crate) refresh_timer: Option<TimerId>,
}

impl<'a> VelocityRemapMainThread<'a> {
    pub fn create(
        host: HostMainThreadHandle<'a>,
        shared: &'a VelocityRemapShared,
    ) -> Result<Self, PluginError> {
        Ok(Self {
            host,
            shared,
            bus_layout: BusLayout::default(),

            web_view: None,
            scale_factor: 1.0,
            gui_size: DEFAULT_GUI_SIZE,
            refresh_timer: None,
        })
    }
}

impl<'a> PluginMainThread<'a, VelocityRemapShared> for VelocityRemapMainThread<'a> {}

// --- audio ports ---

/// One main input and one main output port,
/// both carrying the channels of [BusLayout].
impl PluginAudioPortsImpl for VelocityRemapMainThread<'_> {
    fn count(&mut self, _is_input: bool) -> u32 {
        1
    }

    fn get(&mut self, index: u32, is_input: bool, writer: &mut AudioPortInfoWriter) {
        if index != 0 {
            return;
        }

        let channels = if is_input {
            self.bus_layout.input
        } else {
            self.bus_layout.output
        };
        let channel_count = channels.channel_count();

        writer.set(&AudioPortInfo {
            id: ClapId::new(if is_input { 0 } else { 1 }),
            name: if is_input { &b"Input"[..] } else { &b"Output"[..] },
            channel_count,
            flags: AudioPortFlags::IS_MAIN,
            port_type: port_type(channels),
            in_place_pair: None,
        });
    }
}

fn port_type(channels: ChannelSet) -> Option<AudioPortType<'static>> {
    match channels {
        ChannelSet::Mono => Some(AudioPortType::MONO),
        ChannelSet::Stereo => Some(AudioPortType::STEREO),
        _ => None,
    }
}

// --- audio port configurations ---

/// Lets the host pick between the layouts in [BusLayout::OFFERED].
/// The host only selects while the plugin is deactivated.
impl PluginAudioPortsConfigImpl for VelocityRemapMainThread<'_> {
    fn count(&mut self) -> u32 {
        BusLayout::OFFERED.len() as u32
    }

    fn get(&mut self, index: u32, writer: &mut AudioPortConfigWriter) {
        let Some(layout) = BusLayout::OFFERED.get(index as usize) else {
            return;
        };
        let main_port = |channels: ChannelSet| MainPortInfo {
            channel_count: channels.channel_count(),
            port_type: port_type(channels),
        };

        writer.write(&AudioPortsConfiguration {
            id: ClapId::new(index),
            name: layout.name().as_bytes(),
            input_port_count: 1,
            output_port_count: 1,
            main_input: Some(main_port(layout.input)),
            main_output: Some(main_port(layout.output)),
        });
    }

    fn select(&mut self, config_id: ClapId) -> Result<(), PluginError> {
        let Some(layout) = BusLayout::from_config_id(config_id.get()) else {
            tracing::warn!(config_id = config_id.get(), "host selected an unknown port configuration");
            return Err(PluginError::Message("Unsupported audio port configuration"));
        };

        tracing::info!(layout = layout.name(), "audio port configuration selected");
        self.bus_layout = layout;
        Ok(())
    }
}

// --- note ports ---

/// Notes come in and go out on a single port each,
/// as CLAP note events or raw MIDI.
impl PluginNotePortsImpl for VelocityRemapMainThread<'_> {
    fn count(&mut self, _is_input: bool) -> u32 {
        1
    }

    fn get(&mut self, index: u32, is_input: bool, writer: &mut NotePortInfoWriter) {
        if index != 0 {
            return;
        }

        writer.set(&NotePortInfo {
            id: ClapId::new(if is_input { 0 } else { 1 }),
            name: if is_input { &b"Notes In"[..] } else { &b"Notes Out"[..] },
            supported_dialects: NoteDialects::CLAP | NoteDialects::MIDI,
            preferred_dialect: Some(NoteDialect::Midi),
        });
    }
}

// --- params ---

fn param_flags(descriptor: &ParamDescriptor) -> ParamInfoFlags {
    let mut flags = ParamInfoFlags::IS_AUTOMATABLE;
    if descriptor.stepped {
        flags |= ParamInfoFlags::IS_STEPPED;
    }
    flags
}

impl PluginMainThreadParams for VelocityRemapMainThread<'_> {
    fn count(&mut self) -> u32 {
        ParamId::ALL.len() as u32
    }

    fn get_info(&mut self, param_index: u32, info: &mut ParamInfoWriter) {
        let Some(param) = ParamId::from_index(param_index) else {
            return;
        };
        let descriptor = param.descriptor();

        info.set(&ParamInfo {
            id: ClapId::new(param.raw()),
            name: descriptor.name.as_bytes(),
            module: descriptor.module.as_bytes(),
            min_value: f64::from(descriptor.min),
            max_value: f64::from(descriptor.max),
            default_value: f64::from(descriptor.default),
            flags: param_flags(descriptor),
            cookie: Cookie::default(),
        });
    }

    fn get_value(&mut self, param_id: ClapId) -> Option<f64> {
        let param = ParamId::from_raw(param_id.get())?;
        Some(f64::from(self.shared.get(param)))
    }

    fn value_to_text(
        &mut self,
        param_id: ClapId,
        value: f64,
        writer: &mut ParamDisplayWriter,
    ) -> core::fmt::Result {
        use core::fmt::Write;

        match ParamId::from_raw(param_id.get()) {
            Some(param) => write!(writer, "{}", param.descriptor().display(value as f32)),
            None => write!(writer, "{value:.2}"),
        }
    }

    fn text_to_value(&mut self, param_id: ClapId, text: &CStr) -> Option<f64> {
        let param = ParamId::from_raw(param_id.get())?;
        let text = text.to_str().ok()?;
        param.descriptor().parse(text).map(f64::from)
    }

    fn flush(&mut self, input: &InputEvents, output: &mut OutputEvents) {
        apply_param_events(self.shared, input);
        report_editor_changes(self.shared, |event| output.try_push(event).is_ok());
    }
}

// --- state ---

impl PluginStateImpl for VelocityRemapMainThread<'_> {
    fn save(&mut self, output: &mut OutputStream) -> Result<(), PluginError> {
        PluginStateDocument::capture(self.shared, self.gui_size).write_to(output)?;
        Ok(())
    }

    fn load(&mut self, input: &mut InputStream) -> Result<(), PluginError> {
        let document = PluginStateDocument::read_from(input).inspect_err(|error| {
            tracing::warn!(%error, "rejected saved state");
        })?;

        document.apply(self.shared);
        self.gui_size = document.gui.size();
        tracing::info!(
            note_on_velocity = self.shared.note_on_velocity(),
            bypass = self.shared.bypass(),
            "state loaded"
        );
        Ok(())
    }
}
