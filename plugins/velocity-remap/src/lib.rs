//! A CLAP note effect that forces the velocity of incoming note-ons.
//!
//! While the bypass parameter is off, the audio is silenced and every
//! note-on leaves the plugin with the velocity set in the editor.
//! Everything else passes through untouched.
//!
//! This module declares the plugin and the factory
//! exposed behind the CLAP entry point.

mod audio_thread;
pub mod bus;
mod directories;
mod gui;
mod logging;
mod main_thread;
pub mod meter;
pub mod midi;
pub mod params;
pub mod shared;
pub mod state;

pub use gui::editor;
pub use gui::{DEFAULT_GUI_SIZE, MAX_GUI_SIZE, MIN_GUI_SIZE};

use crate::audio_thread::VelocityRemapProcessor;
use crate::main_thread::VelocityRemapMainThread;
use crate::shared::VelocityRemapShared;
use clack_extensions::audio_ports::PluginAudioPorts;
use clack_extensions::audio_ports_config::PluginAudioPortsConfig;
use clack_extensions::gui::PluginGui;
use clack_extensions::note_ports::PluginNotePorts;
use clack_extensions::params::PluginParams;
use clack_extensions::state::PluginState;
use clack_extensions::timer::PluginTimer;
use clack_plugin::clack_export_entry;
use clack_plugin::entry::prelude::*;
use clack_plugin::plugin::features::{AUDIO_EFFECT, NOTE_EFFECT, STEREO};
use clack_plugin::prelude::*;
use std::ffi::CStr;

pub const PLUGIN_ID: &str = "free-audio.clap.velocity-remap";
pub const PLUGIN_NAME: &str = "Velocity Remap";
pub const PLUGIN_VENDOR: &str = "free-audio";

pub struct VelocityRemapPlugin;

impl Plugin for VelocityRemapPlugin {
    type AudioProcessor<'a> = VelocityRemapProcessor<'a>;
    type MainThread<'a> = VelocityRemapMainThread<'a>;

    /// Parameter values and meter levels,
    /// exchanged between the threads through atomics.
    type Shared<'a> = VelocityRemapShared;

    fn declare_extensions(
        builder: &mut PluginExtensions<Self>,
        _shared: Option<&Self::Shared<'_>>,
    ) {
        builder.register::<PluginAudioPorts>();
        builder.register::<PluginAudioPortsConfig>();
        builder.register::<PluginNotePorts>();
        builder.register::<PluginParams>();
        builder.register::<PluginState>();
        builder.register::<PluginGui>();
        builder.register::<PluginTimer>();
    }
}

/// The factory exposes the plugins that can be instantiated from this binary.
pub struct VelocityRemapFactory {
    descriptor: PluginDescriptor,
}

impl VelocityRemapFactory {
    fn new() -> Self {
        Self {
            descriptor: PluginDescriptor::new(PLUGIN_ID, PLUGIN_NAME)
                .with_vendor(PLUGIN_VENDOR)
                .with_features([NOTE_EFFECT, AUDIO_EFFECT, STEREO]),
        }
    }
}

impl PluginFactory for VelocityRemapFactory {
    fn plugin_count(&self) -> u32 {
        1
    }

    fn plugin_descriptor(&self, index: u32) -> Option<&PluginDescriptor> {
        match index {
            0 => Some(&self.descriptor),
            _ => None,
        }
    }

    fn create_plugin<'b>(
        &'b self,
        host_info: HostInfo<'b>,
        plugin_id: &CStr,
    ) -> Option<PluginInstance<'b>> {
        if plugin_id != self.descriptor.id() {
            tracing::warn!(?plugin_id, "host asked for an unknown plugin");
            return None;
        }

        tracing::info!("creating plugin instance");
        Some(PluginInstance::new::<VelocityRemapPlugin>(
            host_info,
            &self.descriptor,
            |_host| Ok(VelocityRemapShared::new()),
            |host, shared| VelocityRemapMainThread::create(host, shared),
        ))
    }
}

/// Provides the CLAP entry point by deferring to our factory.
pub struct VelocityRemapEntry {
    factory: PluginFactoryWrapper<VelocityRemapFactory>,
}

impl Entry for VelocityRemapEntry {
    fn new(bundle_path: &CStr) -> Result<Self, EntryLoadError> {
        logging::init();
        tracing::info!(?bundle_path, "loading plugin bundle");

        Ok(Self {
            factory: PluginFactoryWrapper::new(VelocityRemapFactory::new()),
        })
    }

    fn declare_factories<'a>(&'a self, builder: &mut EntryFactories<'a>) {
        builder.register_factory(&self.factory);
    }
}

clack_export_entry!(VelocityRemapEntry);
