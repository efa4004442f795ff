//! Bus layout negotiation.

/// The channel configuration of a single bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSet {
    Disabled,
    Mono,
    Stereo,
    Discrete(u32),
}

impl ChannelSet {
    pub fn from_channel_count(count: u32) -> Self {
        match count {
            0 => ChannelSet::Disabled,
            1 => ChannelSet::Mono,
            2 => ChannelSet::Stereo,
            n => ChannelSet::Discrete(n),
        }
    }

    pub fn channel_count(&self) -> u32 {
        match self {
            ChannelSet::Disabled => 0,
            ChannelSet::Mono => 1,
            ChannelSet::Stereo => 2,
            ChannelSet::Discrete(n) => *n,
        }
    }
}

/// The main input and output bus configuration offered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusLayout {
    pub input: ChannelSet,
    pub output: ChannelSet,
}

impl BusLayout {
    /// The layout declared on the plugin's audio ports by default.
    pub const STEREO: BusLayout = BusLayout {
        input: ChannelSet::Stereo,
        output: ChannelSet::Stereo,
    };

    pub const MONO: BusLayout = BusLayout {
        input: ChannelSet::Mono,
        output: ChannelSet::Mono,
    };

    /// The port configurations offered to the host, indexed by configuration id.
    pub const OFFERED: [BusLayout; 2] = [BusLayout::STEREO, BusLayout::MONO];

    /// Looks up an offered configuration, if the layout behind it is supported.
    pub fn from_config_id(id: u32) -> Option<BusLayout> {
        Self::OFFERED
            .get(id as usize)
            .copied()
            .filter(BusLayout::is_supported)
    }

    pub fn name(&self) -> &'static str {
        match (self.input, self.output) {
            (ChannelSet::Mono, ChannelSet::Mono) => "Mono",
            (ChannelSet::Stereo, ChannelSet::Stereo) => "Stereo",
            _ => "Custom",
        }
    }

    /// Only mono or stereo outputs are supported,
    /// and the input has to match the output.
    pub fn is_supported(&self) -> bool {
        matches!(self.output, ChannelSet::Mono | ChannelSet::Stereo) && self.input == self.output
    }
}

impl Default for BusLayout {
    fn default() -> Self {
        Self::STEREO
    }
}
