//! Parameter identifiers and the shared knob bank.
//!
//! Every panel control is a [`ParamId`] with a declared integer range. The
//! control context writes values into a [`ParamBank`] of relaxed atomics;
//! the audio context compares the bank against the values it last applied
//! once per block and only acts on slots that moved.

use std::{
    fmt,
    ops::RangeInclusive,
    str::FromStr,
    sync::atomic::{AtomicI32, Ordering},
};

use thiserror::Error;

use crate::{
    config::EngineConfig,
    effects::filter::DJ_RESONANCE,
    mixer::channel::ChannelFilterKind,
};

/// Upper bound on buses per engine. Send parameters are reserved up to this.
pub const MAX_BUSES: usize = 8;

/// Upper bound on input channels per engine.
pub const MAX_CHANNELS: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("unknown parameter `{0}`")]
    UnknownParam(String),
    #[error("channel {channel} out of range (engine has {channels})")]
    ChannelOutOfRange { channel: usize, channels: usize },
    #[error("control event queue is full")]
    QueueFull,
}

/// Per-channel controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelParam {
    Gain,
    Pan,
    FilterFrequency,
    FilterResonance,
    FilterMode,
    DjFilter,
    Drive,
    Tone,
    DistortionType,
    /// Send level into the given bus.
    Send(u8),
}

const FIXED_CHANNEL_PARAMS: [ChannelParam; 9] = [
    ChannelParam::Gain,
    ChannelParam::Pan,
    ChannelParam::FilterFrequency,
    ChannelParam::FilterResonance,
    ChannelParam::FilterMode,
    ChannelParam::DjFilter,
    ChannelParam::Drive,
    ChannelParam::Tone,
    ChannelParam::DistortionType,
];

/// Slots reserved per channel in the bank.
pub const CHANNEL_SLOTS: usize = FIXED_CHANNEL_PARAMS.len() + MAX_BUSES;

impl ChannelParam {
    fn index(self) -> usize {
        match self {
            ChannelParam::Send(bus) => FIXED_CHANNEL_PARAMS.len() + bus as usize,
            fixed => FIXED_CHANNEL_PARAMS
                .iter()
                .position(|p| *p == fixed)
                .unwrap_or_default(),
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        match FIXED_CHANNEL_PARAMS.get(index) {
            Some(param) => Some(*param),
            None if index < CHANNEL_SLOTS => {
                Some(ChannelParam::Send((index - FIXED_CHANNEL_PARAMS.len()) as u8))
            }
            None => None,
        }
    }

    pub fn range(self) -> RangeInclusive<i32> {
        match self {
            ChannelParam::Pan => -50..=50,
            ChannelParam::DjFilter => -1000..=1000,
            ChannelParam::FilterMode => 0..=2,
            ChannelParam::DistortionType => 0..=6,
            _ => 0..=1000,
        }
    }

    pub fn default_value(self) -> i32 {
        match self {
            ChannelParam::Gain => 750,
            ChannelParam::FilterFrequency | ChannelParam::Tone => 1000,
            ChannelParam::FilterMode | ChannelParam::DistortionType => 1,
            ChannelParam::Send(0) => 1000,
            _ => 0,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ChannelParam::Gain => "gain",
            ChannelParam::Pan => "pan",
            ChannelParam::FilterFrequency => "filter.freq",
            ChannelParam::FilterResonance => "filter.res",
            ChannelParam::FilterMode => "filter.mode",
            ChannelParam::DjFilter => "dj",
            ChannelParam::Drive => "drive",
            ChannelParam::Tone => "tone",
            ChannelParam::DistortionType => "dist",
            ChannelParam::Send(_) => "send",
        }
    }
}

macro_rules! master_params {
    ($($variant:ident => $name:literal, $range:expr, $default:expr;)*) => {
        /// Engine-wide controls: master chain, sends and the envelope.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MasterParam {
            $($variant,)*
        }

        impl MasterParam {
            pub const ALL: &'static [MasterParam] = &[$(MasterParam::$variant,)*];

            pub fn range(self) -> RangeInclusive<i32> {
                match self {
                    $(MasterParam::$variant => $range,)*
                }
            }

            pub fn default_value(self) -> i32 {
                match self {
                    $(MasterParam::$variant => $default,)*
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $(MasterParam::$variant => $name,)*
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(MasterParam::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

master_params! {
    FilterFrequency => "filter.freq", 0..=1000, 1000;
    FilterResonance => "filter.res", 0..=1000, 0;
    FilterMode => "filter.mode", 0..=2, 0;
    FilterLevel => "filter.level", 0..=1000, 1000;
    Drive => "drive", 0..=1000, 0;
    Tone => "tone", 0..=1000, 1000;
    DistortionType => "dist", 0..=6, 1;
    DjFilter => "dj", -1000..=1000, 0;
    DjHardMute => "dj.hard_mute", 0..=1, 0;
    CompThreshold => "comp.threshold", 0..=1000, 1000;
    CompRatio => "comp.ratio", 0..=1000, 0;
    CompAttack => "comp.attack", 0..=1000, 500;
    CompRelease => "comp.release", 0..=1000, 500;
    CompMakeup => "comp.makeup", 0..=1000, 0;
    LimiterThreshold => "limiter.threshold", 0..=1000, 1000;
    LimiterRelease => "limiter.release", 0..=1000, 500;
    OutputGain => "output", 0..=1000, 1000;
    DelayTime => "delay.time", 0..=1000, 500;
    DelayLevel => "delay.level", 0..=1000, 0;
    DelayHighpass => "delay.hp", 0..=1000, 0;
    DelayLowpass => "delay.lp", 0..=1000, 1000;
    DelayPingPong => "delay.pingpong", 0..=1, 0;
    ReverbLevel => "reverb.level", 0..=1000, 0;
    ReverbPredelay => "reverb.predelay", 0..=1000, 0;
    ReverbHighpass => "reverb.hp", 0..=1000, 0;
    ReverbLowpass => "reverb.lp", 0..=1000, 1000;
    EnvAttack => "env.attack", 0..=1000, 0;
    EnvHold => "env.hold", 0..=1000, 0;
    EnvRelease => "env.release", 0..=1000, 250;
    EnvAttackContour => "env.attack_contour", 0..=1000, 500;
    EnvReleaseContour => "env.release_contour", 0..=1000, 500;
    EnvCascade => "env.cascade", 0..=1, 0;
    EnvAmount => "env.amount", -1000..=1000, 0;
}

/// Any knob in the engine.
///
/// Textual form: master parameters by name (`delay.time`), channel
/// parameters prefixed with the channel (`ch0.gain`, `ch2.send1`).
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    Channel(usize, ChannelParam),
    Master(MasterParam),
}

impl ParamId {
    pub fn range(self) -> RangeInclusive<i32> {
        match self {
            ParamId::Channel(_, param) => param.range(),
            ParamId::Master(param) => param.range(),
        }
    }

    pub fn clamp(self, value: i32) -> i32 {
        let range = self.range();
        value.clamp(*range.start(), *range.end())
    }

    pub fn default_value(self) -> i32 {
        match self {
            ParamId::Channel(_, param) => param.default_value(),
            ParamId::Master(param) => param.default_value(),
        }
    }

    /// Boot value in an engine built from `config`. Knobs that mirror a
    /// config field start from that field; DJ channels start at the DJ
    /// filter's own resonance.
    pub fn default_for(self, config: &EngineConfig) -> i32 {
        match self {
            ParamId::Master(MasterParam::DelayPingPong) => config.delay.ping_pong as i32,
            ParamId::Master(MasterParam::EnvCascade) => config.envelope.cascade as i32,
            ParamId::Channel(_, ChannelParam::FilterResonance)
                if config.routing.channel_filter == ChannelFilterKind::Dj =>
            {
                (DJ_RESONANCE * 1000.0).round() as i32
            }
            _ => self.default_value(),
        }
    }

    /// Every parameter of an engine with `channels` channels, in slot order.
    pub fn all(channels: usize) -> impl Iterator<Item = ParamId> {
        (0..MasterParam::ALL.len() + channels * CHANNEL_SLOTS).filter_map(ParamId::from_slot)
    }

    /// Bank slot for this parameter in an engine with `channels` channels.
    pub fn slot(self, channels: usize) -> Result<usize, ControlError> {
        match self {
            ParamId::Master(param) => Ok(MasterParam::ALL
                .iter()
                .position(|p| *p == param)
                .unwrap_or_default()),
            ParamId::Channel(channel, param) => {
                if channel >= channels {
                    return Err(ControlError::ChannelOutOfRange { channel, channels });
                }
                if let ChannelParam::Send(bus) = param {
                    if bus as usize >= MAX_BUSES {
                        return Err(ControlError::UnknownParam(self.to_string()));
                    }
                }
                Ok(MasterParam::ALL.len() + channel * CHANNEL_SLOTS + param.index())
            }
        }
    }

    pub fn from_slot(slot: usize) -> Option<Self> {
        let masters = MasterParam::ALL.len();
        if slot < masters {
            return Some(ParamId::Master(MasterParam::ALL[slot]));
        }
        let offset = slot - masters;
        let param = ChannelParam::from_index(offset % CHANNEL_SLOTS)?;
        Some(ParamId::Channel(offset / CHANNEL_SLOTS, param))
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamId::Master(param) => f.write_str(param.name()),
            ParamId::Channel(channel, ChannelParam::Send(bus)) => {
                write!(f, "ch{}.send{}", channel, bus)
            }
            ParamId::Channel(channel, param) => write!(f, "ch{}.{}", channel, param.name()),
        }
    }
}

impl FromStr for ParamId {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ControlError::UnknownParam(s.to_string());

        if let Some(param) = MasterParam::from_name(s) {
            return Ok(ParamId::Master(param));
        }

        let rest = s.strip_prefix("ch").ok_or_else(unknown)?;
        let (channel, name) = rest.split_once('.').ok_or_else(unknown)?;
        let channel: usize = channel.parse().map_err(|_| unknown())?;

        if let Some(bus) = name.strip_prefix("send") {
            let bus: u8 = bus.parse().map_err(|_| unknown())?;
            if bus as usize >= MAX_BUSES {
                return Err(unknown());
            }
            return Ok(ParamId::Channel(channel, ChannelParam::Send(bus)));
        }

        FIXED_CHANNEL_PARAMS
            .iter()
            .find(|p| p.name() == name)
            .map(|p| ParamId::Channel(channel, *p))
            .ok_or_else(unknown)
    }
}

impl TryFrom<String> for ParamId {
    type Error = ControlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ParamId> for String {
    fn from(id: ParamId) -> Self {
        id.to_string()
    }
}

/// Knob values shared between the control and audio contexts.
///
/// Single writer (the control handle), single reader (the audio callback).
/// Each slot is independent, so relaxed ordering is enough.
pub struct ParamBank {
    channels: usize,
    slots: Box<[AtomicI32]>,
}

impl ParamBank {
    pub fn new(channels: usize) -> Self {
        Self::with_values(channels, ParamId::default_value)
    }

    /// The values an engine built from `config` boots with: config-aware
    /// defaults, then `config.initial` on top.
    pub fn from_config(config: &EngineConfig) -> Self {
        let bank = Self::with_values(config.channels, |id| id.default_for(config));
        for &(id, value) in &config.initial {
            if let Err(err) = bank.store(id, value) {
                tracing::warn!(%id, %err, "boot value ignored");
            }
        }
        bank
    }

    fn with_values(channels: usize, value: impl Fn(ParamId) -> i32) -> Self {
        let slots = ParamId::all(channels)
            .map(|id| AtomicI32::new(value(id)))
            .collect();
        Self { channels, slots }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Clamp and store. Returns the value actually stored.
    pub fn store(&self, id: ParamId, value: i32) -> Result<i32, ControlError> {
        let slot = id.slot(self.channels)?;
        let value = id.clamp(value);
        self.slots[slot].store(value, Ordering::Relaxed);
        Ok(value)
    }

    pub fn load(&self, id: ParamId) -> Result<i32, ControlError> {
        let slot = id.slot(self.channels)?;
        Ok(self.slots[slot].load(Ordering::Relaxed))
    }

    /// Every parameter with its current value, in slot order.
    pub fn values(&self) -> impl Iterator<Item = (ParamId, i32)> + '_ {
        self.slots.iter().enumerate().filter_map(|(slot, atomic)| {
            ParamId::from_slot(slot).map(|id| (id, atomic.load(Ordering::Relaxed)))
        })
    }

    /// Call `apply` for every slot whose value differs from `seen`, then
    /// update `seen`. Allocation-free; `seen` must be `len()` long.
    pub fn drain_changes(&self, seen: &mut [i32], mut apply: impl FnMut(ParamId, i32)) {
        for (slot, (atomic, last)) in self.slots.iter().zip(seen.iter_mut()).enumerate() {
            let value = atomic.load(Ordering::Relaxed);
            if value != *last {
                *last = value;
                if let Some(id) = ParamId::from_slot(slot) {
                    apply(id, value);
                }
            }
        }
    }
}
