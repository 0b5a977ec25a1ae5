//! Engine configuration.
//!
//! Everything that is fixed for the lifetime of an engine: sample rate,
//! channel/bus counts, routing, maximum stage lengths and the knob values
//! applied at boot. With the `serde` feature enabled it loads from TOML:
//!
//! ```toml
//! sample_rate = 48000.0
//! channels = 2
//! buses = 3
//! initial = [["ch0.gain", 800], ["reverb.level", 400]]
//!
//! [routing]
//! reverb_bus = 1
//! delay_bus = 2
//! envelope_target = { filter_cutoff = { channel = 0 } }
//!
//! [[routing.outputs]]
//! bus = 1
//! left = 2
//! right = 3
//! ```

use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    mixer::params::{ChannelParam, ParamId, MAX_BUSES, MAX_CHANNELS},
    MAX_BLOCK_SIZE,
};

pub use crate::dsp::envelope::EnvelopeConfig;
pub use crate::effects::delay::DelayConfig;
pub use crate::mixer::channel::ChannelFilterKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What the envelope modulates.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeTarget {
    #[default]
    None,
    /// Cutoff offset of a channel's filter, scaled by `env.amount`.
    FilterCutoff { channel: usize },
    /// Channel amplitude (VCA).
    Amplitude { channel: usize },
}

/// A bus sent straight to a pair of hardware outputs.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRoute {
    pub bus: usize,
    pub left: usize,
    pub right: usize,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingConfig {
    /// Bus that feeds the master chain and outputs 0/1.
    pub main_bus: usize,
    pub reverb_bus: Option<usize>,
    pub delay_bus: Option<usize>,
    pub outputs: Vec<OutputRoute>,
    pub envelope_target: EnvelopeTarget,
    pub channel_filter: ChannelFilterKind,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            main_bus: 0,
            reverb_bus: None,
            delay_bus: None,
            outputs: Vec::new(),
            envelope_target: EnvelopeTarget::None,
            channel_filter: ChannelFilterKind::Standard,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub max_block_size: usize,
    pub channels: usize,
    pub buses: usize,
    pub envelope: EnvelopeConfig,
    pub delay: DelayConfig,
    pub routing: RoutingConfig,
    /// Knob values applied when the engine is built.
    pub initial: Vec<(ParamId, i32)>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_block_size: 512,
            channels: 1,
            buses: 1,
            envelope: EnvelopeConfig::default(),
            delay: DelayConfig::default(),
            routing: RoutingConfig::default(),
            initial: Vec::new(),
        }
    }
}

impl EngineConfig {
    #[cfg(feature = "serde")]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Number of output channels the routing needs, at least a stereo pair.
    pub fn output_channels(&self) -> usize {
        self.routing
            .outputs
            .iter()
            .map(|route| route.left.max(route.right) + 1)
            .fold(2, usize::max)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.sample_rate.is_finite() && self.sample_rate >= 1_000.0) {
            return invalid(format!("sample_rate {} is not a usable rate", self.sample_rate));
        }
        if self.max_block_size == 0 || self.max_block_size > MAX_BLOCK_SIZE {
            return invalid(format!(
                "max_block_size {} must be in 1..={}",
                self.max_block_size, MAX_BLOCK_SIZE
            ));
        }
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return invalid(format!("channels {} must be in 1..={}", self.channels, MAX_CHANNELS));
        }
        if self.buses == 0 || self.buses > MAX_BUSES {
            return invalid(format!("buses {} must be in 1..={}", self.buses, MAX_BUSES));
        }

        let routing = &self.routing;
        let check_bus = |name: &str, bus: usize| {
            if bus >= self.buses {
                Err(ConfigError::Invalid(format!(
                    "{} {} out of range ({} buses)",
                    name, bus, self.buses
                )))
            } else {
                Ok(())
            }
        };
        check_bus("main_bus", routing.main_bus)?;
        for (name, send) in [("reverb_bus", routing.reverb_bus), ("delay_bus", routing.delay_bus)] {
            if let Some(bus) = send {
                check_bus(name, bus)?;
                if bus == routing.main_bus {
                    return invalid(format!("{} cannot be the main bus", name));
                }
            }
        }
        for route in &routing.outputs {
            check_bus("output route bus", route.bus)?;
            if route.left < 2 || route.right < 2 {
                return invalid("outputs 0 and 1 are reserved for the main bus".to_string());
            }
        }

        match routing.envelope_target {
            EnvelopeTarget::FilterCutoff { channel } | EnvelopeTarget::Amplitude { channel }
                if channel >= self.channels =>
            {
                return invalid(format!(
                    "envelope target channel {} out of range ({} channels)",
                    channel, self.channels
                ));
            }
            _ => {}
        }

        let env = &self.envelope;
        for (name, value) in [
            ("max_attack_s", env.max_attack_s),
            ("max_hold_s", env.max_hold_s),
            ("max_release_s", env.max_release_s),
            ("taper_on_ms", env.taper_on_ms),
            ("taper_off_ms", env.taper_off_ms),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(format!("envelope.{} must be a non-negative number", name));
            }
        }

        if !(self.delay.max_seconds > 0.0 && self.delay.max_seconds <= 30.0) {
            return invalid(format!(
                "delay.max_seconds {} must be in (0, 30]",
                self.delay.max_seconds
            ));
        }

        for (id, _) in &self.initial {
            if let ParamId::Channel(channel, param) = id {
                if *channel >= self.channels {
                    return invalid(format!("initial value for {}: no such channel", id));
                }
                if let ChannelParam::Send(bus) = param {
                    check_bus("initial send bus", *bus as usize)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::params::MasterParam;

    #[test]
    fn test_default_is_valid() {
        EngineConfig::default().validate().expect("default config is valid");
        assert_eq!(EngineConfig::default().output_channels(), 2);
    }

    #[test]
    fn test_rejects_send_on_main_bus() {
        let mut config = EngineConfig {
            buses: 2,
            ..EngineConfig::default()
        };
        config.routing.reverb_bus = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_out_of_range_bus_and_channel() {
        let mut config = EngineConfig::default();
        config.routing.delay_bus = Some(3);
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.routing.envelope_target = EnvelopeTarget::Amplitude { channel: 1 };
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.initial.push((ParamId::Channel(4, ChannelParam::Gain), 10));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_routes_reserve_main_pair() {
        let mut config = EngineConfig {
            buses: 2,
            ..EngineConfig::default()
        };
        config.routing.outputs.push(OutputRoute {
            bus: 1,
            left: 2,
            right: 3,
        });
        config.validate().expect("valid route");
        assert_eq!(config.output_channels(), 4);

        config.routing.outputs[0].left = 1;
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_loads_from_toml() {
        let text = r#"
            sample_rate = 44100.0
            channels = 2
            buses = 3
            initial = [["ch1.send2", 700], ["delay.time", 300]]

            [envelope]
            max_attack_s = 2.0

            [delay]
            max_seconds = 1.5
            ping_pong = true

            [routing]
            reverb_bus = 1
            delay_bus = 2
            envelope_target = { filter_cutoff = { channel = 1 } }
            channel_filter = "dj"

            [[routing.outputs]]
            bus = 1
            left = 2
            right = 3
        "#;
        let config = EngineConfig::from_toml_str(text).expect("valid toml");
        assert_eq!(config.sample_rate, 44_100.0);
        assert_eq!(config.envelope.max_attack_s, 2.0);
        assert_eq!(config.envelope.max_release_s, EnvelopeConfig::default().max_release_s);
        assert!(config.delay.ping_pong);
        assert_eq!(config.routing.reverb_bus, Some(1));
        assert_eq!(
            config.routing.envelope_target,
            EnvelopeTarget::FilterCutoff { channel: 1 }
        );
        assert_eq!(config.routing.channel_filter, ChannelFilterKind::Dj);
        assert_eq!(
            config.initial,
            vec![
                (ParamId::Channel(1, ChannelParam::Send(2)), 700),
                (ParamId::Master(MasterParam::DelayTime), 300),
            ]
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_toml_errors_are_typed() {
        assert!(matches!(
            EngineConfig::from_toml_str("channels = \"two\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("initial = [[\"ch0.bogus\", 1]]"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("channels = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }
}
