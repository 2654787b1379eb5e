use std::path::Path;
use std::time::Duration;

use anyhow::Error;
use pi_pinout::{GpioPin, PhysicalPin, WiringPiPin};
use serde::{Deserialize, Serialize};

use crate::controller::AnimationSettings;
use crate::emotion;

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub renderer: RendererChoice,
    pub led: LedConfig,
    pub animation: AnimationSettings,
    pub policy: PolicySettings,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum RendererChoice {
    #[default]
    Terminal,
    Gpio,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct LedConfig {
    pub red: Pin,
    pub green: Pin,
    pub blue: Pin,
    /// Common-anode wiring: the LED lights when the pin is pulled low
    pub active_low: bool,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            red: Pin::Gpio(GpioPin(14)),
            green: Pin::Gpio(GpioPin(15)),
            blue: Pin::Gpio(GpioPin(18)),
            active_low: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub enum Pin {
    Physical(PhysicalPin),
    Gpio(GpioPin),
    WiringPi(WiringPiPin),
}

impl Pin {
    /// Resolve whichever numbering scheme the config used to a BCM number.
    pub fn bcm_number(&self) -> u8 {
        let pin: GpioPin = match *self {
            Pin::Physical(pin) => pin.into(),
            Pin::Gpio(pin) => pin,
            Pin::WiringPi(pin) => pin.into(),
        };
        pin.0
    }
}

/// Knobs for turning classifier scores into controller goals.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PolicySettings {
    pub mode: PolicyMode,
    /// Scores this close to the top one trigger blinking between the two
    pub co_dominance_margin: f32,
    /// Blend mode ignores scores below this
    pub score_floor: f32,
    pub blink_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum PolicyMode {
    /// Highest score wins; two near-equal leaders blink
    #[default]
    Top,
    /// Score-weighted blend of every emotion color above the floor
    Blend,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            mode: PolicyMode::default(),
            co_dominance_margin: emotion::CO_DOMINANCE_MARGIN,
            score_floor: emotion::SCORE_FLOOR,
            blink_interval_ms: 750,
        }
    }
}

impl PolicySettings {
    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.blink_interval_ms)
    }
}

impl Config {
    pub fn load() -> Result<Config, Error> {
        Config::load_from("config.ron")
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Config, Error> {
        let config = std::fs::read_to_string(path)?;
        let config: Config = ron::from_str(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load() {
        let path = std::env::temp_dir().join("moodring-config-test.ron");
        std::fs::write(
            &path,
            r#"(
    renderer: Gpio,
    led: (
        red: Gpio(GpioPin(14)),
        green: Gpio(GpioPin(15)),
        blue: Physical(PhysicalPin(12)),
        active_low: true,
    ),
    animation: (
        frame_rate: 30,
        transition_steps: 15,
        pulse_frequency_hz: 0.5,
    ),
)"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(RendererChoice::Gpio, config.renderer);
        assert_eq!(Pin::Gpio(GpioPin(15)), config.led.green);
        assert_eq!(Pin::Physical(PhysicalPin(12)), config.led.blue);
        assert_eq!(0.5, config.animation.pulse_frequency_hz);
        // The omitted policy section falls back to its defaults
        assert_eq!(PolicySettings::default(), config.policy);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(RendererChoice::Terminal, config.renderer);
        assert_eq!(30, config.animation.frame_rate);
        assert_eq!(15, config.animation.transition_steps);
        assert_eq!(Duration::from_millis(750), config.policy.blink_interval());
        // Original wiring: BCM 14/15/18, active-low
        assert_eq!(14, config.led.red.bcm_number());
        assert_eq!(15, config.led.green.bcm_number());
        assert_eq!(18, config.led.blue.bcm_number());
        assert!(config.led.active_low);
    }
}
