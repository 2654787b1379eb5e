//! Rendering targets for the animation controller.
//!
//! The controller only knows the [`Renderer`] trait; which implementation it
//! gets is decided once at startup from the config. The physical LED needs
//! the `pi` feature (rppal software PWM on three GPIO pins), the terminal
//! renderer works anywhere.

use std::io::{self, Write};

use anyhow::Error;
use palette::Srgb;

#[cfg(feature = "pi")]
use log::info;
#[cfg(feature = "pi")]
use rppal::gpio::{Gpio, OutputPin};

use crate::color;
use crate::config::Config;
#[cfg(feature = "pi")]
use crate::config::LedConfig;

/// A single rendering target for the animation's output.
///
/// `render` is called once per tick with the pulse-scaled color, the current
/// emotion label, and transition progress (display renderers may show the
/// label and progress, hardware ones ignore them). Failures are reported but
/// treated as transient by the caller.
pub trait Renderer: Send {
    fn render(&mut self, color: Srgb<f32>, label: &str, progress: Option<f32>)
        -> Result<(), Error>;

    /// Turn the indicator off. Called once on shutdown.
    fn off(&mut self) -> Result<(), Error>;
}

/// On-screen stand-in for the LED: one terminal line, rewritten per frame,
/// showing the hex color, the emotion label, and transition progress.
pub struct TerminalRenderer {
    out: io::Stdout,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn render(
        &mut self,
        color: Srgb<f32>,
        label: &str,
        progress: Option<f32>,
    ) -> Result<(), Error> {
        let progress = match progress {
            Some(fraction) => format!("{:3.0}%", fraction * 100.0),
            None => "    ".to_string(),
        };

        write!(
            self.out,
            "\r{} {:<13} {}",
            color::to_hex(color),
            label,
            progress
        )?;
        self.out.flush()?;
        Ok(())
    }

    fn off(&mut self) -> Result<(), Error> {
        writeln!(self.out, "\r{} off          ", color::to_hex(color::BLACK))?;
        self.out.flush()?;
        Ok(())
    }
}

/// Software PWM frequency for the LED pins. gpiozero uses 100 Hz for its
/// PWMLED devices and it is flicker-free in practice.
#[cfg(feature = "pi")]
const PWM_FREQUENCY_HZ: f64 = 100.0;

/// A common-anode/common-cathode RGB LED on three GPIO pins, driven with
/// software PWM. `active_low` inverts the duty cycle for common-anode
/// wiring, where the LED lights when the pin is pulled low.
#[cfg(feature = "pi")]
pub struct PwmLedRenderer {
    red: OutputPin,
    green: OutputPin,
    blue: OutputPin,
    active_low: bool,
}

#[cfg(feature = "pi")]
impl PwmLedRenderer {
    pub fn new(led: &LedConfig) -> Result<Self, Error> {
        let gpio = Gpio::new()?;

        let claim = |pin: crate::config::Pin| -> Result<OutputPin, Error> {
            let number = pin.bcm_number();
            info!("LED channel: initializing on GPIO {}", number);
            Ok(gpio.get(number)?.into_output())
        };

        let mut renderer = Self {
            red: claim(led.red)?,
            green: claim(led.green)?,
            blue: claim(led.blue)?,
            active_low: led.active_low,
        };
        renderer.apply(color::BLACK)?;

        Ok(renderer)
    }

    fn apply(&mut self, color: Srgb<f32>) -> Result<(), Error> {
        let active_low = self.active_low;
        let duty = move |channel: f32| {
            let duty = channel.clamp(0.0, 1.0) as f64;
            if active_low {
                1.0 - duty
            } else {
                duty
            }
        };

        self.red.set_pwm_frequency(PWM_FREQUENCY_HZ, duty(color.red))?;
        self.green
            .set_pwm_frequency(PWM_FREQUENCY_HZ, duty(color.green))?;
        self.blue
            .set_pwm_frequency(PWM_FREQUENCY_HZ, duty(color.blue))?;
        Ok(())
    }
}

#[cfg(feature = "pi")]
impl Renderer for PwmLedRenderer {
    fn render(&mut self, color: Srgb<f32>, _label: &str, _progress: Option<f32>) -> Result<(), Error> {
        self.apply(color)
    }

    fn off(&mut self) -> Result<(), Error> {
        self.red.clear_pwm()?;
        self.green.clear_pwm()?;
        self.blue.clear_pwm()?;

        // Inverted wiring idles high
        if self.active_low {
            self.red.set_high();
            self.green.set_high();
            self.blue.set_high();
        } else {
            self.red.set_low();
            self.green.set_low();
            self.blue.set_low();
        }
        Ok(())
    }
}

/// Build the renderer the config asks for.
pub fn from_config(config: &Config) -> Result<Box<dyn Renderer>, Error> {
    match config.renderer {
        crate::config::RendererChoice::Terminal => Ok(Box::new(TerminalRenderer::new())),
        #[cfg(feature = "pi")]
        crate::config::RendererChoice::Gpio => Ok(Box::new(PwmLedRenderer::new(&config.led)?)),
        #[cfg(not(feature = "pi"))]
        crate::config::RendererChoice::Gpio => {
            anyhow::bail!("GPIO rendering requires the 'pi' feature")
        }
    }
}
