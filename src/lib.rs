use std::time::Duration;

use palette::Srgb;

pub mod color;
pub mod config;
pub mod controller;
pub mod emotion;
pub mod render;

pub mod prelude {
    pub use crate::ControlCommand;
    pub use crate::{color::*, config::*, controller::*, emotion::*, render::*};
}

/// Commands the animation loop drains at the top of every tick. The loop
/// task is the only writer of the controller state, so everything the
/// control plane wants goes through one of these.
#[derive(Clone, Debug)]
pub enum ControlCommand {
    /// Transition toward a single goal color
    SetGoal { color: Srgb<f32>, label: String },
    /// Alternate between two goal colors on a fixed interval
    SetBlinking {
        color_one: Srgb<f32>,
        label_one: String,
        color_two: Srgb<f32>,
        label_two: String,
        interval: Duration,
    },
    /// Stop the loop and turn the indicator off
    Stop,
}
