//! The controller's state machine: color transitions, pulse modulation, and
//! blink scheduling. Everything here is synchronous and driven by explicit
//! `now` / `dt` arguments so the async loop and the tests share one code
//! path.

use std::time::{Duration, Instant};

use palette::Srgb;

use crate::color;

/// Pulse brightness never drops below this fraction of full, so the
/// indicator stays visibly lit while idling.
pub const MIN_PULSE_INTENSITY: f64 = 0.7;

/// An in-flight linear transition from `start` toward `goal`.
#[derive(Debug, Clone)]
pub struct TransitionState {
    pub start: Srgb<f32>,
    pub goal: Option<Srgb<f32>>,
    pub step: u32,
    pub total_steps: u32,
}

impl TransitionState {
    fn new(total_steps: u32) -> Self {
        Self {
            start: color::BLACK,
            goal: None,
            step: 0,
            total_steps,
        }
    }

    /// True once the transition has played out (or never had a goal).
    pub fn is_complete(&self) -> bool {
        self.goal.is_none() || self.step >= self.total_steps
    }

    fn retarget(&mut self, start: Srgb<f32>, goal: Srgb<f32>) {
        self.start = start;
        self.goal = Some(goal);
        self.step = 0;
    }
}

/// Alternating presentation between two goal colors on a fixed interval.
#[derive(Debug, Clone)]
pub struct BlinkState {
    pub color_one: Srgb<f32>,
    pub color_two: Srgb<f32>,
    pub label_one: String,
    pub label_two: String,
    pub interval: Duration,
    pub active_is_one: bool,
    pub last_switch: Instant,
}

impl BlinkState {
    fn active_target(&self) -> (Srgb<f32>, &str) {
        if self.active_is_one {
            (self.color_one, &self.label_one)
        } else {
            (self.color_two, &self.label_two)
        }
    }

    fn same_configuration(
        &self,
        color_one: Srgb<f32>,
        label_one: &str,
        color_two: Srgb<f32>,
        label_two: &str,
        interval: Duration,
    ) -> bool {
        self.color_one == color_one
            && self.color_two == color_two
            && self.label_one == label_one
            && self.label_two == label_two
            && self.interval == interval
    }
}

/// Periodic brightness oscillation, independent of the color transition.
#[derive(Debug, Clone)]
pub struct PulseState {
    pub phase: f64,
    pub frequency_hz: f64,
}

impl PulseState {
    fn new(frequency_hz: f64) -> Self {
        Self {
            phase: 0.0,
            frequency_hz,
        }
    }

    fn advance(&mut self, dt: Duration) {
        self.phase = (self.phase + dt.as_secs_f64() * self.frequency_hz) % 1.0;
    }

    /// Brightness factor in [0.7, 1.0]: 1.0 at phase 0.25, 0.7 at 0.75.
    pub fn intensity(&self) -> f32 {
        let amplitude = (1.0 - MIN_PULSE_INTENSITY) / 2.0;
        let wave = 1.0 + (std::f64::consts::TAU * self.phase).sin();
        (MIN_PULSE_INTENSITY + amplitude * wave) as f32
    }
}

/// What one tick hands to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub color: Srgb<f32>,
    pub label: String,
    pub progress: Option<f32>,
}

/// The aggregate animation state. Owned by the tick loop; the only mutators
/// are [`tick`](Self::tick) and the two setters.
#[derive(Debug, Clone)]
pub struct ControllerState {
    unmodulated: Srgb<f32>,
    label: String,
    transition: TransitionState,
    blink: Option<BlinkState>,
    pulse: PulseState,
}

impl ControllerState {
    pub fn new(transition_steps: u32, pulse_frequency_hz: f64) -> Self {
        Self {
            unmodulated: color::BLACK,
            label: String::new(),
            transition: TransitionState::new(transition_steps),
            blink: None,
            pulse: PulseState::new(pulse_frequency_hz),
        }
    }

    /// Start transitioning toward `goal`, cancelling any active blink.
    ///
    /// Repeating the current goal and label after the transition already
    /// finished just snaps to the goal, so repeated identical classifier
    /// output does not restart the sweep. The comparison is exact bit
    /// equality on the channels; goal colors come from a fixed table, so
    /// epsilon tolerance buys nothing.
    pub fn set_goal_color(&mut self, goal: Srgb<f32>, label: &str) {
        let goal = color::sanitize(goal);
        self.blink = None;

        if self.transition.goal == Some(goal)
            && self.label == label
            && self.transition.is_complete()
        {
            self.unmodulated = goal;
            return;
        }

        self.label = label.to_string();
        self.transition.retarget(self.unmodulated, goal);
    }

    /// Start alternating between two goal colors on `interval`.
    ///
    /// A request identical to the active blink configuration is a no-op, so
    /// repeated classifier output does not restart the cycle. Otherwise the
    /// first target is `color_one`, transitioned to from wherever the color
    /// currently is.
    #[allow(clippy::too_many_arguments)]
    pub fn set_blinking_colors(
        &mut self,
        color_one: Srgb<f32>,
        label_one: &str,
        color_two: Srgb<f32>,
        label_two: &str,
        interval: Duration,
        now: Instant,
    ) {
        let color_one = color::sanitize(color_one);
        let color_two = color::sanitize(color_two);

        if let Some(blink) = &self.blink {
            if blink.same_configuration(color_one, label_one, color_two, label_two, interval) {
                return;
            }
        }

        self.blink = Some(BlinkState {
            color_one,
            color_two,
            label_one: label_one.to_string(),
            label_two: label_two.to_string(),
            interval,
            active_is_one: true,
            last_switch: now,
        });

        self.label = label_one.to_string();
        self.transition.retarget(self.unmodulated, color_one);
    }

    /// Advance the state machine by one frame and produce the render output.
    ///
    /// Order matters: blink arbitration may retarget the transition, the
    /// transition resolves the unmodulated color, then the pulse scales it.
    pub fn tick(&mut self, now: Instant, dt: Duration) -> Frame {
        // Blink arbitration
        if let Some(blink) = &mut self.blink {
            if now.duration_since(blink.last_switch) >= blink.interval {
                blink.active_is_one = !blink.active_is_one;
                blink.last_switch = now;

                let (goal, label) = blink.active_target();
                self.label = label.to_string();
                self.transition.retarget(self.unmodulated, goal);
            }
        }

        // Transition advance
        if let Some(goal) = self.transition.goal {
            if self.transition.step < self.transition.total_steps {
                self.transition.step += 1;
            }
            self.unmodulated = if self.transition.is_complete() {
                // Land on the goal exactly, no residual float error
                goal
            } else {
                color::interpolate(
                    self.transition.start,
                    goal,
                    self.transition.step,
                    self.transition.total_steps,
                )
            };
        }

        // Pulse advance
        self.pulse.advance(dt);

        Frame {
            color: color::scale(self.unmodulated, self.pulse.intensity()),
            label: self.label.clone(),
            progress: self.progress(),
        }
    }

    /// Transition progress in [0, 1], `None` once complete.
    pub fn progress(&self) -> Option<f32> {
        match self.transition.goal {
            Some(_) if !self.transition.is_complete() => {
                Some(self.transition.step as f32 / self.transition.total_steps as f32)
            }
            _ => None,
        }
    }

    pub fn unmodulated_color(&self) -> Srgb<f32> {
        self.unmodulated
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn transition(&self) -> &TransitionState {
        &self.transition
    }

    pub fn blink(&self) -> Option<&BlinkState> {
        self.blink.as_ref()
    }

    pub fn pulse(&self) -> &PulseState {
        &self.pulse
    }
}
