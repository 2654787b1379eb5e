//! The animation controller: a fixed-rate tick loop that owns the state
//! machine and pushes frames to a renderer, fed commands over a channel.
//!
//! The loop task is the single writer of [`ControllerState`]. Callers never
//! touch the state directly; `set_goal_color` and `set_blinking_colors`
//! queue a [`ControlCommand`] which the loop drains at the top of the next
//! tick, so a tick can never observe a half-applied setter.

use std::time::{Duration, Instant};

use anyhow::Error;
use log::{info, warn};
use palette::Srgb;
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};

use crate::{render::Renderer, ControlCommand};

pub mod state;

pub use state::{BlinkState, ControllerState, Frame, PulseState, TransitionState};

/// Timing and transition parameters for the animation loop.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Tick rate of the loop in frames per second
    pub frame_rate: u32,
    /// Ticks a color transition takes from start to goal
    pub transition_steps: u32,
    /// Pulse cycles per second
    pub pulse_frequency_hz: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            frame_rate: 30,
            // Half a second at 30 Hz
            transition_steps: 15,
            // One breath every three seconds
            pulse_frequency_hz: 1.0 / 3.0,
        }
    }
}

impl AnimationSettings {
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }
}

/// Owns the tick loop and the command channel feeding it.
///
/// The loop is started lazily by the first goal-setting call and runs until
/// [`shutdown`](Self::shutdown). Starting is idempotent: once the worker is
/// spawned, later setters only queue commands.
pub struct AnimationController {
    commands: mpsc::Sender<ControlCommand>,
    worker: Option<Worker>,
    handle: Option<JoinHandle<()>>,
}

struct Worker {
    state: ControllerState,
    settings: AnimationSettings,
    renderer: Box<dyn Renderer>,
    commands: mpsc::Receiver<ControlCommand>,
}

impl AnimationController {
    pub fn new(renderer: Box<dyn Renderer>, settings: AnimationSettings) -> Self {
        let (tx, rx) = mpsc::channel(100);

        Self {
            commands: tx,
            worker: Some(Worker {
                state: ControllerState::new(settings.transition_steps, settings.pulse_frequency_hz),
                settings,
                renderer,
                commands: rx,
            }),
            handle: None,
        }
    }

    /// Queue a transition toward a single goal color.
    pub async fn set_goal_color(&mut self, color: Srgb<f32>, label: &str) -> Result<(), Error> {
        self.ensure_running();
        self.commands
            .send(ControlCommand::SetGoal {
                color,
                label: label.to_string(),
            })
            .await?;
        Ok(())
    }

    /// Queue an alternating presentation between two goal colors.
    pub async fn set_blinking_colors(
        &mut self,
        color_one: Srgb<f32>,
        label_one: &str,
        color_two: Srgb<f32>,
        label_two: &str,
        interval: Duration,
    ) -> Result<(), Error> {
        self.ensure_running();
        self.commands
            .send(ControlCommand::SetBlinking {
                color_one,
                label_one: label_one.to_string(),
                color_two,
                label_two: label_two.to_string(),
                interval,
            })
            .await?;
        Ok(())
    }

    /// A clone of the command channel, for collaborators that feed the loop
    /// directly. Spawns the loop if it is not running yet.
    pub fn command_channel(&mut self) -> mpsc::Sender<ControlCommand> {
        self.ensure_running();
        self.commands.clone()
    }

    /// Stop the loop after its current frame and wait for it to finish. The
    /// renderer is turned off before the task returns.
    pub async fn shutdown(mut self) -> Result<(), Error> {
        if let Some(handle) = self.handle.take() {
            self.commands.send(ControlCommand::Stop).await?;
            handle.await?;
        }
        Ok(())
    }

    fn ensure_running(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.handle = Some(tokio::spawn(worker.run()));
        }
    }
}

impl Worker {
    async fn run(mut self) {
        let budget = self.settings.frame_budget();
        info!(
            "animation loop running at {} Hz ({} transition steps)",
            self.settings.frame_rate, self.settings.transition_steps
        );

        loop {
            let tick_start = Instant::now();

            // Apply every pending command before advancing, so the tick
            // sees whole setter updates only
            loop {
                match self.commands.try_recv() {
                    Ok(ControlCommand::SetGoal { color, label }) => {
                        self.state.set_goal_color(color, &label);
                    }
                    Ok(ControlCommand::SetBlinking {
                        color_one,
                        label_one,
                        color_two,
                        label_two,
                        interval,
                    }) => {
                        self.state.set_blinking_colors(
                            color_one, &label_one, color_two, &label_two, interval, tick_start,
                        );
                    }
                    Ok(ControlCommand::Stop) => {
                        self.stop();
                        return;
                    }
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        self.stop();
                        return;
                    }
                }
            }

            let frame = self.state.tick(tick_start, budget);
            if let Err(e) = self
                .renderer
                .render(frame.color, &frame.label, frame.progress)
            {
                // Renderer trouble is transient, keep animating
                warn!("renderer error: {}", e);
            }

            // Self-paced timing: sleep off the rest of the frame budget,
            // or carry straight on if the tick overran it
            let elapsed = tick_start.elapsed();
            if elapsed < budget {
                sleep(budget - elapsed).await;
            } else {
                tokio::task::yield_now().await;
            }
        }
    }

    fn stop(&mut self) {
        info!("animation loop stopping");
        if let Err(e) = self.renderer.off() {
            warn!("failed to turn off renderer: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const RED: Srgb<f32> = Srgb::new(1.0, 0.0, 0.0);
    const BLUE: Srgb<f32> = Srgb::new(0.0, 0.0, 1.0);

    /// Renderer that records every frame it is handed.
    #[derive(Clone, Default)]
    struct RecordingRenderer {
        frames: Arc<Mutex<Vec<Frame>>>,
        off_calls: Arc<Mutex<u32>>,
    }

    impl Renderer for RecordingRenderer {
        fn render(
            &mut self,
            color: Srgb<f32>,
            label: &str,
            progress: Option<f32>,
        ) -> Result<(), Error> {
            self.frames.lock().unwrap().push(Frame {
                color,
                label: label.to_string(),
                progress,
            });
            Ok(())
        }

        fn off(&mut self) -> Result<(), Error> {
            *self.off_calls.lock().unwrap() += 1;
            Ok(())
        }
    }

    /// Renderer that always fails, to prove the loop keeps ticking.
    struct BrokenRenderer;

    impl Renderer for BrokenRenderer {
        fn render(&mut self, _: Srgb<f32>, _: &str, _: Option<f32>) -> Result<(), Error> {
            Err(anyhow::anyhow!("display went away"))
        }

        fn off(&mut self) -> Result<(), Error> {
            Ok(())
        }
    }

    fn fast_settings() -> AnimationSettings {
        AnimationSettings {
            frame_rate: 200,
            transition_steps: 10,
            pulse_frequency_hz: 1.0 / 3.0,
        }
    }

    #[tokio::test]
    async fn test_loop_drives_transition_to_goal() {
        let renderer = RecordingRenderer::default();
        let frames = renderer.frames.clone();
        let mut controller = AnimationController::new(Box::new(renderer), fast_settings());

        controller.set_goal_color(RED, "Anger").await.unwrap();
        sleep(Duration::from_millis(150)).await;
        controller.shutdown().await.unwrap();

        let frames = frames.lock().unwrap();
        assert!(frames.len() >= 10, "expected at least 10 frames");

        let last = frames.last().unwrap();
        assert_eq!("Anger", last.label);
        assert_eq!(None, last.progress);
        // Transition done, only the pulse is scaling the red channel
        assert!(last.color.red >= 0.7);
        assert_eq!(0.0, last.color.green);
        assert_eq!(0.0, last.color.blue);
    }

    #[tokio::test]
    async fn test_loop_not_started_until_first_goal() {
        let renderer = RecordingRenderer::default();
        let frames = renderer.frames.clone();
        let mut controller = AnimationController::new(Box::new(renderer), fast_settings());

        sleep(Duration::from_millis(50)).await;
        assert!(frames.lock().unwrap().is_empty());

        controller.set_goal_color(RED, "Anger").await.unwrap();
        sleep(Duration::from_millis(50)).await;
        assert!(!frames.lock().unwrap().is_empty());

        controller.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_turns_renderer_off() {
        let renderer = RecordingRenderer::default();
        let off_calls = renderer.off_calls.clone();
        let mut controller = AnimationController::new(Box::new(renderer), fast_settings());

        controller.set_goal_color(RED, "Anger").await.unwrap();
        sleep(Duration::from_millis(30)).await;
        controller.shutdown().await.unwrap();

        assert_eq!(1, *off_calls.lock().unwrap());
    }

    #[tokio::test]
    async fn test_renderer_errors_do_not_stop_the_loop() {
        let mut controller = AnimationController::new(Box::new(BrokenRenderer), fast_settings());

        controller.set_goal_color(RED, "Anger").await.unwrap();
        sleep(Duration::from_millis(50)).await;

        // The loop is still alive and accepting commands
        controller.set_goal_color(BLUE, "Sadness").await.unwrap();
        controller.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_loop_blinks_between_goals() {
        let renderer = RecordingRenderer::default();
        let frames = renderer.frames.clone();
        let mut controller = AnimationController::new(Box::new(renderer), fast_settings());

        controller
            .set_blinking_colors(RED, "Anger", BLUE, "Sadness", Duration::from_millis(60))
            .await
            .unwrap();
        sleep(Duration::from_millis(200)).await;
        controller.shutdown().await.unwrap();

        let frames = frames.lock().unwrap();
        let labels: Vec<&str> = frames.iter().map(|f| f.label.as_str()).collect();
        assert!(labels.contains(&"Anger"));
        assert!(labels.contains(&"Sadness"));
    }
}
