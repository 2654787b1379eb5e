//! Cycles the terminal renderer through all six emotion colors, then shows
//! the blinking presentation. Handy for eyeballing transitions and pulse
//! without a classifier attached.

use std::time::Duration;

use anyhow::Error;
use moodring::prelude::*;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let renderer = Box::new(TerminalRenderer::new());
    let mut controller = AnimationController::new(renderer, AnimationSettings::default());

    for emotion in Emotion::ALL {
        controller
            .set_goal_color(emotion.color(), emotion.label())
            .await?;
        sleep(Duration::from_secs(3)).await;
    }

    // Co-dominant pair: alternate between the two
    controller
        .set_blinking_colors(
            Emotion::Anger.color(),
            Emotion::Anger.label(),
            Emotion::Sadness.color(),
            Emotion::Sadness.label(),
            Duration::from_millis(750),
        )
        .await?;
    sleep(Duration::from_secs(6)).await;

    controller.shutdown().await?;
    Ok(())
}
