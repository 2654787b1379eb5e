use anyhow::{bail, Error};
use log::{info, warn};
use moodring::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Parse one classifier line: six scores in 0.0-1.0, whitespace separated,
/// in the fixed emotion order (Anger, Calmness, Embarrassment, Excitement,
/// Romance, Sadness).
fn parse_scores(line: &str) -> Result<Vec<(Emotion, f32)>, Error> {
    let values = line
        .split_whitespace()
        .map(str::parse::<f32>)
        .collect::<Result<Vec<f32>, _>>()?;

    if values.len() != Emotion::ALL.len() {
        bail!(
            "expected {} scores, got {}",
            Emotion::ALL.len(),
            values.len()
        );
    }

    Ok(Emotion::ALL.into_iter().zip(values).collect())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    // Load the config file, falling back to defaults when there is none
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            info!("no config.ron loaded ({}), using defaults", e);
            Config::default()
        }
    };

    info!("renderer: {:?}, policy: {:?}", config.renderer, config.policy.mode);
    let renderer = from_config(&config)?;
    let mut controller = AnimationController::new(renderer, config.animation.clone());

    // Classifier scores arrive as lines on stdin, one line per audio window
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };

        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let scores = match parse_scores(&line) {
            Ok(scores) => scores,
            Err(e) => {
                warn!("ignoring bad classifier line: {}", e);
                continue;
            }
        };

        match config.policy.mode {
            PolicyMode::Top => match select_goal(&scores, config.policy.co_dominance_margin) {
                Some(GoalSelection::Steady(emotion)) => {
                    info!("goal: {}", emotion.label());
                    controller
                        .set_goal_color(emotion.color(), emotion.label())
                        .await?;
                }
                Some(GoalSelection::Alternating(first, second)) => {
                    info!("goal: {} / {}", first.label(), second.label());
                    controller
                        .set_blinking_colors(
                            first.color(),
                            first.label(),
                            second.color(),
                            second.label(),
                            config.policy.blink_interval(),
                        )
                        .await?;
                }
                None => warn!("no prediction"),
            },
            PolicyMode::Blend => match blend_goal(&scores, config.policy.score_floor) {
                Some((color, label)) => {
                    info!("goal: blend led by {}", label);
                    controller.set_goal_color(color, label).await?;
                }
                None => warn!("no prediction"),
            },
        }
    }

    info!("shutting down");
    controller.shutdown().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scores() {
        let scores = parse_scores("0.1 0.2 0.3 0.4 0.5 0.6").unwrap();

        assert_eq!(6, scores.len());
        assert_eq!((Emotion::Anger, 0.1), scores[0]);
        assert_eq!((Emotion::Sadness, 0.6), scores[5]);
    }

    #[test]
    fn test_parse_scores_rejects_wrong_count() {
        assert!(parse_scores("0.1 0.2").is_err());
        assert!(parse_scores("0.1 0.2 0.3 nope 0.5 0.6").is_err());
    }
}
