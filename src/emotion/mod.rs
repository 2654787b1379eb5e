//! The fixed emotion set and the score-to-goal selection policies.
//!
//! The classifier reports a score in 0.0-1.0 for each of six emotions, and
//! each emotion has a fixed display color. The policies here turn one round
//! of scores into a goal for the controller: a single winner, a co-dominant
//! pair to blink between, or a weighted blend of everything above a floor.
//! They are pure functions, all the state lives in the controller.

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::color;

/// Scores below this are treated as noise by the blend policy.
pub const SCORE_FLOOR: f32 = 0.15;

/// Two scores within this margin of each other count as co-dominant.
pub const CO_DOMINANCE_MARGIN: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Emotion {
    Anger,
    Calmness,
    Embarrassment,
    Excitement,
    Romance,
    Sadness,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Anger,
        Emotion::Calmness,
        Emotion::Embarrassment,
        Emotion::Excitement,
        Emotion::Romance,
        Emotion::Sadness,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Anger => "Anger",
            Emotion::Calmness => "Calmness",
            Emotion::Embarrassment => "Embarrassment",
            Emotion::Excitement => "Excitement",
            Emotion::Romance => "Romance",
            Emotion::Sadness => "Sadness",
        }
    }

    /// The display color associated with this emotion.
    pub fn color(&self) -> Srgb<f32> {
        match self {
            // red
            Emotion::Anger => Srgb::new(1.0, 0.0, 0.0),
            // green
            Emotion::Calmness => Srgb::new(0.0, 1.0, 0.0),
            // yellow
            Emotion::Embarrassment => Srgb::new(1.0, 1.0, 0.0),
            // orange
            Emotion::Excitement => Srgb::new(1.0, 0.5, 0.0),
            // pink
            Emotion::Romance => Srgb::new(1.0, 0.0, 1.0),
            // blue
            Emotion::Sadness => Srgb::new(0.0, 0.0, 1.0),
        }
    }
}

/// What one round of classifier scores asks the controller to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalSelection {
    /// One emotion clearly dominates
    Steady(Emotion),
    /// Two emotions are co-dominant, alternate between them
    Alternating(Emotion, Emotion),
}

/// Pick the dominant emotion, or a co-dominant pair when the runner-up is
/// within `margin` of the top score.
pub fn select_goal(scores: &[(Emotion, f32)], margin: f32) -> Option<GoalSelection> {
    let mut ranked: Vec<(Emotion, f32)> = scores.to_vec();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (top, top_score) = *ranked.first()?;

    match ranked.get(1) {
        Some(&(second, second_score))
            if second_score > 0.0 && top_score - second_score <= margin =>
        {
            Some(GoalSelection::Alternating(top, second))
        }
        _ => Some(GoalSelection::Steady(top)),
    }
}

/// Blend the colors of every emotion scoring at least `floor`, weighted by
/// score. The label is the top contributor's. Returns `None` when nothing
/// clears the floor.
pub fn blend_goal(scores: &[(Emotion, f32)], floor: f32) -> Option<(Srgb<f32>, &'static str)> {
    let kept: Vec<(Emotion, f32)> = scores
        .iter()
        .filter(|(_, score)| *score >= floor)
        .copied()
        .collect();

    let total: f32 = kept.iter().map(|(_, score)| score).sum();
    if total <= 0.0 {
        return None;
    }

    let mut blended = color::BLACK;
    let mut top = kept[0];
    for (emotion, score) in &kept {
        let weight = score / total;
        let swatch = emotion.color();
        blended = Srgb::new(
            blended.red + swatch.red * weight,
            blended.green + swatch.green * weight,
            blended.blue + swatch.blue * weight,
        );
        if *score > top.1 {
            top = (*emotion, *score);
        }
    }

    Some((color::sanitize(blended), top.0.label()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: [f32; 6]) -> Vec<(Emotion, f32)> {
        Emotion::ALL.into_iter().zip(values).collect()
    }

    #[test]
    fn test_select_top_emotion() {
        let scores = scores([0.1, 0.7, 0.05, 0.2, 0.0, 0.3]);

        assert_eq!(
            Some(GoalSelection::Steady(Emotion::Calmness)),
            select_goal(&scores, CO_DOMINANCE_MARGIN)
        );
    }

    #[test]
    fn test_select_co_dominant_pair() {
        let scores = scores([0.1, 0.0, 0.163, 0.17, 0.015, 0.004]);

        assert_eq!(
            Some(GoalSelection::Alternating(
                Emotion::Excitement,
                Emotion::Embarrassment
            )),
            select_goal(&scores, CO_DOMINANCE_MARGIN)
        );
    }

    #[test]
    fn test_select_ignores_zero_runner_up() {
        let scores = scores([0.02, 0.0, 0.0, 0.0, 0.0, 0.0]);

        assert_eq!(
            Some(GoalSelection::Steady(Emotion::Anger)),
            select_goal(&scores, CO_DOMINANCE_MARGIN)
        );
    }

    #[test]
    fn test_select_empty_scores() {
        assert_eq!(None, select_goal(&[], CO_DOMINANCE_MARGIN));
    }

    #[test]
    fn test_blend_weights_sum_to_one() {
        // Anger and Sadness split evenly: half red, half blue
        let scores = scores([0.4, 0.0, 0.0, 0.0, 0.0, 0.4]);

        let (blended, label) = blend_goal(&scores, SCORE_FLOOR).unwrap();
        assert_eq!(Srgb::new(0.5, 0.0, 0.5), blended);
        assert_eq!("Anger", label);
    }

    #[test]
    fn test_blend_drops_scores_below_floor() {
        // Only Calmness clears the floor, so the blend is pure green
        let scores = scores([0.1, 0.6, 0.14, 0.0, 0.0, 0.02]);

        let (blended, label) = blend_goal(&scores, SCORE_FLOOR).unwrap();
        assert_eq!(Emotion::Calmness.color(), blended);
        assert_eq!("Calmness", label);
    }

    #[test]
    fn test_blend_nothing_above_floor() {
        let scores = scores([0.01, 0.02, 0.0, 0.05, 0.1, 0.0]);

        assert_eq!(None, blend_goal(&scores, SCORE_FLOOR));
    }

    #[test]
    fn test_blend_label_is_top_contributor() {
        let scores = scores([0.2, 0.0, 0.0, 0.5, 0.0, 0.3]);

        let (_, label) = blend_goal(&scores, SCORE_FLOOR).unwrap();
        assert_eq!("Excitement", label);
    }
}
