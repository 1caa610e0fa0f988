//! Quality grading policy.
//!
//! Confidence maps to a grade and a continuous score through a piecewise
//! linear curve. The branch boundaries are strict `>` comparisons: exactly
//! 80 grades Standard and exactly 60 grades Poor. The score curve also jumps
//! from 68 to 70 across the 60 boundary; both behaviors are long-standing
//! compatibility constraints, not bugs.

use crate::core::types::{Grade, QualityAssessment};
use rand::Rng;

/// Map classification confidence (percent) to grade and score.
pub fn grade_confidence(confidence: f64) -> (Grade, f64) {
    if confidence > 80.0 {
        (Grade::Premium, 85.0 + (confidence - 80.0) * 0.5)
    } else if confidence > 60.0 {
        (Grade::Standard, 70.0 + (confidence - 60.0) * 0.5)
    } else {
        (Grade::Poor, 50.0 + confidence * 0.3)
    }
}

/// Full assessment: grade, score, and three jittered visual sub-metrics.
///
/// Each sub-metric is score + U[-5,+5], drawn independently from the
/// injected RNG. Seed the RNG to make them reproducible.
pub fn assess(confidence: f64, rng: &mut impl Rng) -> QualityAssessment {
    let (grade, score) = grade_confidence(confidence);
    QualityAssessment {
        grade,
        score,
        eye_clarity: score + rng.random_range(-5.0..=5.0),
        gill_color: score + rng.random_range(-5.0..=5.0),
        skin_condition: score + rng.random_range(-5.0..=5.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_reference_scenarios() {
        assert_eq!(grade_confidence(85.0), (Grade::Premium, 87.5));
        assert_eq!(grade_confidence(70.0), (Grade::Standard, 75.0));
        assert_eq!(grade_confidence(50.0), (Grade::Poor, 65.0));
    }

    #[test]
    fn test_boundaries_are_strict() {
        // Exactly 80 is Standard, exactly 60 is Poor
        assert_eq!(grade_confidence(80.0), (Grade::Standard, 80.0));
        assert_eq!(grade_confidence(60.0), (Grade::Poor, 68.0));
        assert_eq!(grade_confidence(80.001).0, Grade::Premium);
        assert_eq!(grade_confidence(60.001).0, Grade::Standard);
    }

    #[test]
    fn test_score_jump_at_sixty() {
        // Accepted discontinuity: Poor side tops out at 68, Standard side
        // starts at 70
        let (_, below) = grade_confidence(60.0);
        let (_, above) = grade_confidence(60.0 + 1e-9);
        assert_eq!(below, 68.0);
        assert!((above - 70.0).abs() < 1e-6);
    }

    #[test]
    fn test_premium_for_full_confidence() {
        let (grade, score) = grade_confidence(100.0);
        assert_eq!(grade, Grade::Premium);
        assert_eq!(score, 95.0);
    }

    #[test]
    fn test_sub_metrics_stay_within_jitter_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for confidence in [10.0, 55.0, 72.0, 91.0] {
            let assessment = assess(confidence, &mut rng);
            let score = assessment.score;
            for metric in [
                assessment.eye_clarity,
                assessment.gill_color,
                assessment.skin_condition,
            ] {
                assert!(metric >= score - 5.0 && metric <= score + 5.0);
            }
        }
    }
}
