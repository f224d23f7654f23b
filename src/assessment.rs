//! Bergen Social Media Addiction Scale (BSMAS) scoring.
//!
//! Six statements answered on a 1-5 Likert scale; the summed score (6-30)
//! maps onto a coarse risk level shown after onboarding.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub const BSMAS_QUESTIONS: [&str; 6] = [
    "You spend a lot of time thinking about social media or planning how to use it",
    "You feel an urge to use social media more and more",
    "You use social media in order to forget about personal problems",
    "You have tried to cut down on the use of social media without success",
    "You become restless or troubled if you are prohibited from using social media",
    "You use social media so much that it has had a negative impact on your job/studies",
];

pub const LIKERT_MIN: u8 = 1;
pub const LIKERT_MAX: u8 = 5;

pub const MIN_SCORE: u8 = BSMAS_QUESTIONS.len() as u8 * LIKERT_MIN;
pub const MAX_SCORE: u8 = BSMAS_QUESTIONS.len() as u8 * LIKERT_MAX;

const LOW_RISK_MAX: u8 = 12;
const MODERATE_RISK_MAX: u8 = 18;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Scores outside 6-30 are clamped before classification.
    pub fn from_score(score: u8) -> Self {
        let score = score.clamp(MIN_SCORE, MAX_SCORE);
        if score <= LOW_RISK_MAX {
            RiskLevel::Low
        } else if score <= MODERATE_RISK_MAX {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskLevel::Low => {
                "Your social media use appears healthy. beo will help you maintain balance."
            }
            RiskLevel::Moderate => {
                "You show some signs of problematic use. beo can help you build better habits."
            }
            RiskLevel::High => {
                "Your usage patterns suggest you could benefit significantly from mindful breaks."
            }
        }
    }
}

/// Sums a complete questionnaire. Every question must be answered.
pub fn score(answers: &[u8]) -> Result<u8> {
    if answers.len() != BSMAS_QUESTIONS.len() {
        bail!(
            "expected {} answers, got {}",
            BSMAS_QUESTIONS.len(),
            answers.len()
        );
    }

    if let Some((index, answer)) = answers
        .iter()
        .enumerate()
        .find(|(_, answer)| !(LIKERT_MIN..=LIKERT_MAX).contains(*answer))
    {
        bail!("answer {} is {answer}, expected {LIKERT_MIN}-{LIKERT_MAX}", index + 1);
    }

    Ok(answers.iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_sums_valid_answers() {
        assert_eq!(score(&[1, 1, 1, 1, 1, 1]).unwrap(), 6);
        assert_eq!(score(&[5, 5, 5, 5, 5, 5]).unwrap(), 30);
        assert_eq!(score(&[2, 3, 4, 1, 5, 2]).unwrap(), 17);
    }

    #[test]
    fn score_rejects_incomplete_or_out_of_scale_answers() {
        assert!(score(&[1, 2, 3]).is_err());
        assert!(score(&[0, 2, 3, 4, 5, 1]).is_err());
        assert!(score(&[6, 2, 3, 4, 5, 1]).is_err());
    }

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(6), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(12), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(13), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(18), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(19), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::High);
    }

    #[test]
    fn risk_level_clamps_out_of_range_scores() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(200), RiskLevel::High);
    }
}
