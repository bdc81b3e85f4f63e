//! Risk and composite quality scoring.
//!
//! Both scorers are pure functions of their input signals plus an explicit
//! `now`, so results are reproducible in tests. Scores live on a 0.0–5.0
//! scale and months are measured as 30-day blocks of wall-clock time.

use chrono::{DateTime, Utc};

pub const MAX_SCORE: f64 = 5.0;

const MS_PER_MONTH: f64 = 30.0 * 86_400_000.0;

/// Raw signals feeding the risk evaluation.
#[derive(Debug, Clone)]
pub struct RiskSignals {
    pub stars: i64,
    pub last_commit: DateTime<Utc>,
    pub has_env_example: bool,
    pub dependencies: Vec<String>,
    pub contributors: i64,
    pub open_issues: i64,
    pub loc: i64,
    pub license: Option<String>,
}

/// Risk evaluation result: the capped additive score plus the factors that
/// fired, in evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub score: f64,
    pub factors: Vec<String>,
}

/// Signals feeding the composite quality score.
#[derive(Debug, Clone)]
pub struct ScoreSignals {
    pub stars: i64,
    pub contributors: i64,
    pub core_features: Vec<String>,
    pub has_env_example: bool,
    pub last_commit: DateTime<Utc>,
    pub risk_score: f64,
}

fn months_since(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - then).num_milliseconds() as f64 / MS_PER_MONTH
}

/// Additive risk score over fixed thresholds, capped at [`MAX_SCORE`].
///
/// The factor order is stable and part of the observable contract: callers
/// persist the factor list verbatim. A license of `None` and the literal
/// string "None" both count as missing.
pub fn evaluate_risk(signals: &RiskSignals, now: DateTime<Utc>) -> RiskAssessment {
    let mut score: f64 = 0.0;
    let mut factors = Vec::new();

    if signals.stars < 100 {
        score += 1.5;
        factors.push("Low star count (< 100)".to_string());
    }

    if signals.contributors < 3 {
        score += 1.0;
        factors.push("Few contributors (< 3)".to_string());
    }

    let months_inactive = months_since(signals.last_commit, now);
    if months_inactive > 12.0 {
        score += 2.0;
        factors.push("No updates in over 12 months".to_string());
    } else if months_inactive > 6.0 {
        score += 1.0;
        factors.push("No updates in over 6 months".to_string());
    }

    if signals.open_issues > 50 {
        score += 1.0;
        factors.push("Many unresolved issues (> 50)".to_string());
    }

    if signals.loc > 10_000 {
        score += 1.0;
        factors.push("Large codebase (LOC > 10,000)".to_string());
    }

    if signals.dependencies.len() > 50 {
        score += 0.5;
        factors.push("Heavy dependency footprint (> 50)".to_string());
    }

    if !signals.has_env_example {
        score += 0.5;
        factors.push("Missing environment variable example".to_string());
    }

    if matches!(signals.license.as_deref(), None | Some("None")) {
        score += 0.5;
        factors.push("Missing license".to_string());
    }

    RiskAssessment {
        score: score.min(MAX_SCORE),
        factors,
    }
}

/// Weighted composite of normalized popularity, completeness, recency, and
/// risk signals, scaled to 0–5 and rounded to one decimal.
pub fn custom_score(signals: &ScoreSignals, now: DateTime<Utc>) -> f64 {
    let stars_norm = (signals.stars as f64 / 5000.0).min(1.0);
    let contributors_norm = (signals.contributors as f64 / 50.0).min(1.0);
    let features_norm = (signals.core_features.len() as f64 / 5.0).min(1.0);
    let env_norm = if signals.has_env_example { 1.0 } else { 0.0 };

    let months_inactive = months_since(signals.last_commit, now);
    let recency_norm = if months_inactive <= 3.0 {
        1.0
    } else if months_inactive <= 6.0 {
        0.5
    } else {
        0.0
    };

    let risk_adjustment = 1.0 - signals.risk_score / MAX_SCORE;

    let score = (stars_norm * 0.25
        + contributors_norm * 0.15
        + features_norm * 0.2
        + env_norm * 0.1
        + recency_norm * 0.2
        + risk_adjustment * 0.1)
        * MAX_SCORE;

    (score * 10.0).round() / 10.0
}
