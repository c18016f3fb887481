//! Recency-adjusted Kelly stake recommendation.
//!
//! Standard Kelly for decimal odds:
//!   f* = (b·p − q) / b
//! where
//!   b = odds − 1  (net payout per unit staked)
//!   p = win probability
//!   q = 1 − p
//!
//! Before the formula runs, the caller's subjective probability is blended
//! with a recency-weighted empirical win rate computed from previously
//! settled bets in the same sport/bet-type category:
//!   adjusted_p = ALPHA·p + (1 − ALPHA)·empirical
//! The blend is clamped to [MIN_PROB, MAX_PROB], the stake is capped at a
//! fixed fraction of bankroll, and the result is floored at MIN_STAKE.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ledger::models::{ClosedBet, Outcome};

/// Trust weight for the caller's own estimate (0–1, higher = lean less on
/// history).
pub const ALPHA: f64 = 0.6;
/// Recency time constant in days for the exponential history weighting.
pub const TAU_DAYS: f64 = 30.0;
/// Unconditional floor on the adjusted probability. The blend is never taken
/// below break-even no matter how poor the inputs; only the Kelly formula's
/// own negative-edge clamp guards against betting into bad odds.
pub const MIN_PROB: f64 = 0.5;
/// Cap on the adjusted probability, against extreme overconfidence.
pub const MAX_PROB: f64 = 0.95;
/// Smallest amount ever recommended. A display floor in currency units, not
/// betting theory.
pub const MIN_STAKE: f64 = 0.10;

/// History-derived probability summary for one sport/bet-type cohort.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EmpiricalInfo {
    /// Recency-weighted win rate, `None` when the cohort is empty.
    pub empirical: Option<f64>,
    /// Blended and clamped probability the Kelly formula would use.
    pub adjusted: f64,
    pub alpha: f64,
    /// Cohort size, independent of recency weights.
    pub matching_count: usize,
}

/// Recommended stake for a prospective bet, in currency units rounded to
/// cents.
///
/// `history` must already be filtered to the closed bets sharing the
/// prospective bet's sport and bet type; `now` anchors the recency
/// weighting so the computation is pure.
///
/// Never errors: missing or unparsable odds/probability yield `0.0`, as do
/// degenerate odds (≤ 1). Callers rely on always receiving a number.
pub fn recommend_stake(
    bankroll: f64,
    percent_bankroll: f64,
    odds: Option<f64>,
    prob: Option<f64>,
    history: &[ClosedBet],
    now: DateTime<Utc>,
) -> f64 {
    let (Some(odds), Some(prob)) = (odds, prob) else {
        return 0.0;
    };
    if !odds.is_finite() || !prob.is_finite() {
        return 0.0;
    }

    let b = odds - 1.0;
    if b <= 0.0 {
        return 0.0; // no edge to price
    }

    let (empirical, _) = weighted_win_rate(history, now);
    let adjusted = blend(prob, empirical);

    let f = ((b * adjusted - (1.0 - adjusted)) / b).max(0.0);
    let raw_stake = f * bankroll;
    let cap = percent_bankroll * bankroll;
    let recommended = raw_stake.min(cap).max(MIN_STAKE);
    round_cents(recommended)
}

/// Summarise a cohort's history for display: the recency-weighted win rate,
/// the blended probability the engine would feed to Kelly, and the cohort
/// size. With no history the blend falls back to the clamped raw `prob`.
pub fn empirical_info(history: &[ClosedBet], prob: f64, now: DateTime<Utc>) -> EmpiricalInfo {
    let (empirical, matching_count) = weighted_win_rate(history, now);
    EmpiricalInfo {
        empirical,
        adjusted: blend(prob, empirical),
        alpha: ALPHA,
        matching_count,
    }
}

/// Exponentially recency-weighted win rate over the cohort, plus the cohort
/// count. A bet settled `age_days` ago carries weight `exp(-age_days/TAU)`;
/// future-dated settlements clamp to age 0.
fn weighted_win_rate(history: &[ClosedBet], now: DateTime<Utc>) -> (Option<f64>, usize) {
    let mut weights_sum = 0.0;
    let mut weighted_wins = 0.0;
    for cb in history {
        let age_days = ((now - cb.closed_at).num_seconds() as f64 / 86_400.0).max(0.0);
        let weight = (-age_days / TAU_DAYS).exp();
        weights_sum += weight;
        if cb.outcome == Outcome::Win {
            weighted_wins += weight;
        }
    }
    let empirical = (weights_sum > 0.0).then(|| weighted_wins / weights_sum);
    (empirical, history.len())
}

fn blend(prob: f64, empirical: Option<f64>) -> f64 {
    let adjusted = match empirical {
        Some(e) => ALPHA * prob + (1.0 - ALPHA) * e,
        None => prob,
    };
    adjusted.clamp(MIN_PROB, MAX_PROB)
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
