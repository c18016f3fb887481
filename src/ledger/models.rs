use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seed bankroll for a fresh ledger, in currency units.
pub const DEFAULT_BANKROLL: f64 = 50.0;
/// Seed per-bet cap as a fraction of bankroll.
pub const DEFAULT_PERCENT_BANKROLL: f64 = 0.25;

/// Bankroll settings. Exactly one row exists once the ledger has run;
/// created with the defaults above on first access.
///
/// `bankroll` is live-updated by bet placement and settlement and is
/// intentionally never clamped to ≥ 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Settings {
    pub bankroll: f64,
    /// Hard cap on a single stake as a fraction of bankroll (0.0–1.0).
    pub percent_bankroll: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bankroll: DEFAULT_BANKROLL,
            percent_bankroll: DEFAULT_PERCENT_BANKROLL,
        }
    }
}

/// The fixed set of wager types offered on a slip. `sport` stays free text;
/// the bet type is closed with Moneyline as the explicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BetType {
    #[default]
    Moneyline,
    Spread,
    OverUnder,
    Player,
}

impl BetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetType::Moneyline => "Moneyline",
            BetType::Spread => "Spread",
            BetType::OverUnder => "Over-Under",
            BetType::Player => "Player",
        }
    }

    /// Lenient parse; unrecognised text falls back to the default.
    pub fn parse(s: &str) -> BetType {
        match s.trim().to_lowercase().as_str() {
            "spread" => BetType::Spread,
            "over-under" | "over/under" | "overunder" | "over under" => BetType::OverUnder,
            "player" => BetType::Player,
            _ => BetType::Moneyline,
        }
    }
}

/// Result of a settled wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
        }
    }

    /// Defensive normalization for caller-supplied outcomes: anything that
    /// is not exactly `win` settles as a loss.
    pub fn normalize(s: &str) -> Outcome {
        if s == "win" {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }

    /// Signed settlement profit for a stake at the given decimal odds:
    /// `stake·(odds−1)` on a win, `−stake` on a loss.
    pub fn profit(self, stake: f64, odds: f64) -> f64 {
        match self {
            Outcome::Win => stake * (odds - 1.0),
            Outcome::Loss => -stake,
        }
    }
}

/// An active wager. The stake is already debited from the bankroll while
/// the bet is open (see the bankroll policy in [`crate::ledger`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenBet {
    pub id: i64,
    pub name: String,
    /// Free-text sport category, one of the two history join keys.
    pub sport: String,
    pub bet_type: BetType,
    /// Decimal odds (> 1.0).
    pub odds: f64,
    /// Bettor's estimated win probability (0–1).
    pub prob: f64,
    pub stake: f64,
    pub created_at: DateTime<Utc>,
    pub event_start: Option<DateTime<Utc>>,
}

/// A settled wager. Immutable once written; the sport/bet-type pair is what
/// the recommendation engine's historical lookup joins on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedBet {
    pub id: Option<i64>,
    pub name: String,
    pub sport: String,
    pub bet_type: BetType,
    pub odds: f64,
    pub prob: f64,
    pub stake: f64,
    pub outcome: Outcome,
    /// `stake·(odds−1)` on a win, `−stake` on a loss.
    pub profit: f64,
    /// Settlement time; backdated for historical imports.
    pub closed_at: DateTime<Utc>,
    pub event_start: Option<DateTime<Utc>>,
}

/// Descriptor for placing or importing a bet. `odds` is always decimal;
/// American-odds input is converted by the caller before it gets here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBet {
    pub name: String,
    pub sport: String,
    pub bet_type: BetType,
    pub odds: f64,
    pub prob: f64,
    pub stake: f64,
    pub event_start: Option<DateTime<Utc>>,
}

impl NewBet {
    pub fn validate(&self) -> Result<()> {
        validate_terms(self.odds, self.prob, self.stake)
    }
}

/// Partial update for an open bet; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct BetUpdate {
    pub name: Option<String>,
    pub sport: Option<String>,
    pub bet_type: Option<BetType>,
    pub odds: Option<f64>,
    pub prob: Option<f64>,
    pub stake: Option<f64>,
}

/// Shared validation for bet terms, both at placement and after an edit.
pub(crate) fn validate_terms(odds: f64, prob: f64, stake: f64) -> Result<()> {
    if !odds.is_finite() || odds <= 1.0 {
        anyhow::bail!("odds must be decimal odds greater than 1.0");
    }
    if !prob.is_finite() || prob <= 0.0 || prob >= 1.0 {
        anyhow::bail!("prob must be strictly between 0.0 and 1.0");
    }
    if !stake.is_finite() || stake <= 0.0 {
        anyhow::bail!("stake must be positive");
    }
    Ok(())
}
