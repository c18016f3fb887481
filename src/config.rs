use clap::{Parser, Subcommand};

/// Kelly-criterion bet sizing and bankroll tracking
#[derive(Parser, Debug)]
#[command(name = "betbook", version, about)]
pub struct Cli {
    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = "bets.db")]
    pub database_path: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show bankroll settings, optionally updating either field first
    Settings {
        /// New bankroll amount
        #[arg(long)]
        bankroll: Option<f64>,
        /// New per-bet cap as a fraction of bankroll (0.0–1.0)
        #[arg(long)]
        percent_bankroll: Option<f64>,
    },
    /// Place an open bet (reserves the stake from the bankroll)
    Place {
        #[arg(long)]
        name: String,
        /// Sport category (free text), used to match historical bets
        #[arg(long, default_value = "")]
        sport: String,
        /// Bet type: moneyline, spread, over-under or player
        #[arg(long, default_value = "moneyline")]
        bet_type: String,
        /// Decimal odds (> 1.0)
        #[arg(long)]
        odds: f64,
        /// Estimated win probability (0–1)
        #[arg(long)]
        prob: f64,
        /// Stake in currency units
        #[arg(long)]
        stake: f64,
        /// Event start time, "YYYY-MM-DDTHH:MM"
        #[arg(long)]
        event_start: Option<String>,
    },
    /// Edit fields of an open bet
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        sport: Option<String>,
        #[arg(long)]
        bet_type: Option<String>,
        #[arg(long)]
        odds: Option<f64>,
        #[arg(long)]
        prob: Option<f64>,
        /// Changing the stake re-reserves the difference from the bankroll
        #[arg(long)]
        stake: Option<f64>,
    },
    /// Cancel an open bet and refund its stake
    Cancel { id: i64 },
    /// Settle an open bet as win or loss
    Settle {
        id: i64,
        /// "win" or "loss"; anything else settles as a loss
        outcome: String,
        /// Backdated close time, "YYYY-MM-DDTHH:MM" (defaults to now)
        #[arg(long)]
        closed_at: Option<String>,
    },
    /// Record a historical closed bet in American odds (no bankroll effect)
    Import {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        sport: String,
        #[arg(long, default_value = "moneyline")]
        bet_type: String,
        /// American odds, e.g. -120 or 150 (nonzero)
        #[arg(long, allow_hyphen_values = true)]
        american_odds: f64,
        #[arg(long)]
        prob: f64,
        #[arg(long)]
        stake: f64,
        /// "win" or "loss"
        #[arg(long)]
        outcome: String,
        /// Settlement time, "YYYY-MM-DDTHH:MM" (defaults to now)
        #[arg(long)]
        closed_at: Option<String>,
        #[arg(long)]
        event_start: Option<String>,
    },
    /// Recommend a stake for the given odds and probability
    Recommend {
        #[arg(long, default_value = "")]
        sport: String,
        #[arg(long, default_value = "moneyline")]
        bet_type: String,
        /// Decimal odds; unparsable input yields a 0.00 recommendation
        #[arg(long)]
        odds: String,
        /// Estimated win probability; unparsable input yields 0.00
        #[arg(long)]
        prob: String,
        #[arg(long)]
        json: bool,
    },
    /// Show the empirical win-rate blend for a category
    Info {
        #[arg(long, default_value = "")]
        sport: String,
        #[arg(long, default_value = "moneyline")]
        bet_type: String,
        #[arg(long, default_value = "0.5")]
        prob: f64,
        #[arg(long)]
        json: bool,
    },
    /// List open and closed bets
    List {
        /// Only closed bets
        #[arg(long, conflicts_with = "open")]
        closed: bool,
        /// Only open bets
        #[arg(long)]
        open: bool,
        #[arg(long)]
        json: bool,
    },
    /// Aggregate ledger stats
    Stats {
        #[arg(long)]
        json: bool,
    },
}
