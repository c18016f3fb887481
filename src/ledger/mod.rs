//! Open/closed bet ledger with live bankroll bookkeeping.
//!
//! Bankroll policy: **the stake is reserved at placement**. Placing a bet
//! debits the bankroll by the stake, cancelling refunds it, and settlement
//! credits `stake × odds` on a win (principal plus profit) and nothing
//! further on a loss. Historical imports never touch the bankroll. The same
//! policy applies to stake edits, which re-reserve the difference.
//!
//! Every lifecycle transition runs inside a single SQLite transaction so the
//! bankroll row and the bet tables cannot diverge, and the connection mutex
//! serializes concurrent read-modify-write updates of the bankroll.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub mod models;
use models::*;

/// Fixed format for caller-supplied timestamps (`2024-03-01T18:30`).
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Lifecycle operation on an id with no open bet behind it. Surfaced to
    /// the caller; there is no sensible silent default.
    #[error("no open bet with id {0}")]
    BetNotFound(i64),
}

/// Thread-safe handle to the SQLite-backed ledger (single connection with
/// mutex, WAL mode).
#[derive(Clone)]
pub struct Ledger {
    conn: Arc<Mutex<Connection>>,
}

impl Ledger {
    /// Open (or create) the ledger database at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let ledger = Ledger {
            conn: Arc::new(Mutex::new(conn)),
        };
        ledger.run_migrations()?;
        Ok(ledger)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // ── Settings ─────────────────────────────────────────────────────────────

    /// Fetch the bankroll settings, creating the row with defaults on first
    /// access.
    pub fn settings(&self) -> Result<Settings> {
        let conn = self.conn.lock().unwrap();
        settings_with(&conn)
    }

    /// Update either settings field; `None` keeps the current value.
    pub fn update_settings(
        &self,
        bankroll: Option<f64>,
        percent_bankroll: Option<f64>,
    ) -> Result<Settings> {
        if let Some(pct) = percent_bankroll {
            if !(0.0..=1.0).contains(&pct) {
                anyhow::bail!("percent_bankroll must be between 0.0 and 1.0");
            }
        }
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let current = settings_with(&tx)?;
        let next = Settings {
            bankroll: bankroll.unwrap_or(current.bankroll),
            percent_bankroll: percent_bankroll.unwrap_or(current.percent_bankroll),
        };
        tx.execute(
            "UPDATE settings SET bankroll=?1, percent_bankroll=?2 WHERE id=1",
            params![next.bankroll, next.percent_bankroll],
        )?;
        tx.commit()?;
        Ok(next)
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Place a bet: insert the open record and reserve its stake from the
    /// bankroll.
    pub fn place_bet(&self, bet: &NewBet) -> Result<i64> {
        bet.validate()?;
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        settings_with(&tx)?;
        tx.execute(
            "INSERT INTO open_bets (name, sport, bet_type, odds, prob, stake, created_at, event_start)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                bet.name,
                bet.sport,
                bet.bet_type.as_str(),
                bet.odds,
                bet.prob,
                bet.stake,
                Utc::now(),
                bet.event_start,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE settings SET bankroll = bankroll - ?1 WHERE id=1",
            params![bet.stake],
        )?;
        tx.commit()?;
        Ok(id)
    }

    /// Cancel an open bet and refund its reserved stake. Only valid while
    /// the bet is open.
    pub fn cancel_bet(&self, id: i64) -> Result<OpenBet> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let bet = get_open_with(&tx, id)?.ok_or(LedgerError::BetNotFound(id))?;
        tx.execute("DELETE FROM open_bets WHERE id=?1", params![id])?;
        settings_with(&tx)?;
        tx.execute(
            "UPDATE settings SET bankroll = bankroll + ?1 WHERE id=1",
            params![bet.stake],
        )?;
        tx.commit()?;
        Ok(bet)
    }

    /// Settle an open bet, converting it into a closed bet. On a win the
    /// bankroll is credited `stake × odds` (the reserved principal plus
    /// profit); a loss credits nothing since the stake was debited at
    /// placement. `closed_at` defaults to now and may be backdated.
    pub fn settle_bet(
        &self,
        id: i64,
        outcome: Outcome,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<ClosedBet> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let bet = get_open_with(&tx, id)?.ok_or(LedgerError::BetNotFound(id))?;
        let closed_at = closed_at.unwrap_or_else(Utc::now);
        let profit = outcome.profit(bet.stake, bet.odds);
        tx.execute(
            "INSERT INTO closed_bets (name, sport, bet_type, odds, prob, stake,
                                      outcome, profit, closed_at, event_start)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                bet.name,
                bet.sport,
                bet.bet_type.as_str(),
                bet.odds,
                bet.prob,
                bet.stake,
                outcome.as_str(),
                profit,
                closed_at,
                bet.event_start,
            ],
        )?;
        let closed_id = tx.last_insert_rowid();
        tx.execute("DELETE FROM open_bets WHERE id=?1", params![id])?;
        if outcome == Outcome::Win {
            settings_with(&tx)?;
            tx.execute(
                "UPDATE settings SET bankroll = bankroll + ?1 WHERE id=1",
                params![bet.stake * bet.odds],
            )?;
        }
        tx.commit()?;
        Ok(ClosedBet {
            id: Some(closed_id),
            name: bet.name,
            sport: bet.sport,
            bet_type: bet.bet_type,
            odds: bet.odds,
            prob: bet.prob,
            stake: bet.stake,
            outcome,
            profit,
            closed_at,
            event_start: bet.event_start,
        })
    }

    /// Record a historical closed bet directly: no open bet, no bankroll
    /// effect. Backfills the history the recommendation engine reads.
    pub fn import_closed_bet(
        &self,
        bet: &NewBet,
        outcome: Outcome,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        bet.validate()?;
        let conn = self.conn.lock().unwrap();
        let closed_at = closed_at.unwrap_or_else(Utc::now);
        let profit = outcome.profit(bet.stake, bet.odds);
        conn.execute(
            "INSERT INTO closed_bets (name, sport, bet_type, odds, prob, stake,
                                      outcome, profit, closed_at, event_start)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                bet.name,
                bet.sport,
                bet.bet_type.as_str(),
                bet.odds,
                bet.prob,
                bet.stake,
                outcome.as_str(),
                profit,
                closed_at,
                bet.event_start,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Apply field updates to an open bet. A stake change re-reserves the
    /// difference against the bankroll so later cancellation or settlement
    /// accounting stays exact.
    pub fn update_open_bet(&self, id: i64, update: &BetUpdate) -> Result<OpenBet> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let current = get_open_with(&tx, id)?.ok_or(LedgerError::BetNotFound(id))?;
        let old_stake = current.stake;
        let updated = OpenBet {
            id: current.id,
            name: update.name.clone().unwrap_or(current.name),
            sport: update.sport.clone().unwrap_or(current.sport),
            bet_type: update.bet_type.unwrap_or(current.bet_type),
            odds: update.odds.unwrap_or(current.odds),
            prob: update.prob.unwrap_or(current.prob),
            stake: update.stake.unwrap_or(current.stake),
            created_at: current.created_at,
            event_start: current.event_start,
        };
        validate_terms(updated.odds, updated.prob, updated.stake)?;
        tx.execute(
            "UPDATE open_bets SET name=?1, sport=?2, bet_type=?3, odds=?4, prob=?5, stake=?6
             WHERE id=?7",
            params![
                updated.name,
                updated.sport,
                updated.bet_type.as_str(),
                updated.odds,
                updated.prob,
                updated.stake,
                id,
            ],
        )?;
        let delta = updated.stake - old_stake;
        if delta != 0.0 {
            settings_with(&tx)?;
            tx.execute(
                "UPDATE settings SET bankroll = bankroll - ?1 WHERE id=1",
                params![delta],
            )?;
        }
        tx.commit()?;
        Ok(updated)
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn get_open_bet(&self, id: i64) -> Result<Option<OpenBet>> {
        let conn = self.conn.lock().unwrap();
        get_open_with(&conn, id)
    }

    /// List open bets, newest first.
    pub fn open_bets(&self) -> Result<Vec<OpenBet>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, sport, bet_type, odds, prob, stake, created_at, event_start
             FROM open_bets ORDER BY created_at DESC",
        )?;
        let bets = stmt
            .query_map([], map_open_bet)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bets)
    }

    /// List closed bets, newest first.
    pub fn closed_bets(&self) -> Result<Vec<ClosedBet>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, sport, bet_type, odds, prob, stake, outcome, profit, closed_at, event_start
             FROM closed_bets ORDER BY closed_at DESC",
        )?;
        let bets = stmt
            .query_map([], map_closed_bet)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bets)
    }

    /// The recommendation engine's historical cohort: closed bets sharing
    /// the given sport and bet type.
    pub fn matching_closed_bets(&self, sport: &str, bet_type: BetType) -> Result<Vec<ClosedBet>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, sport, bet_type, odds, prob, stake, outcome, profit, closed_at, event_start
             FROM closed_bets WHERE sport=?1 AND bet_type=?2 ORDER BY closed_at DESC",
        )?;
        let bets = stmt
            .query_map(params![sport, bet_type.as_str()], map_closed_bet)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bets)
    }

    /// Aggregate ledger stats.
    pub fn stats(&self) -> Result<Stats> {
        let conn = self.conn.lock().unwrap();
        let open_bets: i64 =
            conn.query_row("SELECT COUNT(*) FROM open_bets", [], |r| r.get(0))?;
        let open_stake: f64 =
            conn.query_row("SELECT COALESCE(SUM(stake),0) FROM open_bets", [], |r| r.get(0))?;
        let closed_bets: i64 =
            conn.query_row("SELECT COUNT(*) FROM closed_bets", [], |r| r.get(0))?;
        let wins: i64 = conn.query_row(
            "SELECT COUNT(*) FROM closed_bets WHERE outcome='win'",
            [],
            |r| r.get(0),
        )?;
        let total_profit: f64 = conn.query_row(
            "SELECT COALESCE(SUM(profit),0) FROM closed_bets",
            [],
            |r| r.get(0),
        )?;
        let settings = settings_with(&conn)?;
        Ok(Stats {
            open_bets,
            open_stake,
            closed_bets,
            wins,
            total_profit,
            bankroll: settings.bankroll,
        })
    }
}

// ── Timestamp parsing ──────────────────────────────────────────────────────────

/// Parse a caller-supplied close timestamp in the fixed `%Y-%m-%dT%H:%M`
/// format. Unparsable input silently falls back to `now`; backdating is a
/// convenience, not a validation surface.
pub fn parse_closed_at(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT)
        .map(|dt| dt.and_utc())
        .unwrap_or(now)
}

/// Parse an optional event-start timestamp; unparsable input is `None`.
pub fn parse_event_start(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT)
        .map(|dt| dt.and_utc())
        .ok()
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

/// Read the settings row, inserting the defaults if it does not exist yet.
/// Works inside a caller's transaction via deref.
fn settings_with(conn: &Connection) -> Result<Settings> {
    let existing = conn
        .query_row(
            "SELECT bankroll, percent_bankroll FROM settings WHERE id=1",
            [],
            |row| {
                Ok(Settings {
                    bankroll: row.get(0)?,
                    percent_bankroll: row.get(1)?,
                })
            },
        )
        .optional()?;
    match existing {
        Some(settings) => Ok(settings),
        None => {
            conn.execute(
                "INSERT INTO settings (id, bankroll, percent_bankroll) VALUES (1, ?1, ?2)",
                params![DEFAULT_BANKROLL, DEFAULT_PERCENT_BANKROLL],
            )?;
            Ok(Settings::default())
        }
    }
}

fn get_open_with(conn: &Connection, id: i64) -> Result<Option<OpenBet>> {
    let bet = conn
        .query_row(
            "SELECT id, name, sport, bet_type, odds, prob, stake, created_at, event_start
             FROM open_bets WHERE id=?1",
            params![id],
            map_open_bet,
        )
        .optional()?;
    Ok(bet)
}

fn map_open_bet(row: &rusqlite::Row) -> rusqlite::Result<OpenBet> {
    let bet_type: String = row.get(3)?;
    Ok(OpenBet {
        id: row.get(0)?,
        name: row.get(1)?,
        sport: row.get(2)?,
        bet_type: BetType::parse(&bet_type),
        odds: row.get(4)?,
        prob: row.get(5)?,
        stake: row.get(6)?,
        created_at: row.get(7)?,
        event_start: row.get(8)?,
    })
}

fn map_closed_bet(row: &rusqlite::Row) -> rusqlite::Result<ClosedBet> {
    let bet_type: String = row.get(3)?;
    let outcome: String = row.get(7)?;
    Ok(ClosedBet {
        id: row.get(0)?,
        name: row.get(1)?,
        sport: row.get(2)?,
        bet_type: BetType::parse(&bet_type),
        odds: row.get(4)?,
        prob: row.get(5)?,
        stake: row.get(6)?,
        outcome: Outcome::normalize(&outcome),
        profit: row.get(8)?,
        closed_at: row.get(9)?,
        event_start: row.get(10)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    id               INTEGER PRIMARY KEY CHECK (id = 1),
    bankroll         REAL NOT NULL,
    percent_bankroll REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS open_bets (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    sport       TEXT NOT NULL DEFAULT '',
    bet_type    TEXT NOT NULL DEFAULT 'Moneyline',
    odds        REAL NOT NULL,
    prob        REAL NOT NULL,
    stake       REAL NOT NULL,
    created_at  TEXT NOT NULL,
    event_start TEXT
);

CREATE TABLE IF NOT EXISTS closed_bets (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    sport       TEXT NOT NULL DEFAULT '',
    bet_type    TEXT NOT NULL DEFAULT 'Moneyline',
    odds        REAL NOT NULL,
    prob        REAL NOT NULL,
    stake       REAL NOT NULL,
    outcome     TEXT NOT NULL,
    profit      REAL NOT NULL,
    closed_at   TEXT NOT NULL,
    event_start TEXT
);

CREATE INDEX IF NOT EXISTS idx_closed_bets_category ON closed_bets(sport, bet_type);
CREATE INDEX IF NOT EXISTS idx_closed_bets_closed_at ON closed_bets(closed_at);
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub open_bets: i64,
    pub open_stake: f64,
    pub closed_bets: i64,
    pub wins: i64,
    pub total_profit: f64,
    pub bankroll: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn test_ledger() -> Ledger {
        Ledger::open(":memory:").unwrap()
    }

    fn slip(sport: &str, bet_type: BetType, odds: f64, stake: f64) -> NewBet {
        NewBet {
            name: "Test bet".into(),
            sport: sport.into(),
            bet_type,
            odds,
            prob: 0.6,
            stake,
            event_start: None,
        }
    }

    #[test]
    fn test_settings_created_with_defaults() {
        let ledger = test_ledger();
        let settings = ledger.settings().unwrap();
        assert_relative_eq!(settings.bankroll, DEFAULT_BANKROLL, epsilon = 1e-9);
        assert_relative_eq!(
            settings.percent_bankroll,
            DEFAULT_PERCENT_BANKROLL,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_update_settings_partial() {
        let ledger = test_ledger();
        let settings = ledger.update_settings(Some(1000.0), None).unwrap();
        assert_relative_eq!(settings.bankroll, 1000.0, epsilon = 1e-9);
        assert_relative_eq!(settings.percent_bankroll, 0.25, epsilon = 1e-9);

        let settings = ledger.update_settings(None, Some(0.1)).unwrap();
        assert_relative_eq!(settings.bankroll, 1000.0, epsilon = 1e-9);
        assert_relative_eq!(settings.percent_bankroll, 0.1, epsilon = 1e-9);

        assert!(ledger.update_settings(None, Some(1.5)).is_err());
    }

    #[test]
    fn test_place_reserves_stake() {
        let ledger = test_ledger();
        ledger.place_bet(&slip("NBA", BetType::Moneyline, 2.5, 10.0)).unwrap();
        let settings = ledger.settings().unwrap();
        assert_relative_eq!(settings.bankroll, DEFAULT_BANKROLL - 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_place_rejects_bad_terms() {
        let ledger = test_ledger();
        assert!(ledger.place_bet(&slip("NBA", BetType::Moneyline, 1.0, 10.0)).is_err());
        assert!(ledger.place_bet(&slip("NBA", BetType::Moneyline, 2.5, 0.0)).is_err());
        // failed placements must not touch the bankroll
        let settings = ledger.settings().unwrap();
        assert_relative_eq!(settings.bankroll, DEFAULT_BANKROLL, epsilon = 1e-9);
    }

    #[test]
    fn test_place_then_cancel_restores_bankroll() {
        let ledger = test_ledger();
        let before = ledger.settings().unwrap().bankroll;
        let id = ledger.place_bet(&slip("NBA", BetType::Spread, 1.9, 12.5)).unwrap();
        ledger.cancel_bet(id).unwrap();
        let after = ledger.settings().unwrap().bankroll;
        assert_relative_eq!(after, before, epsilon = 1e-9);
        assert!(ledger.get_open_bet(id).unwrap().is_none());
    }

    #[test]
    fn test_cancel_missing_bet_is_not_found() {
        let ledger = test_ledger();
        let err = ledger.cancel_bet(999).unwrap_err();
        match err.downcast_ref::<LedgerError>() {
            Some(LedgerError::BetNotFound(999)) => {}
            other => panic!("expected BetNotFound(999), got {:?}", other),
        }
    }

    #[test]
    fn test_settle_win_credits_principal_plus_profit() {
        let ledger = test_ledger();
        let id = ledger.place_bet(&slip("NBA", BetType::Moneyline, 2.5, 10.0)).unwrap();
        let closed = ledger.settle_bet(id, Outcome::Win, None).unwrap();
        assert_relative_eq!(closed.profit, 15.0, epsilon = 1e-9);
        assert!(closed.profit >= 0.0);
        // 50 - 10 (reserved) + 25 (stake × odds) = 65 = 50 + profit
        let settings = ledger.settings().unwrap();
        assert_relative_eq!(settings.bankroll, DEFAULT_BANKROLL + 15.0, epsilon = 1e-9);
        assert!(ledger.get_open_bet(id).unwrap().is_none());
    }

    #[test]
    fn test_settle_loss_keeps_debit() {
        let ledger = test_ledger();
        let id = ledger.place_bet(&slip("NBA", BetType::Moneyline, 2.5, 10.0)).unwrap();
        let closed = ledger.settle_bet(id, Outcome::Loss, None).unwrap();
        assert_relative_eq!(closed.profit, -10.0, epsilon = 1e-9);
        let settings = ledger.settings().unwrap();
        assert_relative_eq!(settings.bankroll, DEFAULT_BANKROLL - 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_settle_missing_bet_is_not_found() {
        let ledger = test_ledger();
        let err = ledger.settle_bet(1, Outcome::Win, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::BetNotFound(1))
        ));
    }

    #[test]
    fn test_settle_backdated() {
        let ledger = test_ledger();
        let id = ledger.place_bet(&slip("NHL", BetType::Moneyline, 2.0, 5.0)).unwrap();
        let when = Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 0).unwrap();
        let closed = ledger.settle_bet(id, Outcome::Loss, Some(when)).unwrap();
        assert_eq!(closed.closed_at, when);
        let stored = &ledger.closed_bets().unwrap()[0];
        assert_eq!(stored.closed_at, when);
    }

    #[test]
    fn test_import_skips_bankroll_and_joins_cohort() {
        let ledger = test_ledger();
        let before = ledger.settings().unwrap().bankroll;
        ledger
            .import_closed_bet(&slip("NBA", BetType::Moneyline, 1.8333, 11.0), Outcome::Win, None)
            .unwrap();
        assert_relative_eq!(ledger.settings().unwrap().bankroll, before, epsilon = 1e-9);

        // visible to the engine's cohort lookup on the next call
        let cohort = ledger.matching_closed_bets("NBA", BetType::Moneyline).unwrap();
        assert_eq!(cohort.len(), 1);
        assert_eq!(cohort[0].outcome, Outcome::Win);
        assert_relative_eq!(cohort[0].profit, 11.0 * 0.8333, epsilon = 1e-9);

        // but not to other categories
        assert!(ledger.matching_closed_bets("NFL", BetType::Moneyline).unwrap().is_empty());
        assert!(ledger.matching_closed_bets("NBA", BetType::Spread).unwrap().is_empty());
    }

    #[test]
    fn test_update_open_bet_rereserves_stake_delta() {
        let ledger = test_ledger();
        let before = ledger.settings().unwrap().bankroll;
        let id = ledger.place_bet(&slip("MLB", BetType::OverUnder, 2.1, 10.0)).unwrap();
        let update = BetUpdate {
            stake: Some(25.0),
            odds: Some(2.4),
            ..BetUpdate::default()
        };
        let updated = ledger.update_open_bet(id, &update).unwrap();
        assert_relative_eq!(updated.stake, 25.0, epsilon = 1e-9);
        assert_relative_eq!(updated.odds, 2.4, epsilon = 1e-9);
        assert_relative_eq!(
            ledger.settings().unwrap().bankroll,
            before - 25.0,
            epsilon = 1e-9
        );

        // cancellation still restores the pre-placement bankroll exactly
        ledger.cancel_bet(id).unwrap();
        assert_relative_eq!(ledger.settings().unwrap().bankroll, before, epsilon = 1e-9);
    }

    #[test]
    fn test_update_open_bet_rejects_invalid_terms() {
        let ledger = test_ledger();
        let id = ledger.place_bet(&slip("MLB", BetType::Player, 2.1, 10.0)).unwrap();
        let update = BetUpdate {
            odds: Some(0.9),
            ..BetUpdate::default()
        };
        assert!(ledger.update_open_bet(id, &update).is_err());
        // the rejected edit must leave both the bet and the bankroll alone
        let bet = ledger.get_open_bet(id).unwrap().unwrap();
        assert_relative_eq!(bet.odds, 2.1, epsilon = 1e-9);
        assert_relative_eq!(
            ledger.settings().unwrap().bankroll,
            DEFAULT_BANKROLL - 10.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_stats_aggregates() {
        let ledger = test_ledger();
        let id = ledger.place_bet(&slip("NBA", BetType::Moneyline, 2.0, 10.0)).unwrap();
        ledger.settle_bet(id, Outcome::Win, None).unwrap();
        let id = ledger.place_bet(&slip("NBA", BetType::Moneyline, 2.0, 4.0)).unwrap();
        ledger.settle_bet(id, Outcome::Loss, None).unwrap();
        ledger.place_bet(&slip("NFL", BetType::Spread, 1.9, 7.0)).unwrap();

        let stats = ledger.stats().unwrap();
        assert_eq!(stats.open_bets, 1);
        assert_relative_eq!(stats.open_stake, 7.0, epsilon = 1e-9);
        assert_eq!(stats.closed_bets, 2);
        assert_eq!(stats.wins, 1);
        assert_relative_eq!(stats.total_profit, 10.0 - 4.0, epsilon = 1e-9);
        // 50 + 10 (win profit) - 4 (loss) - 7 (reserved) = 49
        assert_relative_eq!(stats.bankroll, 49.0, epsilon = 1e-9);
    }

    #[test]
    fn test_round_trip_storage_types() {
        let ledger = test_ledger();
        let mut bet = slip("Tennis", BetType::Player, 3.2, 2.5);
        bet.event_start = Some(Utc::now() + Duration::hours(4));
        let id = ledger.place_bet(&bet).unwrap();
        let stored = ledger.get_open_bet(id).unwrap().unwrap();
        assert_eq!(stored.sport, "Tennis");
        assert_eq!(stored.bet_type, BetType::Player);
        assert_eq!(stored.event_start, bet.event_start);
    }

    #[test]
    fn test_parse_closed_at_fixed_format() {
        let now = Utc::now();
        let parsed = parse_closed_at("2024-03-01T18:30", now);
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 0).unwrap());
        // unparsable input silently falls back to now
        assert_eq!(parse_closed_at("yesterday-ish", now), now);
        assert_eq!(parse_closed_at("", now), now);
    }

    #[test]
    fn test_parse_event_start() {
        assert_eq!(
            parse_event_start("2024-03-01T18:30"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 0).unwrap())
        );
        assert_eq!(parse_event_start("not a date"), None);
    }
}
