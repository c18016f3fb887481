use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::info;

mod config;
mod engine;
mod ledger;

use config::{Cli, Command};
use engine::{american_to_decimal, kelly};
use ledger::models::{BetType, BetUpdate, NewBet, Outcome};
use ledger::Ledger;

fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let ledger = Ledger::open(&cli.database_path)?;

    match cli.command {
        Command::Settings {
            bankroll,
            percent_bankroll,
        } => {
            let settings = if bankroll.is_some() || percent_bankroll.is_some() {
                ledger.update_settings(bankroll, percent_bankroll)?
            } else {
                ledger.settings()?
            };
            println!("bankroll:         {:.2}", settings.bankroll);
            println!("percent_bankroll: {:.2}", settings.percent_bankroll);
        }

        Command::Place {
            name,
            sport,
            bet_type,
            odds,
            prob,
            stake,
            event_start,
        } => {
            let bet = NewBet {
                name,
                sport,
                bet_type: BetType::parse(&bet_type),
                odds,
                prob,
                stake,
                event_start: event_start.as_deref().and_then(ledger::parse_event_start),
            };
            let id = ledger.place_bet(&bet)?;
            info!("placed bet {} – reserved {:.2} from bankroll", id, bet.stake);
            println!("{}", id);
        }

        Command::Edit {
            id,
            name,
            sport,
            bet_type,
            odds,
            prob,
            stake,
        } => {
            let update = BetUpdate {
                name,
                sport,
                bet_type: bet_type.as_deref().map(BetType::parse),
                odds,
                prob,
                stake,
            };
            let bet = ledger.update_open_bet(id, &update)?;
            info!("updated bet {}", id);
            print_open_bet(&bet);
        }

        Command::Cancel { id } => {
            let bet = ledger.cancel_bet(id)?;
            info!("cancelled bet {} – refunded {:.2}", id, bet.stake);
        }

        Command::Settle {
            id,
            outcome,
            closed_at,
        } => {
            let outcome = Outcome::normalize(&outcome);
            let closed_at = closed_at
                .as_deref()
                .map(|raw| ledger::parse_closed_at(raw, Utc::now()));
            let closed = ledger.settle_bet(id, outcome, closed_at)?;
            info!(
                "settled bet {} as {} – profit {:.2}",
                id,
                closed.outcome.as_str(),
                closed.profit
            );
            print_closed_bet(&closed);
        }

        Command::Import {
            name,
            sport,
            bet_type,
            american_odds,
            prob,
            stake,
            outcome,
            closed_at,
            event_start,
        } => {
            let odds = american_to_decimal(american_odds)?;
            let bet = NewBet {
                name,
                sport,
                bet_type: BetType::parse(&bet_type),
                odds,
                prob,
                stake,
                event_start: event_start.as_deref().and_then(ledger::parse_event_start),
            };
            let outcome = Outcome::normalize(&outcome);
            let closed_at = closed_at
                .as_deref()
                .map(|raw| ledger::parse_closed_at(raw, Utc::now()));
            let id = ledger.import_closed_bet(&bet, outcome, closed_at)?;
            info!("imported closed bet {} at decimal odds {:.4}", id, odds);
            println!("{}", id);
        }

        Command::Recommend {
            sport,
            bet_type,
            odds,
            prob,
            json,
        } => {
            let settings = ledger.settings()?;
            let bet_type = BetType::parse(&bet_type);
            let history = ledger.matching_closed_bets(&sport, bet_type)?;
            // Lenient parse: unparsable input reaches the engine as None and
            // degrades to a 0.00 recommendation instead of an error.
            let odds = odds.trim().parse::<f64>().ok();
            let prob = prob.trim().parse::<f64>().ok();
            let recommended = kelly::recommend_stake(
                settings.bankroll,
                settings.percent_bankroll,
                odds,
                prob,
                &history,
                Utc::now(),
            );
            if json {
                println!("{}", serde_json::json!({ "recommended": recommended }));
            } else {
                println!("recommended stake: {:.2}", recommended);
            }
        }

        Command::Info {
            sport,
            bet_type,
            prob,
            json,
        } => {
            let bet_type = BetType::parse(&bet_type);
            let history = ledger.matching_closed_bets(&sport, bet_type)?;
            let info = kelly::empirical_info(&history, prob, Utc::now());
            if json {
                println!("{}", serde_json::to_string(&info)?);
            } else {
                match info.empirical {
                    Some(e) => println!("empirical win rate: {:.4}", e),
                    None => println!("empirical win rate: n/a (no matching closed bets)"),
                }
                println!("adjusted prob:      {:.4}", info.adjusted);
                println!("alpha:              {:.2}", info.alpha);
                println!("matching bets:      {}", info.matching_count);
            }
        }

        Command::List { closed, open, json } => {
            let open_bets = if closed { Vec::new() } else { ledger.open_bets()? };
            let closed_bets = if open { Vec::new() } else { ledger.closed_bets()? };
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "open": open_bets, "closed": closed_bets })
                );
            } else {
                if !closed {
                    println!("open bets:");
                    for bet in &open_bets {
                        print_open_bet(bet);
                    }
                }
                if !open {
                    println!("closed bets:");
                    for bet in &closed_bets {
                        print_closed_bet(bet);
                    }
                }
            }
        }

        Command::Stats { json } => {
            let stats = ledger.stats()?;
            if json {
                println!("{}", serde_json::to_string(&stats)?);
            } else {
                println!("open bets:    {} (stake {:.2})", stats.open_bets, stats.open_stake);
                println!(
                    "closed bets:  {} ({} won)",
                    stats.closed_bets, stats.wins
                );
                println!("total profit: {:.2}", stats.total_profit);
                println!("bankroll:     {:.2}", stats.bankroll);
            }
        }
    }

    Ok(())
}

fn print_open_bet(bet: &ledger::models::OpenBet) {
    println!(
        "  #{} {} [{} / {}] odds {:.2} prob {:.2} stake {:.2}",
        bet.id,
        bet.name,
        bet.sport,
        bet.bet_type.as_str(),
        bet.odds,
        bet.prob,
        bet.stake,
    );
}

fn print_closed_bet(bet: &ledger::models::ClosedBet) {
    println!(
        "  #{} {} [{} / {}] odds {:.2} stake {:.2} {} profit {:+.2} ({})",
        bet.id.unwrap_or_default(),
        bet.name,
        bet.sport,
        bet.bet_type.as_str(),
        bet.odds,
        bet.stake,
        bet.outcome.as_str(),
        bet.profit,
        bet.closed_at.format("%Y-%m-%d %H:%M"),
    );
}
