//! CLI definition and dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_export::CsvExporter;
use crate::adapters::csv_store::CsvStore;
use crate::adapters::file_config::FileConfig;
use crate::domain::balance::{self, GroupingUnit};
use crate::domain::error::KeibalogError;
use crate::domain::odds;
use crate::domain::profile::Profile;
use crate::domain::race::Race;
use crate::domain::report::ReportProjection;
use crate::domain::rounding::RoundingRule;
use crate::ports::config_port::ConfigPort;
use crate::ports::export_port::ExportPort;
use crate::ports::store_port::StorePort;

#[derive(Parser, Debug)]
#[command(name = "keibalog", about = "Horse racing ledger with Actual and If scenarios")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a balance series
    Balance {
        #[arg(short, long)]
        config: PathBuf,
        /// Bucket width: day, month, or year
        #[arg(short, long, default_value = "day")]
        unit: String,
    },
    /// Print final Actual and combined balances
    Summary {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print monthly and cumulative report
    Report {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Export races and tickets to CSV files
    Export {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Preview an increased If ticket from an Actual ticket's figures
    PreviewIf {
        #[arg(long)]
        stake: i64,
        #[arg(long)]
        payout: Option<i64>,
        #[arg(long)]
        odds: Option<Decimal>,
        #[arg(long, default_value_t = 0)]
        delta: i64,
        /// Rounding rule: nearest, up, or down
        #[arg(long, default_value = "nearest")]
        rounding: String,
    },
    /// Validate configuration and the stored profile
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Balance { config, unit } => run_balance(&config, &unit),
        Command::Summary { config } => run_summary(&config),
        Command::Report { config } => run_report(&config),
        Command::Export { config, output } => run_export(&config, output.as_ref()),
        Command::PreviewIf {
            stake,
            payout,
            odds,
            delta,
            rounding,
        } => run_preview_if(stake, payout, odds, delta, &rounding),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfig, ExitCode> {
    FileConfig::from_file(path).map_err(|e| {
        let err = KeibalogError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn open_store(config: &FileConfig) -> Result<Box<dyn StorePort>, ExitCode> {
    match config.store_backend().as_str() {
        "csv" => {
            let data_dir = match config.get_string("store", "data_dir") {
                Some(dir) => PathBuf::from(dir),
                None => {
                    let err = KeibalogError::ConfigMissing {
                        section: "store".into(),
                        key: "data_dir".into(),
                    };
                    eprintln!("error: {err}");
                    return Err(ExitCode::from(&err));
                }
            };
            Ok(Box::new(CsvStore::new(data_dir)))
        }
        "sqlite" => open_sqlite_store(config),
        other => {
            let err = KeibalogError::ConfigInvalid {
                section: "store".into(),
                key: "backend".into(),
                reason: format!("unknown backend '{other}' (expected csv or sqlite)"),
            };
            eprintln!("error: {err}");
            Err(ExitCode::from(&err))
        }
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite_store(config: &FileConfig) -> Result<Box<dyn StorePort>, ExitCode> {
    use crate::adapters::sqlite_store::SqliteStore;

    let store = SqliteStore::from_config(config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    store.initialize_schema().map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite_store(_config: &FileConfig) -> Result<Box<dyn StorePort>, ExitCode> {
    eprintln!("error: sqlite feature is required for the sqlite backend");
    Err(ExitCode::from(1))
}

fn load_snapshot(
    store: &dyn StorePort,
) -> Result<(Option<Profile>, Vec<Race>), ExitCode> {
    let profile = store.fetch_profile().map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    let races = store.list_races().map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    Ok((profile, races))
}

fn parse_unit(value: &str) -> Option<GroupingUnit> {
    match value {
        "day" => Some(GroupingUnit::Day),
        "month" => Some(GroupingUnit::Month),
        "year" => Some(GroupingUnit::Year),
        _ => None,
    }
}

fn parse_rounding(value: &str) -> Option<RoundingRule> {
    match value {
        "nearest" => Some(RoundingRule::Nearest),
        "up" => Some(RoundingRule::Up),
        "down" => Some(RoundingRule::Down),
        _ => None,
    }
}

fn run_balance(config_path: &PathBuf, unit_str: &str) -> ExitCode {
    let Some(unit) = parse_unit(unit_str) else {
        eprintln!("error: unknown unit '{unit_str}' (expected day, month, or year)");
        return ExitCode::from(2);
    };

    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let (profile, races) = match load_snapshot(store.as_ref()) {
        Ok(snapshot) => snapshot,
        Err(code) => return code,
    };

    let Some(profile) = profile else {
        eprintln!("No profile found; no balance can be computed");
        return ExitCode::SUCCESS;
    };

    let points = balance::compute_series(unit, &races, &profile);
    eprintln!(
        "Computed {} {} point(s) over {} race(s)",
        points.len(),
        unit_str,
        races.len()
    );
    eprintln!("date        actual    combined  actualPnL combinedPnL");
    for p in &points {
        println!(
            "{} {:>10} {:>10} {:>10} {:>10}",
            p.date, p.actual_balance, p.combined_balance, p.actual_profit, p.combined_profit
        );
    }
    ExitCode::SUCCESS
}

fn run_summary(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let (profile, races) = match load_snapshot(store.as_ref()) {
        Ok(snapshot) => snapshot,
        Err(code) => return code,
    };

    let summary = balance::summarize(
        &races,
        profile.as_ref(),
        config.default_initial_balance(),
    );
    println!("Final Actual:   {}", summary.final_actual);
    println!("Final Combined: {}", summary.final_combined);

    if let Some(profile) = &profile {
        if let Some(last) = balance::daily_series(&races, profile).last() {
            match odds::return_rate(last.actual_stake_total, last.actual_payout_total) {
                Some(rate) => println!("Actual Return:  {:.2}", rate),
                None => println!("Actual Return:  n/a"),
            }
        }
    }
    ExitCode::SUCCESS
}

fn run_report(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let (profile, races) = match load_snapshot(store.as_ref()) {
        Ok(snapshot) => snapshot,
        Err(code) => return code,
    };

    let projection = ReportProjection::compute(&races, profile.as_ref());
    let Some(cumulative) = &projection.cumulative else {
        eprintln!("No profile found; nothing to report");
        return ExitCode::SUCCESS;
    };

    println!("Initial Balance: {}", cumulative.initial_balance);
    println!(
        "Actual:          {} ({:+})",
        cumulative.actual_total,
        cumulative.actual_change()
    );
    println!(
        "Actual+If:       {} ({:+})",
        cumulative.combined_total,
        cumulative.combined_change()
    );
    println!("Difference:      {:+}", cumulative.difference());

    eprintln!("\nmonth       actual    combined   actualChg combinedChg");
    for m in &projection.monthly {
        println!(
            "{} {:>10} {:>10} {:>+10} {:>+10}",
            m.month.format("%Y-%m"),
            m.actual_total,
            m.combined_total,
            m.actual_change,
            m.combined_change
        );
    }
    ExitCode::SUCCESS
}

fn run_export(config_path: &PathBuf, output: Option<&PathBuf>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let races = match store.list_races() {
        Ok(races) => races,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };
    let tickets = match store.list_tickets() {
        Ok(tickets) => tickets,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    let out_dir = output
        .cloned()
        .or_else(|| config.get_string("export", "output_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    eprintln!(
        "Exporting {} race(s) and {} ticket(s) to {}",
        races.len(),
        tickets.len(),
        out_dir.display()
    );

    match CsvExporter::new().write_files(&races, &tickets, &out_dir, Utc::now()) {
        Ok(files) => {
            eprintln!("Races written to:   {}", files.races_path.display());
            eprintln!("Tickets written to: {}", files.tickets_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn run_preview_if(
    stake: i64,
    payout: Option<i64>,
    quoted_odds: Option<Decimal>,
    delta: i64,
    rounding_str: &str,
) -> ExitCode {
    let Some(rule) = parse_rounding(rounding_str) else {
        eprintln!("error: unknown rounding rule '{rounding_str}' (expected nearest, up, or down)");
        return ExitCode::from(2);
    };

    match odds::increased_if(stake, payout, quoted_odds, delta, rule) {
        Some(preview) => {
            println!("New Stake:        {}", preview.stake);
            println!("Applied Delta:    {}", preview.applied_delta);
            match preview.ratio {
                Some(ratio) => println!("Ratio:            {:.2}", ratio),
                None => println!("Ratio:            n/a"),
            }
            match preview.payout {
                Some(p) => println!("Projected Payout: {}", p),
                None => println!("Projected Payout: cannot estimate"),
            }
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("Cannot preview: base stake must be positive");
            ExitCode::from(2)
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match store.fetch_profile() {
        Ok(Some(profile)) => {
            if let Err(e) = profile.validate() {
                eprintln!("error: {e}");
                return ExitCode::from(&e);
            }
            eprintln!("Profile is valid (initial balance {})", profile.initial_balance);
        }
        Ok(None) => {
            eprintln!("No profile stored; defaults will apply");
        }
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    }

    eprintln!("Configuration is valid");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_unit_known_values() {
        assert_eq!(parse_unit("day"), Some(GroupingUnit::Day));
        assert_eq!(parse_unit("month"), Some(GroupingUnit::Month));
        assert_eq!(parse_unit("year"), Some(GroupingUnit::Year));
        assert_eq!(parse_unit("week"), None);
    }

    #[test]
    fn parse_rounding_known_values() {
        assert_eq!(parse_rounding("nearest"), Some(RoundingRule::Nearest));
        assert_eq!(parse_rounding("up"), Some(RoundingRule::Up));
        assert_eq!(parse_rounding("down"), Some(RoundingRule::Down));
        assert_eq!(parse_rounding("banker"), None);
    }
}
