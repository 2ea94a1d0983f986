use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;
use rayon::prelude::*;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

use injury_sim::error::ErrorSeverity;
use injury_sim::{
    fatigue, AppConfig, Athlete, AvailabilityStatus, Dataset, FatigueBadge, LogFormat, LogLevel,
    RandomSource, RangeOutcome, RngSource, SimulationEngine, SimulationMode,
};

/// injury-sim - Squad injury and fatigue simulator
///
/// Advances a team's injury and fatigue state day by day using per-player
/// injury statistics prepared from historical data.
#[derive(Parser)]
#[command(name = "injury-sim")]
#[command(version)]
#[command(about = "Squad injury and fatigue simulator", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log level (error, warn, info, debug, trace), overrides the config
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Log format (pretty, json, compact), overrides the config
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one team over a date range
    Simulate {
        /// Prepared teams.json (defaults to the configured dataset)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Team name as it appears in the dataset
        #[arg(short, long)]
        team: String,

        /// Current date, not simulated (YYYY-MM-DD)
        #[arg(short, long)]
        from: NaiveDate,

        /// Last simulated date (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Seed for a reproducible run
        #[arg(short, long)]
        seed: Option<u64>,

        /// Track fatigue and recovery windows
        #[arg(long)]
        fatigue: bool,

        /// Starting fatigue for every player (default from config)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        initial_fatigue: Option<u8>,

        /// Players starting a match on the first day (comma separated, needs --fatigue)
        #[arg(long, value_delimiter = ',')]
        starters: Vec<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate every team in the dataset in parallel
    SimulateAll {
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        #[arg(short, long)]
        from: NaiveDate,

        #[arg(long)]
        to: NaiveDate,

        /// Base seed; team N uses seed + N
        #[arg(short, long)]
        seed: Option<u64>,

        #[arg(long)]
        fatigue: bool,
    },

    /// Show badge and injury risk multiplier for a fatigue score
    Badge {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        score: u8,
    },

    /// Manage configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,

        /// Print the active configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Tabled)]
struct InjuryRow {
    #[tabled(rename = "Player")]
    player: String,
    #[tabled(rename = "Injury")]
    injury_type: String,
    #[tabled(rename = "From")]
    start: NaiveDate,
    #[tabled(rename = "Returns")]
    returns: NaiveDate,
    #[tabled(rename = "Days")]
    days: u32,
}

#[derive(Tabled)]
struct PlayerRow {
    #[tabled(rename = "Player")]
    player: String,
    #[tabled(rename = "Status")]
    status: AvailabilityStatus,
    #[tabled(rename = "Fatigue")]
    fatigue: String,
    #[tabled(rename = "Badge")]
    badge: String,
}

#[derive(Tabled)]
struct TeamRow {
    #[tabled(rename = "Team")]
    team: String,
    #[tabled(rename = "New injuries")]
    new_injuries: usize,
    #[tabled(rename = "Recovered")]
    recovered: usize,
    #[tabled(rename = "Still injured")]
    still_injured: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };

    let mut log_config = config.logging.clone();
    let base_level = cli.log_level.unwrap_or(log_config.level);
    log_config.level = LogLevel::from_verbosity(base_level, cli.verbose);
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    injury_sim::logging::init_logging(&log_config)?;

    let engine = SimulationEngine::with_policy(config.simulation.clone())
        .context("Invalid simulation policy")?;

    match cli.command {
        Commands::Simulate {
            dataset,
            team,
            from,
            to,
            seed,
            fatigue,
            initial_fatigue,
            starters,
            json,
        } => {
            let dataset = load_dataset(dataset, &config)?;
            let roster = dataset.roster(&team).map_err(report)?;
            let mut rng: Box<dyn RandomSource> = match seed {
                Some(seed) => Box::new(RngSource::seeded(seed)),
                None => Box::new(RngSource::from_entropy()),
            };

            let mode = if fatigue {
                let start = initial_fatigue.unwrap_or(engine.policy().initial_fatigue);
                SimulationMode::with_initial_fatigue(&roster, &team, start)
            } else {
                SimulationMode::Basic
            };

            let outcome = if starters.is_empty() {
                engine
                    .simulate_range(&roster, &[], &team, from, to, mode, rng.as_mut())
                    .map_err(report)?
            } else {
                if !fatigue {
                    bail!("--starters requires --fatigue");
                }
                play_opening_match(&engine, &roster, &team, from, to, &starters, mode, rng.as_mut())?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&team, &roster, to, &outcome);
            }
        }

        Commands::SimulateAll {
            dataset,
            from,
            to,
            seed,
            fatigue,
        } => {
            let dataset = load_dataset(dataset, &config)?;
            let base_seed = seed.unwrap_or_else(rand::random);
            let start = engine.policy().initial_fatigue;

            let teams: Vec<(usize, &str)> = dataset.team_names().enumerate().collect();
            let rows: Vec<TeamRow> = teams
                .par_iter()
                .map(|&(index, team)| -> injury_sim::Result<TeamRow> {
                    let roster = dataset.roster(team)?;
                    let mode = if fatigue {
                        SimulationMode::with_initial_fatigue(&roster, team, start)
                    } else {
                        SimulationMode::Basic
                    };
                    let mut rng = RngSource::seeded(base_seed.wrapping_add(index as u64));
                    let outcome = engine.simulate_range(&roster, &[], team, from, to, mode, &mut rng)?;
                    Ok(TeamRow {
                        team: team.to_string(),
                        new_injuries: outcome.new_injuries.len(),
                        recovered: outcome.recovered.len(),
                        still_injured: outcome.active_injuries.len(),
                    })
                })
                .collect::<injury_sim::Result<Vec<_>>>()
                .map_err(report)?;

            println!(
                "{}",
                format!("Simulated {} teams from {} to {}", rows.len(), from, to)
                    .cyan()
                    .bold()
            );
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }

        Commands::Badge { score } => {
            let badge = FatigueBadge::from_score(score);
            println!("Fatigue {}: {}", score, badge.description());
            println!("  Badge: {}", badge.label().unwrap_or("-"));
            println!("  Injury risk multiplier: {:.2}x", fatigue::risk_multiplier(score));
        }

        Commands::Config { init, show } => {
            let mut config = config;
            if init {
                let path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
                config.save_to_file(&path)?;
                println!("{}", format!("✓ Configuration written to {}", path.display()).green());
            }
            if show || !init {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn load_dataset(path: Option<PathBuf>, config: &AppConfig) -> Result<Dataset> {
    let path = path
        .or_else(|| config.dataset_path.clone())
        .context("No dataset given; pass --dataset or set dataset_path in the config")?;
    Dataset::load_from_path(&path).map_err(report)
}

/// Log an engine error at its severity and turn it into a CLI error
fn report(err: injury_sim::SimError) -> anyhow::Error {
    match err.severity() {
        ErrorSeverity::Critical | ErrorSeverity::Error => {
            tracing::error!(error = %err, "Simulation failed")
        }
        ErrorSeverity::Warning => tracing::warn!(error = %err, "Simulation failed"),
    }
    anyhow::anyhow!(err.user_message())
}

#[cfg(feature = "match-ledger")]
#[allow(clippy::too_many_arguments)]
fn play_opening_match(
    engine: &SimulationEngine,
    roster: &[Athlete],
    team: &str,
    from: NaiveDate,
    to: NaiveDate,
    starters: &[String],
    mode: SimulationMode,
    rng: &mut dyn RandomSource,
) -> Result<RangeOutcome> {
    use injury_sim::{AthleteId, Lineup, MatchLedger};

    let squad: Vec<AthleteId> = starters
        .iter()
        .map(|name| AthleteId::new(team, name.trim()))
        .collect();
    if let Some(unknown) = squad.iter().find(|id| !roster.iter().any(|a| a.name == id.name)) {
        bail!("Unknown player in --starters: {}", unknown.name);
    }

    let lineup = Lineup::from_squad(roster, team, &squad, &[]);
    let mut ledger = MatchLedger::new();
    ledger
        .play_and_advance(engine, roster, &[], team, from, to, &lineup, mode, rng)
        .map_err(report)
}

#[cfg(not(feature = "match-ledger"))]
#[allow(clippy::too_many_arguments)]
fn play_opening_match(
    _engine: &SimulationEngine,
    _roster: &[Athlete],
    _team: &str,
    _from: NaiveDate,
    _to: NaiveDate,
    _starters: &[String],
    _mode: SimulationMode,
    _rng: &mut dyn RandomSource,
) -> Result<RangeOutcome> {
    bail!("--starters needs the match-ledger feature")
}

fn print_outcome(team: &str, roster: &[Athlete], date: NaiveDate, outcome: &RangeOutcome) {
    println!("{}", format!("{} as of {}", team, date).cyan().bold());

    if outcome.new_injuries.is_empty() {
        println!("{}", "No new injuries".green());
    } else {
        println!("{}", format!("{} new injuries", outcome.new_injuries.len()).red().bold());
        let rows: Vec<InjuryRow> = outcome
            .new_injuries
            .iter()
            .map(|i| InjuryRow {
                player: i.athlete.name.clone(),
                injury_type: i.injury_type.clone(),
                start: i.start_date,
                returns: i.return_date,
                days: i.days_missed,
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}", table);
    }

    if !outcome.recovered.is_empty() {
        println!("{} {}", "Recovered:".green().bold(), outcome.recovered.join(", "));
    }

    let rows: Vec<PlayerRow> = roster
        .iter()
        .map(|athlete| {
            let id = athlete.id(team);
            let score = outcome.fatigue().and_then(|f| f.get(&id)).copied();
            PlayerRow {
                player: athlete.name.clone(),
                status: AvailabilityStatus::for_athlete(
                    &id,
                    date,
                    &outcome.active_injuries,
                    outcome.recovery(),
                ),
                fatigue: score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                badge: score
                    .and_then(|s| FatigueBadge::from_score(s).label())
                    .unwrap_or("")
                    .to_string(),
            }
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}
