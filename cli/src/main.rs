mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_eat, cmd_export, cmd_goal_set, cmd_goal_show, cmd_history, cmd_import, cmd_log,
    cmd_predict, cmd_show, cmd_walk, cmd_week,
};
use crate::config::Config;
use stride_core::ledger::StoreState;
use stride_core::models::RecordUpdate;
use stride_core::predictor::MAX_HORIZON_DAYS;
use stride_core::session::Session;

#[derive(Parser)]
#[command(
    name = "stride",
    version,
    about = "A simple fitness log with a weight trend forecast"
)]
struct Cli {
    /// Whose ledger to use
    #[arg(short, long, global = true, default_value = "default")]
    user: String,
    /// Data directory (default: platform data dir)
    #[arg(long, global = true, env = "STRIDE_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add metrics to a day. Calories, steps, distance, water and sleep add up;
    /// weight and notes replace the previous value.
    Log {
        /// Date to log for (YYYY-MM-DD, today or yesterday; default: today)
        #[arg(long)]
        date: Option<String>,
        /// Calories eaten (kcal)
        #[arg(long)]
        intake: Option<f64>,
        /// Calories burned (kcal)
        #[arg(long)]
        burned: Option<f64>,
        /// Steps walked
        #[arg(long)]
        steps: Option<i64>,
        /// Distance covered (km)
        #[arg(long)]
        distance: Option<f64>,
        /// Water drunk (liters)
        #[arg(long)]
        water: Option<f64>,
        /// Hours slept
        #[arg(long)]
        sleep: Option<f64>,
        /// Body weight (kg)
        #[arg(long)]
        weight: Option<f64>,
        /// Free-form notes for the day
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a food by name using the food calorie table
    Eat {
        /// Food name (exact, case-insensitive)
        food: String,
        /// Quantity in grams (e.g. "150" or "150g")
        quantity: String,
        /// Food table CSV with Food and Calories (per 100g) columns
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,
        /// Date to log for (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a walk; calories burned = weight x distance x 0.9
    Walk {
        /// Distance in km
        distance: f64,
        /// Body weight in kg (default: latest logged weight)
        #[arg(long)]
        weight: Option<f64>,
        /// Date to log for (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one day (defaults to today)
    Show {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the last N logged days
    History {
        /// Number of days to show
        #[arg(short, long, default_value = "7")]
        days: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Totals for the last 7 calendar days
    Week {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forecast body weight N days after the last weigh-in
    Predict {
        /// Days ahead (0 to 3650)
        #[arg(
            short,
            long,
            default_value = "7",
            value_parser = clap::value_parser!(i64).range(0..=MAX_HORIZON_DAYS)
        )]
        days: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage daily calorie goals
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Export the ledger to CSV
    Export {
        /// Destination CSV file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Merge a CSV file into the ledger
    Import {
        /// CSV file with a date column and any of the metric columns
        file: PathBuf,
        /// Preview import without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Set daily intake and/or burn goals
    Set {
        /// Intake goal (kcal/day)
        #[arg(long)]
        intake: Option<f64>,
        /// Burn goal (kcal/day)
        #[arg(long)]
        burn: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show current goals
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "stride=debug,stride_core=debug"
    } else {
        "stride=warn,stride_core=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir)?;
    let session = Session::open(&cli.user, &config.data_dir, config.ledger)?;
    if let StoreState::Recovered { quarantined, .. } = session.store_state() {
        eprintln!(
            "Warning: the ledger could not be read and was moved to {}. Starting empty.",
            quarantined.display()
        );
    }

    match cli.command {
        Commands::Log {
            date,
            intake,
            burned,
            steps,
            distance,
            water,
            sleep,
            weight,
            notes,
            json,
        } => {
            let update = RecordUpdate {
                weight,
                intake,
                burned,
                steps,
                distance,
                water_intake: water,
                sleep_hours: sleep,
                notes,
            };
            cmd_log(&session, date, &update, json)
        }
        Commands::Eat {
            food,
            quantity,
            catalog,
            date,
            json,
        } => {
            let catalog = catalog.unwrap_or_else(|| config.catalog_path.clone());
            cmd_eat(&session, &catalog, &food, &quantity, date, json)
        }
        Commands::Walk {
            distance,
            weight,
            date,
            json,
        } => cmd_walk(&session, distance, weight, date, json),
        Commands::Show { date, json } => cmd_show(&session, date, json),
        Commands::History { days, json } => cmd_history(&session, days, json),
        Commands::Week { json } => cmd_week(&session, json),
        Commands::Predict { days, json } => cmd_predict(&session, days, json),
        Commands::Goal { command } => match command {
            GoalCommands::Set { intake, burn, json } => cmd_goal_set(&session, intake, burn, json),
            GoalCommands::Show { json } => cmd_goal_show(&session, json),
        },
        Commands::Export { file, json } => cmd_export(&session, &file, json),
        Commands::Import {
            file,
            dry_run,
            json,
        } => cmd_import(&session, &file, dry_run, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_log_with_global_user() {
        let cli = Cli::try_parse_from([
            "stride", "log", "--intake", "450", "--weight", "71.2", "--user", "alice",
        ])
        .unwrap();
        assert_eq!(cli.user, "alice");
        let Commands::Log { intake, weight, steps, .. } = cli.command else {
            panic!("expected log command");
        };
        assert_eq!(intake, Some(450.0));
        assert_eq!(weight, Some(71.2));
        assert!(steps.is_none());
    }

    #[test]
    fn test_parse_predict_default_horizon() {
        let cli = Cli::try_parse_from(["stride", "predict"]).unwrap();
        let Commands::Predict { days, json } = cli.command else {
            panic!("expected predict command");
        };
        assert_eq!(days, 7);
        assert!(!json);
    }

    #[test]
    fn test_parse_predict_rejects_out_of_range_horizon() {
        assert!(Cli::try_parse_from(["stride", "predict", "--days", "100000000"]).is_err());
        assert!(Cli::try_parse_from(["stride", "predict", "--days", "-1"]).is_err());
        let cli = Cli::try_parse_from(["stride", "predict", "--days", "3650"]).unwrap();
        assert!(matches!(cli.command, Commands::Predict { days: 3650, .. }));
    }
}
