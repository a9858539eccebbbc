//! Operator CLI for the habit gamification engine.
//!
//! # Responsibility
//! - Probe `habitxp_core` linkage (`ping`).
//! - Run maintenance use-cases against a configured database: catalogue
//!   seeding, user stats and XP reconciliation.
//! - Print the level curve for product tuning.

use clap::{Parser, Subcommand};
use habitxp_core::repo::AchievementCatalog;
use habitxp_core::{
    experience_for_level, init_logging_from_config, open_db_from_config, EngineConfig,
    GamificationService, SqliteStore, SystemClock, UserId,
};
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "habitxp")]
#[command(about = "Habit gamification engine maintenance tool", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file; HABITXP_* environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check core linkage and print versions
    Ping,

    /// Seed the built-in achievement catalogue into an empty database
    Seed,

    /// Print cumulative XP required for each level
    Levels {
        /// Highest level to print
        #[arg(long, default_value_t = 10)]
        max: i64,
    },

    /// Show progress statistics for a user
    Stats {
        #[arg(long)]
        user: UserId,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Recompute a user's XP from history and credit any shortfall
    Reconcile {
        #[arg(long)]
        user: UserId,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Ping => {
            println!("habitxp_core ping={}", habitxp_core::ping());
            println!("habitxp_core version={}", habitxp_core::core_version());
            return Ok(());
        }
        Commands::Levels { max } => {
            for level in 1..=max.max(1) {
                println!("level={level} experience={}", experience_for_level(level));
            }
            return Ok(());
        }
        _ => {}
    }

    let config = EngineConfig::load(cli.config.as_deref())?;
    init_logging_from_config(&config)?;
    let conn = open_db_from_config(&config)?;
    let service = GamificationService::new(
        SqliteStore::try_new(&conn)?,
        SystemClock::new(config.utc_offset()?),
    );
    if config.seed_default_catalogue && !matches!(cli.command, Commands::Seed) {
        service.seed_default_catalogue()?;
    }

    match cli.command {
        Commands::Seed => {
            let inserted = service.seed_default_catalogue()?;
            let total = service.store().list_achievements()?.len();
            println!("seeded={inserted} catalogue_size={total}");
        }
        Commands::Stats { user, json } => {
            let stats = service.user_stats(user)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("level={} experience={}", stats.level, stats.experience);
                println!(
                    "progress={}% to_next_level={}",
                    stats.progress.percent, stats.progress.xp_to_next_level
                );
                println!(
                    "habits={} completions={} longest_streak={} current_streak={}",
                    stats.total_habits,
                    stats.completed_count,
                    stats.longest_streak,
                    stats.current_streak
                );
                println!(
                    "tasks_completed={} achievements={}",
                    stats.completed_tasks, stats.unlocked_achievements
                );
                for (name, value) in &stats.metrics {
                    println!("metric {name}={value}");
                }
            }
        }
        Commands::Reconcile { user } => {
            let outcome = service.reconcile_experience(user)?;
            println!(
                "stored={} replayed={} credited={} level={}",
                outcome.stored_experience,
                outcome.replayed_experience,
                outcome.credited,
                outcome.update.new_level
            );
        }
        Commands::Ping | Commands::Levels { .. } => {}
    }
    Ok(())
}
