use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use peerpulse::config::{Settings, DEFAULT_LOG_FILTER};
use peerpulse::error::ConfigError;
use peerpulse::{db, metrics, report, sentiment, themes};

#[derive(Parser)]
#[command(name = "peerpulse")]
#[command(about = "Team feedback and health analytics for PeerPulse", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo team with feedback and health checks
    Seed,
    /// Import peer feedback from a CSV file
    ImportFeedback {
        #[arg(long)]
        csv: PathBuf,
        /// Tag untagged rows with the classifier's suggestion
        #[arg(long)]
        suggest_sentiment: bool,
    },
    /// Import team health checks from a CSV file
    ImportHealth {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Classify a piece of feedback text
    Classify { text: String },
    /// List the most common feedback themes for a team
    Themes {
        #[arg(long)]
        team: String,
        #[arg(long, default_value_t = themes::DEFAULT_TOP_N)]
        top: usize,
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        since_days: Option<i64>,
    },
    /// Show aggregated team health
    Health {
        #[arg(long)]
        team: String,
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        since_days: Option<i64>,
    },
    /// Generate a team dashboard report
    Report {
        #[arg(long)]
        team: String,
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        since_days: Option<i64>,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

fn cutoff(since_days: Option<i64>) -> anyhow::Result<Option<DateTime<Utc>>> {
    let Some(days) = since_days else {
        return Ok(None);
    };
    anyhow::ensure!(days >= 1, "--since-days must be at least 1, got {days}");
    let window = Duration::try_days(days)
        .with_context(|| format!("--since-days {days} is out of range"))?;
    let since = Utc::now()
        .checked_sub_signed(window)
        .with_context(|| format!("--since-days {days} is out of range"))?;
    Ok(Some(since))
}

async fn connect(settings: Result<Settings, ConfigError>) -> anyhow::Result<PgPool> {
    let settings = settings?;
    let database_url = settings
        .require_database_url()
        .context("DATABASE_URL must point at the PeerPulse Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")?;
    tracing::debug!(max_connections = settings.max_connections, "connected to Postgres");
    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let settings = Settings::from_env();
    let log_filter = settings
        .as_ref()
        .map(|settings| settings.log_filter.as_str())
        .unwrap_or(DEFAULT_LOG_FILTER);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Classify { text } => {
            println!(
                "{} (score {}, suggested tag {})",
                sentiment::classify(&text).as_str(),
                sentiment::score(&text),
                sentiment::suggest_tag(&text)
            );
        }
        Commands::InitDb => {
            let pool = connect(settings).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(settings).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportFeedback {
            csv,
            suggest_sentiment,
        } => {
            let pool = connect(settings).await?;
            let inserted = db::import_feedback_csv(&pool, &csv, suggest_sentiment).await?;
            println!("Inserted {inserted} feedback entries from {}.", csv.display());
        }
        Commands::ImportHealth { csv } => {
            let pool = connect(settings).await?;
            let inserted = db::import_health_csv(&pool, &csv).await?;
            println!("Inserted {inserted} health checks from {}.", csv.display());
        }
        Commands::Themes {
            team,
            top,
            since_days,
        } => {
            let since = cutoff(since_days)?;
            let pool = connect(settings).await?;
            let directory = db::fetch_team_directory(&pool, &team).await?;
            let feedback = db::fetch_feedback(&pool, directory.team_id, since).await?;
            let texts: Vec<&str> = feedback.iter().map(|f| f.content.as_str()).collect();
            let ranked = themes::extract_themes(&texts, top);

            if ranked.is_empty() {
                println!("No feedback text found for {team}.");
                return Ok(());
            }

            println!("Common themes for {team}:");
            for theme in ranked {
                println!("- {} ({} mentions)", theme.word, theme.count);
            }
        }
        Commands::Health { team, since_days } => {
            let since = cutoff(since_days)?;
            let pool = connect(settings).await?;
            let directory = db::fetch_team_directory(&pool, &team).await?;
            let checks = db::fetch_health_checks(&pool, directory.team_id, since).await?;
            let aggregated = metrics::aggregate_health(&checks);

            if aggregated.sample_count == 0 {
                println!("No health checks found for {team}.");
                return Ok(());
            }

            println!(
                "Team health for {team}: {:.1}% across {} checks",
                metrics::overall_health(&aggregated),
                aggregated.sample_count
            );
            for point in report::health_radar(&aggregated) {
                println!("- {}: {:.1}%", point.category, point.score);
            }
            for week in metrics::health_trend(&checks) {
                println!(
                    "- Week of {}: {:.1}%",
                    week.week_start,
                    metrics::overall_health(&week.health)
                );
            }
        }
        Commands::Report {
            team,
            since_days,
            format,
            out,
        } => {
            let since = cutoff(since_days)?;
            let pool = connect(settings).await?;
            let directory = db::fetch_team_directory(&pool, &team).await?;
            let feedback = db::fetch_feedback(&pool, directory.team_id, since).await?;
            let checks = db::fetch_health_checks(&pool, directory.team_id, since).await?;

            let team_report = report::build_team_report(&directory, &feedback, &checks);
            let rendered = match format {
                Format::Markdown => report::render_markdown(&team_report),
                Format::Json => serde_json::to_string_pretty(&team_report)?,
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "report written");
                    println!("Report written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
    }

    Ok(())
}
