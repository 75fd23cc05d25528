use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chpp_client::{ChppClient, ChppConfig};
use lineup::score;

#[derive(Parser)]
#[command(version, about = "Hattrick squad dashboard CLI")]
struct Cli {
    /// SQLite database path (falls back to DATABASE_URL, then squad.db).
    #[arg(long, value_name = "PATH")]
    database: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run a full player + match sync against the CHPP API.
    Sync,
    /// Print the stored roster with computed best positions.
    Players,
    /// List stored matches, newest first.
    Matches {
        #[arg(long)]
        limit: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let database_url = cli
        .database
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "squad.db".to_string());

    squad_sync::db::migrate::run_sqlite(&database_url)?;
    let mut conn = squad_sync::db::connection::connect_sqlite(&database_url)?;

    match cli.cmd {
        Cmd::Sync => {
            let config = ChppConfig::from_env()?;
            let team_id = config.team_id;
            let client = ChppClient::new(config)?;
            let summary = squad_sync::sync::run_player_sync(&mut conn, &client, team_id).await?;
            println!(
                "sync run {}: {} players ({} created, {} updated), {} changes",
                summary.sync_run_id,
                summary.total_players,
                summary.players_created,
                summary.players_updated,
                summary.total_changes
            );
        }
        Cmd::Players => {
            let roster = squad_sync::players::list_players(&mut conn, 5, Utc::now())?;
            for player in roster {
                let best = player
                    .latest_snapshot
                    .as_ref()
                    .and_then(|snapshot| snapshot.data.as_object())
                    .and_then(|bag| score::best_position(&score::compute_scores(bag)));
                match best {
                    Some((position, score)) => println!(
                        "{:<30} {:>4} {:>7.2}{}",
                        player.name,
                        position.code(),
                        score,
                        if player.active { "" } else { "  (inactive)" }
                    ),
                    None => println!("{:<30} (no snapshot)", player.name),
                }
            }
        }
        Cmd::Matches { limit } => {
            let config = ChppConfig::from_env()?;
            let matches = squad_sync::matches::list_matches(&mut conn, config.team_id, limit)?;
            for m in matches {
                println!(
                    "{}  {} {} - {} {}  [{} {}]",
                    m.match_date,
                    m.home_team_name,
                    m.home_goals,
                    m.away_goals,
                    m.away_team_name,
                    m.match_type,
                    m.status
                );
            }
        }
    }

    Ok(())
}
