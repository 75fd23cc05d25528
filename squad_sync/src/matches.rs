//! Match synchronization and read queries.
//!
//! Matches are keyed by the external match id. First observation inserts the
//! full row; later syncs only touch score, status and the orders-given flag,
//! so the upsert is idempotent for an unchanged feed.

use anyhow::Context;
use chpp_client::ChppFeed;
use chpp_client::models::{MatchStatus, MatchType};
use chrono::{DateTime, Utc};
use diesel::SqliteConnection;
use diesel::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::models::{Match, MatchScoreUpdate, NewMatch};
use crate::schema::matches::dsl as m;
use crate::tz;

/// Aggregate result of the match sub-sync.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSyncSummary {
    /// Matches observed for the first time.
    pub matches_added: usize,
    /// Matches present in the fetched list.
    pub total_matches: usize,
}

/// Fetch the team's match list (up to now) and upsert it.
pub async fn sync_matches<F>(
    conn: &mut SqliteConnection,
    feed: &F,
    team_id: i64,
) -> anyhow::Result<MatchSyncSummary>
where
    F: ChppFeed + Sync + ?Sized,
{
    let fetched = feed
        .fetch_matches(team_id, Some(Utc::now()))
        .await
        .context("fetching CHPP matches")?;
    debug!(count = fetched.len(), "retrieved matches from CHPP");

    let mut matches_added = 0;
    for chpp in &fetched {
        let now = tz::to_rfc3339_millis(Utc::now());
        let existing: Option<i32> = m::matches
            .filter(m::match_id.eq(chpp.match_id))
            .select(m::id)
            .first(conn)
            .optional()?;

        match existing {
            None => {
                let match_date = tz::to_rfc3339_millis(chpp.match_date);
                diesel::insert_into(m::matches)
                    .values(NewMatch {
                        match_id: chpp.match_id,
                        team_id: chpp.team_id,
                        match_date: &match_date,
                        home_team_id: chpp.home_team_id,
                        home_team_name: &chpp.home_team_name,
                        home_team_short_name: chpp.home_team_short_name.as_deref(),
                        away_team_id: chpp.away_team_id,
                        away_team_name: &chpp.away_team_name,
                        away_team_short_name: chpp.away_team_short_name.as_deref(),
                        home_goals: chpp.home_goals,
                        away_goals: chpp.away_goals,
                        status: chpp.status.as_str(),
                        match_type: chpp.match_type.as_str(),
                        match_context_id: chpp.match_context_id,
                        cup_level: chpp.cup_level,
                        cup_level_index: chpp.cup_level_index,
                        source_system: chpp.source_system.as_deref(),
                        orders_given: chpp.orders_given,
                        created_at: &now,
                        updated_at: &now,
                    })
                    .execute(conn)?;
                matches_added += 1;
            }
            Some(row_id) => {
                diesel::update(m::matches.find(row_id))
                    .set(MatchScoreUpdate {
                        home_goals: chpp.home_goals,
                        away_goals: chpp.away_goals,
                        status: chpp.status.as_str(),
                        orders_given: chpp.orders_given,
                        updated_at: &now,
                    })
                    .execute(conn)?;
            }
        }
    }

    Ok(MatchSyncSummary {
        matches_added,
        total_matches: fetched.len(),
    })
}

/// Stored matches for a team, newest first, optionally limited.
pub fn list_matches(
    conn: &mut SqliteConnection,
    team_id: i64,
    limit: Option<i64>,
) -> anyhow::Result<Vec<Match>> {
    let mut query = m::matches
        .filter(m::team_id.eq(team_id))
        .order(m::match_date.desc())
        .select(Match::as_select())
        .into_boxed();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    Ok(query.load(conn)?)
}

/// One stored match by its external id.
pub fn find_match(conn: &mut SqliteConnection, match_id: i64) -> anyhow::Result<Option<Match>> {
    Ok(m::matches
        .filter(m::match_id.eq(match_id))
        .select(Match::as_select())
        .first(conn)
        .optional()?)
}

/// External ids of this week's official matches: FINISHED league or cup
/// matches since the canonical week boundary, newest two.
pub fn this_week_official_match_ids(
    conn: &mut SqliteConnection,
    team_id: i64,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<i64>> {
    let cutoff = tz::to_rfc3339_millis(lineup::match_week::last_friday(now));
    Ok(m::matches
        .filter(
            m::team_id
                .eq(team_id)
                .and(m::match_date.ge(cutoff))
                .and(m::status.eq(MatchStatus::Finished.as_str()))
                .and(m::match_type.eq_any([MatchType::League.as_str(), MatchType::Cup.as_str()])),
        )
        .order(m::match_date.desc())
        .limit(2)
        .select(m::match_id)
        .load(conn)?)
}
