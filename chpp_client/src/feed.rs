//! The feed abstraction the sync engine programs against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::client::{ChppClient, ChppError};
use crate::models::{ChppAvatar, ChppMatch, ChppPlayer};

/// The three CHPP fetches the sync pipeline consumes.
///
/// [`ChppClient`] is the production implementation; tests substitute an
/// in-memory fake so the orchestrator can be driven without a network.
#[async_trait]
pub trait ChppFeed {
    /// Current roster with full player detail bags.
    async fn fetch_players(&self) -> Result<Vec<ChppPlayer>, ChppError>;

    /// Avatar composition data for the roster.
    async fn fetch_avatars(&self) -> Result<Vec<ChppAvatar>, ChppError>;

    /// Matches for `team_id` up to `last_match_date` (inclusive).
    async fn fetch_matches(
        &self,
        team_id: i64,
        last_match_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<ChppMatch>, ChppError>;
}

#[async_trait]
impl ChppFeed for ChppClient {
    async fn fetch_players(&self) -> Result<Vec<ChppPlayer>, ChppError> {
        ChppClient::fetch_players(self).await
    }

    async fn fetch_avatars(&self) -> Result<Vec<ChppAvatar>, ChppError> {
        ChppClient::fetch_avatars(self).await
    }

    async fn fetch_matches(
        &self,
        team_id: i64,
        last_match_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<ChppMatch>, ChppError> {
        ChppClient::fetch_matches(self, team_id, last_match_date).await
    }
}
