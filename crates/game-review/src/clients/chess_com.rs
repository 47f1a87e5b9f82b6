use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ReviewConfig;
use crate::error::ArchiveError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChessComPlayer {
    #[serde(default)]
    pub rating: u32,
    /// "win", "checkmated", "resigned", "agreed", ...
    pub result: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChessComGame {
    pub url: String,
    #[serde(default)]
    pub pgn: String,
    #[serde(default)]
    pub time_control: String,
    /// Unix seconds
    pub end_time: i64,
    #[serde(default)]
    pub rated: bool,
    pub white: ChessComPlayer,
    pub black: ChessComPlayer,
}

impl ChessComGame {
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.end_time, 0)
    }

    /// Whether `username` played this game and won it. False for anyone who
    /// did not play.
    pub fn won_by(&self, username: &str) -> bool {
        [&self.white, &self.black]
            .into_iter()
            .find(|side| side.username.eq_ignore_ascii_case(username))
            .is_some_and(|side| side.result == "win")
    }
}

#[derive(Debug, Deserialize)]
struct ArchivesResponse {
    #[serde(default)]
    archives: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MonthlyGames {
    #[serde(default)]
    games: Vec<ChessComGame>,
}

pub struct ChessComClient {
    client: Client,
    base_url: String,
}

impl ChessComClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, ArchiveError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ReviewConfig) -> Result<Self, ArchiveError> {
        Self::new(
            &config.chess_com_api_url,
            &config.user_agent,
            config.request_timeout(),
        )
    }

    /// Monthly archive URLs for a user, oldest first.
    pub async fn fetch_archives(&self, username: &str) -> Result<Vec<String>, ArchiveError> {
        let url = format!("{}/player/{}/games/archives", self.base_url, username);
        debug!(url = %url, "Fetching archives");

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(ArchiveError::UserNotFound(username.to_string()));
        }

        let data: ArchivesResponse = resp.json().await?;
        Ok(data.archives)
    }

    /// Games from the user's most recent archive, newest first.
    pub async fn fetch_recent_games(&self, username: &str) -> Result<Vec<ChessComGame>, ArchiveError> {
        let archives = self.fetch_archives(username).await?;
        let Some(last) = archives.last() else {
            info!(username, "No archives");
            return Ok(Vec::new());
        };

        let resp = self.client.get(last).send().await?;
        if !resp.status().is_success() {
            return Err(ArchiveError::Status(resp.status()));
        }

        let data: MonthlyGames = resp.json().await?;
        let mut games = data.games;
        games.reverse();

        info!(username, archive = %last, count = games.len(), "Fetched recent games");
        Ok(games)
    }
}
