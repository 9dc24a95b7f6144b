//! TheSportsDB v1 client (blocking)

use std::sync::Mutex;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{Lookup, RateLimitConfig, RateLimiter, SportsApi, DEFAULT_TEAM_BADGE, SPORTS_DB_BASE_URL, UNKNOWN_TEAM_NAME};
use crate::model::Team;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
    pub rate_limit: RateLimitConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: SPORTS_DB_BASE_URL.to_string(),
            timeout_ms: 10_000,
            user_agent: concat!("boletim/", env!("CARGO_PKG_VERSION")).to_string(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TeamsResponse {
    teams: Option<Vec<RawTeam>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTeam {
    id_team: Option<Value>,
    str_team: Option<String>,
    str_alternate: Option<String>,
    str_team_badge: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeaguesResponse {
    leagues: Option<Vec<RawLeague>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLeague {
    str_badge: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

impl RawTeam {
    fn into_team(self, index: usize, str_league: &str) -> Team {
        let id = match &self.id_team {
            Some(Value::String(s)) => s.trim().parse().ok(),
            Some(Value::Number(n)) => n.as_u64(),
            _ => None,
        };
        Team {
            id: id.unwrap_or(index as u64 + 1000),
            name: non_blank(self.str_team)
                .or_else(|| non_blank(self.str_alternate))
                .unwrap_or_else(|| UNKNOWN_TEAM_NAME.to_string()),
            badge: Some(non_blank(self.str_team_badge).unwrap_or_else(|| DEFAULT_TEAM_BADGE.to_string())),
            league: str_league.to_string(),
        }
    }
}

pub struct SportsDbClient {
    client: Client,
    config: ClientConfig,
    limiter: Mutex<RateLimiter>,
}

impl SportsDbClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| Error::ConfigError(format!("invalid sports API base URL '{}': {}", config.base_url, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            limiter: Mutex::new(RateLimiter::new(config.rate_limit)),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Requests left in the current window.
    pub fn remaining_quota(&self) -> usize {
        self.limiter.lock().map(|mut l| l.remaining()).unwrap_or(0)
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        Url::parse_with_params(&format!("{}/{}", base, path), params)
            .map_err(|e| Error::ConfigError(format!("bad endpoint {}: {}", path, e)))
    }

    fn acquire(&self) -> bool {
        match self.limiter.lock() {
            Ok(mut limiter) => limiter.try_acquire(),
            Err(_) => false,
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        log::debug!("GET {}", url);
        let res = self
            .client
            .get(url.clone())
            .header("User-Agent", self.config.user_agent.clone())
            .send()?;
        if !res.status().is_success() {
            return Err(Error::NetworkError(format!("HTTP {} from {}", res.status(), url)));
        }
        let body = res.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn teams(&self, str_league: &str) -> Result<Vec<Team>> {
        let url = self.endpoint("search_all_teams.php", &[("l", str_league)])?;
        let data: TeamsResponse = self.get_json(url)?;
        Ok(data
            .teams
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, t)| t.into_team(i, str_league))
            .collect())
    }

    fn league_badge(&self, league_id: u32) -> Result<Option<String>> {
        let id = league_id.to_string();
        let url = self.endpoint("lookupleague.php", &[("id", id.as_str())])?;
        let data: LeaguesResponse = self.get_json(url)?;
        Ok(data
            .leagues
            .and_then(|l| l.into_iter().next())
            .and_then(|l| non_blank(l.str_badge)))
    }
}

impl SportsApi for SportsDbClient {
    fn fetch_teams(&self, str_league: &str) -> Lookup<Vec<Team>> {
        if !self.acquire() {
            return Lookup::RateLimited;
        }
        match self.teams(str_league) {
            Ok(teams) if teams.is_empty() => Lookup::Empty,
            Ok(teams) => Lookup::Found(teams),
            Err(e) => Lookup::Failed(e.to_string()),
        }
    }

    fn fetch_league_badge(&self, league_id: u32) -> Lookup<String> {
        if !self.acquire() {
            return Lookup::RateLimited;
        }
        match self.league_badge(league_id) {
            Ok(Some(url)) => Lookup::Found(url),
            Ok(None) => Lookup::Empty,
            Err(e) => Lookup::Failed(e.to_string()),
        }
    }

    fn fetch_image(&self, url: &str) -> Lookup<Vec<u8>> {
        let res = self
            .client
            .get(url)
            .header("User-Agent", self.config.user_agent.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes());
        match res {
            Ok(bytes) if bytes.is_empty() => Lookup::Empty,
            Ok(bytes) => Lookup::Found(bytes.to_vec()),
            Err(e) => Lookup::Failed(e.to_string()),
        }
    }
}
