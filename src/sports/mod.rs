//! Team and league lookup
//!
//! [`SportsApi`] is the raw provider surface and reports *why* a lookup
//! produced nothing. [`TeamDirectory`] is what the rest of the crate uses:
//! it always answers, substituting the static tables when the provider is
//! rate limited, failing or empty.

pub mod leagues;
pub mod rate_limit;

#[cfg(feature = "net")]
pub mod client;

#[cfg(feature = "net")]
pub use client::SportsDbClient;
pub use leagues::{default_league, fallback_teams, find_league, supported_leagues};
pub use rate_limit::{RateLimitConfig, RateLimiter};

use crate::model::Team;

/// Default TheSportsDB v1 endpoint (free key).
pub const SPORTS_DB_BASE_URL: &str = "https://www.thesportsdb.com/api/v1/json/123";

/// Badge used when the provider returns a team without one.
pub const DEFAULT_TEAM_BADGE: &str = "/logos/default_team.png";

/// Name given to provider teams with neither a name nor an alternate name.
pub const UNKNOWN_TEAM_NAME: &str = "Unknown Team";

/// Outcome of a single provider call.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    /// The provider answered but had nothing.
    Empty,
    /// Refused locally by the rate limiter; no request was sent.
    RateLimited,
    Failed(String),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            _ => None,
        }
    }
}

pub trait SportsApi: Send + Sync {
    fn fetch_teams(&self, str_league: &str) -> Lookup<Vec<Team>>;
    /// Badge URL of a league.
    fn fetch_league_badge(&self, league_id: u32) -> Lookup<String>;
    /// Raw bytes of an image (not counted against the quota).
    fn fetch_image(&self, url: &str) -> Lookup<Vec<u8>>;
}

pub trait TeamDirectory {
    fn teams_by_league(&self, str_league: &str) -> Vec<Team>;
    fn league_logo(&self, league_id: u32) -> Option<String>;
}

/// Static tables only.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticDirectory;

impl TeamDirectory for StaticDirectory {
    fn teams_by_league(&self, str_league: &str) -> Vec<Team> {
        fallback_teams(str_league)
    }

    fn league_logo(&self, _league_id: u32) -> Option<String> {
        None
    }
}

/// Live provider with static fallback.
pub struct FallbackDirectory<A: SportsApi> {
    api: A,
}

impl<A: SportsApi> FallbackDirectory<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

impl<A: SportsApi> TeamDirectory for FallbackDirectory<A> {
    fn teams_by_league(&self, str_league: &str) -> Vec<Team> {
        match self.api.fetch_teams(str_league) {
            Lookup::Found(teams) if !teams.is_empty() => teams,
            Lookup::Found(_) | Lookup::Empty => {
                log::debug!("no teams from provider for '{}', using fallback", str_league);
                fallback_teams(str_league)
            }
            Lookup::RateLimited => {
                log::warn!("rate limit reached, using fallback teams for '{}'", str_league);
                fallback_teams(str_league)
            }
            Lookup::Failed(e) => {
                log::error!("error fetching teams for '{}': {}", str_league, e);
                fallback_teams(str_league)
            }
        }
    }

    fn league_logo(&self, league_id: u32) -> Option<String> {
        match self.api.fetch_league_badge(league_id) {
            Lookup::Found(url) => Some(url),
            Lookup::Empty => None,
            Lookup::RateLimited => {
                log::warn!("rate limit reached, no logo for league {}", league_id);
                None
            }
            Lookup::Failed(e) => {
                log::error!("error fetching logo for league {}: {}", league_id, e);
                None
            }
        }
    }
}

/// Case-insensitive substring match on team names; a blank query keeps everything.
pub fn search_teams(teams: &[Team], query: &str) -> Vec<Team> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return teams.to_vec();
    }
    teams.iter().filter(|t| t.name.to_lowercase().contains(&q)).cloned().collect()
}


#[cfg(test)]
mod tests {
    use super::fake::FakeApi;
    use super::*;

    #[test]
    fn provider_teams_win_when_present() {
        let mut api = FakeApi::new(10);
        api.teams.insert("Italian Serie A".into(), vec![Team::named(10, "Inter")]);
        let dir = FallbackDirectory::new(api);
        assert_eq!(dir.teams_by_league("Italian Serie A")[0].name, "Inter");
    }

    #[test]
    fn empty_failed_and_limited_fall_back() {
        let dir = FallbackDirectory::new(FakeApi::new(1));
        // empty answer
        assert_eq!(dir.teams_by_league("English Premier League").len(), 5);
        // quota gone
        assert_eq!(dir.teams_by_league("Spanish La Liga").len(), 3);
        assert!(dir.teams_by_league("Italian Serie A").is_empty());
        assert!(dir.league_logo(4328).is_none());

        let mut failing = FakeApi::new(5);
        failing.fail = true;
        let dir = FallbackDirectory::new(failing);
        assert_eq!(dir.teams_by_league("English Premier League")[0].name, "Arsenal");
    }

    #[test]
    fn static_directory_has_no_logos() {
        assert_eq!(StaticDirectory.teams_by_league("Spanish La Liga").len(), 3);
        assert!(StaticDirectory.league_logo(4335).is_none());
    }

    #[test]
    fn search_is_case_insensitive() {
        let teams = fallback_teams("English Premier League");
        let hits = search_teams(&teams, "  MAN ");
        assert_eq!(hits.len(), 2);
        assert_eq!(search_teams(&teams, "   ").len(), 5);
        assert!(search_teams(&teams, "madrid").is_empty());
    }
}
