//! Local logo cache
//!
//! League and team badges are downloaded once and kept as data URLs under
//! stable keys, so renders do not depend on the network afterwards. The same
//! keys are used as the local-asset fallback paths in the layout.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::rendering::images::{decode_data_url, encode_data_url, Bitmap, ImageSource};
use crate::sports::{supported_leagues, Lookup, SportsApi, UNKNOWN_TEAM_NAME};
use crate::store::StorageBackend;

/// Flag key set once a prefetch has run.
pub const DOWNLOADED_FLAG_KEY: &str = "logosDownloaded";

/// Team badges fetched per league during prefetch.
pub const PREFETCH_TEAMS_PER_LEAGUE: usize = 8;

/// Lowercase, decompose (NFD) and drop combining marks, collapse everything
/// else to `_`.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;
    let lowered = input.to_lowercase();
    for c in lowered.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

pub fn league_logo_key(league_id: u32) -> String {
    format!("logos/competicoes/{}.png", league_id)
}

pub fn team_logo_key(league_name: &str, team_name: &str) -> String {
    format!("logos/equipes/{}/{}.png", slugify(league_name), slugify(team_name))
}

/// What a prefetch run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    /// The downloaded flag was already set; nothing was fetched.
    pub skipped: bool,
    pub league_logos: usize,
    pub team_logos: usize,
    pub rate_limited: bool,
}

pub struct LogoCache<S: StorageBackend> {
    storage: S,
}

impl<S: StorageBackend> LogoCache<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Cached data URL for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.storage.get(key.trim_start_matches('/')) {
            Ok(v) => v,
            Err(e) => {
                log::debug!("logo cache read '{}' failed: {}", key, e);
                None
            }
        }
    }

    /// Store a data URL. Failures (full or read-only storage) are ignored.
    pub fn put(&self, key: &str, data_url: &str) {
        if let Err(e) = self.storage.set(key.trim_start_matches('/'), data_url) {
            log::debug!("logo cache write '{}' failed: {}", key, e);
        }
    }

    pub fn is_downloaded(&self) -> bool {
        self.get(DOWNLOADED_FLAG_KEY).as_deref() == Some("true")
    }

    pub fn mark_downloaded(&self) {
        self.put(DOWNLOADED_FLAG_KEY, "true");
    }

    fn store_image<A: SportsApi>(&self, api: &A, url: &str, key: &str) -> bool {
        match api.fetch_image(url) {
            Lookup::Found(bytes) => {
                self.put(key, &encode_data_url(&bytes));
                true
            }
            other => {
                log::debug!("badge {} not cached: {:?}", url, other);
                false
            }
        }
    }

    /// Download league badges and up to [`PREFETCH_TEAMS_PER_LEAGUE`] team
    /// badges per supported league. Runs once unless `force` is set; stops
    /// at the first rate-limit refusal.
    pub fn prefetch<A: SportsApi>(&self, api: &A, force: bool) -> PrefetchReport {
        let mut report = PrefetchReport::default();
        if !force && self.is_downloaded() {
            report.skipped = true;
            return report;
        }

        'leagues: for league in supported_leagues() {
            match api.fetch_league_badge(league.id) {
                Lookup::Found(url) => {
                    if self.store_image(api, &url, &league_logo_key(league.id)) {
                        report.league_logos += 1;
                    }
                }
                Lookup::RateLimited => {
                    report.rate_limited = true;
                    break 'leagues;
                }
                Lookup::Empty => {}
                Lookup::Failed(e) => log::debug!("league {} badge lookup failed: {}", league.id, e),
            }

            let teams = match api.fetch_teams(&league.str_league) {
                Lookup::Found(teams) => teams,
                Lookup::RateLimited => {
                    report.rate_limited = true;
                    break 'leagues;
                }
                Lookup::Empty => Vec::new(),
                Lookup::Failed(e) => {
                    log::debug!("teams for '{}' failed: {}", league.str_league, e);
                    Vec::new()
                }
            };
            for team in teams.iter().take(PREFETCH_TEAMS_PER_LEAGUE) {
                let Some(badge) = team.badge_ref().filter(|b| b.starts_with("http")) else {
                    continue;
                };
                let name = team.name.trim();
                if name.is_empty() || name == UNKNOWN_TEAM_NAME {
                    continue;
                }
                if self.store_image(api, badge, &team_logo_key(&league.name, &team.name)) {
                    report.team_logos += 1;
                }
            }
        }

        if report.rate_limited {
            log::warn!("rate limit reached during logo prefetch; falling back to bundled logos");
        }
        log::info!(
            "logo prefetch: {} league logos, {} team logos",
            report.league_logos,
            report.team_logos
        );
        self.mark_downloaded();
        report
    }
}

impl<S: StorageBackend> ImageSource for LogoCache<S> {
    fn load(&self, reference: &str) -> Option<Bitmap> {
        if !reference.trim_start_matches('/').starts_with("logos/") {
            return None;
        }
        let data_url = self.get(reference)?;
        match decode_data_url(&data_url) {
            Ok(bmp) => Some(bmp),
            Err(e) => {
                log::debug!("cached logo '{}' unusable: {}", reference, e);
                None
            }
        }
    }
}
