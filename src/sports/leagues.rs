//! Built-in league and fallback team tables

use crate::model::{League, Team};

struct LeagueRow {
    id: u32,
    name: &'static str,
    str_league: &'static str,
    country: &'static str,
    logo: &'static str,
}

const LEAGUES: [LeagueRow; 6] = [
    LeagueRow {
        id: 4328,
        name: "Premier League",
        str_league: "English Premier League",
        country: "England",
        logo: "/logos/competicoes/premier_league.png",
    },
    LeagueRow {
        id: 4335,
        name: "La Liga",
        str_league: "Spanish La Liga",
        country: "Spain",
        logo: "/logos/competicoes/la_liga.png",
    },
    LeagueRow {
        id: 4332,
        name: "Serie A",
        str_league: "Italian Serie A",
        country: "Italy",
        logo: "/logos/competicoes/serie_a.png",
    },
    LeagueRow {
        id: 4331,
        name: "Bundesliga",
        str_league: "German Bundesliga",
        country: "Germany",
        logo: "/logos/competicoes/bundesliga.png",
    },
    LeagueRow {
        id: 4334,
        name: "Ligue 1",
        str_league: "French Ligue 1",
        country: "France",
        logo: "/logos/competicoes/ligue1.png",
    },
    LeagueRow {
        id: 4480,
        name: "Champions League",
        str_league: "UEFA Champions League",
        country: "Europe",
        logo: "/logos/competicoes/champions_league.png",
    },
];

// (id, name, badge) per provider league key
const PREMIER_TEAMS: [(u64, &str, &str); 5] = [
    (1, "Arsenal", "/logos/equipes/premier/arsenal.png"),
    (2, "Chelsea", "/logos/equipes/premier/chelsea.png"),
    (3, "Liverpool", "/logos/equipes/premier/liverpool.png"),
    (4, "Manchester City", "/logos/equipes/premier/man_city.png"),
    (5, "Manchester United", "/logos/equipes/premier/man_united.png"),
];

const LALIGA_TEAMS: [(u64, &str, &str); 3] = [
    (6, "Real Madrid", "/logos/equipes/laliga/real_madrid.png"),
    (7, "FC Barcelona", "/logos/equipes/laliga/barcelona.png"),
    (8, "Atletico Madrid", "/logos/equipes/laliga/atletico.png"),
];

impl LeagueRow {
    fn to_league(&self) -> League {
        League {
            id: self.id,
            name: self.name.to_string(),
            str_league: self.str_league.to_string(),
            logo: Some(self.logo.to_string()),
            country: self.country.to_string(),
        }
    }
}

/// Leagues offered by the wizard, in display order.
pub fn supported_leagues() -> Vec<League> {
    LEAGUES.iter().map(LeagueRow::to_league).collect()
}

/// League used for freshly created games.
pub fn default_league() -> League {
    LEAGUES[0].to_league()
}

/// Find a supported league by id, display name or provider name (case-insensitive).
pub fn find_league(query: &str) -> Option<League> {
    let q = query.trim();
    supported_leagues().into_iter().find(|l| {
        l.id.to_string() == q || l.name.eq_ignore_ascii_case(q) || l.str_league.eq_ignore_ascii_case(q)
    })
}

/// Static teams for a provider league key; empty for unknown keys.
pub fn fallback_teams(str_league: &str) -> Vec<Team> {
    let table: &[(u64, &str, &str)] = match str_league {
        "English Premier League" => &PREMIER_TEAMS,
        "Spanish La Liga" => &LALIGA_TEAMS,
        _ => &[],
    };
    table
        .iter()
        .map(|(id, name, badge)| Team {
            id: *id,
            name: name.to_string(),
            badge: Some(badge.to_string()),
            league: str_league.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_leagues_with_known_ids() {
        let ids: Vec<u32> = supported_leagues().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![4328, 4335, 4332, 4331, 4334, 4480]);
        assert_eq!(default_league().name, "Premier League");
    }

    #[test]
    fn find_by_any_name() {
        assert_eq!(find_league("la liga").unwrap().id, 4335);
        assert_eq!(find_league("UEFA Champions League").unwrap().id, 4480);
        assert_eq!(find_league("4332").unwrap().name, "Serie A");
        assert!(find_league("MLS").is_none());
    }

    #[test]
    fn fallback_tables() {
        let epl = fallback_teams("English Premier League");
        assert_eq!(epl.len(), 5);
        assert_eq!(epl[3].name, "Manchester City");
        assert_eq!(epl[3].badge.as_deref(), Some("/logos/equipes/premier/man_city.png"));
        assert_eq!(fallback_teams("Spanish La Liga").len(), 3);
        assert!(fallback_teams("Italian Serie A").is_empty());
    }
}
