//! TheSportsDB client against a local fake server
#![cfg(feature = "net")]

use boletim::sports::client::ClientConfig;
use boletim::sports::{FallbackDirectory, Lookup, RateLimitConfig, SportsApi, SportsDbClient, TeamDirectory};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use tiny_http::{Response, Server};

static INIT: Once = Once::new();
static HITS: AtomicUsize = AtomicUsize::new(0);

const TEAMS_JSON: &str = r#"{"teams":[
  {"idTeam":"133604","strTeam":"Arsenal","strTeamBadge":"https://r2.thesportsdb.com/arsenal.png"},
  {"idTeam":"133610","strTeam":"Chelsea","strTeamBadge":""},
  {"strTeam":"","strAlternate":"Spurs"}
]}"#;

/// Serves canned SportsDB answers on a fixed port.
fn start_test_server() -> String {
    INIT.call_once(|| {
        std::thread::spawn(|| {
            let server = Server::http("127.0.0.1:18090").unwrap();
            for request in server.incoming_requests() {
                HITS.fetch_add(1, Ordering::SeqCst);
                let url = request.url().to_string();
                let json = "Content-Type: application/json".parse::<tiny_http::Header>().unwrap();
                let response = if url.contains("search_all_teams.php?l=English+Premier+League") {
                    Response::from_string(TEAMS_JSON).with_header(json)
                } else if url.contains("search_all_teams.php") {
                    Response::from_string(r#"{"teams":null}"#).with_header(json)
                } else if url.contains("lookupleague.php?id=4328") {
                    Response::from_string(r#"{"leagues":[{"strBadge":"https://r2.thesportsdb.com/epl.png"}]}"#)
                        .with_header(json)
                } else if url.contains("lookupleague.php") {
                    Response::from_string(r#"{"leagues":[{"strBadge":null}]}"#).with_header(json)
                } else if url.ends_with("/broken") {
                    Response::from_string("oops").with_status_code(500)
                } else {
                    Response::from_string("Not Found").with_status_code(404)
                };
                let _ = request.respond(response);
            }
        });
        std::thread::sleep(std::time::Duration::from_millis(100));
    });

    "http://127.0.0.1:18090/api/v1/json/123".to_string()
}

fn client(max_requests: usize) -> SportsDbClient {
    SportsDbClient::new(ClientConfig {
        base_url: start_test_server(),
        timeout_ms: 2_000,
        rate_limit: RateLimitConfig { max_requests, window_ms: 60_000 },
        ..ClientConfig::default()
    })
    .expect("client")
}

#[test]
fn test_fetch_teams_maps_provider_fields() {
    let c = client(10);
    let teams = match c.fetch_teams("English Premier League") {
        Lookup::Found(t) => t,
        other => panic!("expected teams, got {:?}", other),
    };
    assert_eq!(teams.len(), 3);
    assert_eq!(teams[0].id, 133604);
    assert_eq!(teams[0].badge.as_deref(), Some("https://r2.thesportsdb.com/arsenal.png"));
    assert_eq!(teams[1].badge.as_deref(), Some("/logos/default_team.png"));
    assert_eq!(teams[2].id, 1002);
    assert_eq!(teams[2].name, "Spurs");
    assert!(teams.iter().all(|t| t.league == "English Premier League"));
}

#[test]
fn test_league_badge() {
    let c = client(10);
    assert_eq!(
        c.fetch_league_badge(4328),
        Lookup::Found("https://r2.thesportsdb.com/epl.png".to_string())
    );
    assert_eq!(c.fetch_league_badge(4335), Lookup::Empty);
}

#[test]
fn test_empty_league_falls_back() {
    let dir = FallbackDirectory::new(client(10));
    // provider has nothing for La Liga: static table
    let teams = dir.teams_by_league("Spanish La Liga");
    assert_eq!(teams.len(), 3);
    assert_eq!(teams[0].name, "Real Madrid");
    // unknown league and no fallback
    assert!(dir.teams_by_league("Dutch Eredivisie").is_empty());
}

#[test]
fn test_rate_limit_falls_back_without_request() {
    let c = client(1);
    let dir = FallbackDirectory::new(c);
    assert_eq!(dir.teams_by_league("English Premier League")[0].id, 133604);

    // quota spent: static table ids come back without a request
    let teams = dir.teams_by_league("English Premier League");
    assert_eq!(teams.len(), 5);
    assert_eq!(teams[0].id, 1);
    assert!(dir.league_logo(4328).is_none());
    assert_eq!(dir.api().remaining_quota(), 0);
    assert!(HITS.load(Ordering::SeqCst) >= 1);
}

#[test]
fn test_http_errors_are_failures() {
    let c = client(10);
    let base = start_test_server();
    match c.fetch_image(&format!("{}/broken", base)) {
        Lookup::Failed(msg) => assert!(msg.contains("500")),
        other => panic!("expected failure, got {:?}", other),
    }

    let down = SportsDbClient::new(ClientConfig {
        base_url: "http://127.0.0.1:9/api".into(),
        timeout_ms: 500,
        ..ClientConfig::default()
    })
    .expect("client");
    assert!(matches!(down.fetch_teams("English Premier League"), Lookup::Failed(_)));
    let fallback = FallbackDirectory::new(down).teams_by_league("English Premier League");
    assert_eq!(fallback.len(), 5);
}
