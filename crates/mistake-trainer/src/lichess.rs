//! Lichess game export client.

use chess_core::game_data::GameRecord;
use chess_core::pgn::parse_pgn;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::TrainerError;

const LICHESS_BASE_URL: &str = "https://lichess.org";

/// One line of the NDJSON game export (`pgnInJson=true`).
#[derive(Debug, Deserialize)]
struct ExportedGame {
    id: String,
    pgn: String,
}

pub struct LichessClient {
    client: Client,
    base_url: String,
}

impl LichessClient {
    pub fn new() -> Result<Self, TrainerError> {
        Self::with_base_url(LICHESS_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, TrainerError> {
        let client = Client::builder()
            .user_agent("MistakeTrainer/0.1")
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the user's most recent analysed games.
    pub async fn fetch_user_games(
        &self,
        username: &str,
        max_games: usize,
    ) -> Result<Vec<GameRecord>, TrainerError> {
        let url = format!("{}/api/games/user/{}", self.base_url, username);

        let params = [
            ("max", max_games.to_string()),
            ("analysed", "1".to_string()),
            ("pgnInJson", "true".to_string()),
        ];

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .header("Accept", "application/x-ndjson")
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(TrainerError::Lichess(format!("User not found: {username}")));
        }

        if !resp.status().is_success() {
            return Err(TrainerError::Lichess(format!("HTTP {}", resp.status())));
        }

        let text = resp.text().await?;
        let games = parse_games_ndjson(&text);
        info!(username, count = games.len(), "Fetched games");
        Ok(games)
    }
}

/// Parse an NDJSON export body, skipping lines that do not hold a usable game.
pub fn parse_games_ndjson(body: &str) -> Vec<GameRecord> {
    let mut results = Vec::new();

    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let exported: ExportedGame = match serde_json::from_str(line) {
            Ok(g) => g,
            Err(e) => {
                warn!("Failed to parse Lichess game JSON: {e}");
                continue;
            }
        };

        match parse_pgn(&exported.id, &exported.pgn) {
            Ok(game) => results.push(game),
            Err(e) => warn!(game_id = %exported.id, "Skipping game with bad PGN: {e}"),
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer a single HTTP request with `status` and `body`; the handle
    /// yields the raw request head.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/x-ndjson\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn test_fetch_user_games_parses_export() {
        let body = concat!(
            r#"{"id":"aaaa1111","pgn":"[White \"monksc\"]\n[Black \"rival\"]\n\n1. e4 e5 2. Qh5 *\n"}"#,
            "\n",
            r#"{"id":"bbbb2222","pgn":"1. d4 *"}"#,
            "\n",
        );
        let (base_url, server) = serve_once("200 OK", body).await;
        let client = LichessClient::with_base_url(&base_url).unwrap();

        let games = client.fetch_user_games("monksc", 4).await.unwrap();

        assert_eq!(games.len(), 2);
        assert_eq!(games[0].id, "aaaa1111");
        assert_eq!(games[0].players.black, "rival");
        assert_eq!(games[0].moves, vec!["e4", "e5", "Qh5"]);
        assert_eq!(games[1].moves, vec!["d4"]);

        let request = server.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /api/games/user/monksc?"));
        assert!(request.contains("max=4"));
        assert!(request.contains("analysed=1"));
        assert!(request.contains("pgninjson=true"));
        assert!(request.contains("accept: application/x-ndjson"));
    }

    #[tokio::test]
    async fn test_fetch_unknown_user_is_error() {
        let (base_url, server) = serve_once("404 Not Found", "").await;
        let client = LichessClient::with_base_url(&base_url).unwrap();

        let err = client.fetch_user_games("nobody", 4).await.unwrap_err();

        assert!(matches!(err, TrainerError::Lichess(msg) if msg.contains("User not found: nobody")));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_fatal() {
        let (base_url, server) = serve_once("500 Internal Server Error", "oops").await;
        let client = LichessClient::with_base_url(&base_url).unwrap();

        let err = client.fetch_user_games("monksc", 4).await.unwrap_err();

        assert!(matches!(err, TrainerError::Lichess(msg) if msg.contains("500")));
        server.await.unwrap();
    }

    #[test]
    fn test_parse_games_ndjson() {
        let body = concat!(
            r#"{"id":"aaaa1111","rated":true,"pgn":"[White \"monksc\"]\n[Black \"rival\"]\n\n1. e4 e5 2. Qh5 Nc6 1-0\n"}"#,
            "\n\n",
            r#"{"id":"bbbb2222","pgn":"1. d4 d5 *"}"#,
            "\n",
        );

        let games = parse_games_ndjson(body);
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].id, "aaaa1111");
        assert_eq!(games[0].players.white, "monksc");
        assert_eq!(games[0].moves, vec!["e4", "e5", "Qh5", "Nc6"]);
        assert_eq!(games[1].moves, vec!["d4", "d5"]);
    }

    #[test]
    fn test_parse_games_ndjson_skips_bad_lines() {
        let body = concat!(
            "not json at all\n",
            r#"{"id":"nopgn"}"#,
            "\n",
            r#"{"id":"empty","pgn":""}"#,
            "\n",
            r#"{"id":"good","pgn":"1. c4 *"}"#,
        );

        let games = parse_games_ndjson(body);
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, "good");
    }
}
