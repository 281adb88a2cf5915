use botdash_core::config::{self, DEPLOY_TIMEOUT, REQUEST_TIMEOUT, SESSION_COOKIE};
use botdash_core::{AppError, BotId, BotSummary, DeployedBot, StatusReply};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

pub struct DashboardClient {
    client: reqwest::Client,
    base_url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ListBotsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    bots: Vec<BotSummary>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct LogsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    logs: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct DeployResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    bot_username: Option<String>,
    #[serde(default)]
    ip_address: Option<String>,
    #[serde(default)]
    droplet_id: Option<u64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl DashboardClient {
    /// Build a client for the dashboard at `base_url`, authenticating with the
    /// dashboard's session cookie when one is given.
    pub fn new(base_url: &str, session: Option<&str>) -> Result<Self, AppError> {
        let base_url = config::normalize_base_url(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(session) = session.map(str::trim).filter(|s| !s.is_empty()) {
            let cookie = format!("{SESSION_COOKIE}={session}");
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&cookie)
                    .map_err(|e| AppError::Config(format!("Invalid session cookie: {e}")))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Fetch the readiness of one bot.
    ///
    /// The dashboard answers refusals (`401`, `404`) with the same JSON shape,
    /// so any parseable body is returned as a reply regardless of HTTP status.
    pub async fn bot_status(&self, bot: BotId) -> Result<StatusReply, AppError> {
        let resp = self
            .client
            .get(format!("{}/api/bots/{bot}/status", self.base_url))
            .send()
            .await?;
        let (status, reply) = decode::<StatusReply>(resp).await?;
        debug!(bot_id = %bot, http_status = %status, ?reply, "status reply");
        Ok(reply)
    }

    /// List the signed-in user's bots, newest first.
    pub async fn list_bots(&self) -> Result<Vec<BotSummary>, AppError> {
        let resp = self
            .client
            .get(format!("{}/api/bots", self.base_url))
            .send()
            .await?;
        let (status, parsed) = decode::<ListBotsResponse>(resp).await?;
        if !parsed.success {
            return Err(AppError::Api(format!(
                "List bots failed ({status}): {}",
                parsed.message.unwrap_or_default()
            )));
        }
        Ok(parsed.bots)
    }

    /// Fetch the most recent gateway log lines of one bot.
    pub async fn bot_logs(&self, bot: BotId) -> Result<String, AppError> {
        let resp = self
            .client
            .get(format!("{}/api/logs/{bot}", self.base_url))
            .send()
            .await?;
        let (status, parsed) = decode::<LogsResponse>(resp).await?;
        if !parsed.success {
            return Err(AppError::Api(format!(
                "Fetch logs failed ({status}): {}",
                parsed.message.unwrap_or_default()
            )));
        }
        Ok(parsed.logs)
    }

    /// Ask the dashboard to deploy a bot for `telegram_token`.
    ///
    /// The dashboard provisions the server before answering, so this request
    /// runs under [`DEPLOY_TIMEOUT`] instead of the client-wide timeout.
    pub async fn deploy_bot(&self, telegram_token: &str) -> Result<DeployedBot, AppError> {
        let telegram_token = telegram_token.trim();
        if telegram_token.is_empty() {
            return Err(AppError::MissingParam("telegram_token".into()));
        }

        let resp = self
            .client
            .post(format!("{}/api/deploy", self.base_url))
            .timeout(DEPLOY_TIMEOUT)
            .json(&serde_json::json!({ "telegram_token": telegram_token }))
            .send()
            .await?;
        let (status, parsed) = decode::<DeployResponse>(resp).await?;
        if !parsed.success {
            let reason = parsed.error.or(parsed.message).unwrap_or_default();
            return Err(AppError::Api(format!("Deploy failed ({status}): {reason}")));
        }
        let bot_username = parsed
            .bot_username
            .ok_or_else(|| AppError::Api("Deploy reply is missing bot_username".into()))?;
        debug!(%bot_username, "deploy accepted");
        Ok(DeployedBot {
            bot_username,
            ip_address: parsed.ip_address.unwrap_or_default(),
            droplet_id: parsed.droplet_id,
        })
    }

    /// Delete a bot together with its server. Returns the dashboard's message.
    pub async fn delete_bot(&self, bot: BotId) -> Result<String, AppError> {
        let resp = self
            .client
            .delete(format!("{}/api/bots/{bot}", self.base_url))
            .send()
            .await?;
        let (status, parsed) = decode::<MessageResponse>(resp).await?;
        let message = parsed.message.or(parsed.error).unwrap_or_default();
        if !parsed.success {
            return Err(AppError::Api(format!("Delete bot failed ({status}): {message}")));
        }
        Ok(message)
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<(StatusCode, T), AppError> {
    let status = resp.status();
    let text = resp.text().await?;
    match serde_json::from_str(&text) {
        Ok(parsed) => Ok((status, parsed)),
        Err(e) if status.is_success() => Err(e.into()),
        Err(_) => Err(AppError::Api(format!(
            "Unexpected response ({status}): {}",
            text.chars().take(200).collect::<String>()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus};
    use axum::response::{Html, IntoResponse, Response};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn authed(headers: &AxumHeaders) -> bool {
        headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "session=abc123")
    }

    async fn status_handler(Path(id): Path<u64>, headers: AxumHeaders) -> Response {
        if !authed(&headers) {
            return (
                AxumStatus::UNAUTHORIZED,
                Json(json!({"success": false, "message": "Not authenticated"})),
            )
                .into_response();
        }
        match id {
            1 => Json(json!({
                "success": true, "status": "initializing",
                "telegram_ready": false, "service_active": true
            }))
            .into_response(),
            // A proxy maintenance page served with 200.
            2 => Html("<html><body>maintenance</body></html>").into_response(),
            _ => (
                AxumStatus::NOT_FOUND,
                Json(json!({"success": false, "message": "Bot not found"})),
            )
                .into_response(),
        }
    }

    async fn deploy_handler(headers: AxumHeaders, Json(body): Json<Value>) -> Response {
        if !authed(&headers) {
            return (
                AxumStatus::UNAUTHORIZED,
                Json(json!({"success": false, "message": "Not authenticated"})),
            )
                .into_response();
        }
        match body["telegram_token"].as_str() {
            Some("123:good") => Json(json!({
                "success": true, "bot_username": "freshbot", "ip_address": "203.0.113.7",
                "droplet_id": 555, "gateway_token": "secret"
            }))
            .into_response(),
            Some("123:crash") => (
                AxumStatus::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": "droplet creation timed out"})),
            )
                .into_response(),
            _ => (
                AxumStatus::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "message": "Invalid Telegram bot token. Please check your token from @BotFather."
                })),
            )
                .into_response(),
        }
    }

    async fn spawn_dashboard() -> String {
        let app = Router::new()
            .route("/api/bots/{id}/status", get(status_handler))
            .route(
                "/api/bots",
                get(|| async {
                    Json(json!({"success": true, "bots": [
                        {"id": 1, "bot_name": "openclaw-bot", "bot_username": "firstbot",
                         "ip_address": "203.0.113.1", "status": "running"}
                    ]}))
                }),
            )
            .route("/api/deploy", post(deploy_handler))
            .route(
                "/api/logs/{id}",
                get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "<html>boom</html>") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn status_reply_is_parsed() {
        let base = spawn_dashboard().await;
        let client = DashboardClient::new(&base, Some("abc123")).unwrap();
        let reply = client.bot_status(BotId(1)).await.unwrap();
        assert!(reply.success);
        assert_eq!(reply.status.as_deref(), Some("initializing"));
        assert_eq!(reply.service_active, Some(true));
    }

    #[tokio::test]
    async fn refusals_come_back_as_replies() {
        let base = spawn_dashboard().await;

        let anonymous = DashboardClient::new(&base, None).unwrap();
        let reply = anonymous.bot_status(BotId(1)).await.unwrap();
        assert!(!reply.success);
        assert_eq!(reply.message.as_deref(), Some("Not authenticated"));

        let client = DashboardClient::new(&base, Some("abc123")).unwrap();
        let reply = client.bot_status(BotId(99)).await.unwrap();
        assert!(!reply.success);
        assert_eq!(reply.message.as_deref(), Some("Bot not found"));
    }

    #[tokio::test]
    async fn list_bots_returns_summaries() {
        let base = spawn_dashboard().await;
        let client = DashboardClient::new(&base, Some("abc123")).unwrap();
        let bots = client.list_bots().await.unwrap();
        assert_eq!(bots.len(), 1);
        assert_eq!(bots[0].bot_username, "firstbot");
    }

    #[tokio::test]
    async fn non_json_error_body_is_an_api_error() {
        let base = spawn_dashboard().await;
        let client = DashboardClient::new(&base, Some("abc123")).unwrap();
        let err = client.bot_logs(BotId(1)).await.unwrap_err();
        assert!(matches!(err, AppError::Api(ref msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn html_body_with_ok_status_is_a_decode_error() {
        let base = spawn_dashboard().await;
        let client = DashboardClient::new(&base, Some("abc123")).unwrap();
        let err = client.bot_status(BotId(2)).await.unwrap_err();
        assert!(matches!(err, AppError::Json(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn deploy_returns_the_new_bot() {
        let base = spawn_dashboard().await;
        let client = DashboardClient::new(&base, Some("abc123")).unwrap();
        let bot = client.deploy_bot("123:good").await.unwrap();
        assert_eq!(bot.bot_username, "freshbot");
        assert_eq!(bot.ip_address, "203.0.113.7");
        assert_eq!(bot.droplet_id, Some(555));
    }

    #[tokio::test]
    async fn deploy_failures_carry_the_server_reason() {
        let base = spawn_dashboard().await;
        let client = DashboardClient::new(&base, Some("abc123")).unwrap();

        let err = client.deploy_bot("nope").await.unwrap_err();
        assert!(matches!(err, AppError::Api(ref msg) if msg.contains("@BotFather")));

        let err = client.deploy_bot("123:crash").await.unwrap_err();
        assert!(matches!(err, AppError::Api(ref msg) if msg.contains("timed out")));

        let err = client.deploy_bot("  ").await.unwrap_err();
        assert!(matches!(err, AppError::MissingParam(_)));
    }

    #[tokio::test]
    async fn unreachable_dashboard_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = DashboardClient::new(&format!("http://{addr}"), None).unwrap();
        let err = client.bot_status(BotId(1)).await.unwrap_err();
        assert!(matches!(err, AppError::Http(_)));
    }
}
