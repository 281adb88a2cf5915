use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dashboard-assigned bot identifier, stable for the bot's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotId(pub u64);

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BotId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// --- Wire types ---

/// Body of `GET /api/bots/{id}/status`.
///
/// Every field is optional on the wire: error bodies only carry `success`
/// and `message`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub telegram_ready: Option<bool>,
    #[serde(default)]
    pub service_active: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusReply {
    pub fn lifecycle(&self) -> LifecycleState {
        LifecycleState::from_tag(self.status.as_deref())
    }
}

/// One entry of `GET /api/bots`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotSummary {
    pub id: BotId,
    #[serde(default)]
    pub bot_name: String,
    pub bot_username: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub droplet_id: Option<u64>,
    #[serde(default)]
    pub region: Option<String>,
    /// Server-side record status (`running`, ...), not readiness.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl BotSummary {
    pub fn is_running(&self) -> bool {
        self.status.as_deref() == Some("running")
    }

    /// Deploy date, accepting both SQLite `CURRENT_TIMESTAMP` and RFC 3339.
    pub fn deployed_on(&self) -> Option<NaiveDate> {
        let raw = self.created_at.as_deref()?.trim();
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Some(dt.date());
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}

/// Successful body of `POST /api/deploy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedBot {
    pub bot_username: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub droplet_id: Option<u64>,
}

impl DeployedBot {
    /// Find this deployment in a bot list. The deploy reply carries no id, so
    /// the handle is matched, preferring the newest entry on the same IP.
    pub fn find_in<'a>(&self, bots: &'a [BotSummary]) -> Option<&'a BotSummary> {
        let handle = self.bot_username.trim_start_matches('@');
        let same_handle = || bots.iter().filter(move |b| b.bot_username == handle);
        same_handle()
            .filter(|b| b.ip_address == self.ip_address)
            .max_by_key(|b| b.id)
            .or_else(|| same_handle().max_by_key(|b| b.id))
    }
}

// --- Lifecycle ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Provisioning,
    Initializing,
    Ready,
    Unknown,
}

impl LifecycleState {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some("ready") => Self::Ready,
            Some("initializing") => Self::Initializing,
            Some("provisioning") | Some("deploying") => Self::Provisioning,
            _ => Self::Unknown,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Ready
    }
}

// --- Rendering ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    Green,
    Amber,
    Cyan,
    Red,
}

/// What a bot card's status label currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLabel {
    SettingUp,
    Initializing,
    Ready,
    Checking,
    Unreachable,
}

impl StatusLabel {
    pub fn for_state(state: LifecycleState) -> Self {
        match state {
            LifecycleState::Ready => Self::Ready,
            LifecycleState::Initializing => Self::Initializing,
            LifecycleState::Provisioning | LifecycleState::Unknown => Self::SettingUp,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Self::SettingUp => "🟡 Setting up...",
            Self::Initializing => "🟡 Initializing...",
            Self::Ready => "🟢 Ready!",
            Self::Checking => "⚠️ Checking...",
            Self::Unreachable => "🔴 Unreachable",
        }
    }

    pub fn color(self) -> ColorToken {
        match self {
            Self::SettingUp | Self::Initializing => ColorToken::Amber,
            Self::Ready => ColorToken::Green,
            Self::Checking => ColorToken::Cyan,
            Self::Unreachable => ColorToken::Red,
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// The "test bot" control revealed on a card once the bot is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestAction {
    pub label: String,
    pub url: String,
}

impl TestAction {
    pub fn for_handle(platform_url: &str, handle: &str) -> Self {
        let handle = handle.trim().trim_start_matches('@');
        Self {
            label: "💬 TEST BOT".into(),
            url: format!("{}/{handle}", platform_url.trim_end_matches('/')),
        }
    }
}
