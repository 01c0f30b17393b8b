//! Client configuration types for Tripmate.
//!
//! `ClientConfig` represents `config.toml` in the data directory. Every
//! field has a default, so an empty or missing file yields a working client
//! pointed at a local backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub plan: PlanConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

/// REST endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every request path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Prefix for resource endpoints (users, rooms, plans). Auth endpoints
    /// are not prefixed.
    #[serde(default = "default_resource_prefix")]
    pub resource_prefix: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Origin of the web client, used for invite links.
    #[serde(default = "default_web_origin")]
    pub web_origin: String,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_resource_prefix() -> String {
    "/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_web_origin() -> String {
    "http://localhost:5173".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            resource_prefix: default_resource_prefix(),
            request_timeout_secs: default_request_timeout_secs(),
            web_origin: default_web_origin(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Realtime transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// WebSocket endpoint speaking STOMP.
    #[serde(default = "default_ws_url")]
    pub url: String,
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,
}

fn default_ws_url() -> String {
    "ws://localhost:8080/ws-stomp/websocket".to_string()
}

fn default_handshake_timeout_secs() -> u64 {
    10
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: default_ws_url(),
            handshake_timeout_secs: default_handshake_timeout_secs(),
        }
    }
}

impl RealtimeConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }
}

/// Session lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Upper bound on the silent refresh attempted at startup.
    #[serde(default = "default_bootstrap_refresh_timeout_secs")]
    pub bootstrap_refresh_timeout_secs: u64,
}

fn default_bootstrap_refresh_timeout_secs() -> u64 {
    8
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bootstrap_refresh_timeout_secs: default_bootstrap_refresh_timeout_secs(),
        }
    }
}

impl AuthConfig {
    pub fn bootstrap_refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.bootstrap_refresh_timeout_secs)
    }
}

/// Plan-generation workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    /// How long to wait for the planner before giving up.
    #[serde(default = "default_plan_timeout_secs")]
    pub timeout_secs: u64,
    /// How long error notices stay visible.
    #[serde(default = "default_notice_secs")]
    pub notice_secs: u64,
    /// Phrases that start plan generation (compared without whitespace).
    #[serde(default = "default_trigger_phrases")]
    pub trigger_phrases: Vec<String>,
    /// Substrings marking a planner message as an error report.
    #[serde(default = "default_error_markers")]
    pub error_markers: Vec<String>,
}

fn default_plan_timeout_secs() -> u64 {
    20 * 60
}

fn default_notice_secs() -> u64 {
    8
}

fn default_trigger_phrases() -> Vec<String> {
    [
        "일정 짜줘",
        "일정 만들어줘",
        "일정 생성해줘",
        "일정 보여줘",
        "계획 짜줘",
        "플랜 짜줘",
        "generate plan",
        "make a plan",
        "show the plan",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_error_markers() -> Vec<String> {
    ["ERROR", "오류", "실패", "failed"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_plan_timeout_secs(),
            notice_secs: default_notice_secs(),
            trigger_phrases: default_trigger_phrases(),
            error_markers: default_error_markers(),
        }
    }
}

impl PlanConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_secs(self.notice_secs)
    }
}

/// Chat room settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Number of history messages fetched on room entry.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

fn default_history_limit() -> u32 {
    100
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}
