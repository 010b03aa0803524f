use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::session::PollPolicy;
use crate::voice::Transport;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Websocket endpoint of the conversational voice service
    pub ws_url: String,

    /// REST base for conversation analysis and audio
    pub api_base: String,

    pub agent_id: Option<String>,

    pub api_key: Option<String>,

    pub transport: Transport,

    /// Input devices reported by the capture client; when unset the
    /// local sound system is probed
    pub input_devices: Option<Vec<String>>,

    /// How many times to poll the session handle for its conversation id
    pub id_poll_attempts: u32,

    pub id_poll_interval_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            ws_url: "wss://api.elevenlabs.io/v1/convai/conversation".to_string(),
            api_base: "https://api.elevenlabs.io/v1/convai".to_string(),
            agent_id: None,
            api_key: None,
            transport: Transport::WebSocket,
            input_devices: None,
            id_poll_attempts: 5,
            id_poll_interval_ms: 100,
        }
    }
}

impl VoiceConfig {
    pub fn id_poll_interval(&self) -> Duration {
        Duration::from_millis(self.id_poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub initial_delay_ms: u64,
    pub retry_delay_ms: u64,
    pub max_attempts: u32,
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 3_000,
            retry_delay_ms: 5_000,
            max_attempts: 3,
            timeout_secs: 30,
        }
    }
}

impl AnalysisConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            max_attempts: self.max_attempts,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// How many recent trainings feed the stats and the list
    pub recent_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { recent_limit: 10 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file with initial actors and clients
    pub seed_path: Option<String>,
}

impl Config {
    /// Load `path` (extension optional) layered with `CALLCOACH__*`
    /// environment variables, e.g. `CALLCOACH__VOICE__API_KEY`.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CALLCOACH").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
