use crate::domains::navigation::NavigationSettings;
use crate::domains::orchestrator::RuntimeSettings;
use crate::domains::robot::{Capabilities, RobotKind};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Suppresses mission reports and SMS.
    pub debug_mode: bool,
    pub state_inspector: bool,
    /// Robot type the simulated platform announces.
    pub simulated_kind: RobotKind,
    pub sms_sender_id: String,
}

/// All durations in milliseconds unless the name says otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub tick_ms: u64,
    pub status_poll_ms: u64,
    pub retry_backoff_ms: u64,
    pub navigation_retry_backoff_ms: u64,
    pub dispatch_backoff_ms: u64,
    pub elevator_poll_ms: u64,
    pub door_hold_period_ms: u64,
    pub dispatch_rpc_timeout_ms: u64,
    pub park_charge_await_ms: u64,
    pub pause_cooldown_ms: u64,
    pub docked_settle_ms: u64,
    pub lid_test_hold_ms: u64,
    pub sms_retry_delay_ms: u64,
    pub sms_attempts: u32,
    pub default_countdown_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Domain log file. `None` logs to the console only.
    pub file: Option<String>,
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JournalConfig {
    /// Directory for the JSON Lines mission journal. `None` keeps it in memory.
    pub directory: Option<PathBuf>,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Optional TOML file, then `ERRAND__SECTION__KEY` environment overrides,
    /// on top of the defaults.
    pub fn load(path: &str) -> Result<Self> {
        let layered = ::config::Config::builder()
            .add_source(::config::File::with_name(path).required(false))
            .add_source(::config::Environment::with_prefix("ERRAND").separator("__"))
            .build()?;
        Ok(layered.try_deserialize()?)
    }

    pub fn runtime_settings(&self) -> RuntimeSettings {
        let t = &self.timing;
        let ms = Duration::from_millis;
        RuntimeSettings {
            tick: ms(t.tick_ms),
            status_poll: ms(t.status_poll_ms),
            retry_backoff: ms(t.retry_backoff_ms),
            park_charge_await: ms(t.park_charge_await_ms),
            pause_cooldown: ms(t.pause_cooldown_ms),
            docked_settle: ms(t.docked_settle_ms),
            lid_test_hold: ms(t.lid_test_hold_ms),
            sms_retry_delay: ms(t.sms_retry_delay_ms),
            sms_attempts: t.sms_attempts,
            default_countdown_secs: t.default_countdown_secs,
            navigation: NavigationSettings {
                goal_backoff: ms(t.navigation_retry_backoff_ms),
                retry_backoff: ms(t.retry_backoff_ms),
                dispatch_backoff: ms(t.dispatch_backoff_ms),
                elevator_poll: ms(t.elevator_poll_ms),
                door_hold_period: ms(t.door_hold_period_ms),
                dispatch_rpc_timeout: ms(t.dispatch_rpc_timeout_ms),
            },
            capabilities: Capabilities {
                state_inspector: self.robot.state_inspector,
            },
            sender_id: self.robot.sms_sender_id.clone(),
        }
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            state_inspector: true,
            simulated_kind: RobotKind::Delivery,
            sms_sender_id: "Errand Robotics".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            status_poll_ms: 1_000,
            retry_backoff_ms: 1_000,
            navigation_retry_backoff_ms: 5_000,
            dispatch_backoff_ms: 5_000,
            elevator_poll_ms: 1_000,
            door_hold_period_ms: 1_000,
            dispatch_rpc_timeout_ms: 20_000,
            park_charge_await_ms: 5_000,
            pause_cooldown_ms: 60_000,
            docked_settle_ms: 5_000,
            lid_test_hold_ms: 10_000,
            sms_retry_delay_ms: 60_000,
            sms_attempts: 3,
            default_countdown_secs: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}
