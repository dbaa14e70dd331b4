use crate::domains::site::SiteMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What `init` returns: the site, the robot's identity and its runtime
/// parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitData {
    pub site: SiteInfo,
    pub robot: RobotIdentity,
    #[serde(default)]
    pub params: RobotParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    pub id: String,
    #[serde(default)]
    pub locale: Option<String>,
    pub map: Arc<SiteMap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotKind {
    Delivery,
    Disinfection,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotIdentity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RobotKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub debug_mode: bool,
}

/// Timeouts are in seconds, battery thresholds in percent. Any parameter the
/// platform leaves out takes its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotParams {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub integration_test: bool,
    #[serde(default = "defaults::nav_timeout_integration_test")]
    pub nav_timeout_integration_test: u64,
    #[serde(default = "defaults::nav_timeout_navigation")]
    pub nav_timeout_navigation: u64,
    #[serde(default = "defaults::nav_timeout_deliver")]
    pub nav_timeout_deliver: u64,
    #[serde(default = "defaults::nav_timeout_return")]
    pub nav_timeout_return: u64,
    #[serde(default = "defaults::idle_timeout_standby")]
    pub idle_timeout_standby: u64,
    #[serde(default = "defaults::idle_timeout_item_place")]
    pub idle_timeout_item_place: u64,
    #[serde(
        default = "defaults::idle_timeout_wait_recipient",
        alias = "idleTimeoutWaitReciepient"
    )]
    pub idle_timeout_wait_recipient: u64,
    #[serde(default = "defaults::idle_timeout_item_collect")]
    pub idle_timeout_item_collect: u64,
    #[serde(default = "defaults::min_battery")]
    pub min_battery_wakeup: f64,
    #[serde(default = "defaults::min_battery")]
    pub min_battery_disinfection: f64,
}

mod defaults {
    pub fn nav_timeout_integration_test() -> u64 {
        30 * 60
    }
    pub fn nav_timeout_navigation() -> u64 {
        10 * 60
    }
    pub fn nav_timeout_deliver() -> u64 {
        60 * 60
    }
    pub fn nav_timeout_return() -> u64 {
        60 * 60
    }
    pub fn idle_timeout_standby() -> u64 {
        5 * 60
    }
    pub fn idle_timeout_item_place() -> u64 {
        10 * 60
    }
    pub fn idle_timeout_wait_recipient() -> u64 {
        30 * 60
    }
    pub fn idle_timeout_item_collect() -> u64 {
        5 * 60
    }
    pub fn min_battery() -> f64 {
        30.0
    }
}

impl Default for RobotParams {
    fn default() -> Self {
        Self {
            password: None,
            integration_test: false,
            nav_timeout_integration_test: defaults::nav_timeout_integration_test(),
            nav_timeout_navigation: defaults::nav_timeout_navigation(),
            nav_timeout_deliver: defaults::nav_timeout_deliver(),
            nav_timeout_return: defaults::nav_timeout_return(),
            idle_timeout_standby: defaults::idle_timeout_standby(),
            idle_timeout_item_place: defaults::idle_timeout_item_place(),
            idle_timeout_wait_recipient: defaults::idle_timeout_wait_recipient(),
            idle_timeout_item_collect: defaults::idle_timeout_item_collect(),
            min_battery_wakeup: defaults::min_battery(),
            min_battery_disinfection: defaults::min_battery(),
        }
    }
}
