//! Neutron QoS rule and NSX switching profile value types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Neutron QoS policy as delivered in notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QosPolicy {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Request context of a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QosContext {
    /// Name of the project issuing the request, when known
    pub project_name: Option<String>,
}

impl QosContext {
    pub fn for_project(name: impl Into<String>) -> Self {
        Self { project_name: Some(name.into()) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthLimitRule {
    pub max_kbps: u64,
    pub max_burst_kbps: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DscpMarkingRule {
    pub dscp_mark: u8,
}

/// Whether the switch keeps the DSCP value of incoming traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QosMarking {
    Trusted,
    Untrusted,
}

impl fmt::Display for QosMarking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QosMarking::Trusted => f.write_str("trusted"),
            QosMarking::Untrusted => f.write_str("untrusted"),
        }
    }
}

/// Shaping part of a switching profile; all values are `None` when disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthShaping {
    pub shaping_enabled: bool,
    /// Bytes
    pub burst_size: Option<u64>,
    /// Mbps
    pub peak_bandwidth: Option<u64>,
    /// Mbps
    pub average_bandwidth: Option<u64>,
}

impl BandwidthShaping {
    pub const DISABLED: Self = Self {
        shaping_enabled: false,
        burst_size: None,
        peak_bandwidth: None,
        average_bandwidth: None,
    };
}

/// Full `update_shaping` payload for a QoS switching profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapingParameters {
    #[serde(flatten)]
    pub bandwidth: BandwidthShaping,
    pub qos_marking: QosMarking,
    pub dscp: u8,
}
