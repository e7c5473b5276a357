//! # QoS
//!
//! Neutron QoS policies map one to one onto NSX QoS switching profiles.
//! [`translator`] converts rule values into profile values and
//! [`QosNotificationsHandler`] keeps the profiles in sync with policy
//! notifications.

pub mod handler;
pub mod translator;
pub mod types;

pub use handler::{QosNotificationsHandler, QosSwitchingProfileApi, QOS_POLICY_TAG_SCOPE};
pub use translator::{
    bandwidth_shaping, clamp_bandwidth_rule, dscp_marking, shaping_parameters,
    MAX_BURST_MAX_VALUE, MAX_KBPS_MIN_VALUE,
};
pub use types::{
    BandwidthLimitRule, BandwidthShaping, DscpMarkingRule, QosContext, QosMarking, QosPolicy,
    ShapingParameters,
};
