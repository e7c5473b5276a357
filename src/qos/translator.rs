//! Translation of Neutron QoS rules into NSX switching profile values.
//!
//! NSX takes burst in bytes and bandwidth in Mbps; Neutron rules are in kbps.
//! Out-of-range values are clamped with a warning since a notification cannot
//! be rejected.

use tracing::warn;

use super::types::{
    BandwidthLimitRule, BandwidthShaping, DscpMarkingRule, QosMarking, ShapingParameters,
};

/// Smallest `max_kbps` the backend accepts (1 Mbps).
pub const MAX_KBPS_MIN_VALUE: u64 = 1024;

/// Largest `max_burst_kbps` whose byte value stays below 2^31.
pub const MAX_BURST_MAX_VALUE: u64 = ((1 << 31) - 1) / 128;

const BYTES_PER_KBIT_BURST: u64 = 128;
const KBPS_PER_MBPS: f64 = 1024.0;

/// Clamp a bandwidth rule to the values the backend accepts.
pub fn clamp_bandwidth_rule(rule: BandwidthLimitRule) -> BandwidthLimitRule {
    let mut rule = rule;

    if rule.max_kbps < MAX_KBPS_MIN_VALUE {
        warn!(
            max_kbps = rule.max_kbps,
            "Invalid input for max_kbps. The minimal legal value is {}", MAX_KBPS_MIN_VALUE
        );
        rule.max_kbps = MAX_KBPS_MIN_VALUE;
    }

    if rule.max_burst_kbps > MAX_BURST_MAX_VALUE {
        warn!(
            max_burst_kbps = rule.max_burst_kbps,
            "Invalid input for burst_size. The maximal legal value is {}", MAX_BURST_MAX_VALUE
        );
        rule.max_burst_kbps = MAX_BURST_MAX_VALUE;
    }

    rule
}

/// Shaping values for a bandwidth limit rule, or disabled shaping without one.
///
/// Rounding is half-to-even on both the kbps to Mbps conversion and the peak
/// multiplication.
pub fn bandwidth_shaping(
    rule: Option<BandwidthLimitRule>,
    peak_bw_multiplier: f64,
) -> BandwidthShaping {
    let Some(rule) = rule else {
        return BandwidthShaping::DISABLED;
    };
    let rule = clamp_bandwidth_rule(rule);

    let burst_size = rule.max_burst_kbps * BYTES_PER_KBIT_BURST;
    let average_bandwidth = (rule.max_kbps as f64 / KBPS_PER_MBPS).round_ties_even() as u64;
    let peak_bandwidth = (average_bandwidth as f64 * peak_bw_multiplier).round_ties_even() as u64;

    BandwidthShaping {
        shaping_enabled: true,
        burst_size: Some(burst_size),
        peak_bandwidth: Some(peak_bandwidth),
        average_bandwidth: Some(average_bandwidth),
    }
}

/// DSCP handling: a marking rule rewrites the value, otherwise it is trusted.
pub fn dscp_marking(rule: Option<DscpMarkingRule>) -> (QosMarking, u8) {
    match rule {
        Some(rule) => (QosMarking::Untrusted, rule.dscp_mark),
        None => (QosMarking::Trusted, 0),
    }
}

pub fn shaping_parameters(
    bw_rule: Option<BandwidthLimitRule>,
    dscp_rule: Option<DscpMarkingRule>,
    peak_bw_multiplier: f64,
) -> ShapingParameters {
    let (qos_marking, dscp) = dscp_marking(dscp_rule);
    ShapingParameters {
        bandwidth: bandwidth_shaping(bw_rule, peak_bw_multiplier),
        qos_marking,
        dscp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn rule(max_kbps: u64, max_burst_kbps: u64) -> Option<BandwidthLimitRule> {
        Some(BandwidthLimitRule { max_kbps, max_burst_kbps })
    }

    #[test]
    fn test_burst_ceiling_fits_backend_limit() {
        assert_eq!(MAX_BURST_MAX_VALUE, 16_777_215);
        assert!(MAX_BURST_MAX_VALUE * 128 < 1 << 31);
    }

    #[test]
    fn test_no_rule_disables_shaping() {
        assert_eq!(bandwidth_shaping(None, 2.0), BandwidthShaping::DISABLED);
    }

    #[test]
    fn test_kbps_translated_to_bytes_and_mbps() {
        let shaping = bandwidth_shaping(rule(2048, 100), 2.0);
        assert!(shaping.shaping_enabled);
        assert_eq!(shaping.burst_size, Some(12_800));
        assert_eq!(shaping.average_bandwidth, Some(2));
        assert_eq!(shaping.peak_bandwidth, Some(4));
    }

    #[traced_test]
    #[test]
    fn test_max_kbps_below_floor_is_clamped() {
        let shaping = bandwidth_shaping(rule(512, 0), 2.0);
        assert_eq!(shaping.average_bandwidth, Some(1));
        assert_eq!(shaping.peak_bandwidth, Some(2));
        assert_eq!(shaping.burst_size, Some(0));
        assert!(logs_contain("Invalid input for max_kbps"));
    }

    #[traced_test]
    #[test]
    fn test_burst_above_ceiling_is_clamped() {
        let shaping = bandwidth_shaping(rule(10_240, MAX_BURST_MAX_VALUE + 1), 2.0);
        assert_eq!(shaping.burst_size, Some(MAX_BURST_MAX_VALUE * 128));
        assert!(logs_contain("Invalid input for burst_size"));
    }

    #[traced_test]
    #[test]
    fn test_values_at_limits_are_not_clamped() {
        let clamped = clamp_bandwidth_rule(BandwidthLimitRule {
            max_kbps: MAX_KBPS_MIN_VALUE,
            max_burst_kbps: MAX_BURST_MAX_VALUE,
        });
        assert_eq!(clamped.max_kbps, MAX_KBPS_MIN_VALUE);
        assert_eq!(clamped.max_burst_kbps, MAX_BURST_MAX_VALUE);
        assert!(!logs_contain("Invalid input"));
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        // 1.5 Mbps and 2.5 Mbps both round to 2
        assert_eq!(bandwidth_shaping(rule(1536, 0), 1.0).average_bandwidth, Some(2));
        assert_eq!(bandwidth_shaping(rule(2560, 0), 1.0).average_bandwidth, Some(2));
        assert_eq!(bandwidth_shaping(rule(3584, 0), 1.0).average_bandwidth, Some(4));

        // 3 Mbps * 1.5 = 4.5
        assert_eq!(bandwidth_shaping(rule(3072, 0), 1.5).peak_bandwidth, Some(4));
    }

    #[test]
    fn test_dscp_marking() {
        assert_eq!(dscp_marking(Some(DscpMarkingRule { dscp_mark: 10 })), (QosMarking::Untrusted, 10));
        assert_eq!(dscp_marking(None), (QosMarking::Trusted, 0));
    }

    #[test]
    fn test_shaping_parameters_combines_rules() {
        let params = shaping_parameters(rule(4096, 50), Some(DscpMarkingRule { dscp_mark: 22 }), 2.0);
        assert_eq!(params.bandwidth.average_bandwidth, Some(4));
        assert_eq!(params.bandwidth.peak_bandwidth, Some(8));
        assert_eq!(params.qos_marking, QosMarking::Untrusted);
        assert_eq!(params.dscp, 22);

        let params = shaping_parameters(None, None, 2.0);
        assert!(!params.bandwidth.shaping_enabled);
        assert_eq!(params.qos_marking, QosMarking::Trusted);
        assert_eq!(params.dscp, 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn burst_bytes_stay_below_2_pow_31(max_kbps in 0u64..10_000_000, burst in 0u64..u32::MAX as u64) {
                let shaping = bandwidth_shaping(rule(max_kbps, burst), 2.0);
                prop_assert!(shaping.burst_size.unwrap() < 1 << 31);
                prop_assert!(shaping.average_bandwidth.unwrap() >= 1);
                prop_assert!(shaping.peak_bandwidth.unwrap() >= shaping.average_bandwidth.unwrap());
            }
        }
    }
}
