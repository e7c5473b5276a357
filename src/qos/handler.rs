//! Bridges Neutron QoS policy notifications to NSX QoS switching profiles.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::translator::shaping_parameters;
use super::types::{BandwidthLimitRule, DscpMarkingRule, QosContext, QosPolicy, ShapingParameters};
use crate::backend::{build_v3_tags, Tag, NSX_NEUTRON_PLUGIN};
use crate::errors::{NsxError, Result};
use crate::storage::QosPolicyMappingRepository;

/// Tag scope holding the Neutron QoS policy ID.
pub const QOS_POLICY_TAG_SCOPE: &str = "os-neutron-qos-id";

/// QoS switching profile operations of the nsxlib client.
#[async_trait]
pub trait QosSwitchingProfileApi: Send + Sync {
    /// Create a profile and return its ID. `None` or an empty ID means the
    /// backend did not create it.
    async fn create(&self, tags: Vec<Tag>, name: &str, description: &str) -> Result<Option<String>>;

    async fn update(
        &self,
        profile_id: &str,
        tags: Vec<Tag>,
        name: &str,
        description: &str,
    ) -> Result<()>;

    async fn delete(&self, profile_id: &str) -> Result<()>;

    async fn update_shaping(&self, profile_id: &str, shaping: &ShapingParameters) -> Result<()>;
}

pub struct QosNotificationsHandler {
    api: Arc<dyn QosSwitchingProfileApi>,
    mappings: Arc<dyn QosPolicyMappingRepository>,
    peak_bw_multiplier: f64,
    plugin_tag: String,
    plugin_ver: String,
}

impl QosNotificationsHandler {
    pub fn new(
        api: Arc<dyn QosSwitchingProfileApi>,
        mappings: Arc<dyn QosPolicyMappingRepository>,
        peak_bw_multiplier: f64,
    ) -> Self {
        Self {
            api,
            mappings,
            peak_bw_multiplier,
            plugin_tag: NSX_NEUTRON_PLUGIN.to_string(),
            plugin_ver: crate::VERSION.to_string(),
        }
    }

    fn tags(&self, context: &QosContext, policy: &QosPolicy) -> Vec<Tag> {
        build_v3_tags(
            QOS_POLICY_TAG_SCOPE,
            &policy.id,
            &policy.tenant_id,
            context.project_name.as_deref(),
            &self.plugin_tag,
            &self.plugin_ver,
        )
    }

    async fn switch_profile(&self, policy_id: &str) -> Result<String> {
        self.mappings
            .get_switch_profile(policy_id)
            .await?
            .ok_or_else(|| NsxError::not_found("QosSwitchingProfile", policy_id))
    }

    #[instrument(skip(self, context, policy), fields(policy_id = %policy.id), name = "qos_create_policy")]
    pub async fn create_policy(&self, context: &QosContext, policy: &QosPolicy) -> Result<String> {
        let tags = self.tags(context, policy);
        let profile_id = self
            .api
            .create(tags, &policy.name, &policy.description)
            .await?
            .filter(|id| !id.is_empty())
            .ok_or_else(|| NsxError::backend("Unable to create QoS switching profile on the backend"))?;

        self.mappings.add_mapping(&policy.id, &profile_id).await?;
        info!(profile_id = %profile_id, "Created QoS switching profile");
        Ok(profile_id)
    }

    #[instrument(skip(self), name = "qos_delete_policy")]
    pub async fn delete_policy(&self, policy_id: &str) -> Result<()> {
        let profile_id = self.switch_profile(policy_id).await?;

        self.api.delete(&profile_id).await?;
        self.mappings.delete_mapping(policy_id).await?;
        info!(profile_id = %profile_id, "Deleted QoS switching profile");
        Ok(())
    }

    #[instrument(skip(self, context, policy), name = "qos_update_policy")]
    pub async fn update_policy(
        &self,
        context: &QosContext,
        policy_id: &str,
        policy: &QosPolicy,
    ) -> Result<()> {
        let profile_id = self.switch_profile(policy_id).await?;
        let tags = self.tags(context, policy);

        self.api.update(&profile_id, tags, &policy.name, &policy.description).await
    }

    /// Push the policy's bandwidth and DSCP rules to its switching profile.
    #[instrument(skip(self, bw_rule, dscp_rule), name = "qos_update_policy_rules")]
    pub async fn update_policy_rules(
        &self,
        policy_id: &str,
        bw_rule: Option<BandwidthLimitRule>,
        dscp_rule: Option<DscpMarkingRule>,
    ) -> Result<()> {
        let profile_id = self.switch_profile(policy_id).await?;
        let shaping = shaping_parameters(bw_rule, dscp_rule, self.peak_bw_multiplier);

        if !shaping.bandwidth.shaping_enabled {
            debug!(profile_id = %profile_id, "No bandwidth limit rule, disabling shaping");
        }
        self.api.update_shaping(&profile_id, &shaping).await
    }
}
