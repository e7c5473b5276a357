//! Neutron QoS policy to NSX switching profile mappings.

use crate::errors::{NsxError, Result};
use crate::storage::DbPool;
use async_trait::async_trait;
use tracing::instrument;

#[async_trait]
pub trait QosPolicyMappingRepository: Send + Sync {
    /// Record the switching profile created for a QoS policy.
    async fn add_mapping(&self, qos_policy_id: &str, switch_profile_id: &str) -> Result<()>;

    /// Switching profile ID for a QoS policy, `None` if unmapped.
    async fn get_switch_profile(&self, qos_policy_id: &str) -> Result<Option<String>>;

    async fn delete_mapping(&self, qos_policy_id: &str) -> Result<()>;
}

pub struct SqlxQosPolicyMappingRepository {
    pool: DbPool,
}

impl SqlxQosPolicyMappingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QosPolicyMappingRepository for SqlxQosPolicyMappingRepository {
    #[instrument(skip(self), fields(qos_policy_id = %qos_policy_id, switch_profile_id = %switch_profile_id), name = "db_add_qos_policy_mapping")]
    async fn add_mapping(&self, qos_policy_id: &str, switch_profile_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO neutron_nsx_qos_policy_mappings (qos_policy_id, switch_profile_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(qos_policy_id)
        .bind(switch_profile_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            NsxError::database(e, format!("Failed to add QoS policy mapping: {}", qos_policy_id))
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(qos_policy_id = %qos_policy_id), name = "db_get_qos_switch_profile")]
    async fn get_switch_profile(&self, qos_policy_id: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT switch_profile_id FROM neutron_nsx_qos_policy_mappings WHERE qos_policy_id = $1",
        )
        .bind(qos_policy_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            NsxError::database(e, format!("Failed to fetch QoS policy mapping: {}", qos_policy_id))
        })
    }

    #[instrument(skip(self), fields(qos_policy_id = %qos_policy_id), name = "db_delete_qos_policy_mapping")]
    async fn delete_mapping(&self, qos_policy_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM neutron_nsx_qos_policy_mappings WHERE qos_policy_id = $1")
            .bind(qos_policy_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                NsxError::database(
                    e,
                    format!("Failed to delete QoS policy mapping: {}", qos_policy_id),
                )
            })?;

        Ok(())
    }
}
