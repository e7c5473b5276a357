//! NSX resource tags.

use serde::{Deserialize, Serialize};

/// NSX limits tag values to 40 characters.
pub const MAX_TAG_LEN: usize = 40;

pub const OS_PROJECT_ID_SCOPE: &str = "os-project-id";
pub const OS_PROJECT_NAME_SCOPE: &str = "os-project-name";
pub const OS_API_VERSION_SCOPE: &str = "os-api-version";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub scope: String,
    pub tag: String,
}

impl Tag {
    /// Build a tag, truncating the value to [`MAX_TAG_LEN`] characters.
    pub fn new(scope: impl Into<String>, value: &str) -> Self {
        Self { scope: scope.into(), tag: truncate(value) }
    }
}

fn truncate(value: &str) -> String {
    value.chars().take(MAX_TAG_LEN).collect()
}

/// Standard tags identifying the Neutron resource behind an NSX object.
///
/// An empty or missing project name falls back to `plugin_tag`.
pub fn build_v3_tags(
    resource_type: &str,
    resource_id: &str,
    tenant_id: &str,
    project_name: Option<&str>,
    plugin_tag: &str,
    plugin_ver: &str,
) -> Vec<Tag> {
    let project_name = project_name.filter(|name| !name.is_empty()).unwrap_or(plugin_tag);
    vec![
        Tag::new(resource_type, resource_id),
        Tag::new(OS_PROJECT_ID_SCOPE, tenant_id),
        Tag::new(OS_PROJECT_NAME_SCOPE, project_name),
        Tag::new(OS_API_VERSION_SCOPE, plugin_ver),
    ]
}
