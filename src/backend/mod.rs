//! # NSX Backend
//!
//! Connection configuration handed to the nsxlib client and the tags put on
//! every NSX object the plugin creates.

pub mod connection;
pub mod tags;

pub use connection::{
    build_nsxlib_config, get_nsxlib_config, BackendCredentials, NsxLibConfig, NSX_NEUTRON_PLUGIN,
    OS_NEUTRON_ID_SCOPE,
};
pub use tags::{build_v3_tags, Tag, MAX_TAG_LEN};
