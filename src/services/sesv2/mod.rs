//! SESv2 service.
//!
//! Only dedicated IP pool assignment is managed here. SESv2 applies a pool
//! move asynchronously, so the resource handlers in
//! [`dedicated_ip_assignment`] wait for the IP to show up in its destination
//! pool.

pub mod dedicated_ip_assignment;

#[cfg(feature = "aws")]
pub mod sdk;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ApiError;

pub use dedicated_ip_assignment::{
    dedicated_ip_assignment_status, find_dedicated_ip_assignment_by_id, split_id, to_id,
    wait_dedicated_ip_assignment_created, wait_dedicated_ip_assignment_deleted,
    DedicatedIpAssignment, DedicatedIpAssignmentResource,
};

/// Service display name used in handler errors.
pub const SERVICE_NAME: &str = "SESv2";

/// Pool AWS keeps unassigned dedicated IPs in. Deleting an assignment moves
/// the IP back here.
pub const DEFAULT_DEDICATED_POOL_NAME: &str = "ses-default-dedicated-pool";

/// Assignment labels reported by [`dedicated_ip_assignment_status`].
pub mod assignment_status {
    /// The IP is visible, but not yet in the requested pool.
    pub const PENDING: &str = "PENDING";
    /// The IP is in the requested pool.
    pub const ASSIGNED: &str = "ASSIGNED";
}

/// A dedicated IP as returned by GetDedicatedIp.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DedicatedIp {
    pub ip: String,
    pub pool_name: Option<String>,
}

/// The SESv2 calls used by dedicated IP assignment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sesv2Api: Send + Sync {
    /// GetDedicatedIp. `Ok(None)` when the response carries no IP.
    async fn get_dedicated_ip(&self, ip: &str) -> Result<Option<DedicatedIp>, ApiError>;

    /// PutDedicatedIpInPool.
    async fn put_dedicated_ip_in_pool(&self, ip: &str, pool: &str) -> Result<(), ApiError>;
}

/// Named timeouts for SESv2 handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sesv2Timeouts {
    #[serde(with = "humantime_serde")]
    pub create: Duration,
    #[serde(with = "humantime_serde")]
    pub delete: Duration,
}

impl Default for Sesv2Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(30 * 60),
            delete: Duration::from_secs(30 * 60),
        }
    }
}
