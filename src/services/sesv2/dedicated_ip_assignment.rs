//! Dedicated IP assignment resource.
//!
//! An assignment places one dedicated IP in a named pool. Its ID is
//! `"<ip>,<destination_pool_name>"`; deleting it moves the IP back to
//! [`DEFAULT_DEDICATED_POOL_NAME`].

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{
    assignment_status, DedicatedIp, Sesv2Api, Sesv2Timeouts, DEFAULT_DEDICATED_POOL_NAME,
    SERVICE_NAME,
};
use crate::error::{Error, Result};
use crate::resource::{ProviderError, ResourceAction};
use crate::services::{poll_from, ApiError};
use crate::waiter::{refresh_fn, BoxError, Refresh, WaitContext, WaitOutcome, WaitSpec};

/// Resource display name used in handler errors.
pub const RES_NAME: &str = "Dedicated IP Assignment";

/// Message attached when the IP sits in a different pool than the ID says.
const INCORRECT_POOL_ASSIGNMENT: &str = "incorrect pool assignment";

/// Observed state of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedicatedIpAssignment {
    pub id: String,
    pub ip: String,
    pub destination_pool_name: String,
}

/// Build an assignment ID.
pub fn to_id(ip: &str, destination_pool_name: &str) -> String {
    format!("{},{}", ip, destination_pool_name)
}

/// Split an assignment ID into IP and pool. Malformed IDs give two empty strings.
pub fn split_id(id: &str) -> (&str, &str) {
    let parts: Vec<&str> = id.split(',').collect();
    match parts.as_slice() {
        [ip, pool] => (*ip, *pool),
        _ => ("", ""),
    }
}

/// Look up the assignment named by `id`.
///
/// An IP that is missing, or assigned to another pool, is reported as
/// [`ProviderError::NotFound`].
pub async fn find_dedicated_ip_assignment_by_id(
    conn: &dyn Sesv2Api,
    id: &str,
) -> std::result::Result<DedicatedIp, ProviderError> {
    let (ip, destination_pool_name) = split_id(id);

    let found = match conn.get_dedicated_ip(ip).await {
        Ok(found) => found,
        Err(err) if err.is_not_found() => return Err(ProviderError::not_found(err)),
        Err(err) => return Err(err.into()),
    };

    let Some(dedicated_ip) = found else {
        return Err(ProviderError::empty_result());
    };

    if dedicated_ip.pool_name.as_deref() != Some(destination_pool_name) {
        return Err(ProviderError::not_found(INCORRECT_POOL_ASSIGNMENT));
    }

    Ok(dedicated_ip)
}

/// Assignment status of `ip` with respect to `pool`.
///
/// `ASSIGNED` once the IP is in `pool`, `PENDING` while it is elsewhere,
/// absent when SESv2 does not know the IP.
pub fn dedicated_ip_assignment_status(
    conn: Arc<dyn Sesv2Api>,
    ip: impl Into<String>,
    pool: impl Into<String>,
) -> Refresh<DedicatedIp> {
    let ip = ip.into();
    let pool = pool.into();

    refresh_fn(move || {
        let conn = Arc::clone(&conn);
        let ip = ip.clone();
        let pool = pool.clone();
        async move {
            let result = conn.get_dedicated_ip(&ip).await.and_then(|found| {
                found.ok_or_else(|| ApiError::NotFound("empty result".to_string()))
            });

            poll_from(result, |dedicated_ip| {
                if dedicated_ip.pool_name.as_deref() == Some(pool.as_str()) {
                    assignment_status::ASSIGNED.to_string()
                } else {
                    assignment_status::PENDING.to_string()
                }
            })
        }
    })
}

/// Wait for `ip` to land in `pool`.
///
/// The outcome keeps the last observed IP even when the wait fails.
pub async fn wait_dedicated_ip_assignment_created(
    ctx: &WaitContext,
    conn: &Arc<dyn Sesv2Api>,
    ip: &str,
    pool: &str,
    timeout: Duration,
) -> Result<WaitOutcome<DedicatedIp>> {
    let spec = WaitSpec::builder(dedicated_ip_assignment_status(Arc::clone(conn), ip, pool))
        .pending([assignment_status::PENDING])
        .target([assignment_status::ASSIGNED])
        .timeout(timeout)
        .build()?;

    Ok(spec.wait(ctx).await)
}

/// Wait for `ip` to be back in the default pool.
pub async fn wait_dedicated_ip_assignment_deleted(
    ctx: &WaitContext,
    conn: &Arc<dyn Sesv2Api>,
    ip: &str,
    timeout: Duration,
) -> Result<WaitOutcome<DedicatedIp>> {
    wait_dedicated_ip_assignment_created(ctx, conn, ip, DEFAULT_DEDICATED_POOL_NAME, timeout).await
}

fn settled(outcome: WaitOutcome<DedicatedIp>) -> Result<Option<DedicatedIp>> {
    Ok(outcome.into_result()?)
}

/// Create, read and delete handlers for dedicated IP assignments.
#[derive(Clone)]
pub struct DedicatedIpAssignmentResource {
    conn: Arc<dyn Sesv2Api>,
    timeouts: Sesv2Timeouts,
}

impl DedicatedIpAssignmentResource {
    /// Create handlers over `conn`.
    pub fn new(conn: Arc<dyn Sesv2Api>, timeouts: Sesv2Timeouts) -> Self {
        Self { conn, timeouts }
    }

    /// Configured timeouts.
    pub fn timeouts(&self) -> &Sesv2Timeouts {
        &self.timeouts
    }

    fn error(
        action: ResourceAction,
        id: &str,
        source: impl Into<BoxError>,
    ) -> ProviderError {
        ProviderError::action(action, SERVICE_NAME, RES_NAME, id, source)
    }

    /// Put `ip` in `destination_pool_name` and wait until SESv2 reports it there.
    pub async fn create(
        &self,
        ctx: &WaitContext,
        ip: &str,
        destination_pool_name: &str,
    ) -> std::result::Result<DedicatedIpAssignment, ProviderError> {
        ip.parse::<IpAddr>().map_err(|e| {
            ProviderError::InvalidArgument(format!(
                "expected ip to contain a valid IP address, got {}: {}",
                ip, e
            ))
        })?;
        if destination_pool_name.is_empty() {
            return Err(ProviderError::InvalidArgument(
                "destination_pool_name must not be empty".to_string(),
            ));
        }

        self.conn
            .put_dedicated_ip_in_pool(ip, destination_pool_name)
            .await
            .map_err(|e| Self::error(ResourceAction::Creating, ip, e))?;

        let id = to_id(ip, destination_pool_name);
        info!(id = %id, "Created SESv2 Dedicated IP Assignment");

        wait_dedicated_ip_assignment_created(
            ctx,
            &self.conn,
            ip,
            destination_pool_name,
            self.timeouts.create,
        )
        .await
        .and_then(settled)
        .map_err(|e| Self::error(ResourceAction::WaitingForCreation, &id, e))?;

        self.read(&id, true)
            .await?
            .ok_or_else(ProviderError::empty_result)
    }

    /// Read the assignment named by `id`.
    ///
    /// Returns `Ok(None)` when a previously created assignment is gone, so the
    /// caller drops it from state.
    pub async fn read(
        &self,
        id: &str,
        is_new_resource: bool,
    ) -> std::result::Result<Option<DedicatedIpAssignment>, ProviderError> {
        match find_dedicated_ip_assignment_by_id(self.conn.as_ref(), id).await {
            Ok(found) => Ok(Some(DedicatedIpAssignment {
                id: id.to_string(),
                ip: found.ip,
                destination_pool_name: found.pool_name.unwrap_or_default(),
            })),
            Err(err) if !is_new_resource && err.is_not_found() => {
                warn!(id = %id, "SESv2 Dedicated IP Assignment not found, removing from state");
                Ok(None)
            }
            Err(err) => Err(Self::error(ResourceAction::Reading, id, err)),
        }
    }

    /// Move the IP back to the default pool.
    pub async fn delete(&self, ctx: &WaitContext, id: &str) -> std::result::Result<(), ProviderError> {
        let (ip, _) = split_id(id);
        info!(id = %id, "Deleting SESv2 Dedicated IP Assignment");

        match self
            .conn
            .put_dedicated_ip_in_pool(ip, DEFAULT_DEDICATED_POOL_NAME)
            .await
        {
            Ok(()) => {}
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(Self::error(ResourceAction::Deleting, id, err)),
        }

        match wait_dedicated_ip_assignment_deleted(ctx, &self.conn, ip, self.timeouts.delete)
            .await
            .and_then(settled)
        {
            Ok(_) => Ok(()),
            Err(Error::Wait(err)) if err.is_not_found() => Ok(()),
            Err(err) => Err(Self::error(ResourceAction::WaitingForDeletion, id, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sesv2::MockSesv2Api;
    use pretty_assertions::assert_eq;

    fn in_pool(ip: &str, pool: &str) -> Option<DedicatedIp> {
        Some(DedicatedIp {
            ip: ip.to_string(),
            pool_name: Some(pool.to_string()),
        })
    }

    #[test]
    fn test_split_id() {
        assert_eq!(split_id("192.0.2.10,marketing"), ("192.0.2.10", "marketing"));
        assert_eq!(split_id("192.0.2.10"), ("", ""));
        assert_eq!(split_id("a,b,c"), ("", ""));
        assert_eq!(to_id("192.0.2.10", "marketing"), "192.0.2.10,marketing");
    }

    #[tokio::test]
    async fn test_find_rejects_other_pool() {
        let mut api = MockSesv2Api::new();
        api.expect_get_dedicated_ip()
            .returning(|ip| Ok(in_pool(ip, "transactional")));

        let err = find_dedicated_ip_assignment_by_id(&api, "192.0.2.10,marketing")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "couldn't find resource: incorrect pool assignment");
    }

    #[tokio::test]
    async fn test_find_empty_result() {
        let mut api = MockSesv2Api::new();
        api.expect_get_dedicated_ip().returning(|_| Ok(None));

        let err = find_dedicated_ip_assignment_by_id(&api, "192.0.2.10,marketing")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_read_removes_missing_existing_resource() {
        let mut api = MockSesv2Api::new();
        api.expect_get_dedicated_ip()
            .returning(|_| Err(ApiError::NotFound("no such ip".to_string())));
        let resource = DedicatedIpAssignmentResource::new(Arc::new(api), Sesv2Timeouts::default());

        assert_eq!(resource.read("192.0.2.10,marketing", false).await.unwrap(), None);

        let err = resource.read("192.0.2.10,marketing", true).await.unwrap_err();
        assert!(err.to_string().starts_with(
            "reading SESv2 Dedicated IP Assignment (192.0.2.10,marketing): couldn't find resource"
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_ip() {
        let api = MockSesv2Api::new();
        let resource = DedicatedIpAssignmentResource::new(Arc::new(api), Sesv2Timeouts::default());

        let err = resource
            .create(&WaitContext::new(), "not-an-ip", "marketing")
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_delete_ignores_not_found() {
        let mut api = MockSesv2Api::new();
        api.expect_put_dedicated_ip_in_pool()
            .withf(|ip, pool| ip == "192.0.2.10" && pool == DEFAULT_DEDICATED_POOL_NAME)
            .times(1)
            .returning(|_, _| Err(ApiError::NotFound("no such ip".to_string())));
        let resource = DedicatedIpAssignmentResource::new(Arc::new(api), Sesv2Timeouts::default());

        resource
            .delete(&WaitContext::new(), "192.0.2.10,marketing")
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_wait_keeps_last_ip() {
        let mut api = MockSesv2Api::new();
        api.expect_get_dedicated_ip()
            .returning(|ip| Ok(in_pool(ip, DEFAULT_DEDICATED_POOL_NAME)));
        let conn: Arc<dyn Sesv2Api> = Arc::new(api);

        let outcome = wait_dedicated_ip_assignment_created(
            &WaitContext::new(),
            &conn,
            "192.0.2.10",
            "marketing",
            Duration::from_secs(20),
        )
        .await
        .unwrap();

        assert!(outcome.error().is_some_and(|e| e.is_timeout()));
        assert_eq!(outcome.last_state.as_deref(), Some(assignment_status::PENDING));
        assert_eq!(
            outcome.payload.and_then(|found| found.pool_name).as_deref(),
            Some(DEFAULT_DEDICATED_POOL_NAME)
        );
    }
}
