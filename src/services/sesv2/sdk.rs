//! [`Sesv2Api`] backed by the AWS SDK.

use async_trait::async_trait;
use aws_sdk_sesv2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sesv2::Client;
use std::fmt;

use super::{DedicatedIp, Sesv2Api};
use crate::services::ApiError;

/// SESv2 client.
#[derive(Clone, Debug)]
pub struct SdkSesv2Client {
    client: Client,
}

impl SdkSesv2Client {
    /// Wrap a configured SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn classify<E, R>(err: SdkError<E, R>) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug + 'static,
{
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            ApiError::Transport(DisplayErrorContext(&err).to_string())
        }
        _ => match err.code() {
            Some(code) => ApiError::from_code(code, err.message().unwrap_or_default()),
            None => ApiError::Service {
                code: "Unknown".to_string(),
                message: DisplayErrorContext(&err).to_string(),
            },
        },
    }
}

#[async_trait]
impl Sesv2Api for SdkSesv2Client {
    async fn get_dedicated_ip(&self, ip: &str) -> Result<Option<DedicatedIp>, ApiError> {
        let output = self
            .client
            .get_dedicated_ip()
            .ip(ip)
            .send()
            .await
            .map_err(classify)?;

        Ok(output.dedicated_ip().map(|found| DedicatedIp {
            ip: ip.to_string(),
            pool_name: found.pool_name().map(str::to_string),
        }))
    }

    async fn put_dedicated_ip_in_pool(&self, ip: &str, pool: &str) -> Result<(), ApiError> {
        self.client
            .put_dedicated_ip_in_pool()
            .ip(ip)
            .destination_pool_name(pool)
            .send()
            .await
            .map_err(classify)?;

        Ok(())
    }
}
