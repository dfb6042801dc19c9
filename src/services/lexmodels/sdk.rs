//! [`LexModelsApi`] backed by the AWS SDK.

use async_trait::async_trait;
use aws_sdk_lexmodelbuilding::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_lexmodelbuilding::Client;
use std::fmt;

use super::{Bot, BotAlias, IntentMetadata, IntentVersions, LexModelsApi, SlotType};
use crate::services::ApiError;

/// Lex Model Building client.
#[derive(Clone, Debug)]
pub struct SdkLexModelsClient {
    client: Client,
}

impl SdkLexModelsClient {
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
impl LexModelsApi for SdkLexModelsClient {
    async fn get_bot(&self, name: &str, version: &str) -> Result<Bot, ApiError> {
        let output = self
            .client
            .get_bot()
            .name(name)
            .version_or_alias(version)
            .send()
            .await
            .map_err(classify)?;

        Ok(Bot {
            name: output.name().unwrap_or(name).to_string(),
            version: output.version().unwrap_or(version).to_string(),
            status: output
                .status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            failure_reason: output.failure_reason().map(str::to_string),
            checksum: output.checksum().map(str::to_string),
        })
    }

    async fn get_bot_alias(&self, name: &str, bot_name: &str) -> Result<BotAlias, ApiError> {
        let output = self
            .client
            .get_bot_alias()
            .name(name)
            .bot_name(bot_name)
            .send()
            .await
            .map_err(classify)?;

        Ok(BotAlias {
            name: output.name().unwrap_or(name).to_string(),
            bot_name: output.bot_name().unwrap_or(bot_name).to_string(),
            bot_version: output.bot_version().map(str::to_string),
            checksum: output.checksum().map(str::to_string),
        })
    }

    async fn get_intent_versions(&self, name: &str) -> Result<IntentVersions, ApiError> {
        let output = self
            .client
            .get_intent_versions()
            .name(name)
            .send()
            .await
            .map_err(classify)?;

        let intents = output
            .intents()
            .iter()
            .map(|intent| IntentMetadata {
                name: intent.name().unwrap_or(name).to_string(),
                version: intent.version().map(str::to_string),
            })
            .collect();

        Ok(IntentVersions { intents })
    }

    async fn get_slot_type(&self, name: &str, version: &str) -> Result<SlotType, ApiError> {
        let output = self
            .client
            .get_slot_type()
            .name(name)
            .version(version)
            .send()
            .await
            .map_err(classify)?;

        Ok(SlotType {
            name: output.name().unwrap_or(name).to_string(),
            version: output.version().unwrap_or(version).to_string(),
            checksum: output.checksum().map(str::to_string),
        })
    }
}
