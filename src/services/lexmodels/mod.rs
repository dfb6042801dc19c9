//! Lex Model Building service.
//!
//! Bots build asynchronously and every Lex model object is deleted
//! asynchronously, so create and delete handlers block on the waiters in
//! [`wait`] until the service catches up.

pub mod status;
pub mod wait;

#[cfg(feature = "aws")]
pub mod sdk;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ApiError;

pub use status::{bot_alias_status, bot_version_status, intent_status, slot_type_status};
pub use wait::{
    wait_bot_alias_deleted, wait_bot_deleted, wait_bot_version_created, wait_intent_deleted,
    wait_slot_type_deleted,
};

/// Service display name used in handler errors.
pub const SERVICE_NAME: &str = "Lex Model Building";

/// Version alias for the working copy of a bot.
pub const BOT_VERSION_LATEST: &str = "$LATEST";

/// Version alias for the working copy of a slot type.
pub const SLOT_TYPE_VERSION_LATEST: &str = "$LATEST";

/// Bot build status labels reported by the service.
pub mod bot_status {
    pub const BUILDING: &str = "BUILDING";
    pub const READY: &str = "READY";
    pub const READY_BASIC_TESTING: &str = "READY_BASIC_TESTING";
    pub const NOT_BUILT: &str = "NOT_BUILT";
    pub const FAILED: &str = "FAILED";
}

/// Label for objects that have no status field of their own: they exist.
pub const SERVICE_STATUS_CREATED: &str = "CREATED";

/// A bot version as returned by GetBot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bot {
    pub name: String,
    pub version: String,
    /// Build status, one of [`bot_status`].
    pub status: String,
    /// Set when `status` is FAILED.
    pub failure_reason: Option<String>,
    pub checksum: Option<String>,
}

/// A bot alias as returned by GetBotAlias.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BotAlias {
    pub name: String,
    pub bot_name: String,
    pub bot_version: Option<String>,
    pub checksum: Option<String>,
}

/// One entry of GetIntentVersions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntentMetadata {
    pub name: String,
    pub version: Option<String>,
}

/// All versions of an intent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntentVersions {
    pub intents: Vec<IntentMetadata>,
}

/// A slot type version as returned by GetSlotType.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotType {
    pub name: String,
    pub version: String,
    pub checksum: Option<String>,
}

/// Read side of the Lex Model Building API used by the waiters.
///
/// Implementations must be safe to share between concurrent waits.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LexModelsApi: Send + Sync {
    /// GetBot for `name` at `version` (a version number or `$LATEST`).
    async fn get_bot(&self, name: &str, version: &str) -> Result<Bot, ApiError>;

    /// GetBotAlias.
    async fn get_bot_alias(&self, name: &str, bot_name: &str) -> Result<BotAlias, ApiError>;

    /// GetIntentVersions.
    async fn get_intent_versions(&self, name: &str) -> Result<IntentVersions, ApiError>;

    /// GetSlotType for `name` at `version`.
    async fn get_slot_type(&self, name: &str, version: &str) -> Result<SlotType, ApiError>;
}

/// Named timeouts for Lex waits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexModelsTimeouts {
    /// Bot version build.
    #[serde(with = "humantime_serde")]
    pub bot_version_created: Duration,
    /// Bot deletion.
    #[serde(with = "humantime_serde")]
    pub bot_deleted: Duration,
    /// Bot alias deletion.
    #[serde(with = "humantime_serde")]
    pub bot_alias_deleted: Duration,
    /// Intent deletion.
    #[serde(with = "humantime_serde")]
    pub intent_deleted: Duration,
    /// Slot type deletion.
    #[serde(with = "humantime_serde")]
    pub slot_type_deleted: Duration,
}

impl Default for LexModelsTimeouts {
    fn default() -> Self {
        Self {
            bot_version_created: Duration::from_secs(60),
            bot_deleted: Duration::from_secs(5 * 60),
            bot_alias_deleted: Duration::from_secs(5 * 60),
            intent_deleted: Duration::from_secs(5 * 60),
            slot_type_deleted: Duration::from_secs(5 * 60),
        }
    }
}
