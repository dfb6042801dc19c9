//! Waiters for Lex model objects.
//!
//! Creation waits succeed on a settled build status; deletion waits succeed
//! once the object is gone. Each returns the full [`WaitOutcome`], so the last
//! observed payload stays available when the wait fails (`None` after a
//! deletion completes). The outer `Err` is reserved for an invalid spec.

use std::sync::Arc;
use std::time::Duration;

use super::status::{bot_alias_status, bot_version_status, intent_status, slot_type_status};
use super::{
    bot_status, Bot, BotAlias, IntentVersions, LexModelsApi, SlotType, BOT_VERSION_LATEST,
    SERVICE_STATUS_CREATED, SLOT_TYPE_VERSION_LATEST,
};
use crate::error::Result;
use crate::waiter::{Failure, WaitContext, WaitOutcome, WaitSpec};

/// The server's failure reason, only when the bot actually failed.
fn bot_failure_reason(bot: &Bot) -> Option<Failure> {
    if bot.status != bot_status::FAILED {
        return None;
    }
    bot.failure_reason
        .as_ref()
        .map(|reason| Failure::new(bot.status.as_str(), reason.as_str()))
}

/// Wait for a bot version to finish building.
pub async fn wait_bot_version_created(
    ctx: &WaitContext,
    conn: &Arc<dyn LexModelsApi>,
    name: &str,
    version: &str,
    timeout: Duration,
) -> Result<WaitOutcome<Bot>> {
    let spec = WaitSpec::builder(bot_version_status(Arc::clone(conn), name, version))
        .pending([bot_status::BUILDING])
        .target([
            bot_status::NOT_BUILT,
            bot_status::READY,
            bot_status::READY_BASIC_TESTING,
        ])
        .timeout(timeout)
        .failure_reason(bot_failure_reason)
        .build()?;

    Ok(spec.wait(ctx).await)
}

/// Wait for a bot to be deleted.
pub async fn wait_bot_deleted(
    ctx: &WaitContext,
    conn: &Arc<dyn LexModelsApi>,
    name: &str,
    timeout: Duration,
) -> Result<WaitOutcome<Bot>> {
    let spec = WaitSpec::builder(bot_version_status(Arc::clone(conn), name, BOT_VERSION_LATEST))
        .pending([
            bot_status::NOT_BUILT,
            bot_status::READY,
            bot_status::READY_BASIC_TESTING,
        ])
        .timeout(timeout)
        .failure_reason(bot_failure_reason)
        .build()?;

    Ok(spec.wait(ctx).await)
}

/// Wait for a bot alias to be deleted.
pub async fn wait_bot_alias_deleted(
    ctx: &WaitContext,
    conn: &Arc<dyn LexModelsApi>,
    name: &str,
    bot_name: &str,
    timeout: Duration,
) -> Result<WaitOutcome<BotAlias>> {
    let spec = WaitSpec::builder(bot_alias_status(Arc::clone(conn), name, bot_name))
        .pending([SERVICE_STATUS_CREATED])
        .timeout(timeout)
        .build()?;

    Ok(spec.wait(ctx).await)
}

/// Wait for an intent (all of its versions) to be deleted.
pub async fn wait_intent_deleted(
    ctx: &WaitContext,
    conn: &Arc<dyn LexModelsApi>,
    name: &str,
    timeout: Duration,
) -> Result<WaitOutcome<IntentVersions>> {
    let spec = WaitSpec::builder(intent_status(Arc::clone(conn), name))
        .pending([SERVICE_STATUS_CREATED])
        .timeout(timeout)
        .build()?;

    Ok(spec.wait(ctx).await)
}

/// Wait for the working copy of a slot type to be deleted.
pub async fn wait_slot_type_deleted(
    ctx: &WaitContext,
    conn: &Arc<dyn LexModelsApi>,
    name: &str,
    timeout: Duration,
) -> Result<WaitOutcome<SlotType>> {
    let spec = WaitSpec::builder(slot_type_status(
        Arc::clone(conn),
        name,
        SLOT_TYPE_VERSION_LATEST,
    ))
    .pending([SERVICE_STATUS_CREATED])
    .timeout(timeout)
    .build()?;

    Ok(spec.wait(ctx).await)
}
