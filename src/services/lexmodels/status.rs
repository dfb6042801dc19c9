//! Status refresh adapters for Lex model objects.

use std::sync::Arc;

use super::{Bot, BotAlias, IntentVersions, LexModelsApi, SlotType, SERVICE_STATUS_CREATED};
use crate::services::poll_from;
use crate::waiter::{refresh_fn, PollResult, Refresh};

/// Build status of a bot version.
pub fn bot_version_status(
    conn: Arc<dyn LexModelsApi>,
    name: impl Into<String>,
    version: impl Into<String>,
) -> Refresh<Bot> {
    let name = name.into();
    let version = version.into();

    refresh_fn(move || {
        let conn = Arc::clone(&conn);
        let name = name.clone();
        let version = version.clone();
        async move {
            let result = conn.get_bot(&name, &version).await;
            poll_from(result, |bot| bot.status.clone())
        }
    })
}

/// Existence of a bot alias.
pub fn bot_alias_status(
    conn: Arc<dyn LexModelsApi>,
    name: impl Into<String>,
    bot_name: impl Into<String>,
) -> Refresh<BotAlias> {
    let name = name.into();
    let bot_name = bot_name.into();

    refresh_fn(move || {
        let conn = Arc::clone(&conn);
        let name = name.clone();
        let bot_name = bot_name.clone();
        async move {
            let result = conn.get_bot_alias(&name, &bot_name).await;
            poll_from(result, |_| SERVICE_STATUS_CREATED.to_string())
        }
    })
}

/// Existence of an intent. An intent with no versions left counts as gone.
pub fn intent_status(conn: Arc<dyn LexModelsApi>, name: impl Into<String>) -> Refresh<IntentVersions> {
    let name = name.into();

    refresh_fn(move || {
        let conn = Arc::clone(&conn);
        let name = name.clone();
        async move {
            let poll = poll_from(conn.get_intent_versions(&name).await, |_| {
                SERVICE_STATUS_CREATED.to_string()
            })?;

            match &poll.payload {
                Some(versions) if versions.intents.is_empty() => Ok(PollResult::absent()),
                _ => Ok(poll),
            }
        }
    })
}

/// Existence of a slot type version.
pub fn slot_type_status(
    conn: Arc<dyn LexModelsApi>,
    name: impl Into<String>,
    version: impl Into<String>,
) -> Refresh<SlotType> {
    let name = name.into();
    let version = version.into();

    refresh_fn(move || {
        let conn = Arc::clone(&conn);
        let name = name.clone();
        let version = version.clone();
        async move {
            let result = conn.get_slot_type(&name, &version).await;
            poll_from(result, |_| SERVICE_STATUS_CREATED.to_string())
        }
    })
}
