//! Shared test utilities and fixtures for the Stateconf test suite.
//!
//! This module provides:
//! - Scripted fake clients for the Lex Model Building and SESv2 traits
//! - Wait context helpers with deterministic backoff
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use stateconf::services::lexmodels::{
    Bot, BotAlias, IntentMetadata, IntentVersions, LexModelsApi, SlotType,
};
use stateconf::services::sesv2::{DedicatedIp, Sesv2Api};
use stateconf::services::ApiError;
use stateconf::waiter::{BackoffPolicy, WaitContext};

// ============================================================================
// Wait Helpers
// ============================================================================

/// A context polling every `interval`, no growth, no jitter.
pub fn fixed_context(interval: Duration) -> WaitContext {
    WaitContext::new().with_backoff(BackoffPolicy::fixed(interval))
}

// ============================================================================
// Scripted Responses
// ============================================================================

/// Queue of canned responses. The last response repeats once the queue drains.
pub struct Script<T> {
    responses: RwLock<VecDeque<Result<T, ApiError>>>,
    calls: AtomicU32,
}

impl<T: Clone> Script<T> {
    pub fn new(responses: Vec<Result<T, ApiError>>) -> Self {
        Self {
            responses: RwLock::new(responses.into()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn next(&self) -> Result<T, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut responses = self.responses.write();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ApiError::NotFound("no scripted response".to_string())))
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<T: Clone> Default for Script<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

pub fn not_found<T>() -> Result<T, ApiError> {
    Err(ApiError::NotFound("resource does not exist".to_string()))
}

pub fn throttled<T>() -> Result<T, ApiError> {
    Err(ApiError::from_code("ThrottlingException", "Rate exceeded"))
}

// ============================================================================
// Fake Lex Model Building Client
// ============================================================================

/// Lex client answering from per-operation scripts.
#[derive(Default)]
pub struct FakeLexModels {
    pub bots: Script<Bot>,
    pub aliases: Script<BotAlias>,
    pub intents: Script<IntentVersions>,
    pub slot_types: Script<SlotType>,
    requests: RwLock<Vec<String>>,
}

impl FakeLexModels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bots(mut self, responses: Vec<Result<Bot, ApiError>>) -> Self {
        self.bots = Script::new(responses);
        self
    }

    pub fn with_aliases(mut self, responses: Vec<Result<BotAlias, ApiError>>) -> Self {
        self.aliases = Script::new(responses);
        self
    }

    pub fn with_intents(mut self, responses: Vec<Result<IntentVersions, ApiError>>) -> Self {
        self.intents = Script::new(responses);
        self
    }

    pub fn with_slot_types(mut self, responses: Vec<Result<SlotType, ApiError>>) -> Self {
        self.slot_types = Script::new(responses);
        self
    }

    /// Requests seen so far, as `Operation(args)`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.read().clone()
    }

    fn record(&self, request: String) {
        self.requests.write().push(request);
    }
}

#[async_trait]
impl LexModelsApi for FakeLexModels {
    async fn get_bot(&self, name: &str, version: &str) -> Result<Bot, ApiError> {
        self.record(format!("GetBot({}, {})", name, version));
        self.bots.next()
    }

    async fn get_bot_alias(&self, name: &str, bot_name: &str) -> Result<BotAlias, ApiError> {
        self.record(format!("GetBotAlias({}, {})", name, bot_name));
        self.aliases.next()
    }

    async fn get_intent_versions(&self, name: &str) -> Result<IntentVersions, ApiError> {
        self.record(format!("GetIntentVersions({})", name));
        self.intents.next()
    }

    async fn get_slot_type(&self, name: &str, version: &str) -> Result<SlotType, ApiError> {
        self.record(format!("GetSlotType({}, {})", name, version));
        self.slot_types.next()
    }
}

pub fn bot(status: &str) -> Result<Bot, ApiError> {
    Ok(Bot {
        name: "OrderFlowers".to_string(),
        version: "1".to_string(),
        status: status.to_string(),
        failure_reason: None,
        checksum: Some("c0ffee".to_string()),
    })
}

pub fn failed_bot(reason: &str) -> Result<Bot, ApiError> {
    Ok(Bot {
        failure_reason: Some(reason.to_string()),
        ..bot("FAILED")?
    })
}

pub fn alias() -> Result<BotAlias, ApiError> {
    Ok(BotAlias {
        name: "prod".to_string(),
        bot_name: "OrderFlowers".to_string(),
        bot_version: Some("1".to_string()),
        checksum: None,
    })
}

pub fn intent_versions(versions: &[&str]) -> Result<IntentVersions, ApiError> {
    Ok(IntentVersions {
        intents: versions
            .iter()
            .map(|v| IntentMetadata {
                name: "OrderFlowers".to_string(),
                version: Some(v.to_string()),
            })
            .collect(),
    })
}

pub fn slot_type() -> Result<SlotType, ApiError> {
    Ok(SlotType {
        name: "FlowerTypes".to_string(),
        version: "$LATEST".to_string(),
        checksum: None,
    })
}

// ============================================================================
// Fake SESv2 Client
// ============================================================================

/// SESv2 client keeping dedicated IP pool membership in memory.
///
/// A pool move becomes visible after `lag` further reads of the IP.
#[derive(Default)]
pub struct FakeSesv2 {
    pools: RwLock<std::collections::HashMap<String, PoolState>>,
    lag: u32,
    put_error: RwLock<Option<ApiError>>,
    get_calls: AtomicU32,
    put_calls: AtomicU32,
}

struct PoolState {
    visible: String,
    requested: Option<(String, u32)>,
}

impl FakeSesv2 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool moves show up after `reads` reads.
    pub fn with_lag(mut self, reads: u32) -> Self {
        self.lag = reads;
        self
    }

    /// Register a dedicated IP in `pool`.
    pub fn with_ip(self, ip: &str, pool: &str) -> Self {
        self.pools.write().insert(
            ip.to_string(),
            PoolState {
                visible: pool.to_string(),
                requested: None,
            },
        );
        self
    }

    /// Fail every PutDedicatedIpInPool with `err`.
    pub fn with_put_error(self, err: ApiError) -> Self {
        *self.put_error.write() = Some(err);
        self
    }

    /// Move an IP out of band.
    pub fn move_ip(&self, ip: &str, pool: &str) {
        if let Some(state) = self.pools.write().get_mut(ip) {
            state.visible = pool.to_string();
            state.requested = None;
        }
    }

    /// Forget an IP entirely.
    pub fn release_ip(&self, ip: &str) {
        self.pools.write().remove(ip);
    }

    pub fn pool_of(&self, ip: &str) -> Option<String> {
        self.pools.read().get(ip).map(|s| {
            s.requested
                .as_ref()
                .map(|(pool, _)| pool.clone())
                .unwrap_or_else(|| s.visible.clone())
        })
    }

    pub fn get_calls(&self) -> u32 {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> u32 {
        self.put_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sesv2Api for FakeSesv2 {
    async fn get_dedicated_ip(&self, ip: &str) -> Result<Option<DedicatedIp>, ApiError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        let mut pools = self.pools.write();
        let Some(state) = pools.get_mut(ip) else {
            return Err(ApiError::NotFound(format!("dedicated IP {} not found", ip)));
        };

        if let Some((pool, remaining)) = state.requested.take() {
            if remaining == 0 {
                state.visible = pool;
            } else {
                state.requested = Some((pool, remaining - 1));
            }
        }

        Ok(Some(DedicatedIp {
            ip: ip.to_string(),
            pool_name: Some(state.visible.clone()),
        }))
    }

    async fn put_dedicated_ip_in_pool(&self, ip: &str, pool: &str) -> Result<(), ApiError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.put_error.read().clone() {
            return Err(err);
        }

        let mut pools = self.pools.write();
        let Some(state) = pools.get_mut(ip) else {
            return Err(ApiError::NotFound(format!("dedicated IP {} not found", ip)));
        };

        if self.lag == 0 {
            state.visible = pool.to_string();
        } else {
            state.requested = Some((pool.to_string(), self.lag));
        }
        Ok(())
    }
}
