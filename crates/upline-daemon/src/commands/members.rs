//! Member, hierarchy and allocation command handlers.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use upline_engine::MemberSummary;
use upline_types::amount::format_units;
use upline_types::{Address, AllocationConfig, MemberTier, Rate};

use super::{params, unix_now, Result};
use crate::DaemonState;

#[derive(Deserialize)]
struct RegisterParams {
    address: Address,
    #[serde(default = "default_tier")]
    tier: MemberTier,
}

fn default_tier() -> MemberTier {
    MemberTier::Normal
}

#[derive(Deserialize)]
struct TierParams {
    address: Address,
    tier: MemberTier,
}

#[derive(Deserialize)]
struct ReferrerParams {
    member: Address,
    referrer: Address,
}

#[derive(Deserialize)]
struct AllocationParams {
    member: Address,
    #[serde(default)]
    self_bps: u32,
    #[serde(default)]
    level1_bps: u32,
    #[serde(default)]
    level2_bps: u32,
    #[serde(default)]
    partner_bps: u32,
}

#[derive(Deserialize)]
struct AddressParams {
    address: Address,
}

/// Register a new member.
pub async fn register_member(state: &Arc<DaemonState>, raw: &Value) -> Result {
    let p: RegisterParams = params(raw)?;
    let db = state.db.lock().await;
    state.engine.register_member(&db, &p.address, p.tier, unix_now())?;

    Ok(serde_json::json!({
        "address": p.address,
        "tier": p.tier,
    }))
}

/// Change a member's tier.
pub async fn set_member_tier(state: &Arc<DaemonState>, raw: &Value) -> Result {
    let p: TierParams = params(raw)?;
    let mut db = state.db.lock().await;
    state.engine.set_member_tier(&mut db, &p.address, p.tier)?;
    let summary = state.engine.member(&db, &p.address)?;

    Ok(member_json(&summary))
}

/// Assign a member's referrer (once).
pub async fn set_referrer(state: &Arc<DaemonState>, raw: &Value) -> Result {
    let p: ReferrerParams = params(raw)?;
    let mut db = state.db.lock().await;
    state
        .engine
        .set_referrer(&mut db, &p.member, &p.referrer, unix_now())?;

    Ok(serde_json::json!({
        "member": p.member,
        "referrer": p.referrer,
    }))
}

/// Store a partner's custom allocation.
pub async fn set_allocation_config(state: &Arc<DaemonState>, raw: &Value) -> Result {
    let p: AllocationParams = params(raw)?;
    let config = AllocationConfig {
        self_rate: Rate::from_bps(p.self_bps),
        level1_bonus: Rate::from_bps(p.level1_bps),
        level2_bonus: Rate::from_bps(p.level2_bps),
        partner_bonus: Rate::from_bps(p.partner_bps),
    };
    let mut db = state.db.lock().await;
    state
        .engine
        .set_allocation_config(&mut db, &p.member, &config, unix_now())?;

    Ok(serde_json::json!({
        "member": p.member,
        "allocation": allocation_json(&config),
    }))
}

/// Balance, earnings, tier, referrer and allocation of a member.
pub async fn get_member(state: &Arc<DaemonState>, raw: &Value) -> Result {
    let p: AddressParams = params(raw)?;
    let db = state.db.lock().await;
    let summary = state.engine.member(&db, &p.address)?;

    Ok(member_json(&summary))
}

fn member_json(summary: &MemberSummary) -> Value {
    serde_json::json!({
        "address": summary.address,
        "tier": summary.tier,
        "balance": format_units(summary.balance),
        "lifetime_earnings": format_units(summary.lifetime_earnings),
        "referrer": summary.referrer,
        "allocation": summary.allocation.as_ref().map(allocation_json),
    })
}

fn allocation_json(config: &AllocationConfig) -> Value {
    serde_json::json!({
        "self_bps": config.self_rate.bps(),
        "level1_bps": config.level1_bonus.bps(),
        "level2_bps": config.level2_bonus.bps(),
        "partner_bps": config.partner_bonus.bps(),
    })
}
