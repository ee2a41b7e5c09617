//! Operation entry points.
//!
//! [`CommissionEngine`] is stateless apart from its rate schedule; every
//! call takes the connection it should work on so that many workers can
//! share one database file, each through its own connection.

use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use upline_db::queries::commissions::{self, CommissionRow};
use upline_db::queries::{allocations, hierarchy, members, settlements};
use upline_db::DbError;
use upline_rates::budget::validate_config;
use upline_rates::schedule::RateSchedule;
use upline_types::amount::MAX_AMOUNT;
use upline_types::{
    Address, Allocation, AllocationConfig, CommissionRecord, MemberTier, PurchaseEvent,
    PurchaseTxId, Rate, TypesError, MAX_CHAIN_DEPTH,
};

use crate::ledger::{self, ApplyOutcome};
use crate::{allocator, walker, EngineError, Result};

/// Result of settling one purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub purchase_tx_id: String,
    pub outcome: ApplyOutcome,
    /// The commissions for this purchase, nearest ancestor first. On
    /// re-delivery these are the records stored by the first application.
    pub allocations: Vec<Allocation>,
    /// Sum of `allocations` in micro-units.
    pub total_commission: u64,
}

/// Read view of a member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    pub address: Address,
    pub tier: MemberTier,
    pub balance: u64,
    pub lifetime_earnings: u64,
    pub referrer: Option<Address>,
    pub allocation: Option<AllocationConfig>,
}

/// The commission engine.
#[derive(Clone, Debug, Default)]
pub struct CommissionEngine {
    schedule: RateSchedule,
}

impl CommissionEngine {
    pub fn new(schedule: RateSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &RateSchedule {
        &self.schedule
    }

    /// Distribute commissions for a verified purchase.
    ///
    /// Safe to call any number of times with the same transaction id: the
    /// first call applies, later ones return the stored allocations with
    /// [`ApplyOutcome::AlreadyApplied`] and change nothing.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ZeroAmount`] / [`EngineError::AmountTooLarge`]
    /// - [`EngineError::UnknownMember`] if the purchaser is not registered
    /// - [`EngineError::ConflictingPurchase`] if the id was settled with
    ///   different purchase details
    /// - [`EngineError::BalanceOverflow`] if a beneficiary's balance would
    ///   leave the storable range (nothing is written)
    /// - [`EngineError::Store`] on database failure (nothing is written)
    pub fn settle_purchase(
        &self,
        conn: &mut Connection,
        purchase: &PurchaseEvent,
        now: u64,
    ) -> Result<Settlement> {
        if purchase.amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        if purchase.amount > MAX_AMOUNT {
            return Err(EngineError::AmountTooLarge(purchase.amount));
        }

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !members::exists(&tx, &purchase.purchaser)? {
            return Err(EngineError::UnknownMember(purchase.purchaser.clone()));
        }

        if let Some(existing) = settlements::get(&tx, purchase.tx_id.as_str())? {
            if existing.purchaser != purchase.purchaser.as_str()
                || existing.amount != purchase.amount
                || existing.category != purchase.category.as_str()
            {
                return Err(EngineError::ConflictingPurchase {
                    tx_id: purchase.tx_id.to_string(),
                });
            }
            let allocations = stored_allocations(&tx, purchase.tx_id.as_str())?;
            tracing::debug!(tx_id = %purchase.tx_id, "purchase already settled");
            return Ok(Settlement {
                purchase_tx_id: existing.purchase_tx_id,
                outcome: ApplyOutcome::AlreadyApplied,
                allocations,
                total_commission: existing.total_commission,
            });
        }

        let allocations = allocator::allocate(
            &*tx,
            &self.schedule,
            &purchase.purchaser,
            purchase.amount,
            MAX_CHAIN_DEPTH,
        )?;
        for a in &allocations {
            tracing::debug!(
                tx_id = %purchase.tx_id,
                beneficiary = %a.beneficiary,
                depth = a.depth,
                rate = %a.rate,
                amount = a.amount,
                "allocation"
            );
        }

        let outcome = ledger::apply_in(&tx, purchase, &allocations, now)?;
        tx.commit()?;

        let total_commission = match outcome {
            ApplyOutcome::Applied { total, .. } => total,
            ApplyOutcome::AlreadyApplied => 0,
        };
        tracing::info!(
            tx_id = %purchase.tx_id,
            purchaser = %purchase.purchaser,
            category = %purchase.category,
            amount = purchase.amount,
            records = allocations.len(),
            total_commission,
            "purchase settled"
        );

        Ok(Settlement {
            purchase_tx_id: purchase.tx_id.to_string(),
            outcome,
            allocations,
            total_commission,
        })
    }

    /// Register a member with zero balances and no referrer.
    pub fn register_member(
        &self,
        conn: &Connection,
        address: &Address,
        tier: MemberTier,
        now: u64,
    ) -> Result<()> {
        match members::insert(conn, address, tier, now) {
            Ok(()) => {
                tracing::info!(member = %address, %tier, "member registered");
                Ok(())
            }
            Err(DbError::Constraint(_)) => Err(EngineError::AlreadyRegistered(address.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// Change a member's tier.
    ///
    /// A stored allocation configuration that is not valid for the new tier
    /// is deleted in the same transaction.
    pub fn set_member_tier(
        &self,
        conn: &mut Connection,
        address: &Address,
        tier: MemberTier,
    ) -> Result<()> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        match members::set_tier(&tx, address, tier) {
            Ok(()) => {}
            Err(DbError::NotFound(_)) => return Err(EngineError::UnknownMember(address.clone())),
            Err(e) => return Err(e.into()),
        }

        let mut dropped_config = false;
        if let Some(config) = allocations::get(&tx, address)? {
            if validate_config(tier, &config).is_err() {
                dropped_config = allocations::remove(&tx, address)?;
            }
        }
        tx.commit()?;

        tracing::info!(member = %address, %tier, dropped_config, "member tier changed");
        Ok(())
    }

    /// Assign a member's referrer. Permanent once it succeeds.
    ///
    /// The referrer does not have to be registered yet; until it is, walks
    /// through the edge stop there.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SelfReferral`] if `referrer == member`
    /// - [`EngineError::UnknownMember`] if `member` is not registered
    /// - [`EngineError::ReferrerAlreadySet`] if a referrer is on record
    /// - [`EngineError::ReferralCycle`] if `member` is an ancestor of
    ///   `referrer`
    pub fn set_referrer(
        &self,
        conn: &mut Connection,
        member: &Address,
        referrer: &Address,
        now: u64,
    ) -> Result<()> {
        if member == referrer {
            return Err(EngineError::SelfReferral);
        }

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let row = match members::get(&tx, member) {
            Ok(row) => row,
            Err(DbError::NotFound(_)) => return Err(EngineError::UnknownMember(member.clone())),
            Err(e) => return Err(e.into()),
        };
        if let Some(existing) = row.referrer {
            return Err(EngineError::ReferrerAlreadySet {
                member: member.clone(),
                existing,
            });
        }
        if walker::reaches(&*tx, referrer, member)? {
            return Err(EngineError::ReferralCycle {
                member: member.clone(),
                referrer: referrer.clone(),
            });
        }

        if !members::assign_referrer(&tx, member, referrer)? {
            let existing = members::get(&tx, member)?.referrer.unwrap_or_default();
            return Err(EngineError::ReferrerAlreadySet {
                member: member.clone(),
                existing,
            });
        }
        hierarchy::insert_edge(&tx, member, referrer, now)?;
        tx.commit()?;

        tracing::info!(%member, %referrer, "referrer assigned");
        Ok(())
    }

    /// Store a partner's custom allocation, replacing any previous one.
    ///
    /// # Errors
    ///
    /// - [`EngineError::UnknownMember`]
    /// - [`EngineError::Rate`] if the tier is not eligible, a market partner
    ///   sets a partner bonus, or the components exceed the tier's budget
    pub fn set_allocation_config(
        &self,
        conn: &mut Connection,
        member: &Address,
        config: &AllocationConfig,
        now: u64,
    ) -> Result<()> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let row = match members::get(&tx, member) {
            Ok(row) => row,
            Err(DbError::NotFound(_)) => return Err(EngineError::UnknownMember(member.clone())),
            Err(e) => return Err(e.into()),
        };
        let tier: MemberTier = row
            .tier
            .parse()
            .map_err(|_| DbError::Corrupt(format!("tier {:?} of {member}", row.tier)))?;

        validate_config(tier, config)?;
        allocations::upsert(&tx, member, config, now)?;
        tx.commit()?;

        tracing::info!(
            %member,
            %tier,
            self_rate = %config.self_rate,
            level1_bonus = %config.level1_bonus,
            level2_bonus = %config.level2_bonus,
            partner_bonus = %config.partner_bonus,
            "allocation config updated"
        );
        Ok(())
    }

    /// Current state of a member.
    pub fn member(&self, conn: &Connection, address: &Address) -> Result<MemberSummary> {
        let row = match members::get(conn, address) {
            Ok(row) => row,
            Err(DbError::NotFound(_)) => return Err(EngineError::UnknownMember(address.clone())),
            Err(e) => return Err(e.into()),
        };
        let tier: MemberTier = row
            .tier
            .parse()
            .map_err(|_| DbError::Corrupt(format!("tier {:?} of {address}", row.tier)))?;
        let referrer = row
            .referrer
            .as_deref()
            .map(Address::parse)
            .transpose()
            .map_err(|e| DbError::Corrupt(e.to_string()))?;
        let allocation = allocations::get(conn, address)?;

        Ok(MemberSummary {
            address: address.clone(),
            tier,
            balance: row.balance,
            lifetime_earnings: row.lifetime_earnings,
            referrer,
            allocation,
        })
    }

    /// Most recent commission records credited to `beneficiary`, newest
    /// first, optionally restricted to one depth.
    pub fn commission_history(
        &self,
        conn: &Connection,
        beneficiary: &Address,
        depth: Option<u32>,
        limit: u32,
    ) -> Result<Vec<CommissionRecord>> {
        if !members::exists(conn, beneficiary)? {
            return Err(EngineError::UnknownMember(beneficiary.clone()));
        }
        commissions::for_beneficiary(conn, beneficiary, depth, limit)?
            .into_iter()
            .map(decode_record)
            .collect()
    }
}

fn decode_record(row: CommissionRow) -> Result<CommissionRecord> {
    let corrupt = |e: TypesError| DbError::Corrupt(e.to_string());
    Ok(CommissionRecord {
        beneficiary: Address::parse(&row.beneficiary).map_err(corrupt)?,
        source: Address::parse(&row.source).map_err(corrupt)?,
        amount: row.amount,
        rate: Rate::from_bps(row.rate_bps),
        depth: row.depth,
        category: row.category.parse().map_err(corrupt)?,
        created_at: row.created_at,
        purchase_tx_id: PurchaseTxId::parse(&row.purchase_tx_id).map_err(corrupt)?,
    })
}

fn stored_allocations(conn: &Connection, tx_id: &str) -> Result<Vec<Allocation>> {
    commissions::for_purchase(conn, tx_id)?
        .into_iter()
        .map(|row| {
            let beneficiary = Address::parse(&row.beneficiary)
                .map_err(|e| DbError::Corrupt(e.to_string()))?;
            Ok(Allocation {
                beneficiary,
                depth: row.depth,
                rate: Rate::from_bps(row.rate_bps),
                amount: row.amount,
            })
        })
        .collect()
}
