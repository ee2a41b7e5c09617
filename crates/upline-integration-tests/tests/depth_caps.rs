//! Integration test: tier-dependent earning depths and the global walk bound.
//!
//! - `normal` ancestors earn only at depths 1-2
//! - `market_partner` ancestors earn only at depths 1-10
//! - `global_partner` ancestors earn at depths 1-100, never beyond

use upline_engine::CommissionEngine;
use upline_integration_tests::{addr, balance, build_chain, purchase, units, TempDb, BASE_TIME};
use upline_rates::schedule::earning_depth_cap;
use upline_types::{MemberTier, MAX_CHAIN_DEPTH};

/// Purchaser `m0` followed by `len` ancestors `m1..=m{len}`, all of `tier`.
fn uniform_chain(len: usize, tier: MemberTier) -> Vec<(String, MemberTier)> {
    (0..=len).map(|i| (format!("m{i}"), tier)).collect()
}

fn settle_uniform(tier: MemberTier, len: usize) -> (CommissionEngine, TempDb, Vec<u32>) {
    let db = TempDb::new("depth");
    let mut conn = db.connect();
    let engine = CommissionEngine::default();
    let chain = uniform_chain(len, tier);
    let refs: Vec<(&str, MemberTier)> = chain.iter().map(|(n, t)| (n.as_str(), *t)).collect();
    build_chain(&engine, &mut conn, &refs);

    let settlement = engine
        .settle_purchase(&mut conn, &purchase("m0", units(1_000_000), "deep"), BASE_TIME)
        .expect("settle");
    let depths = settlement.allocations.iter().map(|a| a.depth).collect();
    drop(conn);
    (engine, db, depths)
}

#[test]
fn normal_ancestors_stop_at_depth_two() {
    let (_, _, depths) = settle_uniform(MemberTier::Normal, 6);
    assert_eq!(depths, vec![1, 2]);
    assert_eq!(earning_depth_cap(MemberTier::Normal), 2);
}

#[test]
fn market_partners_stop_at_depth_ten() {
    let (engine, db, depths) = settle_uniform(MemberTier::MarketPartner, 15);
    assert_eq!(depths, (1..=10).collect::<Vec<_>>());

    let conn = db.connect();
    assert!(balance(&engine, &conn, "m10") > 0);
    assert_eq!(balance(&engine, &conn, "m11"), 0);
}

#[test]
fn global_partners_stop_at_the_walk_bound() {
    let (engine, db, depths) = settle_uniform(MemberTier::GlobalPartner, 120);
    assert_eq!(depths.len(), MAX_CHAIN_DEPTH as usize);
    assert_eq!(depths.last().copied(), Some(MAX_CHAIN_DEPTH));

    let conn = db.connect();
    // 0.05% of 1,000,000 units at depth 100.
    assert_eq!(balance(&engine, &conn, "m100"), units(500));
    assert_eq!(balance(&engine, &conn, "m101"), 0);
    assert_eq!(balance(&engine, &conn, "m120"), 0);
}

#[test]
fn mixed_chain_uses_each_ancestors_own_cap() {
    let db = TempDb::new("mixed");
    let mut conn = db.connect();
    let engine = CommissionEngine::default();

    // Depths 1..=12: normals at 1 and 3, a market partner at 11, a global at 12.
    let mut members = vec![("buyer".to_string(), MemberTier::Normal)];
    for depth in 1..=12 {
        let tier = match depth {
            11 => MemberTier::MarketPartner,
            12 => MemberTier::GlobalPartner,
            d if d % 2 == 1 => MemberTier::Normal,
            _ => MemberTier::MarketPartner,
        };
        members.push((format!("d{depth}"), tier));
    }
    let refs: Vec<(&str, MemberTier)> = members.iter().map(|(n, t)| (n.as_str(), *t)).collect();
    build_chain(&engine, &mut conn, &refs);

    let settlement = engine
        .settle_purchase(&mut conn, &purchase("buyer", units(10_000), "mixed"), BASE_TIME)
        .expect("settle");
    let paid: Vec<u32> = settlement.allocations.iter().map(|a| a.depth).collect();

    // Normal at 1 pays; normals at 3, 5, 7, 9 do not; market partners at
    // 2..=10 pay; the market partner at 11 does not; the global at 12 does.
    assert_eq!(paid, vec![1, 2, 4, 6, 8, 10, 12]);
    assert_eq!(balance(&engine, &conn, "d3"), 0);
    assert_eq!(balance(&engine, &conn, "d11"), 0);
    assert_eq!(
        balance(&engine, &conn, "d12"),
        units(10),
        "global partner at depth 12 earns 0.10%"
    );
    assert!(engine.member(&conn, &addr("d12")).expect("member").lifetime_earnings > 0);
}
