//! Integration test: settlement of a verified purchase, end to end.
//!
//! 1. Build P -> A (normal) -> B (market partner) -> C (global partner)
//! 2. Settle a 1000-unit purchase by P
//! 3. Verify balances, ledger records and the settlement marker
//! 4. Re-deliver the purchase, including after reopening the database
//! 5. Verify balances equal the sum of ledger records

use upline_db::queries::{commissions, settlements};
use upline_engine::{ApplyOutcome, CommissionEngine, EngineError};
use upline_integration_tests::{
    addr, balance, build_chain, purchase, units, TempDb, BASE_TIME,
};
use upline_types::{MemberTier, Rate};

const CHAIN: [(&str, MemberTier); 4] = [
    ("p", MemberTier::Normal),
    ("a", MemberTier::Normal),
    ("b", MemberTier::MarketPartner),
    ("c", MemberTier::GlobalPartner),
];

#[test]
fn worked_example_pays_fifty_three_units() {
    let db = TempDb::new("worked");
    let mut conn = db.connect();
    let engine = CommissionEngine::default();
    build_chain(&engine, &mut conn, &CHAIN);

    // =========================================================
    // Settle
    // =========================================================
    let settlement = engine
        .settle_purchase(&mut conn, &purchase("p", units(1000), "0xabc"), BASE_TIME + 1)
        .expect("settle");

    assert_eq!(
        settlement.outcome,
        ApplyOutcome::Applied { records: 3, total: units(53) }
    );
    let got: Vec<(String, u32, Rate, u64)> = settlement
        .allocations
        .iter()
        .map(|a| (a.beneficiary.to_string(), a.depth, a.rate, a.amount))
        .collect();
    assert_eq!(
        got,
        vec![
            ("a".to_string(), 1, Rate::from_bps(300), units(30)),
            ("b".to_string(), 2, Rate::from_bps(200), units(20)),
            ("c".to_string(), 3, Rate::from_bps(30), units(3)),
        ]
    );

    // =========================================================
    // Balances and ledger
    // =========================================================
    assert_eq!(balance(&engine, &conn, "a"), units(30));
    assert_eq!(balance(&engine, &conn, "b"), units(20));
    assert_eq!(balance(&engine, &conn, "c"), units(3));
    assert_eq!(balance(&engine, &conn, "p"), 0, "purchaser never earns from itself");

    let rows = commissions::for_purchase(&conn, "0xabc").expect("rows");
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.source, "p");
        assert_eq!(row.category, "product");
        assert_eq!(row.created_at, BASE_TIME + 1);
        assert_ne!(row.beneficiary, row.source);
    }

    let marker = settlements::get(&conn, "0xabc").expect("get").expect("marker");
    assert_eq!(marker.total_commission, units(53));
    assert_eq!(marker.record_count, 3);
}

#[test]
fn redelivery_is_idempotent_across_reopen() {
    let db = TempDb::new("redeliver");
    let engine = CommissionEngine::default();
    let event = purchase("p", units(1000), "order-77");

    let first = {
        let mut conn = db.connect();
        build_chain(&engine, &mut conn, &CHAIN);
        engine.settle_purchase(&mut conn, &event, BASE_TIME + 1).expect("settle")
    };

    // A fresh connection sees the settlement and changes nothing.
    let mut conn = db.connect();
    for attempt in 0..3 {
        let again = engine
            .settle_purchase(&mut conn, &event, BASE_TIME + 10 + attempt)
            .expect("re-deliver");
        assert_eq!(again.outcome, ApplyOutcome::AlreadyApplied);
        assert_eq!(again.allocations, first.allocations);
        assert_eq!(again.total_commission, first.total_commission);
    }
    assert_eq!(balance(&engine, &conn, "a"), units(30));
    assert_eq!(commissions::for_purchase(&conn, "order-77").expect("rows").len(), 3);

    // Same id, different amount.
    let err = engine
        .settle_purchase(&mut conn, &purchase("p", units(5), "order-77"), BASE_TIME + 20)
        .expect_err("conflict");
    assert!(matches!(err, EngineError::ConflictingPurchase { .. }));

    // Ids are case-sensitive: a different id settles independently.
    let other = engine
        .settle_purchase(&mut conn, &purchase("p", units(1000), "ORDER-77"), BASE_TIME + 21)
        .expect("settle");
    assert!(matches!(other.outcome, ApplyOutcome::Applied { .. }));
    assert_eq!(balance(&engine, &conn, "a"), units(60));
}

#[test]
fn balances_match_ledger_after_many_purchases() {
    let db = TempDb::new("ledger");
    let mut conn = db.connect();
    let engine = CommissionEngine::default();
    build_chain(&engine, &mut conn, &CHAIN);

    let mut expected_c = 0u64;
    for i in 0..40u64 {
        let purchaser = if i % 2 == 0 { "p" } else { "a" };
        // Odd micro-unit amounts exercise floor rounding.
        let amount = units(i + 1) + 7 * i + 3;
        engine
            .settle_purchase(&mut conn, &purchase(purchaser, amount, &format!("tx-{i}")), BASE_TIME + i)
            .expect("settle");
        // C sits at depth 3 from P (0.30%) and depth 2 from A (0.50%).
        let bps = if purchaser == "p" { 30 } else { 50 };
        expected_c += Rate::from_bps(bps).apply(amount);
    }

    for member in ["p", "a", "b", "c"] {
        let summary = engine.member(&conn, &addr(member)).expect("member");
        let ledger_total =
            commissions::total_for_beneficiary(&conn, &addr(member)).expect("total");
        assert_eq!(summary.balance, ledger_total, "balance of {member}");
        assert_eq!(summary.lifetime_earnings, ledger_total, "earnings of {member}");
    }
    assert_eq!(balance(&engine, &conn, "c"), expected_c);
}

#[test]
fn rejected_purchases_write_nothing() {
    let db = TempDb::new("rejected");
    let mut conn = db.connect();
    let engine = CommissionEngine::default();
    build_chain(&engine, &mut conn, &CHAIN);

    assert!(matches!(
        engine.settle_purchase(&mut conn, &purchase("p", 0, "t0"), BASE_TIME),
        Err(EngineError::ZeroAmount)
    ));
    assert!(matches!(
        engine.settle_purchase(&mut conn, &purchase("stranger", units(1), "t1"), BASE_TIME),
        Err(EngineError::UnknownMember(_))
    ));
    assert!(settlements::get(&conn, "t0").expect("get").is_none());
    assert!(settlements::get(&conn, "t1").expect("get").is_none());

    // The rejected id is still usable for a valid purchase.
    let ok = engine
        .settle_purchase(&mut conn, &purchase("p", units(10), "t0"), BASE_TIME)
        .expect("settle");
    assert!(matches!(ok.outcome, ApplyOutcome::Applied { .. }));
}
