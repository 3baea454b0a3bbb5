//! Pooled withdrawal distribution.
//!
//! A pooled withdrawal draws one requested amount from several sources in
//! one logical operation: the member's mana reward balance first, then
//! their eligible contracts in caller order (oldest first). The
//! allocation policy is a sequential greedy drain - simple and auditable,
//! deliberately not proportional or largest-first - with any cent residue
//! from rounding folded into the first allocation so nothing is lost.

use crate::{
    core::{
        contract::{self, MAX_WITHDRAWALS},
        kyc, pin,
    },
    entities::{DonationContract, Member, donation_contract, member, payout_queue},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Rounds to whole cents.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Withdrawable money offered by one eligible contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractAvailability {
    /// The offering contract
    pub contract_id: i64,
    /// `floor(donation_amount * 0.3)`
    pub withdrawal_per_period: f64,
    /// Stacked, unconsumed periods
    pub available_periods: i32,
    /// `withdrawal_per_period * available_periods`
    pub available_amount: f64,
}

/// Everything a member can withdraw right now, across all sources.
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawableSummary {
    /// Contract availability plus mana balance
    pub total_amount: f64,
    /// Sum across eligible contracts only
    pub contract_total: f64,
    /// The member's raw reward balance (always fully available)
    pub mana_balance: f64,
    /// Eligible contracts in the caller's original ordering
    pub eligible_contracts: Vec<ContractAvailability>,
}

/// One contract's share of a distributed withdrawal.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// The contract to draw from
    pub contract_id: i64,
    /// Amount drawn from it
    pub amount: f64,
}

/// Result of a pooled withdrawal.
#[derive(Debug, Clone, PartialEq)]
pub struct PooledWithdrawalResult {
    /// IDs of every payout-queue entry created
    pub payout_ids: Vec<i64>,
    /// The originally requested total
    pub total_amount: f64,
}

/// Computes total withdrawable money across contracts and reward balance.
///
/// Pure function. Each contract is evaluated with
/// [`contract::eligibility`]; stacked periods surface here as withdrawable
/// money (`per_period * available_periods`). The reward balance has no
/// eligibility gate of its own. Contract ordering is preserved from the
/// input.
#[must_use]
pub fn calculate_total_withdrawable(
    contracts: &[donation_contract::Model],
    reward_balance: f64,
    now: DateTime<Utc>,
) -> WithdrawableSummary {
    let mut eligible = Vec::new();
    let mut contract_total = 0.0;

    for c in contracts {
        let check = contract::eligibility(c, now);
        if check.eligible && check.available_periods > 0 {
            let per_period = contract::withdrawal_details(c).withdrawal_per_period;
            let available_amount = per_period * f64::from(check.available_periods);
            contract_total += available_amount;
            eligible.push(ContractAvailability {
                contract_id: c.id,
                withdrawal_per_period: per_period,
                available_periods: check.available_periods,
                available_amount,
            });
        }
    }

    WithdrawableSummary {
        total_amount: round2(contract_total + reward_balance),
        contract_total: round2(contract_total),
        mana_balance: reward_balance,
        eligible_contracts: eligible,
    }
}

/// Splits a requested amount across eligible contracts.
///
/// Sequential greedy drain: contracts are consumed in the order given by
/// the caller (expected to be oldest first; this function does not
/// re-sort), each yielding `min(remaining, available)` until the request
/// is covered. Cent residue from rounding is folded into the first
/// allocation, so the returned amounts always sum to exactly `requested`.
pub fn distribute(requested: f64, eligible: &[ContractAvailability]) -> Result<Vec<Allocation>> {
    if requested <= 0.0 || !requested.is_finite() {
        return Err(Error::InvalidAmount { amount: requested });
    }

    let available: f64 = eligible.iter().map(|c| c.available_amount).sum();
    if round2(requested) > round2(available) {
        return Err(Error::InsufficientFunds {
            available: round2(available),
            requested,
        });
    }

    let mut remaining = round2(requested);
    let mut allocations = Vec::new();
    for c in eligible {
        if remaining <= 0.0 {
            break;
        }
        let take = round2(remaining.min(c.available_amount));
        if take <= 0.0 {
            continue;
        }
        allocations.push(Allocation {
            contract_id: c.contract_id,
            amount: take,
        });
        remaining = round2(remaining - take);
    }

    // Fold any cent residue into the first allocation rather than drop it
    if remaining > 0.0 {
        if let Some(first) = allocations.first_mut() {
            first.amount = round2(first.amount + remaining);
        }
    }

    Ok(allocations)
}

/// Executes a pooled withdrawal across the member's reward balance and
/// contracts.
///
/// Order of operations, preserved for correct accounting:
///
/// 1. PIN verification
/// 2. availability computation and `InsufficientFunds` check
/// 3. KYC gate
/// 4. reward balance drawn first - the one path where a balance changes
///    synchronously: the member's balance is debited directly and a
///    `MANA_REWARDS` payout entry is queued
/// 5. the remainder drawn from contracts via [`distribute`]; each
///    allocation consumes `round(amount / per_period)` periods, which can
///    be several at once when periods have stacked
///
/// The two phases are separate transactions; a failure after phase 4 has
/// committed surfaces as an error for manual reconciliation rather than a
/// cross-phase rollback.
pub async fn process_pooled_withdrawal(
    db: &DatabaseConnection,
    user_id: &str,
    pin_code: &str,
    requested: f64,
    reward_requested: f64,
) -> Result<PooledWithdrawalResult> {
    pin::verify_pin(db, user_id, pin_code).await?;

    if requested <= 0.0 || !requested.is_finite() {
        return Err(Error::InvalidAmount { amount: requested });
    }

    let member = Member::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: user_id.to_string(),
        })?;

    // Oldest contract drains first
    let contracts = DonationContract::find()
        .filter(donation_contract::Column::UserId.eq(user_id))
        .order_by_asc(donation_contract::Column::CreatedAt)
        .order_by_asc(donation_contract::Column::Id)
        .all(db)
        .await?;

    let now = Utc::now();
    let summary = calculate_total_withdrawable(&contracts, member.balance, now);
    if round2(requested) > summary.total_amount {
        return Err(Error::InsufficientFunds {
            available: summary.total_amount,
            requested,
        });
    }

    let decision = kyc::can_withdraw(&member);
    if !decision.allowed {
        return Err(Error::KycRequired {
            status: member.kyc_status,
        });
    }

    let mut remaining = round2(requested);
    let mut payout_ids = Vec::new();

    // Phase 1: reward balance first
    let mana_amount = round2(remaining.min(reward_requested).min(member.balance).max(0.0));
    if mana_amount > 0.0 {
        let txn = db.begin().await?;

        Member::update_many()
            .col_expr(
                member::Column::Balance,
                Expr::col(member::Column::Balance).sub(mana_amount),
            )
            .filter(member::Column::Id.eq(user_id))
            .exec(&txn)
            .await?;

        let entry = payout_queue::ActiveModel {
            user_id: Set(user_id.to_string()),
            amount: Set(mana_amount),
            status: Set(payout_queue::STATUS_PENDING.to_string()),
            contract_id: Set(None),
            withdrawal_type: Set(Some(payout_queue::TYPE_MANA_REWARDS.to_string())),
            withdrawal_number: Set(None),
            total_withdrawals: Set(None),
            pooled: Set(true),
            periods_withdrawn: Set(None),
            notes: Set(Some("Mana reward balance withdrawal".to_string())),
            created_at: Set(now),
            processed_at: Set(None),
            processed_by: Set(None),
            refund_processed_at: Set(None),
            ..Default::default()
        };
        let inserted = entry.insert(&txn).await?;
        payout_ids.push(inserted.id);

        txn.commit().await?;
        remaining = round2(remaining - mana_amount);
        info!(user_id, mana_amount, "Mana balance drawn for pooled withdrawal");
    }

    // Phase 2: remaining amount from contracts
    if remaining > 0.0 {
        let allocations = distribute(remaining, &summary.eligible_contracts)?;
        let txn = db.begin().await?;

        for allocation in &allocations {
            let contract = DonationContract::find_by_id(allocation.contract_id)
                .one(&txn)
                .await?
                .ok_or_else(|| Error::ContractNotFound {
                    id: allocation.contract_id.to_string(),
                })?;

            let per_period = contract::withdrawal_details(&contract).withdrawal_per_period;
            #[allow(clippy::cast_possible_truncation)]
            let periods_withdrawn = ((allocation.amount / per_period).round() as i32).max(1);
            let new_count = (contract.withdrawals_count + periods_withdrawn).min(MAX_WITHDRAWALS);

            let mut active: donation_contract::ActiveModel = contract.into();
            active.withdrawals_count = Set(new_count);
            active.last_withdrawal_date = Set(Some(now));
            if new_count >= MAX_WITHDRAWALS {
                active.status = Set(contract::STATUS_COMPLETED.to_string());
            }
            active.update(&txn).await?;

            let entry = payout_queue::ActiveModel {
                user_id: Set(user_id.to_string()),
                amount: Set(allocation.amount),
                status: Set(payout_queue::STATUS_PENDING.to_string()),
                contract_id: Set(Some(allocation.contract_id)),
                withdrawal_type: Set(None),
                withdrawal_number: Set(Some(new_count)),
                total_withdrawals: Set(Some(MAX_WITHDRAWALS)),
                pooled: Set(true),
                periods_withdrawn: Set(Some(periods_withdrawn)),
                notes: Set(Some(format!(
                    "Pooled withdrawal, {periods_withdrawn} period(s)"
                ))),
                created_at: Set(now),
                processed_at: Set(None),
                processed_by: Set(None),
                refund_processed_at: Set(None),
                ..Default::default()
            };
            let inserted = entry.insert(&txn).await?;
            payout_ids.push(inserted.id);
        }

        txn.commit().await?;
    }

    info!(
        user_id,
        requested,
        entries = payout_ids.len(),
        "Pooled withdrawal queued"
    );
    Ok(PooledWithdrawalResult {
        payout_ids,
        total_amount: requested,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::contract::{STATUS_ACTIVE, STATUS_COMPLETED};
    use crate::entities::PayoutQueue;
    use crate::test_utils::{
        approve_backdated, create_test_contract, create_test_member, set_member_balance,
        setup_test_db,
    };

    fn availability(contract_id: i64, per_period: f64, periods: i32) -> ContractAvailability {
        ContractAvailability {
            contract_id,
            withdrawal_per_period: per_period,
            available_periods: periods,
            available_amount: per_period * f64::from(periods),
        }
    }

    #[test]
    fn test_distribute_rejects_non_positive() {
        let eligible = vec![availability(1, 900.0, 1)];
        assert!(matches!(
            distribute(0.0, &eligible).unwrap_err(),
            Error::InvalidAmount { amount: _ }
        ));
        assert!(matches!(
            distribute(-5.0, &eligible).unwrap_err(),
            Error::InvalidAmount { amount: _ }
        ));
    }

    #[test]
    fn test_distribute_rejects_over_availability() {
        let eligible = vec![availability(1, 900.0, 1)];
        let result = distribute(1000.0, &eligible);
        match result.unwrap_err() {
            Error::InsufficientFunds { available, requested } => {
                assert_eq!(available, 900.0);
                assert_eq!(requested, 1000.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_distribute_greedy_drains_in_order() {
        let eligible = vec![
            availability(1, 300.0, 2), // 600
            availability(2, 900.0, 1), // 900
            availability(3, 150.0, 3), // 450
        ];
        let allocations = distribute(1200.0, &eligible).unwrap();
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0], Allocation { contract_id: 1, amount: 600.0 });
        assert_eq!(allocations[1], Allocation { contract_id: 2, amount: 600.0 });
    }

    #[test]
    fn test_distribute_sums_to_requested_exactly() {
        let eligible = vec![
            availability(1, 100.33, 3),
            availability(2, 250.67, 2),
            availability(3, 75.10, 1),
        ];
        let total: f64 = eligible.iter().map(|c| c.available_amount).sum();
        let allocations = distribute(super::round2(total), &eligible).unwrap();
        let allocated: f64 = allocations.iter().map(|a| a.amount).sum();
        assert_eq!(super::round2(allocated), super::round2(total));
    }

    #[test]
    fn test_distribute_partial_from_single_contract() {
        let eligible = vec![availability(7, 900.0, 3)];
        let allocations = distribute(1000.0, &eligible).unwrap();
        assert_eq!(allocations, vec![Allocation { contract_id: 7, amount: 1000.0 }]);
    }

    #[test]
    fn test_calculate_total_withdrawable_includes_stacking() {
        let now = Utc::now();
        let start = now - chrono::Duration::days(95);
        let contract = crate::entities::donation_contract::Model {
            id: 1,
            user_id: "user1".to_string(),
            donation_amount: 3000.0,
            payment_method: "bank_transfer".to_string(),
            receipt_ref: None,
            status: STATUS_ACTIVE.to_string(),
            donation_start_date: Some(start),
            contract_end_date: Some(start + chrono::Duration::days(365)),
            withdrawals_count: 0,
            last_withdrawal_date: None,
            created_at: start,
            approved_at: Some(start),
            approved_by: None,
        };

        let summary = calculate_total_withdrawable(&[contract], 400.0, now);
        assert_eq!(summary.mana_balance, 400.0);
        assert_eq!(summary.contract_total, 2700.0);
        assert_eq!(summary.total_amount, 3100.0);
        assert_eq!(summary.eligible_contracts.len(), 1);
        assert_eq!(summary.eligible_contracts[0].available_periods, 3);
    }

    #[tokio::test]
    async fn test_pooled_withdrawal_mana_first_then_contract() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_member(&db, "user1").await?;
        set_member_balance(&db, "user1", 400.0).await?;
        pin::setup_pin(&db, "user1", "123456").await?;
        let contract = create_test_contract(&db, "user1", 3000.0).await?;
        approve_backdated(&db, contract.id, 30).await?;

        // Reward balance 400, one contract offering 900; request 1000
        let result = process_pooled_withdrawal(&db, "user1", "123456", 1000.0, 400.0).await?;
        assert_eq!(result.total_amount, 1000.0);
        assert_eq!(result.payout_ids.len(), 2);

        // Balance debited synchronously
        let member = Member::find_by_id("user1").one(&db).await?.unwrap();
        assert_eq!(member.balance, 0.0);

        let entries = PayoutQueue::find().all(&db).await?;
        assert_eq!(entries.len(), 2);
        let mana = entries
            .iter()
            .find(|e| e.withdrawal_type.as_deref() == Some(payout_queue::TYPE_MANA_REWARDS))
            .unwrap();
        assert_eq!(mana.amount, 400.0);
        let from_contract = entries.iter().find(|e| e.contract_id.is_some()).unwrap();
        assert_eq!(from_contract.amount, 600.0);
        assert_eq!(from_contract.periods_withdrawn, Some(1));
        assert!(from_contract.pooled);

        // round(600 / 900) = 1 period consumed
        let updated = DonationContract::find_by_id(contract.id).one(&db).await?.unwrap();
        assert_eq!(updated.withdrawals_count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_pooled_withdrawal_drains_stacked_periods() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_member(&db, "user1").await?;
        pin::setup_pin(&db, "user1", "123456").await?;
        let contract = create_test_contract(&db, "user1", 3000.0).await?;
        approve_backdated(&db, contract.id, 95).await?;

        // Three stacked periods: 2700 drains the contract in one call
        let result = process_pooled_withdrawal(&db, "user1", "123456", 2700.0, 0.0).await?;
        assert_eq!(result.payout_ids.len(), 1);

        let updated = DonationContract::find_by_id(contract.id).one(&db).await?.unwrap();
        assert_eq!(updated.withdrawals_count, 3);

        let entries = PayoutQueue::find().all(&db).await?;
        assert_eq!(entries[0].periods_withdrawn, Some(3));

        Ok(())
    }

    #[tokio::test]
    async fn test_pooled_withdrawal_oldest_contract_first() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_member(&db, "user1").await?;
        pin::setup_pin(&db, "user1", "123456").await?;

        let older = create_test_contract(&db, "user1", 1000.0).await?; // 300/period
        let newer = create_test_contract(&db, "user1", 2000.0).await?; // 600/period
        approve_backdated(&db, older.id, 35).await?;
        approve_backdated(&db, newer.id, 35).await?;

        // 500 requested: 300 from the older, 200 from the newer
        process_pooled_withdrawal(&db, "user1", "123456", 500.0, 0.0).await?;

        let entries = PayoutQueue::find().all(&db).await?;
        let older_entry = entries.iter().find(|e| e.contract_id == Some(older.id)).unwrap();
        let newer_entry = entries.iter().find(|e| e.contract_id == Some(newer.id)).unwrap();
        assert_eq!(older_entry.amount, 300.0);
        assert_eq!(newer_entry.amount, 200.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_pooled_withdrawal_insufficient_funds() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_member(&db, "user1").await?;
        pin::setup_pin(&db, "user1", "123456").await?;
        let contract = create_test_contract(&db, "user1", 3000.0).await?;
        approve_backdated(&db, contract.id, 30).await?;

        let result = process_pooled_withdrawal(&db, "user1", "123456", 5000.0, 0.0).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientFunds { available: _, requested: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_pooled_withdrawal_completes_contract_at_cap() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_member(&db, "user1").await?;
        pin::setup_pin(&db, "user1", "123456").await?;
        let contract = create_test_contract(&db, "user1", 3000.0).await?;
        approve_backdated(&db, contract.id, 360).await?;

        // Twelve periods elapsed; drain the full 10800
        process_pooled_withdrawal(&db, "user1", "123456", 10800.0, 0.0).await?;

        let updated = DonationContract::find_by_id(contract.id).one(&db).await?.unwrap();
        assert_eq!(updated.withdrawals_count, 12);
        assert_eq!(updated.status, STATUS_COMPLETED);

        Ok(())
    }
}
