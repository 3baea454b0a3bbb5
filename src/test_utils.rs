//! Shared test utilities for `manavault`.
//!
//! This module provides common helper functions for setting up test
//! databases and creating test entities with sensible defaults.

use crate::{
    core::{contract, reward},
    entities::{DonationContract, donation_contract, member, payout_queue, reward_pool},
    errors::Result,
};
use chrono::{Duration, Utc};
use sea_orm::{DatabaseConnection, Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test member with sensible defaults.
///
/// # Defaults
/// * `kyc_status`: `"VERIFIED"` (withdrawal-ready)
/// * `balance`: 0.0
/// * no PIN configured
pub async fn create_test_member(db: &DatabaseConnection, id: &str) -> Result<member::Model> {
    create_test_member_with_kyc(db, id, "VERIFIED").await
}

/// Creates a test member with a specific KYC status.
pub async fn create_test_member_with_kyc(
    db: &DatabaseConnection,
    id: &str,
    kyc_status: &str,
) -> Result<member::Model> {
    let model = member::ActiveModel {
        id: Set(id.to_string()),
        name: Set(format!("Member {id}")),
        balance: Set(0.0),
        total_rewards: Set(0.0),
        refund_balance: Set(0.0),
        kyc_status: Set(kyc_status.to_string()),
        has_pin_setup: Set(false),
        pin_hash: Set(None),
        failed_pin_attempts: Set(0),
        pin_lock_until: Set(None),
        last_pin_success: Set(None),
        last_mana_claim_date: Set(None),
        created_at: Set(Utc::now()),
    };
    model.insert(db).await.map_err(Into::into)
}

/// Sets a member's mana balance to an absolute value.
pub async fn set_member_balance(
    db: &DatabaseConnection,
    id: &str,
    balance: f64,
) -> Result<member::Model> {
    let found = crate::entities::Member::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| crate::errors::Error::UserNotFound { id: id.to_string() })?;
    let mut active: member::ActiveModel = found.into();
    active.balance = Set(balance);
    active.update(db).await.map_err(Into::into)
}

/// Creates a pending test contract via the public creation path.
pub async fn create_test_contract(
    db: &DatabaseConnection,
    user_id: &str,
    amount: f64,
) -> Result<donation_contract::Model> {
    contract::create_contract(db, user_id, amount, "bank_transfer", None).await
}

/// Approves a contract and backdates its clock so that `days_ago` days
/// have elapsed since `donation_start_date`. Calling it again on an
/// already-approved contract just shifts the clock.
pub async fn approve_backdated(
    db: &DatabaseConnection,
    contract_id: i64,
    days_ago: i64,
) -> Result<donation_contract::Model> {
    let found = DonationContract::find_by_id(contract_id)
        .one(db)
        .await?
        .ok_or_else(|| crate::errors::Error::ContractNotFound {
            id: contract_id.to_string(),
        })?;

    if found.status == contract::STATUS_PENDING {
        contract::approve_contract(db, contract_id, "test_admin").await?;
    }

    let found = DonationContract::find_by_id(contract_id)
        .one(db)
        .await?
        .ok_or_else(|| crate::errors::Error::ContractNotFound {
            id: contract_id.to_string(),
        })?;
    let start = Utc::now() - Duration::days(days_ago);
    let mut active: donation_contract::ActiveModel = found.into();
    active.donation_start_date = Set(Some(start));
    active.contract_end_date = Set(Some(start + Duration::days(365)));
    active.update(db).await.map_err(Into::into)
}

/// Creates an active test reward campaign expiring in two days, so a
/// test can claim both today and tomorrow without hitting expiry.
pub async fn create_test_campaign(
    db: &DatabaseConnection,
    code: &str,
    pool: f64,
) -> Result<reward_pool::Model> {
    reward::create_campaign(db, code, pool, Utc::now() + Duration::days(2)).await
}

/// Creates a pending test payout entry with no source attribution.
pub async fn create_test_payout(
    db: &DatabaseConnection,
    user_id: &str,
    amount: f64,
) -> Result<payout_queue::Model> {
    let entry = payout_queue::ActiveModel {
        user_id: Set(user_id.to_string()),
        amount: Set(amount),
        status: Set(payout_queue::STATUS_PENDING.to_string()),
        contract_id: Set(None),
        withdrawal_type: Set(None),
        withdrawal_number: Set(None),
        total_withdrawals: Set(None),
        pooled: Set(false),
        periods_withdrawn: Set(None),
        notes: Set(None),
        created_at: Set(Utc::now()),
        processed_at: Set(None),
        processed_by: Set(None),
        refund_processed_at: Set(None),
        ..Default::default()
    };
    entry.insert(db).await.map_err(Into::into)
}
