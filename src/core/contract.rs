//! Donation contract lifecycle and withdrawal eligibility.
//!
//! A contract locks in an immutable principal (`donation_amount`). After
//! admin approval starts the clock, every elapsed 30-day period since
//! `donation_start_date` unlocks one withdrawal of
//! `floor(donation_amount * 0.3)`, up to twelve withdrawals over the
//! one-year contract. Periods accrue independently of when the member
//! actually withdraws, so skipped periods stack: ninety days without a
//! withdrawal yields three available periods at once.

use crate::{
    core::{kyc, pin},
    entities::{DonationContract, Member, donation_contract, payout_queue},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{EntityTrait, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Days per withdrawal period.
pub const PERIOD_DAYS: i64 = 30;
/// Lifetime withdrawal cap per contract.
pub const MAX_WITHDRAWALS: i32 = 12;
/// Fraction of the principal released per period.
pub const WITHDRAWAL_RATE: f64 = 0.3;

/// Typed view of the contract's approval phase, so the both-or-neither
/// rule for the date pair is a fact inside the algorithm rather than a
/// pair of null checks scattered through it.
enum ContractPhase {
    /// Not yet approved; no withdrawal clock
    Pending,
    /// Approved with a running clock
    Dated {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

fn phase_of(contract: &donation_contract::Model) -> ContractPhase {
    match (contract.donation_start_date, contract.contract_end_date) {
        (Some(start), Some(end)) => ContractPhase::Dated { start, end },
        _ => ContractPhase::Pending,
    }
}

/// Result of a withdrawal-eligibility evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Eligibility {
    /// Whether a withdrawal may proceed right now
    pub eligible: bool,
    /// Human-readable reason when not eligible
    pub reason: Option<String>,
    /// When the next period unlocks (informational)
    pub next_unlock_at: Option<DateTime<Utc>>,
    /// Elapsed, unconsumed periods available to withdraw
    pub available_periods: i32,
}

impl Eligibility {
    fn denied(reason: &str) -> Self {
        Self {
            eligible: false,
            reason: Some(reason.to_string()),
            next_unlock_at: None,
            available_periods: 0,
        }
    }
}

/// Fixed per-contract withdrawal arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalDetails {
    /// `floor(donation_amount * 0.3)` - integer-floor truncation, not
    /// rounding; both withdrawal paths must agree on this figure
    pub withdrawal_per_period: f64,
    /// Amount already withdrawn across all consumed periods
    pub total_withdrawn: f64,
    /// Amount still withdrawable over the remaining periods
    pub total_remaining: f64,
    /// Withdrawals consumed so far
    pub withdrawals_used: i32,
    /// Withdrawals left before the lifetime cap
    pub withdrawals_remaining: i32,
    /// `withdrawal_per_period * 12`
    pub max_total_withdrawal: f64,
}

/// Computes the fixed withdrawal arithmetic for a contract.
#[must_use]
pub fn withdrawal_details(contract: &donation_contract::Model) -> WithdrawalDetails {
    let withdrawal_per_period = (contract.donation_amount * WITHDRAWAL_RATE).floor();
    let max_total_withdrawal = withdrawal_per_period * f64::from(MAX_WITHDRAWALS);
    let total_withdrawn = withdrawal_per_period * f64::from(contract.withdrawals_count);

    WithdrawalDetails {
        withdrawal_per_period,
        total_withdrawn,
        total_remaining: max_total_withdrawal - total_withdrawn,
        withdrawals_used: contract.withdrawals_count,
        withdrawals_remaining: MAX_WITHDRAWALS - contract.withdrawals_count,
        max_total_withdrawal,
    }
}

/// Evaluates withdrawal eligibility for a contract at instant `now`.
///
/// Pure function; calling it twice with the same inputs yields identical
/// results. Policy, first match wins:
///
/// 1. pending / dates unset - awaiting approval
/// 2. past `contract_end_date` (strictly) - expired
/// 3. status not active/approved - covers completed contracts
/// 4. twelve withdrawals consumed - exhausted
/// 5. fewer than 30 days since start - must wait
/// 6. otherwise periods accrued since start minus periods consumed,
///    capped by the lifetime limit
///
/// Periods are gated by elapsed time since `donation_start_date` divided
/// into fixed 30-day buckets, not by time since the last withdrawal.
/// Skipped periods therefore stack and a single pooled withdrawal can
/// claim several at once.
#[must_use]
pub fn eligibility(contract: &donation_contract::Model, now: DateTime<Utc>) -> Eligibility {
    let ContractPhase::Dated { start, end } = phase_of(contract) else {
        return Eligibility::denied("awaiting approval");
    };
    if contract.status == STATUS_PENDING {
        return Eligibility::denied("awaiting approval");
    }

    if now > end {
        return Eligibility::denied("expired");
    }

    if contract.status != STATUS_ACTIVE && contract.status != STATUS_APPROVED {
        return Eligibility::denied(&format!("contract is {}", contract.status));
    }

    if contract.withdrawals_count >= MAX_WITHDRAWALS {
        return Eligibility::denied("exhausted");
    }

    let days_since_start = (now - start).num_days();
    let periods_elapsed = days_since_start.div_euclid(PERIOD_DAYS);

    if periods_elapsed < 1 {
        return Eligibility {
            eligible: false,
            reason: Some("must wait 30 days from start".to_string()),
            next_unlock_at: Some(start + Duration::days(PERIOD_DAYS)),
            available_periods: 0,
        };
    }

    let count = i64::from(contract.withdrawals_count);
    let available = (periods_elapsed - count)
        .min(i64::from(MAX_WITHDRAWALS) - count)
        .max(0);
    #[allow(clippy::cast_possible_truncation)]
    let available_periods = available as i32;

    // Start of the period after the ones currently available; when none
    // are available this is the member's next accrual date.
    let next_unlock_at = Some(start + Duration::days((count + available + 1) * PERIOD_DAYS));

    if available_periods > 0 {
        Eligibility {
            eligible: true,
            reason: None,
            next_unlock_at,
            available_periods,
        }
    } else {
        Eligibility {
            eligible: false,
            reason: Some("no periods available yet".to_string()),
            next_unlock_at,
            available_periods: 0,
        }
    }
}

pub use crate::entities::donation_contract::{
    STATUS_ACTIVE, STATUS_APPROVED, STATUS_COMPLETED, STATUS_PENDING,
};

/// Creates a new donation contract in `pending` status.
///
/// Validates the principal is strictly positive and finite. Has no side
/// effect on any balance.
pub async fn create_contract(
    db: &DatabaseConnection,
    user_id: &str,
    amount: f64,
    payment_method: &str,
    receipt_ref: Option<String>,
) -> Result<donation_contract::Model> {
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }

    let contract = donation_contract::ActiveModel {
        user_id: Set(user_id.to_string()),
        donation_amount: Set(amount),
        payment_method: Set(payment_method.to_string()),
        receipt_ref: Set(receipt_ref),
        status: Set(STATUS_PENDING.to_string()),
        donation_start_date: Set(None),
        contract_end_date: Set(None),
        withdrawals_count: Set(0),
        last_withdrawal_date: Set(None),
        created_at: Set(Utc::now()),
        approved_at: Set(None),
        approved_by: Set(None),
        ..Default::default()
    };

    let result = contract.insert(db).await?;
    info!(user_id, contract_id = result.id, amount, "Donation contract created");
    Ok(result)
}

/// Approves a pending contract, starting its withdrawal clock.
///
/// The status flip and both date stamps land in one atomic update; no
/// reader ever observes `active` with null dates. Only `pending`
/// contracts can be approved.
pub async fn approve_contract(
    db: &DatabaseConnection,
    contract_id: i64,
    admin_id: &str,
) -> Result<donation_contract::Model> {
    let txn = db.begin().await?;

    let contract = DonationContract::find_by_id(contract_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::ContractNotFound {
            id: contract_id.to_string(),
        })?;

    if contract.status != STATUS_PENDING {
        return Err(Error::InvalidState {
            current: contract.status,
        });
    }

    let now = Utc::now();
    let mut active: donation_contract::ActiveModel = contract.into();
    active.status = Set(STATUS_ACTIVE.to_string());
    active.donation_start_date = Set(Some(now));
    active.contract_end_date = Set(Some(now + Duration::days(365)));
    active.approved_at = Set(Some(now));
    active.approved_by = Set(Some(admin_id.to_string()));
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    info!(contract_id, admin_id, "Donation contract approved");
    Ok(updated)
}

/// Withdraws exactly one period from a single contract.
///
/// Precondition chain, each a hard failure: PIN, contract existence,
/// eligibility, ownership, KYC. Ownership is checked only after
/// existence and eligibility so callers cannot probe which contracts
/// exist. The contract mutation and payout-queue entry land in one
/// transaction.
///
/// Unlike the pooled path, this path always consumes a single period per
/// call even when more have stacked up.
pub async fn withdraw(
    db: &DatabaseConnection,
    contract_id: i64,
    actor_id: &str,
    pin: &str,
) -> Result<f64> {
    pin::verify_pin(db, actor_id, pin).await?;

    let txn = db.begin().await?;

    let contract = DonationContract::find_by_id(contract_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::ContractNotFound {
            id: contract_id.to_string(),
        })?;

    let now = Utc::now();
    let check = eligibility(&contract, now);
    if !check.eligible {
        return Err(Error::WithdrawalNotAvailable {
            reason: check
                .reason
                .unwrap_or_else(|| "not eligible".to_string()),
        });
    }

    if contract.user_id != actor_id {
        return Err(Error::Unauthorized);
    }

    let member = Member::find_by_id(actor_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: actor_id.to_string(),
        })?;
    let decision = kyc::can_withdraw(&member);
    if !decision.allowed {
        return Err(Error::KycRequired {
            status: member.kyc_status,
        });
    }

    let details = withdrawal_details(&contract);
    let amount = details.withdrawal_per_period;
    let new_count = contract.withdrawals_count + 1;

    let mut active: donation_contract::ActiveModel = contract.into();
    active.withdrawals_count = Set(new_count);
    active.last_withdrawal_date = Set(Some(now));
    if new_count >= MAX_WITHDRAWALS {
        active.status = Set(STATUS_COMPLETED.to_string());
    }
    active.update(&txn).await?;

    let entry = payout_queue::ActiveModel {
        user_id: Set(actor_id.to_string()),
        amount: Set(amount),
        status: Set(payout_queue::STATUS_PENDING.to_string()),
        contract_id: Set(Some(contract_id)),
        withdrawal_type: Set(None),
        withdrawal_number: Set(Some(new_count)),
        total_withdrawals: Set(Some(MAX_WITHDRAWALS)),
        pooled: Set(false),
        periods_withdrawn: Set(Some(1)),
        notes: Set(Some(format!(
            "Contract withdrawal {new_count} of {MAX_WITHDRAWALS}"
        ))),
        created_at: Set(now),
        processed_at: Set(None),
        processed_by: Set(None),
        refund_processed_at: Set(None),
        ..Default::default()
    };
    entry.insert(&txn).await?;

    txn.commit().await?;
    info!(
        contract_id,
        actor_id, amount, withdrawal_number = new_count, "Contract withdrawal queued"
    );
    Ok(amount)
}
