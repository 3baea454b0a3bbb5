//! Shared reward pool claims.
//!
//! Many members race to claim from one shared campaign document. The
//! whole claim is a single database transaction in which every read
//! precedes every write, so concurrent claims against a near-empty pool
//! serialize correctly and the pool never goes negative: the final claim
//! is clamped to whatever remains.
//!
//! The one-claim-per-member-per-day rule is checked inside the
//! transaction and additionally enforced by the UNIQUE `claim_key` column
//! on `reward_history`, so a concurrent double-claim that slips past the
//! pre-check fails at insert instead of double-crediting.

use crate::{
    entities::{Member, RewardHistory, RewardPool, member, reward_history, reward_pool},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Smallest possible rolled reward.
pub const MIN_REWARD: f64 = 1.00;
/// Largest possible rolled reward.
pub const MAX_REWARD: f64 = 5.00;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

/// Outcome of a successful claim.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimOutcome {
    /// Amount credited to the member
    pub amount: f64,
    /// Pool budget remaining after this claim
    pub pool_remaining: f64,
}

/// Creates a new reward campaign and deactivates any previous one.
///
/// Administrative seeding entry point; the engine itself never tops a
/// pool back up.
pub async fn create_campaign(
    db: &DatabaseConnection,
    code: &str,
    pool: f64,
    expires_at: DateTime<Utc>,
) -> Result<reward_pool::Model> {
    if pool <= 0.0 || !pool.is_finite() {
        return Err(Error::InvalidAmount { amount: pool });
    }

    let txn = db.begin().await?;

    RewardPool::update_many()
        .col_expr(reward_pool::Column::IsActive, Expr::value(false))
        .filter(reward_pool::Column::IsActive.eq(true))
        .exec(&txn)
        .await?;

    let campaign = reward_pool::ActiveModel {
        active_code: Set(code.to_string()),
        expires_at: Set(expires_at),
        remaining_pool: Set(pool),
        initial_pool: Set(pool),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = campaign.insert(&txn).await?;

    txn.commit().await?;
    Ok(created)
}

/// Claims a reward from the active campaign for a member.
///
/// Validation order inside one transaction, reads strictly before writes:
/// active campaign exists, member exists, not already claimed today, code
/// matches (case/whitespace-normalized), not expired (`now >= expires_at`
/// fails), pool not depleted. The reward is a uniform roll in
/// `[1.00, 5.00]` rounded to cents and clamped to the remaining pool.
///
/// Writes: pool decrement, history append, member balance and
/// `total_rewards` credit, `last_mana_claim_date` stamp.
pub async fn claim(
    db: &DatabaseConnection,
    user_id: &str,
    secret_code: &str,
    now: DateTime<Utc>,
) -> Result<ClaimOutcome> {
    let txn = db.begin().await?;

    let pool = RewardPool::find()
        .filter(reward_pool::Column::IsActive.eq(true))
        .order_by_desc(reward_pool::Column::CreatedAt)
        .one(&txn)
        .await?
        .ok_or(Error::NoActiveReward)?;

    let claimant = Member::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: user_id.to_string(),
        })?;

    let claimed_date = now.date_naive().format("%Y-%m-%d").to_string();
    let claim_key = format!("{user_id}_{claimed_date}");

    let already = RewardHistory::find()
        .filter(reward_history::Column::ClaimKey.eq(claim_key.as_str()))
        .filter(reward_history::Column::RewardType.eq(reward_history::TYPE_MANA))
        .one(&txn)
        .await?;
    if already.is_some() {
        return Err(Error::AlreadyClaimedToday);
    }

    if normalize_code(secret_code) != normalize_code(&pool.active_code) {
        return Err(Error::InvalidCode);
    }

    if now >= pool.expires_at {
        return Err(Error::CodeExpired);
    }

    if pool.remaining_pool <= 0.0 {
        return Err(Error::PoolDepleted);
    }

    // Scoped so the RNG is dropped before the next await point
    let rolled = {
        let mut rng = rand::thread_rng();
        round2(rng.gen_range(MIN_REWARD..=MAX_REWARD))
    };
    let amount = round2(rolled.min(pool.remaining_pool));
    let pool_before = pool.remaining_pool;
    let pool_after = round2(pool_before - amount);

    RewardPool::update_many()
        .col_expr(
            reward_pool::Column::RemainingPool,
            Expr::col(reward_pool::Column::RemainingPool).sub(amount),
        )
        .filter(reward_pool::Column::Id.eq(pool.id))
        .exec(&txn)
        .await?;

    let history = reward_history::ActiveModel {
        claim_key: Set(claim_key),
        user_id: Set(user_id.to_string()),
        user_name: Set(claimant.name.clone()),
        amount: Set(amount),
        reward_type: Set(reward_history::TYPE_MANA.to_string()),
        secret_code: Set(secret_code.trim().to_string()),
        claimed_at: Set(now),
        claimed_date: Set(claimed_date.clone()),
        pool_before: Set(pool_before),
        pool_after: Set(pool_after),
        ..Default::default()
    };
    history.insert(&txn).await?;

    Member::update_many()
        .col_expr(
            member::Column::Balance,
            Expr::col(member::Column::Balance).add(amount),
        )
        .col_expr(
            member::Column::TotalRewards,
            Expr::col(member::Column::TotalRewards).add(amount),
        )
        .col_expr(
            member::Column::LastManaClaimDate,
            Expr::value(Some(claimed_date)),
        )
        .filter(member::Column::Id.eq(user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    info!(user_id, amount, pool_after, "Mana reward claimed");
    Ok(ClaimOutcome {
        amount,
        pool_remaining: pool_after,
    })
}
