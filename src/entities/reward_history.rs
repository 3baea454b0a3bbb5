//! Reward history entity - Append-only per-claim audit record.
//!
//! Doubles as the uniqueness fence for the one-claim-per-member-per-day
//! rule: `claim_key` is the deterministic `{user_id}_{claimed_date}` key
//! with a UNIQUE constraint, so the storage layer rejects a concurrent
//! double-claim even if both pass the in-transaction pre-check.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `reward_type` value for mana pool claims.
pub const TYPE_MANA: &str = "mana";

/// Reward history database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reward_history")]
pub struct Model {
    /// Unique identifier for the claim record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Deterministic per-member-per-day key: `{user_id}_{claimed_date}`
    #[sea_orm(unique)]
    pub claim_key: String,
    /// Member who claimed
    pub user_id: String,
    /// Member display name at claim time (historical snapshot)
    pub user_name: String,
    /// Amount credited by this claim
    pub amount: f64,
    /// Kind of reward; currently always `"mana"`
    pub reward_type: String,
    /// The code that was redeemed
    pub secret_code: String,
    /// Exact claim instant
    pub claimed_at: DateTimeUtc,
    /// Calendar day of the claim (`YYYY-MM-DD`)
    pub claimed_date: String,
    /// Pool budget before this claim
    pub pool_before: f64,
    /// Pool budget after this claim
    pub pool_after: f64,
}

/// `RewardHistory` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
