//! Payout queue entity - Money promised to a member, awaiting external
//! settlement.
//!
//! Entries are created exclusively by the withdrawal operations. The
//! external settlement process mutates `status`/`processed_*`; the
//! rejection reconciler owns `refund_processed_at` as its exactly-once
//! marker.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Freshly created, waiting for the external settler.
pub const STATUS_PENDING: &str = "pending";
/// Picked up by the external settler.
pub const STATUS_PROCESSING: &str = "processing";
/// Settled successfully.
pub const STATUS_COMPLETED: &str = "completed";
/// Settlement failed.
pub const STATUS_FAILED: &str = "failed";
/// Rejected by the settler; consumed by the refund reconciler.
pub const STATUS_REJECTED: &str = "rejected";

/// `withdrawal_type` value for reward-balance-sourced entries.
pub const TYPE_MANA_REWARDS: &str = "MANA_REWARDS";

/// Payout queue database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payout_queue")]
pub struct Model {
    /// Unique identifier for the payout entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Member the payout is owed to
    pub user_id: String,
    /// Payout amount in dollars
    pub amount: f64,
    /// Settlement status
    pub status: String,
    /// Source contract, for contract-sourced entries
    pub contract_id: Option<i64>,
    /// Source attribution for non-contract entries (`MANA_REWARDS`)
    pub withdrawal_type: Option<String>,
    /// Which of the twelve withdrawals this is (single-contract path)
    pub withdrawal_number: Option<i32>,
    /// Lifetime withdrawal cap, recorded alongside `withdrawal_number`
    pub total_withdrawals: Option<i32>,
    /// Whether the entry was created by a pooled withdrawal
    pub pooled: bool,
    /// Number of 30-day periods consumed by this entry (pooled path)
    pub periods_withdrawn: Option<i32>,
    /// Free-text notes for the settlement operator
    pub notes: Option<String>,
    /// When the entry was created
    pub created_at: DateTimeUtc,
    /// When the external settler processed the entry
    pub processed_at: Option<DateTimeUtc>,
    /// Who processed the entry
    pub processed_by: Option<String>,
    /// Set once the reconciler has refunded a rejected entry; the
    /// exactly-once idempotency marker
    pub refund_processed_at: Option<DateTimeUtc>,
}

/// Defines relationships between `PayoutQueue` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payout entry belongs to one member
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::UserId",
        to = "super::member::Column::Id"
    )]
    Member,
    /// Contract-sourced entries reference their contract
    #[sea_orm(
        belongs_to = "super::donation_contract::Entity",
        from = "Column::ContractId",
        to = "super::donation_contract::Column::Id"
    )]
    DonationContract,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl Related<super::donation_contract::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DonationContract.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
