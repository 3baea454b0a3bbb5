//! Donation contract entity - One donor's principal commitment.
//!
//! The principal (`donation_amount`) is immutable for the lifetime of the
//! contract. The date pair is null while pending and is stamped exactly
//! once, together, when an admin approves. `withdrawals_count` only ever
//! grows and is capped at twelve.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Entry lifecycle state, the only state a contract is created in.
pub const STATUS_PENDING: &str = "pending";
/// Approved and withdrawable (stamped by admin approval).
pub const STATUS_ACTIVE: &str = "active";
/// Legacy synonym for `active`; treated identically for eligibility.
pub const STATUS_APPROVED: &str = "approved";
/// All twelve withdrawals consumed; terminal for withdrawal purposes.
pub const STATUS_COMPLETED: &str = "completed";

/// Donation contract database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "donation_contracts")]
pub struct Model {
    /// Unique identifier for the contract
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning member; immutable after creation
    pub user_id: String,
    /// Principal in dollars; strictly positive and never mutated
    pub donation_amount: f64,
    /// How the donation was paid (informational)
    pub payment_method: String,
    /// Optional reference to an uploaded payment receipt
    pub receipt_ref: Option<String>,
    /// Lifecycle status: `pending`, `active`, `approved`, or `completed`.
    /// Expiry is not a stored status; it is derived from
    /// `contract_end_date` at evaluation time.
    pub status: String,
    /// Start of the withdrawal clock; null until approval
    pub donation_start_date: Option<DateTimeUtc>,
    /// `donation_start_date + 1 year`; null until approval
    pub contract_end_date: Option<DateTimeUtc>,
    /// Withdrawals consumed so far, in `[0, 12]`, non-decreasing
    pub withdrawals_count: i32,
    /// Timestamp of the most recent withdrawal (informational)
    pub last_withdrawal_date: Option<DateTimeUtc>,
    /// When the contract was created
    pub created_at: DateTimeUtc,
    /// When an admin approved the contract
    pub approved_at: Option<DateTimeUtc>,
    /// Which admin approved the contract
    pub approved_by: Option<String>,
}

/// Defines relationships between `DonationContract` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each contract belongs to one member
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::UserId",
        to = "super::member::Column::Id"
    )]
    Member,
    /// One contract has many payout queue entries
    #[sea_orm(has_many = "super::payout_queue::Entity")]
    PayoutEntries,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl Related<super::payout_queue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayoutEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
