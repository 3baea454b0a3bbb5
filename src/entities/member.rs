//! Member entity - Represents a user record as seen by the engine.
//!
//! The engine does not own account creation; it reads and conditionally
//! writes the balance, reward, KYC and PIN-security fields of an existing
//! member record.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Member database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    /// External user identifier (owned by the auth system)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name, denormalized into reward history entries
    pub name: String,
    /// Mana reward balance in dollars; credited by claims, debited by
    /// MANA-sourced withdrawals
    pub balance: f64,
    /// Lifetime sum of claimed rewards
    pub total_rewards: f64,
    /// Destination ledger for rejected-payout refunds, distinct from
    /// `balance`
    pub refund_balance: f64,
    /// KYC verification status string (e.g. `"VERIFIED"`, `"PENDING"`)
    pub kyc_status: String,
    /// Whether the member has completed transaction PIN setup
    pub has_pin_setup: bool,
    /// Salted one-way hash of the transaction PIN (`salt$hash`)
    pub pin_hash: Option<String>,
    /// Consecutive failed PIN attempts since the last success
    pub failed_pin_attempts: i32,
    /// If set and in the future, PIN verification is refused until then
    pub pin_lock_until: Option<DateTimeUtc>,
    /// Timestamp of the last successful PIN verification
    pub last_pin_success: Option<DateTimeUtc>,
    /// Calendar day (`YYYY-MM-DD`) of the most recent mana claim
    pub last_mana_claim_date: Option<String>,
    /// When the member record was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Member and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One member has many donation contracts
    #[sea_orm(has_many = "super::donation_contract::Entity")]
    DonationContracts,
    /// One member has many payout queue entries
    #[sea_orm(has_many = "super::payout_queue::Entity")]
    PayoutEntries,
}

impl Related<super::donation_contract::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DonationContracts.def()
    }
}

impl Related<super::payout_queue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayoutEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
