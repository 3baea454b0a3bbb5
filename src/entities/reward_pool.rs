//! Reward pool entity - One shared reward campaign.
//!
//! There is exactly one live campaign at a time (singleton by convention:
//! the most recent row with `is_active = true`). `remaining_pool` only
//! decreases as members claim and is never driven negative; the final
//! claim is clamped to whatever remains.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reward pool database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reward_pools")]
pub struct Model {
    /// Unique identifier for the campaign
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Secret unlock string; matching is case/whitespace-normalized
    pub active_code: String,
    /// Instant at which the code becomes invalid
    pub expires_at: DateTimeUtc,
    /// Remaining budget in dollars; non-negative, non-increasing
    pub remaining_pool: f64,
    /// Budget the campaign started with
    pub initial_pool: f64,
    /// Whether this is the live campaign
    pub is_active: bool,
    /// When the campaign was created
    pub created_at: DateTimeUtc,
}

/// `RewardPool` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
