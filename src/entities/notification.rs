//! Notification entity - Records emitted for external delivery.
//!
//! Delivery mechanics (email/SMS provider, templating) live outside this
//! crate; the engine only inserts rows into this queue-like table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Member the notification is addressed to
    pub user_id: String,
    /// Notification kind (e.g. `"payout_refunded"`)
    pub kind: String,
    /// Human-readable message body
    pub message: String,
    /// When the notification was recorded
    pub created_at: DateTimeUtc,
}

/// `Notification` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
