//! Database configuration module.
//!
//! Handles `SQLite` database connection and table creation using `SeaORM`.
//! The schema is generated from the entity definitions via
//! `Schema::create_table_from_entity`, so the database always matches the
//! Rust struct definitions without manual SQL.

use crate::entities::{
    DonationContract, Member, Notification, PayoutQueue, RewardHistory, RewardPool,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from environment variable or returns default `SQLite` path.
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/manavault.sqlite".to_string())
}

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL`
/// environment variable, falling back to a default local `SQLite` file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all necessary database tables from the entity definitions.
///
/// Idempotent: tables are created with `IF NOT EXISTS` so the reconciler
/// daemon can run this on every startup.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut member_table = schema.create_table_from_entity(Member);
    let mut contract_table = schema.create_table_from_entity(DonationContract);
    let mut payout_table = schema.create_table_from_entity(PayoutQueue);
    let mut pool_table = schema.create_table_from_entity(RewardPool);
    let mut history_table = schema.create_table_from_entity(RewardHistory);
    let mut notification_table = schema.create_table_from_entity(Notification);

    db.execute(builder.build(member_table.if_not_exists())).await?;
    db.execute(builder.build(contract_table.if_not_exists())).await?;
    db.execute(builder.build(payout_table.if_not_exists())).await?;
    db.execute(builder.build(pool_table.if_not_exists())).await?;
    db.execute(builder.build(history_table.if_not_exists())).await?;
    db.execute(builder.build(notification_table.if_not_exists()))
        .await?;

    Ok(())
}
