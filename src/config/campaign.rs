//! Reward campaign seeding from config.toml
//!
//! Loads an initial reward campaign definition from a TOML configuration
//! file and seeds it into the database when no campaign is active yet.
//! Subsequent campaign management (top-ups, replacements) happens through
//! administrative tooling outside this crate.

use crate::core::reward;
use crate::entities::{RewardPool, reward_pool};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Optional initial reward campaign to seed
    pub campaign: Option<CampaignConfig>,
}

/// Configuration for the initial reward campaign
#[derive(Debug, Deserialize, Clone)]
pub struct CampaignConfig {
    /// The secret unlock code members must submit
    pub code: String,
    /// Total pool budget in dollars
    pub pool: f64,
    /// RFC 3339 instant at which the code expires
    pub expires_at: String,
}

/// Loads campaign configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is
/// invalid, or required fields are missing.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads campaign configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}

/// Seeds the configured campaign if no campaign is currently active.
///
/// Returns `true` if a campaign was created.
pub async fn seed_initial_campaign(db: &DatabaseConnection, config: &Config) -> Result<bool> {
    let Some(campaign) = &config.campaign else {
        return Ok(false);
    };

    let existing = RewardPool::find()
        .filter(reward_pool::Column::IsActive.eq(true))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let expires_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&campaign.expires_at)
        .map_err(|e| Error::Config {
            message: format!("Invalid campaign expires_at: {e}"),
        })?
        .with_timezone(&Utc);

    reward::create_campaign(db, &campaign.code, campaign.pool, expires_at).await?;
    info!(
        code = %campaign.code,
        pool = campaign.pool,
        "Seeded initial reward campaign"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_parse_campaign_config() {
        let toml_str = r#"
            [campaign]
            code = "GOLD1"
            pool = 500.0
            expires_at = "2030-01-01T00:00:00Z"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        let campaign = config.campaign.unwrap();
        assert_eq!(campaign.code, "GOLD1");
        assert_eq!(campaign.pool, 500.0);
        assert_eq!(campaign.expires_at, "2030-01-01T00:00:00Z");
    }

    #[test]
    fn test_parse_config_without_campaign() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.campaign.is_none());
    }

    #[tokio::test]
    async fn test_seed_initial_campaign() -> Result<()> {
        let db = setup_test_db().await?;

        let config = Config {
            campaign: Some(CampaignConfig {
                code: "GOLD1".to_string(),
                pool: 100.0,
                expires_at: "2030-01-01T00:00:00Z".to_string(),
            }),
        };

        // First seed creates the campaign
        assert!(seed_initial_campaign(&db, &config).await?);

        // Second seed is a no-op while a campaign is active
        assert!(!seed_initial_campaign(&db, &config).await?);

        let active = RewardPool::find()
            .filter(reward_pool::Column::IsActive.eq(true))
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(active.active_code, "GOLD1");
        assert_eq!(active.remaining_pool, 100.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_rejects_bad_expiry() -> Result<()> {
        let db = setup_test_db().await?;

        let config = Config {
            campaign: Some(CampaignConfig {
                code: "GOLD1".to_string(),
                pool: 100.0,
                expires_at: "not-a-date".to_string(),
            }),
        };

        let result = seed_initial_campaign(&db, &config).await;
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));

        Ok(())
    }
}
