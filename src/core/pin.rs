//! Transaction PIN setup, verification and lockout.
//!
//! PINs are exactly six digits, stored as a salted one-way SHA-256 hash
//! (`salt$hash`). Verification tracks consecutive failures on the member
//! record and enforces a timed lockout: three failures lock the account
//! for thirty minutes. The lock is a lazily-checked timestamp, evaluated
//! on the next verify attempt; there is no background timer.

use crate::{
    entities::{Member, member},
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::{Set, prelude::*};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Consecutive failures before the account locks.
pub const MAX_PIN_ATTEMPTS: i32 = 3;
/// Lockout duration after `MAX_PIN_ATTEMPTS` failures.
pub const LOCKOUT_MINUTES: i64 = 30;

fn is_valid_pin_format(pin: &str) -> bool {
    pin.len() == 6 && pin.chars().all(|c| c.is_ascii_digit())
}

fn hash_with_salt(salt: &str, pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(pin.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Produces a fresh `salt$hash` string for the given PIN.
fn encode_pin(pin: &str) -> String {
    let salt: u128 = rand::thread_rng().r#gen();
    let salt = format!("{salt:032x}");
    let hash = hash_with_salt(&salt, pin);
    format!("{salt}${hash}")
}

/// Checks a candidate PIN against a stored `salt$hash` string.
fn matches_stored(stored: &str, pin: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => hash_with_salt(salt, pin) == hash,
        None => false,
    }
}

/// Stores a new transaction PIN for a member.
///
/// Validates the six-digit format, replaces any previous hash and clears
/// the failure counter and lock.
pub async fn setup_pin<C>(db: &C, user_id: &str, pin: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    if !is_valid_pin_format(pin) {
        return Err(Error::InvalidPinFormat);
    }

    let member = Member::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: user_id.to_string(),
        })?;

    let mut active: member::ActiveModel = member.into();
    active.pin_hash = Set(Some(encode_pin(pin)));
    active.has_pin_setup = Set(true);
    active.failed_pin_attempts = Set(0);
    active.pin_lock_until = Set(None);
    active.update(db).await?;

    debug!(user_id, "Transaction PIN configured");
    Ok(())
}

/// Verifies a member's transaction PIN, enforcing the lockout policy.
///
/// While locked, the stored hash is not even consulted. A mismatch
/// increments the failure counter; the third consecutive failure sets
/// `pin_lock_until = now + 30min` and resets the counter. A match resets
/// the counter, clears any expired lock and stamps the success time.
///
/// The counter and lock mutations are written directly against `db` so
/// they persist even when the surrounding operation aborts.
pub async fn verify_pin<C>(db: &C, user_id: &str, pin: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let member = Member::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: user_id.to_string(),
        })?;

    let now = Utc::now();

    if let Some(lock_until) = member.pin_lock_until {
        if now < lock_until {
            let minutes_remaining = (lock_until - now).num_minutes() + 1;
            warn!(user_id, minutes_remaining, "PIN verify refused: locked");
            return Err(Error::AccountLocked { minutes_remaining });
        }
    }

    let Some(stored) = member.pin_hash.clone() else {
        return Err(Error::PinNotConfigured);
    };
    if !member.has_pin_setup {
        return Err(Error::PinNotConfigured);
    }

    if matches_stored(&stored, pin) {
        let mut active: member::ActiveModel = member.into();
        active.failed_pin_attempts = Set(0);
        active.pin_lock_until = Set(None);
        active.last_pin_success = Set(Some(now));
        active.update(db).await?;
        return Ok(());
    }

    let attempts = member.failed_pin_attempts + 1;
    let mut active: member::ActiveModel = member.into();
    if attempts >= MAX_PIN_ATTEMPTS {
        active.failed_pin_attempts = Set(0);
        active.pin_lock_until = Set(Some(now + Duration::minutes(LOCKOUT_MINUTES)));
        active.update(db).await?;
        warn!(user_id, "PIN attempts exhausted, account locked");
        Err(Error::IncorrectPin {
            attempts_remaining: 0,
        })
    } else {
        active.failed_pin_attempts = Set(attempts);
        active.update(db).await?;
        Err(Error::IncorrectPin {
            attempts_remaining: MAX_PIN_ATTEMPTS - attempts,
        })
    }
}
