//! Unified error types for the withdrawal engine.
//!
//! Business rejections (invalid amounts, lockouts, depleted pools, ...) are
//! modeled as distinct variants so callers can map each to a stable
//! user-facing message. Infrastructure failures (database, I/O) are kept
//! separate; only those are candidates for caller-side retry with backoff.

use thiserror::Error;

/// All error conditions produced by the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or parsing failure
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Non-positive or non-finite monetary amount
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Referenced donation contract does not exist
    #[error("Donation contract not found: {id}")]
    ContractNotFound {
        /// Identifier used in the lookup
        id: String,
    },

    /// Referenced member record does not exist
    #[error("Member not found: {id}")]
    UserNotFound {
        /// Identifier used in the lookup
        id: String,
    },

    /// Operation attempted against a contract in the wrong lifecycle state
    #[error("Invalid contract state: {current}")]
    InvalidState {
        /// The contract's current status
        current: String,
    },

    /// Actor does not own the resource being mutated
    #[error("Not authorized to operate on this resource")]
    Unauthorized,

    /// PIN is not exactly six digits
    #[error("PIN must be exactly 6 digits")]
    InvalidPinFormat,

    /// Member has not completed PIN setup
    #[error("Transaction PIN has not been set up")]
    PinNotConfigured,

    /// PIN did not match the stored hash
    #[error("Incorrect PIN ({attempts_remaining} attempts remaining)")]
    IncorrectPin {
        /// Failures left before the account locks
        attempts_remaining: i32,
    },

    /// Too many consecutive PIN failures
    #[error("Account locked, try again in {minutes_remaining} minutes")]
    AccountLocked {
        /// Minutes until the lock expires
        minutes_remaining: i64,
    },

    /// Withdrawal blocked by the KYC verification gate
    #[error("KYC verification required (current status: {status})")]
    KycRequired {
        /// The member's current KYC status string
        status: String,
    },

    /// Contract is not currently eligible for withdrawal
    #[error("Withdrawal not available: {reason}")]
    WithdrawalNotAvailable {
        /// Eligibility reason, identical across single and pooled paths
        reason: String,
    },

    /// Requested amount exceeds computed availability
    #[error("Insufficient funds: requested {requested:.2}, available {available:.2}")]
    InsufficientFunds {
        /// Total withdrawable amount at evaluation time
        available: f64,
        /// The amount the caller asked for
        requested: f64,
    },

    /// No active reward campaign exists
    #[error("No active reward campaign")]
    NoActiveReward,

    /// Member already claimed a mana reward today
    #[error("Reward already claimed today")]
    AlreadyClaimedToday,

    /// Submitted secret code does not match the active campaign
    #[error("Invalid reward code")]
    InvalidCode,

    /// The active campaign's code has expired
    #[error("Reward code has expired")]
    CodeExpired,

    /// The reward pool has been fully claimed
    #[error("Reward pool is depleted")]
    PoolDepleted,
}

// Convenience `Result` type
/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
