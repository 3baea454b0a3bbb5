//! Core business logic - framework-agnostic contract, distribution,
//! reward, PIN and KYC operations.

/// Donation contract lifecycle and withdrawal eligibility
pub mod contract;
/// Pooled withdrawal distribution across contracts and reward balance
pub mod distribution;
/// KYC verification gate
pub mod kyc;
/// Transaction PIN setup, verification and lockout
pub mod pin;
/// Rejected-payout refund reconciliation
pub mod reconciler;
/// Shared reward pool claims
pub mod reward;
