//! KYC verification gate.
//!
//! A pure predicate over a member record's verification status. KYC
//! submission and approval are owned by an external system; this module
//! only decides whether a given member may withdraw.

use crate::entities::member;

/// Statuses that permit withdrawal.
const ALLOWED_STATUSES: [&str; 2] = ["VERIFIED", "APPROVED"];

/// Outcome of the KYC gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KycDecision {
    /// Whether withdrawal is permitted
    pub allowed: bool,
    /// Denial reason embedding the current status, None when allowed
    pub reason: Option<String>,
}

/// Decides whether a member may withdraw based on their KYC status.
///
/// Allowed iff the status (case-insensitively) is `VERIFIED` or
/// `APPROVED`; any other status is denied with the current status
/// embedded in the reason so the UI can render it.
#[must_use]
pub fn can_withdraw(member: &member::Model) -> KycDecision {
    let status = member.kyc_status.trim().to_uppercase();
    if ALLOWED_STATUSES.contains(&status.as_str()) {
        KycDecision {
            allowed: true,
            reason: None,
        }
    } else {
        KycDecision {
            allowed: false,
            reason: Some(format!(
                "KYC verification required before withdrawal (current status: {})",
                member.kyc_status
            )),
        }
    }
}
