//! Rejected-payout refund reconciliation.
//!
//! When the external settlement process marks a payout entry rejected,
//! the promised money must flow back to the member exactly once. Each
//! refund runs in its own transaction that re-checks the
//! `refund_processed_at` marker before crediting, so a sweep that races
//! another sweep (or a retried run) never double-refunds. Refunds land in
//! the member's `refund_balance` ledger, not the mana balance, and emit a
//! notification record for external delivery.

use crate::{
    entities::{Member, PayoutQueue, member, notification, payout_queue},
    errors::Result,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{info, warn};

/// Outcome of one reconciliation sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    /// Entries refunded by this sweep
    pub refunded: usize,
    /// Total amount credited back
    pub total_amount: f64,
    /// Entries skipped because another run already refunded them
    pub skipped: usize,
    /// Entries left for manual review (e.g. missing member record)
    pub unresolved: usize,
}

/// Sweeps the payout queue and refunds every rejected entry that has not
/// been refunded yet.
///
/// Safe to run on any schedule and from multiple processes; idempotence
/// comes from the `refund_processed_at` marker checked inside the same
/// transaction as the credit.
pub async fn reconcile_rejected_payouts(db: &DatabaseConnection) -> Result<ReconcileReport> {
    let candidates = PayoutQueue::find()
        .filter(payout_queue::Column::Status.eq(payout_queue::STATUS_REJECTED))
        .filter(payout_queue::Column::RefundProcessedAt.is_null())
        .all(db)
        .await?;

    let mut report = ReconcileReport {
        refunded: 0,
        total_amount: 0.0,
        skipped: 0,
        unresolved: 0,
    };

    for candidate in candidates {
        let txn = db.begin().await?;

        // Re-read under the transaction; a concurrent sweep may have
        // refunded this entry since the candidate query
        let Some(entry) = PayoutQueue::find_by_id(candidate.id).one(&txn).await? else {
            report.skipped += 1;
            continue;
        };
        if entry.refund_processed_at.is_some() {
            report.skipped += 1;
            continue;
        }

        let member_exists = Member::find_by_id(&entry.user_id).one(&txn).await?.is_some();
        if !member_exists {
            warn!(
                payout_id = entry.id,
                user_id = %entry.user_id,
                "Rejected payout references missing member, leaving for manual review"
            );
            report.unresolved += 1;
            continue;
        }

        let now = Utc::now();
        let amount = entry.amount;
        let user_id = entry.user_id.clone();

        Member::update_many()
            .col_expr(
                member::Column::RefundBalance,
                Expr::col(member::Column::RefundBalance).add(amount),
            )
            .filter(member::Column::Id.eq(user_id.as_str()))
            .exec(&txn)
            .await?;

        let mut active: payout_queue::ActiveModel = entry.into();
        active.refund_processed_at = Set(Some(now));
        active.update(&txn).await?;

        let note = notification::ActiveModel {
            user_id: Set(user_id.clone()),
            kind: Set("payout_refunded".to_string()),
            message: Set(format!(
                "Your payout of {amount:.2} was rejected; the amount has been refunded to your account."
            )),
            created_at: Set(now),
            ..Default::default()
        };
        note.insert(&txn).await?;

        txn.commit().await?;
        report.refunded += 1;
        report.total_amount += amount;
        info!(payout_id = candidate.id, user_id = %user_id, amount, "Rejected payout refunded");
    }

    Ok(report)
}
