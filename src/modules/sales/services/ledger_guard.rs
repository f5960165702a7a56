use rust_decimal::Decimal;
use tracing::warn;

use crate::core::{AppError, Result};
use crate::modules::sales::models::PaymentStatus;

/// Keeps Σ payments ≤ total_amount.
///
/// Comparisons are exact; amounts are already validated to cents.
pub struct LedgerGuard;

impl LedgerGuard {
    /// Check before inserting a new payment
    pub fn ensure_payment_fits(
        sale_id: i64,
        paid_amount: Decimal,
        new_amount: Decimal,
        total_amount: Decimal,
    ) -> Result<()> {
        let after = paid_amount + new_amount;
        if after > total_amount {
            warn!(
                sale_id = sale_id,
                paid_amount = %paid_amount,
                new_amount = %new_amount,
                total_amount = %total_amount,
                "Payment would exceed sale total"
            );
            return Err(AppError::invariant(format!(
                "Payment of {} would bring paid amount to {}, exceeding sale total {}",
                new_amount, after, total_amount
            )));
        }
        Ok(())
    }

    /// Check after a sale edit. The edit may not push the total below what
    /// was already paid. `baseline_total` is the live total just before the
    /// edit; a total already under the paid amount (a catalog price drop)
    /// does not block edits that leave it where it is.
    pub fn ensure_total_covers_paid(
        sale_id: i64,
        paid_amount: Decimal,
        baseline_total: Decimal,
        total_amount: Decimal,
    ) -> Result<()> {
        if paid_amount > total_amount && total_amount < baseline_total {
            warn!(
                sale_id = sale_id,
                paid_amount = %paid_amount,
                baseline_total = %baseline_total,
                total_amount = %total_amount,
                "Sale edit would drop total below paid amount"
            );
            return Err(AppError::invariant(format!(
                "Sale total {} would fall below the {} already paid",
                total_amount, paid_amount
            )));
        }
        Ok(())
    }

    /// Settlement state implied by the paid amount.
    ///
    /// `Cancelled` is sticky. With nothing paid the sale is `Pending`, or
    /// stays `Overdue` when it was flagged so.
    pub fn payment_status(
        current: PaymentStatus,
        paid_amount: Decimal,
        total_amount: Decimal,
    ) -> PaymentStatus {
        if current == PaymentStatus::Cancelled {
            return current;
        }

        if paid_amount <= Decimal::ZERO {
            match current {
                PaymentStatus::Overdue => PaymentStatus::Overdue,
                _ => PaymentStatus::Pending,
            }
        } else if paid_amount >= total_amount {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }
}
