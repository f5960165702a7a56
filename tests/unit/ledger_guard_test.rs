// Payment ledger guard: boundary and status derivation

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tourdesk::core::AppError;
use tourdesk::modules::sales::models::PaymentStatus;
use tourdesk::modules::sales::services::LedgerGuard;

fn cents(max: i64) -> impl Strategy<Value = Decimal> {
    (0..=max).prop_map(|c| Decimal::new(c, 2))
}

#[test]
fn test_payment_up_to_total_is_accepted() {
    assert!(LedgerGuard::ensure_payment_fits(1, dec!(50.00), dec!(60.00), dec!(110.00)).is_ok());
}

#[test]
fn test_one_cent_over_total_is_rejected() {
    let err = LedgerGuard::ensure_payment_fits(1, dec!(110.00), dec!(0.01), dec!(110.00))
        .unwrap_err();
    assert!(matches!(err, AppError::InvariantViolation(_)));
    assert!(err.to_string().contains("110.01"));
}

#[test]
fn test_total_edit_below_paid_is_rejected() {
    assert!(
        LedgerGuard::ensure_total_covers_paid(1, dec!(100.00), dec!(120.00), dec!(100.00)).is_ok()
    );

    let err = LedgerGuard::ensure_total_covers_paid(1, dec!(100.00), dec!(120.00), dec!(99.99))
        .unwrap_err();
    assert!(matches!(err, AppError::InvariantViolation(_)));
}

#[test]
fn test_edit_that_keeps_an_underwater_total_is_allowed() {
    // Live total already fell under the paid amount; the edit leaves it there
    assert!(
        LedgerGuard::ensure_total_covers_paid(1, dec!(110.00), dec!(105.00), dec!(105.00)).is_ok()
    );
    // Raising it is fine too
    assert!(
        LedgerGuard::ensure_total_covers_paid(1, dec!(110.00), dec!(105.00), dec!(107.00)).is_ok()
    );
    // Lowering it further is not
    assert!(
        LedgerGuard::ensure_total_covers_paid(1, dec!(110.00), dec!(105.00), dec!(104.99)).is_err()
    );
}

#[test]
fn test_payment_status_progression() {
    let total = dec!(110.00);

    assert_eq!(
        LedgerGuard::payment_status(PaymentStatus::Pending, Decimal::ZERO, total),
        PaymentStatus::Pending
    );
    assert_eq!(
        LedgerGuard::payment_status(PaymentStatus::Pending, dec!(50.00), total),
        PaymentStatus::Partial
    );
    assert_eq!(
        LedgerGuard::payment_status(PaymentStatus::Partial, dec!(110.00), total),
        PaymentStatus::Paid
    );
}

#[test]
fn test_nothing_paid_derives_pending() {
    let total = dec!(110.00);

    for current in [PaymentStatus::Pending, PaymentStatus::Partial, PaymentStatus::Paid] {
        assert_eq!(
            LedgerGuard::payment_status(current, Decimal::ZERO, total),
            PaymentStatus::Pending
        );
    }
    assert_eq!(
        LedgerGuard::payment_status(PaymentStatus::Overdue, Decimal::ZERO, total),
        PaymentStatus::Overdue
    );
}

#[test]
fn test_cancelled_payment_status_is_sticky() {
    assert_eq!(
        LedgerGuard::payment_status(PaymentStatus::Cancelled, dec!(110.00), dec!(110.00)),
        PaymentStatus::Cancelled
    );
}

#[test]
fn test_raised_total_reopens_paid_sale() {
    assert_eq!(
        LedgerGuard::payment_status(PaymentStatus::Paid, dec!(110.00), dec!(125.00)),
        PaymentStatus::Partial
    );
}

proptest! {
    #[test]
    fn accepted_payments_never_exceed_total(
        total in cents(1_000_000),
        attempts in prop::collection::vec(cents(200_000), 1..20),
    ) {
        let mut paid = Decimal::ZERO;
        for amount in attempts {
            if LedgerGuard::ensure_payment_fits(1, paid, amount, total).is_ok() {
                paid += amount;
            }
            prop_assert!(paid <= total);
        }
    }

    #[test]
    fn guard_accepts_exactly_the_remaining_balance(
        total in cents(1_000_000),
        paid_share in 0u32..=100,
    ) {
        let paid = (total * Decimal::from(paid_share) / dec!(100)).round_dp(2).min(total);
        let remaining = total - paid;

        prop_assert!(LedgerGuard::ensure_payment_fits(1, paid, remaining, total).is_ok());
        prop_assert!(
            LedgerGuard::ensure_payment_fits(1, paid, remaining + dec!(0.01), total).is_err()
        );
    }
}
