// Sale total recalculation
//
//   accessories_total = Σ quantity × unit_value
//   total_amount      = subtotal − discount_amount + tax_amount + accessories_total
//   commission_amount = round2(total_amount × commission_percentage / 100)
//
// Pure functions of their inputs: no dirty tracking, no clamping, safe to
// run any number of times on the same data.

use rust_decimal::Decimal;
use tracing::debug;

use crate::core::money;
use crate::modules::sales::models::{PricedAccessoryLine, Sale, SaleFinancials};

/// Derived financial fields of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub accessories_total: Decimal,
    pub total_amount: Decimal,
    pub commission_amount: Decimal,
}

/// A sale whose totals were produced by [`TotalsEngine::apply`].
///
/// Store write methods only accept this type, so a sale cannot be
/// persisted without passing through the engine first.
#[derive(Debug, Clone)]
pub struct RecalculatedSale {
    sale: Sale,
    totals: SaleTotals,
}

impl RecalculatedSale {
    pub fn sale(&self) -> &Sale {
        &self.sale
    }

    pub fn totals(&self) -> SaleTotals {
        self.totals
    }

    pub fn into_inner(self) -> Sale {
        self.sale
    }
}

/// Sums accessory lines
pub struct AccessoryAggregator;

impl AccessoryAggregator {
    /// Σ quantity × unit_value; lines with a missing accessory count as zero
    pub fn total(lines: &[PricedAccessoryLine]) -> Decimal {
        lines.iter().map(PricedAccessoryLine::line_total).sum()
    }
}

pub struct TotalsEngine;

impl TotalsEngine {
    /// Derive totals from the base fields and the current line set
    pub fn recalculate(financials: &SaleFinancials, lines: &[PricedAccessoryLine]) -> SaleTotals {
        let accessories_total = AccessoryAggregator::total(lines);

        let total_amount = financials.subtotal - financials.discount_amount
            + financials.tax_amount
            + accessories_total;

        let commission_amount = match financials.commission_percentage {
            Some(pct) if pct > Decimal::ZERO => money::percentage_of(total_amount, pct),
            _ => Decimal::ZERO,
        };

        SaleTotals {
            accessories_total,
            total_amount,
            commission_amount,
        }
    }

    /// Recalculate and stamp the totals onto the sale
    pub fn apply(mut sale: Sale, lines: &[PricedAccessoryLine]) -> RecalculatedSale {
        let totals = Self::recalculate(&sale.financials(), lines);
        sale.set_totals(totals.total_amount, totals.commission_amount);

        debug!(
            sale_id = sale.id,
            line_count = lines.len(),
            accessories_total = %totals.accessories_total,
            total_amount = %totals.total_amount,
            commission_amount = %totals.commission_amount,
            "Sale totals recalculated"
        );

        RecalculatedSale { sale, totals }
    }
}
