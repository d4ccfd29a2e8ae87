use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{PawnError, Result};
use crate::types::Metal;

/// weight precision in grams (milligram)
const WEIGHT_SCALE: u32 = 3;

/// one pledged line on a loan ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralItem {
    pub id: Uuid,
    pub qty: u32,
    pub item_name: String,
    pub metal: Metal,
    /// gross weight in grams
    pub weight: Decimal,
    /// purity as a percentage (91.6 for 22 carat)
    pub purity_percent: Decimal,
    /// weight of pure metal in grams
    pub fine_weight: Decimal,
    /// value agreed at the counter
    pub value: Money,
}

impl CollateralItem {
    pub fn new(
        qty: u32,
        item_name: impl Into<String>,
        metal: Metal,
        weight: Decimal,
        purity_percent: Decimal,
        value: Money,
    ) -> Result<Self> {
        let item_name = item_name.into();

        if qty == 0 {
            return Err(invalid(format!("{item_name}: quantity must be at least 1")));
        }
        if item_name.trim().is_empty() {
            return Err(invalid("item name cannot be empty".to_string()));
        }
        if weight <= Decimal::ZERO {
            return Err(invalid(format!("{item_name}: weight must be positive")));
        }
        if purity_percent <= Decimal::ZERO || purity_percent > Decimal::ONE_HUNDRED {
            return Err(invalid(format!(
                "{item_name}: purity must be within (0, 100], got {purity_percent}"
            )));
        }
        if value.is_negative() {
            return Err(invalid(format!("{item_name}: value cannot be negative")));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            qty,
            item_name,
            metal,
            weight,
            purity_percent,
            fine_weight: fine_weight(weight, purity_percent),
            value,
        })
    }

    /// value the pure metal content at today's rates
    pub fn appraise(&self, rates: &MetalRates) -> Money {
        Money::from_decimal(self.fine_weight * rates.per_gram(self.metal).as_decimal())
    }
}

/// pure-metal weight, rounded to the milligram
pub fn fine_weight(weight: Decimal, purity_percent: Decimal) -> Decimal {
    (weight * purity_percent / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(WEIGHT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// counter rates per gram of pure metal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetalRates {
    pub gold_per_gram: Money,
    pub silver_per_gram: Money,
}

impl MetalRates {
    pub fn per_gram(&self, metal: Metal) -> Money {
        match metal {
            Metal::Gold => self.gold_per_gram,
            Metal::Silver => self.silver_per_gram,
        }
    }

    pub fn appraise(&self, item: &CollateralItem) -> Money {
        item.appraise(self)
    }
}

/// totals over all items pledged on a loan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CollateralSummary {
    pub item_count: usize,
    pub gross_weight: Decimal,
    pub gold_fine_weight: Decimal,
    pub silver_fine_weight: Decimal,
    pub declared_value: Money,
}

impl CollateralSummary {
    pub fn from_items(items: &[CollateralItem]) -> Self {
        items.iter().fold(Self::default(), |mut summary, item| {
            summary.item_count += 1;
            summary.gross_weight += item.weight;
            match item.metal {
                Metal::Gold => summary.gold_fine_weight += item.fine_weight,
                Metal::Silver => summary.silver_fine_weight += item.fine_weight,
            }
            summary.declared_value += item.value;
            summary
        })
    }

    /// value of the pledge at metal rates; falls back to declared value without rates
    pub fn market_value(&self, rates: Option<&MetalRates>) -> Money {
        match rates {
            Some(rates) => Money::from_decimal(
                self.gold_fine_weight * rates.gold_per_gram.as_decimal()
                    + self.silver_fine_weight * rates.silver_per_gram.as_decimal(),
            ),
            None => self.declared_value,
        }
    }
}

fn invalid(message: String) -> PawnError {
    PawnError::InvalidCollateral { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rates() -> MetalRates {
        MetalRates {
            gold_per_gram: Money::from_major(6_000),
            silver_per_gram: Money::from_major(75),
        }
    }

    #[test]
    fn test_fine_weight_from_purity() {
        let chain = CollateralItem::new(1, "Chain", Metal::Gold, dec!(10), dec!(91.6), Money::from_major(50_000))
            .unwrap();
        assert_eq!(chain.fine_weight, dec!(9.160));

        assert_eq!(fine_weight(dec!(12.345), dec!(75)), dec!(9.259));
    }

    #[test]
    fn test_appraise_by_metal() {
        let ring = CollateralItem::new(2, "Ring", Metal::Gold, dec!(5), dec!(100), Money::ZERO).unwrap();
        let anklet = CollateralItem::new(1, "Anklet", Metal::Silver, dec!(40), dec!(80), Money::ZERO).unwrap();

        assert_eq!(ring.appraise(&rates()), Money::from_major(30_000));
        assert_eq!(anklet.appraise(&rates()), Money::from_major(2_400));
        assert_eq!(rates().appraise(&ring), ring.appraise(&rates()));
    }

    #[test]
    fn test_item_validation() {
        let bad = [
            CollateralItem::new(0, "Ring", Metal::Gold, dec!(5), dec!(91.6), Money::ZERO),
            CollateralItem::new(1, " ", Metal::Gold, dec!(5), dec!(91.6), Money::ZERO),
            CollateralItem::new(1, "Ring", Metal::Gold, dec!(0), dec!(91.6), Money::ZERO),
            CollateralItem::new(1, "Ring", Metal::Gold, dec!(5), dec!(101), Money::ZERO),
            CollateralItem::new(1, "Ring", Metal::Gold, dec!(5), dec!(0), Money::ZERO),
            CollateralItem::new(1, "Ring", Metal::Gold, dec!(5), dec!(91.6), Money::from_major(-1)),
        ];

        for result in bad {
            assert!(matches!(result, Err(PawnError::InvalidCollateral { .. })));
        }
    }

    #[test]
    fn test_summary_splits_metals() {
        let items = vec![
            CollateralItem::new(1, "Bangle", Metal::Gold, dec!(20), dec!(91.6), Money::from_major(90_000)).unwrap(),
            CollateralItem::new(1, "Coin", Metal::Gold, dec!(8), dec!(99.9), Money::from_major(45_000)).unwrap(),
            CollateralItem::new(3, "Toe ring", Metal::Silver, dec!(15), dec!(70), Money::from_major(800)).unwrap(),
        ];

        let summary = CollateralSummary::from_items(&items);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.gross_weight, dec!(43));
        assert_eq!(summary.gold_fine_weight, dec!(26.312));
        assert_eq!(summary.silver_fine_weight, dec!(10.5));
        assert_eq!(summary.declared_value, Money::from_major(135_800));

        assert_eq!(summary.market_value(None), Money::from_major(135_800));
        // 26.312 * 6000 + 10.5 * 75
        assert_eq!(summary.market_value(Some(&rates())), Money::from_str_exact("158659.5").unwrap());
    }
}
