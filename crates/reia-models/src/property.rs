use serde::{Deserialize, Serialize};

/// A candidate investment property as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: String,
    pub address: String,
    pub purchase_price: f64,
    pub annual_rent: f64,
    pub operating_expenses: f64,
    /// Prevailing market cap rate for the area. Informational only.
    pub market_cap_rate: f64,
}

impl Property {
    /// Net operating income: annual rent minus operating expenses.
    pub fn noi(&self) -> f64 {
        self.annual_rent - self.operating_expenses
    }

    /// Capitalization rate as a percentage. Zero when the purchase price is not positive.
    pub fn cap_rate(&self) -> f64 {
        if self.purchase_price > 0.0 {
            self.noi() / self.purchase_price * 100.0
        } else {
            0.0
        }
    }

    /// Cash-on-cash return as a percentage, given the down payment as a
    /// percentage of the purchase price.
    pub fn cash_on_cash_return(&self, down_payment_percent: f64) -> f64 {
        let down_payment = self.purchase_price * down_payment_percent / 100.0;
        if down_payment > 0.0 {
            self.noi() / down_payment * 100.0
        } else {
            0.0
        }
    }

    /// Check the fields the analysis depends on. Returns a description of the
    /// first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("property id must not be empty".to_string());
        }
        let numeric = [
            ("purchase_price", self.purchase_price),
            ("annual_rent", self.annual_rent),
            ("operating_expenses", self.operating_expenses),
            ("market_cap_rate", self.market_cap_rate),
        ];
        for (field, value) in numeric {
            if !value.is_finite() {
                return Err(format!("{}: {field} is not a finite number", self.id));
            }
        }
        Ok(())
    }
}

/// The four-property portfolio used by the CLI `--demo` flag.
pub fn demo_portfolio() -> Vec<Property> {
    vec![
        Property {
            id: "PROP001".to_string(),
            address: "123 Main St, Downtown".to_string(),
            purchase_price: 500_000.0,
            annual_rent: 60_000.0,
            operating_expenses: 15_000.0,
            market_cap_rate: 0.06,
        },
        Property {
            id: "PROP002".to_string(),
            address: "456 Oak Ave, Suburbs".to_string(),
            purchase_price: 750_000.0,
            annual_rent: 90_000.0,
            operating_expenses: 20_000.0,
            market_cap_rate: 0.05,
        },
        Property {
            id: "PROP003".to_string(),
            address: "789 Pine Rd, University Area".to_string(),
            purchase_price: 350_000.0,
            annual_rent: 48_000.0,
            operating_expenses: 12_000.0,
            market_cap_rate: 0.07,
        },
        Property {
            id: "PROP004".to_string(),
            address: "321 Elm St, Business District".to_string(),
            purchase_price: 1_200_000.0,
            annual_rent: 144_000.0,
            operating_expenses: 36_000.0,
            market_cap_rate: 0.045,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn property(price: f64, rent: f64, expenses: f64) -> Property {
        Property {
            id: "P".to_string(),
            address: "1 Test Way".to_string(),
            purchase_price: price,
            annual_rent: rent,
            operating_expenses: expenses,
            market_cap_rate: 0.05,
        }
    }

    #[test]
    fn noi_and_cap_rate() {
        let p = property(500_000.0, 60_000.0, 15_000.0);
        assert_eq!(p.noi(), 45_000.0);
        assert!((p.cap_rate() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn cap_rate_zero_for_non_positive_price() {
        assert_eq!(property(0.0, 60_000.0, 15_000.0).cap_rate(), 0.0);
        assert_eq!(property(-10.0, 60_000.0, 15_000.0).cap_rate(), 0.0);
    }

    #[test]
    fn cash_on_cash_with_twenty_percent_down() {
        let p = property(500_000.0, 60_000.0, 15_000.0);
        assert!((p.cash_on_cash_return(20.0) - 45.0).abs() < 1e-9);
        assert_eq!(p.cash_on_cash_return(0.0), 0.0);
    }

    #[test]
    fn validate_rejects_blank_id_and_nan() {
        let mut p = property(1.0, 1.0, 1.0);
        p.id = "  ".to_string();
        assert!(p.validate().is_err());

        let mut p = property(1.0, f64::NAN, 1.0);
        p.id = "X".to_string();
        let err = p.validate().unwrap_err();
        assert!(err.contains("annual_rent"));
    }

    #[test]
    fn demo_portfolio_cap_rates() {
        let rates: Vec<f64> = demo_portfolio().iter().map(Property::cap_rate).collect();
        assert!((rates[0] - 9.0).abs() < 1e-9);
        assert!((rates[1] - 9.333_333).abs() < 1e-4);
        assert!((rates[2] - 10.285_714).abs() < 1e-4);
        assert_eq!(rates[0], rates[3]);
    }

    #[test]
    fn deserialize_from_caller_json() {
        let json = r#"{
            "id": "PROP009",
            "address": "9 Harbor Rd",
            "purchase_price": 420000,
            "annual_rent": 39000,
            "operating_expenses": 9000,
            "market_cap_rate": 0.055
        }"#;
        let p: Property = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, "PROP009");
        assert_eq!(p.noi(), 30_000.0);
    }

    proptest! {
        #[test]
        fn cap_rate_matches_formula(
            price in 1.0f64..10_000_000.0,
            rent in 0.0f64..2_000_000.0,
            expenses in 0.0f64..2_000_000.0,
        ) {
            let p = property(price, rent, expenses);
            prop_assert_eq!(p.cap_rate(), (rent - expenses) / price * 100.0);
        }
    }
}
