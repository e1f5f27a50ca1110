use serde::{Deserialize, Serialize};

/// Settlement method for a transaction (closed set).
///
/// `Leke` (account transfer) and `Mobile` behave identically at checkout:
/// received amount is fixed to the subtotal and change is zero. They stay
/// distinct variants so history and statistics keep the original tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Leke,
    Mobile,
}

impl PaymentMethod {
    /// Cash is the only method that takes a manually entered amount.
    pub fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Leke => "leke",
            PaymentMethod::Mobile => "mobile",
        }
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a cash-received input field into the smallest currency unit.
///
/// Non-numeric input coerces to 0 (the shortfall is then reported as
/// insufficient funds, not as a parse error). Negative input clamps to 0;
/// fractional input truncates.
pub fn parse_cash_input(input: &str) -> u64 {
    let value = input.trim().parse::<f64>().unwrap_or(0.0);
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cash_input_parses_plain_numbers() {
        assert_eq!(parse_cash_input("200"), 200);
        assert_eq!(parse_cash_input(" 130 "), 130);
        assert_eq!(parse_cash_input("99.9"), 99);
    }

    #[test]
    fn cash_input_coerces_garbage_to_zero() {
        assert_eq!(parse_cash_input(""), 0);
        assert_eq!(parse_cash_input("abc"), 0);
        assert_eq!(parse_cash_input("-50"), 0);
        assert_eq!(parse_cash_input("NaN"), 0);
    }

    #[test]
    fn only_cash_takes_a_manual_amount() {
        assert!(PaymentMethod::Cash.is_cash());
        assert!(!PaymentMethod::Leke.is_cash());
        assert!(!PaymentMethod::Mobile.is_cash());
    }
}
