use crate::utils::error::{EtlError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,
    #[serde(rename = "Rate")]
    rate: String,
}

/// Currency code to multiplier. Keys are stored upper-case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, Decimal>,
}

impl RateTable {
    /// Parses a delimited file with `Currency` and `Rate` header columns.
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut rates = HashMap::new();
        for (line, row) in reader.deserialize::<RateRow>().enumerate() {
            let row = row.map_err(|e| EtlError::parse(format!("rate table row {}: {}", line + 1, e)))?;
            let rate = parse_rate(&row.rate).ok_or_else(|| {
                EtlError::parse(format!(
                    "rate table row {}: '{}' is not a positive rate for {}",
                    line + 1,
                    row.rate,
                    row.currency
                ))
            })?;
            rates.insert(row.currency.to_uppercase(), rate);
        }

        if rates.is_empty() {
            return Err(EtlError::parse("rate table is empty"));
        }
        tracing::debug!("Loaded {} exchange rates", rates.len());
        Ok(Self { rates })
    }

    pub fn rate(&self, code: &str) -> Result<Decimal> {
        self.rates
            .get(&code.to_uppercase())
            .copied()
            .ok_or_else(|| EtlError::UnknownRateError {
                code: code.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

fn parse_rate(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .filter(|rate| rate.is_sign_positive() && !rate.is_zero())
}

impl<K: AsRef<str>> FromIterator<(K, Decimal)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (K, Decimal)>>(iter: I) -> Self {
        Self {
            rates: iter
                .into_iter()
                .map(|(code, rate)| (code.as_ref().to_uppercase(), rate))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exchange_rate_csv() {
        let table = RateTable::from_csv("Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rate("EUR").unwrap(), Decimal::new(93, 2));
        assert_eq!(table.rate("inr").unwrap(), Decimal::new(8295, 2));
    }

    #[test]
    fn test_codes_are_uppercased_and_extra_columns_ignored() {
        let table =
            RateTable::from_csv("Country, Currency , Rate\nEurozone, eur , 0.93\n").unwrap();
        assert_eq!(table.rate("EUR").unwrap(), Decimal::new(93, 2));
    }

    #[test]
    fn test_unknown_code_is_error() {
        let table: RateTable = [("EUR", Decimal::new(93, 2))].into_iter().collect();
        let err = table.rate("JPY").unwrap_err();
        assert!(matches!(err, EtlError::UnknownRateError { ref code } if code == "JPY"));
    }

    #[test]
    fn test_malformed_rate_is_parse_error() {
        let err = RateTable::from_csv("Currency,Rate\nEUR,abc\n").unwrap_err();
        assert!(matches!(err, EtlError::ParseError { .. }));

        let err = RateTable::from_csv("Code,Value\nEUR,0.9\n").unwrap_err();
        assert!(matches!(err, EtlError::ParseError { .. }));
    }

    #[test]
    fn test_non_finite_or_non_positive_rate_is_parse_error() {
        for bad in ["NaN", "inf", "-inf", "0", "-0.93"] {
            let err = RateTable::from_csv(&format!("Currency,Rate\nEUR,{}\n", bad)).unwrap_err();
            assert!(matches!(err, EtlError::ParseError { .. }), "accepted rate {bad}");
        }
    }

    #[test]
    fn test_rate_keeps_its_decimal_digits() {
        let table = RateTable::from_csv("Currency,Rate\nEUR,0.1\nJPY,1.5e2\n").unwrap();
        assert_eq!(table.rate("EUR").unwrap().to_string(), "0.1");
        assert_eq!(table.rate("JPY").unwrap(), Decimal::new(150, 0));
    }
}
