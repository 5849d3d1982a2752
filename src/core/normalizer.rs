use crate::core::rates::RateTable;
use crate::domain::model::{ColumnSpec, Field, NormalizedRecord, RawRecord, ResultSet, Value};
use crate::utils::error::{EtlError, Result};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Decimal places kept on every numeric value.
pub const PRECISION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rescale {
    /// The primary field is divided by this, e.g. 1000 for millions to billions.
    pub factor: f64,
    /// Output name for the primary field once rescaled.
    #[serde(default)]
    pub rename_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTarget {
    pub code: String,
    /// Name of the derived output field.
    pub field: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeSpec {
    pub primary_field: String,
    pub rescale: Option<Rescale>,
    pub currencies: Vec<CurrencyTarget>,
}

/// Rounds half away from zero to `PRECISION` decimals.
///
/// Works on the decimal value, so `1.005` becomes `1.01` whatever its
/// nearest binary float happens to be.
pub fn round_to_precision(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

/// Parses cleaned numeric text as an exact decimal.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn to_real(value: Decimal, field: &str, record: usize) -> Result<Value> {
    round_to_precision(value)
        .to_f64()
        .map(Value::Real)
        .ok_or_else(|| EtlError::MalformedNumberError {
            field: field.to_string(),
            value: value.to_string(),
            record,
        })
}

fn overflow(field: &str, record: usize) -> EtlError {
    EtlError::parse(format!("numeric overflow in field '{}' at record {}", field, record))
}

/// Parses, rescales, converts and rounds the numeric fields of every record.
///
/// All-or-nothing: any failure aborts with no partial output.
pub fn normalize(
    records: Vec<RawRecord>,
    columns: &ColumnSpec,
    spec: &NormalizeSpec,
    rates: Option<&RateTable>,
) -> Result<ResultSet> {
    let primary = columns.get(&spec.primary_field).ok_or_else(|| {
        EtlError::config(format!("primary field '{}' is not a column", spec.primary_field))
    })?;
    if !primary.numeric {
        return Err(EtlError::config(format!(
            "primary field '{}' must be numeric",
            spec.primary_field
        )));
    }

    let divisor = match &spec.rescale {
        Some(rescale) if !(rescale.factor.is_finite() && rescale.factor > 0.0) => {
            return Err(EtlError::config(format!(
                "rescale factor must be positive, got {}",
                rescale.factor
            )));
        }
        Some(rescale) => Decimal::from_f64(rescale.factor).ok_or_else(|| {
            EtlError::config(format!("rescale factor {} is out of range", rescale.factor))
        })?,
        None => Decimal::ONE,
    };

    // Resolve every rate up front so an unknown code fails before any work.
    let multipliers: Vec<Decimal> = match (rates, spec.currencies.is_empty()) {
        (_, true) => Vec::new(),
        (Some(table), false) => spec
            .currencies
            .iter()
            .map(|target| table.rate(&target.code))
            .collect::<Result<_>>()?,
        (None, false) => {
            return Err(EtlError::config(
                "currency targets are configured but no rate table was supplied",
            ));
        }
    };

    let fields = output_fields(columns, spec);
    let mut normalized = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let mut values = Vec::with_capacity(fields.len());
        let mut primary_value = Decimal::ZERO;

        for (column, (name, text)) in columns.columns().iter().zip(record.into_fields()) {
            if column.name != name {
                return Err(EtlError::parse(format!(
                    "record {} has field '{}' where '{}' was expected",
                    index, name, column.name
                )));
            }
            if !column.numeric {
                values.push(Value::Text(text));
                continue;
            }

            let mut value = parse_decimal(&text).ok_or_else(|| EtlError::MalformedNumberError {
                field: name.clone(),
                value: text.clone(),
                record: index,
            })?;
            if name == spec.primary_field {
                value = value
                    .checked_div(divisor)
                    .ok_or_else(|| overflow(&name, index))?;
                primary_value = value;
            }
            values.push(to_real(value, &name, index)?);
        }

        for (target, multiplier) in spec.currencies.iter().zip(&multipliers) {
            let derived = primary_value
                .checked_mul(*multiplier)
                .ok_or_else(|| overflow(&target.field, index))?;
            values.push(to_real(derived, &target.field, index)?);
        }

        normalized.push(NormalizedRecord::new(values));
    }

    tracing::info!(
        "Normalized {} records ({} derived fields)",
        normalized.len(),
        multipliers.len()
    );
    ResultSet::new(fields, normalized)
}

/// Output schema: configured columns in order, derived currency fields appended.
pub fn output_fields(columns: &ColumnSpec, spec: &NormalizeSpec) -> Vec<Field> {
    let renamed = spec.rescale.as_ref().and_then(|r| r.rename_to.as_deref());

    columns
        .columns()
        .iter()
        .map(|column| {
            let name = match renamed {
                Some(new_name) if column.name == spec.primary_field => new_name.to_string(),
                _ => column.name.clone(),
            };
            if column.numeric {
                Field::real(name)
            } else {
                Field::text(name)
            }
        })
        .chain(spec.currencies.iter().map(|target| Field::real(target.field.clone())))
        .collect()
}
