//! Rental amount calculation by billing modality.
//!
//! `monto` is computed once per save from the proposed fields, falling back
//! to the stored record for anything the edit did not touch. The calculation
//! never fails: malformed input degrades to zero and is reported as a
//! [`PricingWarning`] instead.

use crate::domain::types::{Amount, BillingModality};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// A numeric input as found in a stored or proposed document.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericField {
    Number(Decimal),
    Null,
    /// Anything that could not be read as a number, kept verbatim
    Invalid(String),
}

impl NumericField {
    pub fn number(value: impl Into<Decimal>) -> Self {
        NumericField::Number(value.into())
    }

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => NumericField::Null,
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return NumericField::Number(Decimal::from(i));
                }
                parse_decimal(&n.to_string())
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64))
                    .map(NumericField::Number)
                    .unwrap_or_else(|| NumericField::Invalid(n.to_string()))
            }
            Value::String(s) if s.trim().is_empty() => NumericField::Null,
            Value::String(s) => parse_decimal(&s.trim().replace(',', ""))
                .map(NumericField::Number)
                .unwrap_or_else(|| NumericField::Invalid(s.clone())),
            other => NumericField::Invalid(other.to_string()),
        }
    }

    pub fn value_or_zero(&self) -> Decimal {
        match self {
            NumericField::Number(d) => *d,
            NumericField::Null | NumericField::Invalid(_) => Decimal::ZERO,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, NumericField::Null)
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .ok()
        .or_else(|| Decimal::from_scientific(raw).ok())
}

impl From<Decimal> for NumericField {
    fn from(value: Decimal) -> Self {
        NumericField::Number(value)
    }
}

impl Serialize for NumericField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NumericField::Number(d) => Serialize::serialize(d, serializer),
            NumericField::Null => serializer.serialize_none(),
            NumericField::Invalid(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for NumericField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(NumericField::from_value(&value))
    }
}

/// Keeps an explicit `null` apart from a missing key: a missing key
/// deserializes to `None` through `#[serde(default)]`, a present one always
/// lands here.
fn present<'de, D>(deserializer: D) -> Result<Option<NumericField>, D::Error>
where
    D: Deserializer<'de>,
{
    NumericField::deserialize(deserializer).map(Some)
}

fn present_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    crate::domain::types::lenient::text(deserializer)
}

/// Pricing inputs of a rental. Every field is optional so the same type
/// describes a full stored record and a partial edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RentalFields {
    #[serde(
        rename = "modalidad_facturacion",
        default,
        deserialize_with = "present_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub modality: Option<String>,

    #[serde(
        rename = "horas",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub hours: Option<NumericField>,

    #[serde(
        rename = "precio_por_hora",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub price_per_hour: Option<NumericField>,

    #[serde(
        rename = "volumen_generado",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub volume: Option<NumericField>,

    #[serde(
        rename = "precio_por_unidad",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub price_per_unit: Option<NumericField>,

    /// Informational label (m3, viajes, ...), never part of the arithmetic
    #[serde(
        rename = "unidad_volumen",
        default,
        deserialize_with = "present_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub volume_unit: Option<String>,

    #[serde(
        rename = "monto_fijo",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub fixed_amount: Option<NumericField>,
}

impl RentalFields {
    pub fn hourly(hours: impl Into<Decimal>, price_per_hour: impl Into<Decimal>) -> Self {
        Self {
            modality: Some(BillingModality::Hours.to_string()),
            hours: Some(NumericField::number(hours)),
            price_per_hour: Some(NumericField::number(price_per_hour)),
            ..Self::default()
        }
    }

    pub fn by_volume(
        volume: impl Into<Decimal>,
        price_per_unit: impl Into<Decimal>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            modality: Some(BillingModality::Volume.to_string()),
            volume: Some(NumericField::number(volume)),
            price_per_unit: Some(NumericField::number(price_per_unit)),
            volume_unit: Some(unit.into()),
            ..Self::default()
        }
    }

    pub fn fixed(amount: impl Into<Decimal>) -> Self {
        Self {
            modality: Some(BillingModality::Fixed.to_string()),
            fixed_amount: Some(NumericField::number(amount)),
            ..Self::default()
        }
    }

    /// Stored modality, `horas` when missing or unknown.
    pub fn modality(&self) -> BillingModality {
        self.modality
            .as_deref()
            .and_then(BillingModality::parse_lenient)
            .unwrap_or_default()
    }

    /// Numeric value of `horas`, zero when unset.
    pub fn hours_value(&self) -> Decimal {
        self.hours
            .as_ref()
            .map(NumericField::value_or_zero)
            .unwrap_or_default()
    }

    pub fn volume_value(&self) -> Decimal {
        self.volume
            .as_ref()
            .map(NumericField::value_or_zero)
            .unwrap_or_default()
    }

    /// Fields present in `changes` replace ours; the rest are kept.
    pub fn overlay(&self, changes: &RentalFields) -> RentalFields {
        RentalFields {
            modality: changes.modality.clone().or_else(|| self.modality.clone()),
            hours: changes.hours.clone().or_else(|| self.hours.clone()),
            price_per_hour: changes
                .price_per_hour
                .clone()
                .or_else(|| self.price_per_hour.clone()),
            volume: changes.volume.clone().or_else(|| self.volume.clone()),
            price_per_unit: changes
                .price_per_unit
                .clone()
                .or_else(|| self.price_per_unit.clone()),
            volume_unit: changes
                .volume_unit
                .clone()
                .or_else(|| self.volume_unit.clone()),
            fixed_amount: changes
                .fixed_amount
                .clone()
                .or_else(|| self.fixed_amount.clone()),
        }
    }
}

/// Degraded input noticed while pricing a rental
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PricingWarning {
    #[error("unknown billing modality {raw:?}, billed as horas")]
    UnknownModality { raw: String },

    #[error("{field} is not a number ({raw:?}), using 0")]
    InvalidNumber { field: &'static str, raw: String },

    #[error("{field} is negative ({value})")]
    NegativeValue { field: &'static str, value: Decimal },

    #[error("{field} overflowed, using 0")]
    Overflow { field: &'static str },
}

/// Result of pricing one rental
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountCalculation {
    #[serde(rename = "monto")]
    pub amount: Amount,
    #[serde(rename = "modalidad_facturacion")]
    pub modality: BillingModality,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PricingWarning>,
}

impl AmountCalculation {
    pub fn into_pair(self) -> (Amount, BillingModality) {
        (self.amount, self.modality)
    }

    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}

/// Only an empty string counts as absent. A whitespace-only value is a
/// present modality that trims to nothing, so it resolves to `horas`
/// without consulting the original.
fn resolve_modality(
    proposed: &RentalFields,
    original: Option<&RentalFields>,
    warnings: &mut Vec<PricingWarning>,
) -> BillingModality {
    let given = |fields: &RentalFields| fields.modality.clone().filter(|s| !s.is_empty());
    let raw = given(proposed).or_else(|| original.and_then(given));

    let (modality, fell_back) = BillingModality::resolve(raw.as_deref());
    if let (true, Some(raw)) = (fell_back, non_blank(raw.as_deref())) {
        warnings.push(PricingWarning::UnknownModality {
            raw: raw.to_string(),
        });
    }
    modality
}

/// Proposed value when the key is present (even as null), else the
/// original's, else zero.
fn resolve_operand(
    field: &'static str,
    proposed: Option<&NumericField>,
    original: Option<&NumericField>,
    warnings: &mut Vec<PricingWarning>,
) -> Decimal {
    match proposed.or(original) {
        None | Some(NumericField::Null) => Decimal::ZERO,
        Some(NumericField::Number(value)) => {
            if value.is_sign_negative() && !value.is_zero() {
                warnings.push(PricingWarning::NegativeValue {
                    field,
                    value: *value,
                });
            }
            *value
        }
        Some(NumericField::Invalid(raw)) => {
            warnings.push(PricingWarning::InvalidNumber {
                field,
                raw: raw.clone(),
            });
            Decimal::ZERO
        }
    }
}

fn product(
    field: &'static str,
    a: Decimal,
    b: Decimal,
    warnings: &mut Vec<PricingWarning>,
) -> Decimal {
    a.checked_mul(b).unwrap_or_else(|| {
        warnings.push(PricingWarning::Overflow { field });
        Decimal::ZERO
    })
}

/// Compute `monto` and the normalised modality for a rental.
///
/// `proposed` holds the fields being saved (possibly a partial edit) and
/// `original` the stored record, if any. For `volumen` and `fijo` the hourly
/// inputs on `proposed` are set to null so they are not persisted.
pub fn calculate_amount(
    proposed: &mut RentalFields,
    original: Option<&RentalFields>,
) -> AmountCalculation {
    let mut warnings = Vec::new();
    let modality = resolve_modality(proposed, original, &mut warnings);

    let amount = match modality {
        BillingModality::Hours => {
            let hours = resolve_operand(
                "horas",
                proposed.hours.as_ref(),
                original.and_then(|o| o.hours.as_ref()),
                &mut warnings,
            );
            let price = resolve_operand(
                "precio_por_hora",
                proposed.price_per_hour.as_ref(),
                original.and_then(|o| o.price_per_hour.as_ref()),
                &mut warnings,
            );
            product("monto", hours, price, &mut warnings)
        }
        BillingModality::Volume => {
            let volume = resolve_operand(
                "volumen_generado",
                proposed.volume.as_ref(),
                original.and_then(|o| o.volume.as_ref()),
                &mut warnings,
            );
            let price = resolve_operand(
                "precio_por_unidad",
                proposed.price_per_unit.as_ref(),
                original.and_then(|o| o.price_per_unit.as_ref()),
                &mut warnings,
            );
            if non_blank(proposed.volume_unit.as_deref()).is_none() {
                proposed.volume_unit = Some(
                    original
                        .and_then(|o| o.volume_unit.clone())
                        .unwrap_or_default(),
                );
            }
            clear_hourly_inputs(proposed);
            product("monto", volume, price, &mut warnings)
        }
        BillingModality::Fixed => {
            let fixed = resolve_operand(
                "monto_fijo",
                proposed.fixed_amount.as_ref(),
                original.and_then(|o| o.fixed_amount.as_ref()),
                &mut warnings,
            );
            clear_hourly_inputs(proposed);
            fixed
        }
    };

    for warning in &warnings {
        warn!("Degraded pricing input (modality={}): {}", modality, warning);
    }

    AmountCalculation {
        amount: Amount::new(amount),
        modality,
        warnings,
    }
}

fn clear_hourly_inputs(fields: &mut RentalFields) {
    fields.hours = Some(NumericField::Null);
    fields.price_per_hour = Some(NumericField::Null);
}

/// Null the inputs of the two inactive modalities, so a record only ever
/// carries the inputs its `monto` was computed from.
pub fn normalize_modality_fields(fields: &mut RentalFields, modality: BillingModality) {
    fields.modality = Some(modality.to_string());
    match modality {
        BillingModality::Hours => {
            fields.volume = Some(NumericField::Null);
            fields.price_per_unit = Some(NumericField::Null);
            fields.volume_unit = None;
            fields.fixed_amount = Some(NumericField::Null);
        }
        BillingModality::Volume => {
            clear_hourly_inputs(fields);
            fields.fixed_amount = Some(NumericField::Null);
        }
        BillingModality::Fixed => {
            clear_hourly_inputs(fields);
            fields.volume = Some(NumericField::Null);
            fields.price_per_unit = Some(NumericField::Null);
            fields.volume_unit = None;
        }
    }
}
