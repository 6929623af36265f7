use crate::domain::pricing::NumericField;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;
use uuid::Uuid;

/// Raw identifier as found in legacy documents: ids were written both as
/// integers and as strings, so both are accepted and normalised to text.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
    Float(f64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s.trim().to_string(),
            RawId::Int(i) => i.to_string(),
            RawId::Float(f) if f.fract() == 0.0 => format!("{}", f as i64),
            RawId::Float(f) => f.to_string(),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into_string()))
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Rental identifier (`transaccion_id`)
    RentalId
);
string_id!(
    /// Equipment identifier (`equipo_id`)
    EquipmentId
);
string_id!(
    /// Client identifier (`cliente_id`)
    ClientId
);
string_id!(
    /// Operator identifier (`operador_id`)
    OperatorId
);

impl RentalId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Monetary amount.
///
/// Arithmetic is exact; rounding only happens when formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn add(&self, other: Amount) -> Self {
        Self(self.0 + other.0)
    }

    /// Balances and margins are allowed to go negative.
    pub fn subtract(&self, other: Amount) -> Self {
        Self(self.0 - other.0)
    }

    /// Value rounded to cents (half away from zero), for presentation.
    pub fn rounded(&self) -> Decimal {
        self.0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded())
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, a| acc.add(a))
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, a| acc.add(*a))
    }
}

/// `numerator / denominator * 100`, rounded to two places, 0 when the
/// denominator is not positive.
pub fn ratio_pct(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator
        .checked_div(denominator)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .map(|r| r.round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

/// `numerator / denominator`, 0 when the denominator is not positive.
pub fn guarded_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// How a rental is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BillingModality {
    #[default]
    #[serde(rename = "horas")]
    Hours,
    #[serde(rename = "volumen")]
    Volume,
    #[serde(rename = "fijo")]
    Fixed,
}

impl BillingModality {
    pub const ALL: [BillingModality; 3] = [
        BillingModality::Hours,
        BillingModality::Volume,
        BillingModality::Fixed,
    ];

    /// Trimmed, case-insensitive match against the stored names.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "horas" => Some(BillingModality::Hours),
            "volumen" => Some(BillingModality::Volume),
            "fijo" => Some(BillingModality::Fixed),
            _ => None,
        }
    }

    /// Modality for a stored value, with whether it fell back to `horas`
    /// because the value was missing, blank or unknown.
    pub fn resolve(raw: Option<&str>) -> (Self, bool) {
        match raw.and_then(Self::parse_lenient) {
            Some(modality) => (modality, false),
            None => (BillingModality::Hours, true),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingModality::Hours => "horas",
            BillingModality::Volume => "volumen",
            BillingModality::Fixed => "fijo",
        }
    }

    /// Capitalised name used in report columns
    pub fn label(&self) -> &'static str {
        match self {
            BillingModality::Hours => "Horas",
            BillingModality::Volume => "Volumen",
            BillingModality::Fixed => "Fijo",
        }
    }
}

impl fmt::Display for BillingModality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BillingModality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_lenient(s).ok_or_else(|| format!("unknown billing modality: {}", s))
    }
}

/// Inclusive `fecha` range in `YYYY-MM-DD` form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(rename = "fecha_inicio")]
    pub start: String,
    #[serde(rename = "fecha_fin")]
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn contains(&self, fecha: &str) -> bool {
        equipos_common::dates::in_range(fecha, &self.start, &self.end)
    }
}

/// Serde helpers that never reject a document because of a malformed number.
pub mod lenient {
    use super::*;
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

    /// Timestamp as RFC 3339 or as a naive ISO datetime (read as UTC), the
    /// form older exports wrote. Anything else becomes `None`.
    pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                    .map(|naive| Utc.from_utc_datetime(&naive))
            })
    }

    pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => parse_timestamp(&s),
            _ => None,
        })
    }

    /// Any JSON value to an [`Amount`]; null, missing or malformed become zero.
    pub fn amount<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let field = NumericField::deserialize(deserializer)?;
        Ok(Amount::new(field.value_or_zero()))
    }

    /// Any JSON value to a plain decimal; null or malformed become zero.
    pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let field = NumericField::deserialize(deserializer)?;
        Ok(field.value_or_zero())
    }

    /// `pagado` as found in old documents: null and unknown values are false.
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::Bool(b) => b,
            serde_json::Value::Number(n) => n.as_i64() == Some(1),
            serde_json::Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "si" | "sí"),
            _ => false,
        })
    }

    /// Any JSON scalar to text; null stays `None`.
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }
}
