//! CPU and memory quantities.
//!
//! Quantities are parsed from the mixed-suffix text used in resource profiles
//! and node declarations (`250m`, `0.5`, `512Mi`, `2G`) and normalized to
//! integers: CPU to milli-cores, memory to bytes. Keeping integers means sums
//! and products are exact, and formatting can always find the original unit
//! again. Arithmetic is checked: overflow is reported, never saturated.
//!
//! CPU and memory are separate types, so they cannot be added to each other.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QuantityError;

/// Memory suffixes, ordered from the largest multiplier to the smallest.
const MEMORY_SUFFIXES: &[(&str, u64)] = &[
    ("Ti", 1 << 40),
    ("T", 1_000_000_000_000),
    ("Gi", 1 << 30),
    ("G", 1_000_000_000),
    ("Mi", 1 << 20),
    ("M", 1_000_000),
    ("Ki", 1 << 10),
    ("K", 1_000),
];

/// Milli-cores per core.
const MILLIS_PER_CORE: u64 = 1_000;

/// Longest digit run accepted before the value is considered out of range.
const MAX_DIGITS: usize = 30;

/// An amount of CPU, stored as milli-cores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct CpuQuantity {
    millis: u64,
}

/// An amount of memory, stored as bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct MemoryQuantity {
    bytes: u64,
}

/// Raw forms a quantity can take in YAML or JSON input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuantityText {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl QuantityText {
    fn into_text(self) -> String {
        match self {
            Self::Integer(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// Quantity text exactly as written in configuration, not yet parsed.
///
/// Accepts YAML numbers as well as strings, so `cpu: 4` and `cpu: "4"` are
/// the same thing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RawQuantity(String);

impl RawQuantity {
    /// Returns the text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the text as a CPU amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid CPU quantity.
    pub fn cpu(&self) -> Result<CpuQuantity, QuantityError> {
        CpuQuantity::parse(&self.0)
    }

    /// Parses the text as a memory amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid memory quantity.
    pub fn memory(&self) -> Result<MemoryQuantity, QuantityError> {
        MemoryQuantity::parse(&self.0)
    }
}

impl From<&str> for RawQuantity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for RawQuantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        QuantityText::deserialize(deserializer).map(|raw| Self(raw.into_text()))
    }
}

impl CpuQuantity {
    /// A zero amount.
    pub const ZERO: Self = Self { millis: 0 };

    /// Creates a quantity from milli-cores.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Returns the amount in milli-cores.
    #[must_use]
    pub const fn millis(self) -> u64 {
        self.millis
    }

    /// Returns the amount in (fractional) cores.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cores(self) -> f64 {
        self.millis as f64 / MILLIS_PER_CORE as f64
    }

    /// Parses CPU text: bare cores (`2`, `0.5`) or milli-cores (`250m`).
    ///
    /// # Errors
    ///
    /// Returns an error on malformed numbers, unknown suffixes, negative
    /// values, precision finer than one milli-core, or overflow.
    pub fn parse(text: &str) -> Result<Self, QuantityError> {
        let (number, suffix) = split_quantity(text)?;
        let multiplier = match suffix {
            "" => MILLIS_PER_CORE,
            "m" => 1,
            other => {
                return Err(QuantityError::UnknownSuffix {
                    value: text.to_string(),
                    suffix: other.to_string(),
                });
            }
        };

        scale_decimal(text, number, multiplier).map(Self::from_millis)
    }

    /// Renders the canonical text: whole cores when they divide evenly,
    /// milli-cores otherwise.
    #[must_use]
    pub fn format(self) -> String {
        if self.millis % MILLIS_PER_CORE == 0 {
            (self.millis / MILLIS_PER_CORE).to_string()
        } else {
            format!("{}m", self.millis)
        }
    }

    /// Renders a rounded, human-oriented form (`850m`, `8.00`).
    #[must_use]
    pub fn to_human(self) -> String {
        if self.millis < MILLIS_PER_CORE {
            format!("{}m", self.millis)
        } else {
            format!("{:.2}", self.cores())
        }
    }
}

impl MemoryQuantity {
    /// A zero amount.
    pub const ZERO: Self = Self { bytes: 0 };

    /// Creates a quantity from bytes.
    #[must_use]
    pub const fn from_bytes(bytes: u64) -> Self {
        Self { bytes }
    }

    /// Returns the amount in bytes.
    #[must_use]
    pub const fn bytes(self) -> u64 {
        self.bytes
    }

    /// Parses memory text: bytes, or a number followed by one of
    /// `Ki Mi Gi Ti` (base 1024) or `K M G T` (base 1000).
    ///
    /// # Errors
    ///
    /// Returns an error on malformed numbers, unknown suffixes, negative
    /// values, fractional bytes, or overflow.
    pub fn parse(text: &str) -> Result<Self, QuantityError> {
        let (number, suffix) = split_quantity(text)?;
        let multiplier = if suffix.is_empty() {
            1
        } else {
            MEMORY_SUFFIXES
                .iter()
                .find(|(s, _)| *s == suffix)
                .map(|(_, m)| *m)
                .ok_or_else(|| QuantityError::UnknownSuffix {
                    value: text.to_string(),
                    suffix: suffix.to_string(),
                })?
        };

        scale_decimal(text, number, multiplier).map(Self::from_bytes)
    }

    /// Renders the canonical text using the largest suffix that divides the
    /// byte count evenly, or plain bytes.
    #[must_use]
    pub fn format(self) -> String {
        if self.bytes == 0 {
            return String::from("0");
        }

        MEMORY_SUFFIXES
            .iter()
            .find(|(_, m)| self.bytes % m == 0)
            .map_or_else(
                || self.bytes.to_string(),
                |(suffix, m)| format!("{}{suffix}", self.bytes / m),
            )
    }

    /// Renders a rounded, human-oriented form in binary units (`4.75Gi`).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_human(self) -> String {
        let bytes = self.bytes as f64;
        for (suffix, m) in [("Gi", 1u64 << 30), ("Mi", 1 << 20), ("Ki", 1 << 10)] {
            if self.bytes >= m {
                return format!("{:.2}{suffix}", bytes / m as f64);
            }
        }
        self.bytes.to_string()
    }
}

/// Arithmetic, comparison helpers and text conversions shared by both
/// quantity types.
macro_rules! quantity_impls {
    ($ty:ident, $field:ident) => {
        impl $ty {
            /// Adds two quantities, returning `None` on overflow.
            #[must_use]
            pub const fn checked_add(self, other: Self) -> Option<Self> {
                match self.$field.checked_add(other.$field) {
                    Some($field) => Some(Self { $field }),
                    None => None,
                }
            }

            /// Multiplies by a scalar, returning `None` on overflow.
            #[must_use]
            pub const fn checked_mul(self, factor: u64) -> Option<Self> {
                match self.$field.checked_mul(factor) {
                    Some($field) => Some(Self { $field }),
                    None => None,
                }
            }

            /// Sums quantities, returning `None` on overflow.
            #[must_use]
            pub fn checked_sum<I: IntoIterator<Item = Self>>(items: I) -> Option<Self> {
                items.into_iter().try_fold(Self::ZERO, Self::checked_add)
            }

            /// Expresses `self` as a percentage of `total`.
            ///
            /// Returns `None` when `total` is zero.
            #[must_use]
            #[allow(clippy::cast_precision_loss)]
            pub fn percent_of(self, total: Self) -> Option<f64> {
                if total.$field == 0 {
                    None
                } else {
                    Some(self.$field as f64 / total.$field as f64 * 100.0)
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.format())
            }
        }

        impl FromStr for $ty {
            type Err = QuantityError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = QuantityText::deserialize(deserializer)?;
                Self::parse(&raw.into_text()).map_err(serde::de::Error::custom)
            }
        }

        impl From<$ty> for String {
            fn from(q: $ty) -> Self {
                q.format()
            }
        }
    };
}

quantity_impls!(CpuQuantity, millis);
quantity_impls!(MemoryQuantity, bytes);

/// Splits quantity text into its numeric part and unit suffix.
fn split_quantity(text: &str) -> Result<(&str, &str), QuantityError> {
    let trimmed = text.trim();

    if trimmed.starts_with('-') {
        return Err(QuantityError::Negative {
            value: text.to_string(),
        });
    }

    let split_at = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split_at);

    if number.is_empty() {
        return Err(QuantityError::Malformed {
            value: text.to_string(),
        });
    }

    Ok((number, suffix))
}

/// Multiplies a decimal string by an integer unit, requiring an exact
/// integer result.
fn scale_decimal(original: &str, number: &str, multiplier: u64) -> Result<u64, QuantityError> {
    let malformed = || QuantityError::Malformed {
        value: original.to_string(),
    };
    let overflow = || QuantityError::Overflow {
        value: original.to_string(),
    };

    let (whole, fraction) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };

    if whole.is_empty() || fraction.contains('.') || (number.contains('.') && fraction.is_empty()) {
        return Err(malformed());
    }

    let digits = format!("{whole}{fraction}");
    let digits = digits.trim_start_matches('0');
    if digits.len() > MAX_DIGITS {
        return Err(overflow());
    }

    let mantissa: u128 = if digits.is_empty() {
        0
    } else {
        digits.parse().map_err(|_| malformed())?
    };

    let fraction_digits = u32::try_from(fraction.len()).map_err(|_| overflow())?;
    let divisor = 10u128.checked_pow(fraction_digits).ok_or_else(overflow)?;
    let scaled = mantissa
        .checked_mul(u128::from(multiplier))
        .ok_or_else(overflow)?;

    if scaled % divisor != 0 {
        return Err(QuantityError::TooPrecise {
            value: original.to_string(),
        });
    }

    u64::try_from(scaled / divisor).map_err(|_| overflow())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("250m", 250)]
    #[case("1", 1_000)]
    #[case("0.5", 500)]
    #[case("1.25", 1_250)]
    #[case("4", 4_000)]
    #[case("1000m", 1_000)]
    #[case("0", 0)]
    fn test_cpu_parse(#[case] input: &str, #[case] millis: u64) {
        assert_eq!(CpuQuantity::parse(input).unwrap().millis(), millis);
    }

    #[rstest]
    #[case("512Mi", 512 * 1024 * 1024)]
    #[case("1Gi", 1 << 30)]
    #[case("2.75Gi", 2_952_790_016)]
    #[case("1Ki", 1024)]
    #[case("2G", 2_000_000_000)]
    #[case("1.5K", 1_500)]
    #[case("4096", 4096)]
    #[case("1Ti", 1 << 40)]
    fn test_memory_parse(#[case] input: &str, #[case] bytes: u64) {
        assert_eq!(MemoryQuantity::parse(input).unwrap().bytes(), bytes);
    }

    #[rstest]
    #[case("250m")]
    #[case("2")]
    #[case("1500m")]
    fn test_cpu_format_round_trip(#[case] input: &str) {
        assert_eq!(CpuQuantity::parse(input).unwrap().format(), input);
    }

    #[rstest]
    #[case("1Gi")]
    #[case("512Mi")]
    #[case("2G")]
    #[case("1500M")]
    #[case("1000Ki")]
    #[case("100")]
    fn test_memory_format_round_trip(#[case] input: &str) {
        assert_eq!(MemoryQuantity::parse(input).unwrap().format(), input);
    }

    #[test]
    fn test_format_falls_back_to_numerically_equal_form() {
        assert_eq!(CpuQuantity::parse("1000m").unwrap().format(), "1");
        assert_eq!(MemoryQuantity::parse("1024Mi").unwrap().format(), "1Gi");
        assert_eq!(MemoryQuantity::parse("4.75Gi").unwrap().format(), "4864Mi");
    }

    #[rstest]
    #[case("")]
    #[case("m")]
    #[case("1.2.3")]
    #[case("1.")]
    #[case(".5")]
    fn test_cpu_malformed(#[case] input: &str) {
        assert!(matches!(
            CpuQuantity::parse(input),
            Err(QuantityError::Malformed { .. })
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            CpuQuantity::parse("-1"),
            Err(QuantityError::Negative { .. })
        ));
        assert!(matches!(
            CpuQuantity::parse("2cores"),
            Err(QuantityError::UnknownSuffix { .. })
        ));
        assert!(matches!(
            MemoryQuantity::parse("1Pi"),
            Err(QuantityError::UnknownSuffix { .. })
        ));
        assert!(matches!(
            MemoryQuantity::parse("1gi"),
            Err(QuantityError::UnknownSuffix { .. })
        ));
        assert!(matches!(
            CpuQuantity::parse("0.0005"),
            Err(QuantityError::TooPrecise { .. })
        ));
        assert!(matches!(
            MemoryQuantity::parse("0.1"),
            Err(QuantityError::TooPrecise { .. })
        ));
        assert!(matches!(
            MemoryQuantity::parse("99999999999Ti"),
            Err(QuantityError::Overflow { .. })
        ));
    }

    #[test]
    fn test_arithmetic_is_exact() {
        let a = CpuQuantity::parse("500m").unwrap();
        let b = CpuQuantity::parse("350m").unwrap();
        assert_eq!(a.checked_add(b).unwrap().format(), "850m");

        let per_node = MemoryQuantity::parse("16Gi").unwrap();
        assert_eq!(per_node.checked_mul(2).unwrap().format(), "32Gi");

        let total = MemoryQuantity::checked_sum(
            ["2Gi", "2.75Gi"].iter().map(|s| MemoryQuantity::parse(s).unwrap()),
        )
        .unwrap();
        assert_eq!(total.bytes(), 5_100_273_664);
        assert_eq!(CpuQuantity::checked_sum([]), Some(CpuQuantity::ZERO));
    }

    #[test]
    fn test_arithmetic_overflow_is_reported() {
        let huge = MemoryQuantity::from_bytes(u64::MAX);
        let one = MemoryQuantity::from_bytes(1);

        assert!(huge.checked_add(one).is_none());
        assert!(huge.checked_mul(2).is_none());
        assert!(MemoryQuantity::checked_sum([huge, one]).is_none());
        assert_eq!(huge.checked_mul(1), Some(huge));
    }

    #[test]
    fn test_compare() {
        let small = CpuQuantity::parse("999m").unwrap();
        let large = CpuQuantity::parse("1").unwrap();
        assert!(small < large);
        assert_eq!(CpuQuantity::parse("1").unwrap(), CpuQuantity::parse("1000m").unwrap());
    }

    #[test]
    fn test_percent_of() {
        let used = CpuQuantity::from_millis(850);
        let total = CpuQuantity::from_millis(8_000);
        let pct = used.percent_of(total).unwrap();
        assert!((pct - 10.625).abs() < 1e-9);
        assert!(used.percent_of(CpuQuantity::ZERO).is_none());
    }

    #[test]
    fn test_deserialize_from_yaml_number_and_text() {
        let cpu: CpuQuantity = serde_yaml::from_str("4").unwrap();
        assert_eq!(cpu.millis(), 4_000);
        let cpu: CpuQuantity = serde_yaml::from_str("0.5").unwrap();
        assert_eq!(cpu.millis(), 500);
        let mem: MemoryQuantity = serde_yaml::from_str("\"8Gi\"").unwrap();
        assert_eq!(mem.format(), "8Gi");
        assert!(serde_yaml::from_str::<MemoryQuantity>("eight").is_err());
    }

    #[test]
    fn test_raw_quantity_defers_parsing() {
        let raw: RawQuantity = serde_yaml::from_str("4").unwrap();
        assert_eq!(raw.as_str(), "4");
        assert_eq!(raw.cpu().unwrap().millis(), 4_000);
        assert!(raw.memory().is_ok());

        let bad: RawQuantity = serde_yaml::from_str("lots").unwrap();
        assert!(bad.cpu().is_err());
    }

    #[test]
    fn test_serializes_as_canonical_text() {
        let json = serde_json::to_string(&MemoryQuantity::parse("512Mi").unwrap()).unwrap();
        assert_eq!(json, "\"512Mi\"");
    }

    #[test]
    fn test_to_human() {
        assert_eq!(CpuQuantity::from_millis(850).to_human(), "850m");
        assert_eq!(CpuQuantity::from_millis(8_000).to_human(), "8.00");
        assert_eq!(MemoryQuantity::parse("4.75Gi").unwrap().to_human(), "4.75Gi");
    }
}
