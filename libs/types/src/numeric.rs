//! Integer amount type for custodied quantities
//!
//! Amounts are non-negative 256-bit integers in the asset's smallest unit,
//! the same range as an ERC-20 balance. Only checked arithmetic is exposed:
//! an operation that would overflow or go below zero yields `None` instead
//! of wrapping.

pub use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::AmountParseError;

/// Quantity of an asset, in base units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256([0; 4]));
    pub const MAX: Amount = Amount(U256::MAX);

    pub const fn new(units: U256) -> Self {
        Self(units)
    }

    /// Raw base units
    pub const fn units(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self(U256::from(units))
    }
}

impl From<u128> for Amount {
    fn from(units: u128) -> Self {
        Self(U256::from(units))
    }
}

impl From<U256> for Amount {
    fn from(units: U256) -> Self {
        Self(units)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountParseError::Empty);
        }
        U256::from_dec_str(trimmed)
            .map(Amount)
            .map_err(|_| AmountParseError::Invalid {
                input: trimmed.to_string(),
            })
    }
}

// JSON numbers lose precision above 2^53 in most consumers, so amounts
// travel as decimal strings.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(Amount::MAX.checked_add(Amount::from(1u64)), None);
        assert_eq!(
            Amount::from(2u64).checked_add(Amount::from(3u64)),
            Some(Amount::from(5u64))
        );
    }

    #[test]
    fn test_checked_sub_underflow() {
        assert_eq!(Amount::ZERO.checked_sub(Amount::from(1u64)), None);
        assert_eq!(
            Amount::from(10u64).checked_sub(Amount::from(10u64)),
            Some(Amount::ZERO)
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("100".parse::<Amount>().unwrap(), Amount::from(100u64));
        assert_eq!("".parse::<Amount>(), Err(AmountParseError::Empty));
        assert!(matches!(
            "-5".parse::<Amount>(),
            Err(AmountParseError::Invalid { .. })
        ));
    }

    #[test]
    fn test_beyond_128_bits() {
        let big = Amount::from(u128::MAX);
        let sum = big.checked_add(Amount::from(1u64)).unwrap();
        assert_eq!(sum.to_string(), "340282366920938463463374607431768211456");
        assert_eq!(sum.checked_sub(Amount::from(1u64)), Some(big));
    }

    #[test]
    fn test_parse_bounds() {
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(max.parse::<Amount>().unwrap(), Amount::MAX);
        assert!(matches!(
            "115792089237316195423570985008687907853269984665640564039457584007913129639936"
                .parse::<Amount>(),
            Err(AmountParseError::Invalid { .. })
        ));
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Amount::MAX).unwrap();
        assert_eq!(
            json,
            "\"115792089237316195423570985008687907853269984665640564039457584007913129639935\""
        );
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Amount::MAX);
    }

    proptest! {
        #[test]
        fn add_then_sub_is_identity(a in any::<u128>(), b in any::<u128>()) {
            let a = Amount::from(a);
            let b = Amount::from(b);
            let sum = a.checked_add(b).unwrap();
            prop_assert_eq!(sum.checked_sub(b), Some(a));
        }
    }
}
