use num::{BigUint, Integer, Num, ToPrimitive, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use thiserror::Error;

pub const SHANNONS_PER_CKB: u64 = 100_000_000;

/// Amount of native value held by a cell, in shannons.
///
/// Backed by an arbitrary precision integer so that sums of many cells and
/// `size * fee_rate` products never wrap. Conversion to the 8 byte wire field
/// is checked through [`Capacity::to_u64`].
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capacity(BigUint);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid capacity: {0}")]
pub struct ParseCapacityError(pub String);

impl Capacity {
    pub fn zero() -> Self {
        Capacity(BigUint::zero())
    }

    pub fn from_shannons(shannons: u64) -> Self {
        Capacity(BigUint::from(shannons))
    }

    pub fn from_ckb(ckb: u64) -> Self {
        Capacity(BigUint::from(ckb) * BigUint::from(SHANNONS_PER_CKB))
    }

    /// Capacity a cell must hold to occupy `len` bytes on chain.
    pub fn bytes(len: usize) -> Self {
        Capacity(BigUint::from(len) * BigUint::from(SHANNONS_PER_CKB))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    /// `None` when `rhs` is greater than `self`.
    pub fn safe_sub(&self, rhs: &Capacity) -> Option<Capacity> {
        if self.0 < rhs.0 {
            None
        } else {
            Some(Capacity(&self.0 - &rhs.0))
        }
    }

    /// Quotient and remainder, `None` on a zero divisor.
    pub fn div_rem(&self, divisor: &Capacity) -> Option<(Capacity, Capacity)> {
        if divisor.is_zero() {
            return None;
        }
        let (q, r) = self.0.div_rem(&divisor.0);
        Some((Capacity(q), Capacity(r)))
    }

    pub fn to_hex_string(&self) -> String {
        format!("0x{}", self.0.to_str_radix(16))
    }

    pub fn from_hex_str(s: &str) -> Result<Self, ParseCapacityError> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| ParseCapacityError(format!("missing 0x prefix: {}", s)))?;
        if digits.is_empty() {
            return Err(ParseCapacityError(s.to_string()));
        }
        BigUint::from_str_radix(digits, 16)
            .map(Capacity)
            .map_err(|_| ParseCapacityError(s.to_string()))
    }
}

impl From<u64> for Capacity {
    fn from(shannons: u64) -> Self {
        Capacity::from_shannons(shannons)
    }
}

impl From<BigUint> for Capacity {
    fn from(value: BigUint) -> Self {
        Capacity(value)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Capacity {
    type Output = Capacity;

    fn add(self, rhs: Capacity) -> Capacity {
        Capacity(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Capacity> for &'a Capacity {
    type Output = Capacity;

    fn add(self, rhs: &'a Capacity) -> Capacity {
        Capacity(&self.0 + &rhs.0)
    }
}

impl AddAssign<&Capacity> for Capacity {
    fn add_assign(&mut self, rhs: &Capacity) {
        self.0 += &rhs.0;
    }
}

/// Panics on underflow, use [`Capacity::safe_sub`] when `rhs` may be larger.
impl<'a> Sub<&'a Capacity> for &'a Capacity {
    type Output = Capacity;

    fn sub(self, rhs: &'a Capacity) -> Capacity {
        Capacity(&self.0 - &rhs.0)
    }
}

impl Mul<u64> for &Capacity {
    type Output = Capacity;

    fn mul(self, rhs: u64) -> Capacity {
        Capacity(&self.0 * BigUint::from(rhs))
    }
}

impl<'a> Sum<&'a Capacity> for Capacity {
    fn sum<I: Iterator<Item = &'a Capacity>>(iter: I) -> Capacity {
        iter.fold(Capacity::zero(), |acc, c| Capacity(acc.0 + &c.0))
    }
}

impl Sum<Capacity> for Capacity {
    fn sum<I: Iterator<Item = Capacity>>(iter: I) -> Capacity {
        iter.fold(Capacity::zero(), |acc, c| acc + c)
    }
}

impl Serialize for Capacity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

struct CapacityVisitor;

impl<'de> Visitor<'de> for CapacityVisitor {
    type Value = Capacity;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a 0x-prefixed hex string or an unsigned integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Capacity, E> {
        Capacity::from_hex_str(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Capacity, E> {
        Ok(Capacity::from_shannons(v))
    }
}

impl<'de> Deserialize<'de> for Capacity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Capacity, D::Error> {
        deserializer.deserialize_any(CapacityVisitor)
    }
}
