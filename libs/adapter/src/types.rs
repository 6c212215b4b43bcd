//! Core value types shared by the registry, liquidity manager and router
//!
//! Addresses, asset identifiers, canonical pair keys, pool handles and
//! validated swap paths. Everything here is plain data: no collaborator
//! calls, no state.

use crate::errors::AdapterError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Token amount in the asset's smallest unit
pub type Balance = u128;

/// 20-byte account or contract address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Address with every byte set to `byte` (handy for fixtures)
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; 20])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| AdapterError::InvalidConfig {
            reason: format!("invalid address '{}': {}", s, e),
        })?;
        let bytes: [u8; 20] = bytes.try_into().map_err(|v: Vec<u8>| AdapterError::InvalidConfig {
            reason: format!("address '{}' has {} bytes, expected 20", s, v.len()),
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of a fungible asset
///
/// `Native` is the ledger's base currency, moved by value attachment rather
/// than by allowance. The derived ordering is only used to canonicalize
/// pair keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetId {
    Native,
    Token(Address),
}

impl AssetId {
    pub fn is_native(&self) -> bool {
        matches!(self, AssetId::Native)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Native => f.write_str("native"),
            AssetId::Token(address) => write!(f, "{}", address),
        }
    }
}

impl From<Address> for AssetId {
    fn from(address: Address) -> Self {
        AssetId::Token(address)
    }
}

/// Unordered pair of two distinct assets, stored in canonical order
///
/// `PairKey::new(a, b) == PairKey::new(b, a)` for every distinct `a`, `b`,
/// which is what makes registry lookups symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    first: AssetId,
    second: AssetId,
}

impl PairKey {
    /// Canonicalize two assets into a key
    ///
    /// Fails with [`AdapterError::InvalidPair`] when both identifiers are equal.
    pub fn new(a: AssetId, b: AssetId) -> Result<Self, AdapterError> {
        if a == b {
            return Err(AdapterError::InvalidPair { asset: a });
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { first, second })
    }

    pub fn first(&self) -> AssetId {
        self.first
    }

    pub fn second(&self) -> AssetId {
        self.second
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.first == *asset || self.second == *asset
    }

    /// Counterpart of `asset` in this pair, if `asset` belongs to it
    pub fn other(&self, asset: &AssetId) -> Option<AssetId> {
        if *asset == self.first {
            Some(self.second)
        } else if *asset == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.first, self.second)
    }
}

/// The engine's reference to a pool; the pool address doubles as its
/// liquidity token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolHandle(pub Address);

impl PoolHandle {
    pub fn address(&self) -> Address {
        self.0
    }

    /// Asset identifier of the pool (liquidity) token
    pub fn liquidity_token(&self) -> AssetId {
        AssetId::Token(self.0)
    }
}

impl fmt::Display for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool:{}", self.0)
    }
}

/// Ordered sequence of at least two distinct assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapPath(Vec<AssetId>);

impl SwapPath {
    /// Validate a path: at least two entries and no asset visited twice
    pub fn new(assets: Vec<AssetId>) -> Result<Self, AdapterError> {
        if assets.len() < 2 {
            return Err(AdapterError::InvalidPath {
                reason: format!("path needs at least 2 assets, got {}", assets.len()),
            });
        }
        let mut seen = HashSet::with_capacity(assets.len());
        for asset in &assets {
            if !seen.insert(*asset) {
                return Err(AdapterError::InvalidPath {
                    reason: format!("asset {} appears more than once", asset),
                });
            }
        }
        Ok(Self(assets))
    }

    pub fn assets(&self) -> &[AssetId] {
        &self.0
    }

    pub fn input(&self) -> AssetId {
        self.0[0]
    }

    pub fn output(&self) -> AssetId {
        self.0[self.0.len() - 1]
    }

    /// Number of hops (always `len - 1`)
    pub fn hop_count(&self) -> usize {
        self.0.len() - 1
    }

    /// Consecutive `(asset_in, asset_out)` legs, left to right
    pub fn hops(&self) -> impl Iterator<Item = (AssetId, AssetId)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }
}

impl TryFrom<Vec<AssetId>> for SwapPath {
    type Error = AdapterError;

    fn try_from(assets: Vec<AssetId>) -> Result<Self, Self::Error> {
        SwapPath::new(assets)
    }
}

impl<'de> Deserialize<'de> for SwapPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let assets = Vec::<AssetId>::deserialize(deserializer)?;
        SwapPath::new(assets).map_err(serde::de::Error::custom)
    }
}

/// Who is calling and how much native currency they attached to the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub value: Balance,
}

impl CallContext {
    /// A call without attached value
    pub fn new(caller: Address) -> Self {
        Self { caller, value: 0 }
    }

    /// A call carrying `value` units of native currency
    pub fn with_value(caller: Address, value: Balance) -> Self {
        Self { caller, value }
    }
}
