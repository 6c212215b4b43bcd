//! Error types for the adapter and its collaborators
//!
//! Every adapter failure is surfaced to the immediate caller with the
//! whole operation rolled back; nothing here is retried or swallowed.

use crate::types::{Address, AssetId, Balance, PairKey, PoolHandle};
use thiserror::Error;

/// Failures reported by the asset ledger
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance of {asset} for {holder}: need {needed}, have {available}")]
    InsufficientBalance {
        asset: AssetId,
        holder: Address,
        needed: Balance,
        available: Balance,
    },

    #[error("insufficient allowance of {asset} from {owner} to {spender}: need {needed}, have {available}")]
    InsufficientAllowance {
        asset: AssetId,
        owner: Address,
        spender: Address,
        needed: Balance,
        available: Balance,
    },

    #[error("operation not supported for {asset}: {operation}")]
    Unsupported {
        asset: AssetId,
        operation: &'static str,
    },

    #[error("balance overflow for {asset}")]
    Overflow { asset: AssetId },

    #[error("transfer of {asset} rejected: {reason}")]
    Rejected { asset: AssetId, reason: String },
}

/// Failures reported by the AMM engine (factory and router)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("pool already exists for {0}")]
    PoolExists(PairKey),

    #[error("identical assets")]
    IdenticalAssets,

    #[error("unknown pool {0}")]
    UnknownPool(PoolHandle),

    #[error("insufficient {asset} amount: minimum {minimum}, available {actual}")]
    InsufficientAmount {
        asset: AssetId,
        minimum: Balance,
        actual: Balance,
    },

    #[error("insufficient output amount of {asset}: minimum {minimum}, got {actual}")]
    InsufficientOutputAmount {
        asset: AssetId,
        minimum: Balance,
        actual: Balance,
    },

    #[error("insufficient liquidity in {0}")]
    InsufficientLiquidity(PoolHandle),

    #[error("ledger failure inside engine: {0}")]
    Ledger(#[from] LedgerError),

    #[error("engine rejected call: {0}")]
    Rejected(String),
}

/// Errors surfaced by [`Adapter`](crate::Adapter) operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("invalid pair: both sides resolve to {asset}")]
    InvalidPair { asset: AssetId },

    #[error("invalid swap path: {reason}")]
    InvalidPath { reason: String },

    #[error("invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("no pool for {pair}")]
    PoolNotFound { pair: PairKey },

    #[error("pool for {pair} could not be created: {source}")]
    PoolUnavailable {
        pair: PairKey,
        #[source]
        source: EngineError,
    },

    #[error("slippage exceeded for {asset}: minimum {minimum}, actual {actual}")]
    SlippageExceeded {
        asset: AssetId,
        minimum: Balance,
        actual: Balance,
    },

    #[error("transfer failed: {0}")]
    TransferFailed(#[from] LedgerError),

    #[error("engine failure: {0}")]
    EngineFailure(#[source] EngineError),

    #[error("reentrant call into {operation} rejected")]
    Reentrancy { operation: &'static str },
}

impl AdapterError {
    pub(crate) fn invalid_amount(reason: impl Into<String>) -> Self {
        AdapterError::InvalidAmount {
            reason: reason.into(),
        }
    }

    /// Whether the failure is a caller-specified bound not being met
    pub fn is_slippage(&self) -> bool {
        matches!(self, AdapterError::SlippageExceeded { .. })
    }
}

/// Engine slippage rejections become `SlippageExceeded`, engine-side ledger
/// failures become `TransferFailed`, the rest stay opaque.
impl From<EngineError> for AdapterError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InsufficientAmount {
                asset,
                minimum,
                actual,
            }
            | EngineError::InsufficientOutputAmount {
                asset,
                minimum,
                actual,
            } => AdapterError::SlippageExceeded {
                asset,
                minimum,
                actual,
            },
            EngineError::Ledger(ledger) => AdapterError::TransferFailed(ledger),
            other => AdapterError::EngineFailure(other),
        }
    }
}

pub type Result<T, E = AdapterError> = std::result::Result<T, E>;
