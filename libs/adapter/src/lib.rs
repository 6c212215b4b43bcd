//! # AMM Adapter - Orchestration over an External Factory/Router
//!
//! ## Purpose
//!
//! Thin, atomic orchestration layer in front of an existing constant-product
//! AMM. The adapter never prices anything itself: it resolves or creates
//! pools, moves caller funds into custody, approves the router for exactly
//! what each call needs, enforces caller slippage bounds and returns every
//! unused unit to the caller before the operation completes.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Caller requests carried as [`CallContext`] plus
//!   operation arguments; deployment wiring from [`AdapterConfig`]
//! - **Output Destinations**: [`AmmEngine`] (factory + router) and
//!   [`AssetLedger`] (balances, allowances, wrapped native currency)
//! - **Atomicity**: every mutating operation commits as a whole or rolls
//!   back every participant via [`Transactional`] checkpoints
//! - **Reentrancy**: collaborators calling back into an adapter mid-operation
//!   get [`AdapterError::Reentrancy`]
//!
//! ## Components
//!
//! - [`PairRegistry`]: canonical `{A, B} → pool` mapping, lazily populated
//! - [`LiquidityManager`]: add/remove liquidity for token and native pairs
//! - [`SwapRouter`]: single-hop and multi-hop exact-input swaps
//!
//! ## Examples
//!
//! ```no_run
//! use amm_adapter::{Adapter, AmmEngine, AssetId, AssetLedger, CallContext, Transactional};
//!
//! fn sell<E, L>(adapter: &Adapter<E, L>, ctx: CallContext, a: AssetId, b: AssetId)
//! where
//!     L: AssetLedger + Transactional,
//!     E: AmmEngine<L> + Transactional,
//! {
//!     match adapter.swap(ctx, a, b, 1_000, 990) {
//!         Ok(out) => println!("received {}", out),
//!         Err(e) if e.is_slippage() => println!("price moved: {}", e),
//!         Err(e) => println!("swap failed: {}", e),
//!     }
//! }
//! ```

mod adapter;
pub mod config;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod liquidity;
pub mod logging;
pub mod registry;
pub mod router;
pub mod transaction;
pub mod types;

pub use adapter::Adapter;
pub use config::AdapterConfig;
pub use engine::{
    AddLiquidityParams, AmmEngine, LiquidityAdded, LiquidityRemoved, PoolFactory,
    RemoveLiquidityParams, SwapParams,
};
pub use errors::{AdapterError, EngineError, LedgerError, Result};
pub use ledger::AssetLedger;
pub use liquidity::LiquidityManager;
pub use logging::LogEmoji;
pub use registry::PairRegistry;
pub use router::SwapRouter;
pub use transaction::Transactional;
pub use types::{Address, AssetId, Balance, CallContext, PairKey, PoolHandle, SwapPath};
