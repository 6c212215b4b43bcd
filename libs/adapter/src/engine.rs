//! AMM engine interface
//!
//! The external factory/router pair the adapter orchestrates. Pricing,
//! fee accounting and pool-token mint/burn all live behind this trait;
//! the adapter never recomputes them, it only checks outcomes against
//! caller bounds.
//!
//! The engine pulls funds from `payer` using an allowance granted to
//! [`AmmEngine::router_address`]. Every method must be all-or-nothing on
//! its own: an `Err` leaves both the engine and the ledger untouched.

use crate::errors::EngineError;
use crate::ledger::AssetLedger;
use crate::types::{Address, AssetId, Balance, PairKey, PoolHandle};

/// Arguments for [`AmmEngine::add_liquidity`]
///
/// Amounts follow the `asset_a`/`asset_b` order given here, not the
/// pool's canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityParams {
    pub pool: PoolHandle,
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    pub amount_a_desired: Balance,
    pub amount_b_desired: Balance,
    pub amount_a_min: Balance,
    pub amount_b_min: Balance,
    pub payer: Address,
    pub recipient: Address,
}

/// Outcome of an add: what was consumed and how many pool tokens were minted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityAdded {
    pub amount_a: Balance,
    pub amount_b: Balance,
    pub liquidity: Balance,
}

/// Arguments for [`AmmEngine::remove_liquidity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveLiquidityParams {
    pub pool: PoolHandle,
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    pub liquidity: Balance,
    pub amount_a_min: Balance,
    pub amount_b_min: Balance,
    pub payer: Address,
    pub recipient: Address,
}

/// Outcome of a remove, in `asset_a`/`asset_b` order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityRemoved {
    pub amount_a: Balance,
    pub amount_b: Balance,
}

/// Arguments for [`AmmEngine::swap_exact_in`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapParams {
    pub pool: PoolHandle,
    pub asset_in: AssetId,
    pub amount_in: Balance,
    pub amount_out_min: Balance,
    pub payer: Address,
    pub recipient: Address,
}

/// Pool factory: creates pools and answers existence checks
pub trait PoolFactory {
    /// Address of the pool factory
    fn factory_address(&self) -> Address;

    /// Create the pool for `pair`; fails if it already exists
    fn create_pool(&mut self, pair: PairKey) -> Result<PoolHandle, EngineError>;

    /// Read-only existence check
    fn get_pool(&self, pair: PairKey) -> Option<PoolHandle>;
}

/// Router surface executing liquidity and swap calls against pools
pub trait AmmEngine<L: AssetLedger + ?Sized>: PoolFactory {
    /// Address the adapter must approve before the engine can pull funds
    fn router_address(&self) -> Address;

    fn add_liquidity(
        &mut self,
        ledger: &mut L,
        params: AddLiquidityParams,
    ) -> Result<LiquidityAdded, EngineError>;

    fn remove_liquidity(
        &mut self,
        ledger: &mut L,
        params: RemoveLiquidityParams,
    ) -> Result<LiquidityRemoved, EngineError>;

    /// Sell exactly `amount_in` of `asset_in`, returning the amount of the
    /// pool's other asset delivered to `recipient`
    fn swap_exact_in(&mut self, ledger: &mut L, params: SwapParams)
        -> Result<Balance, EngineError>;

    /// Output a `swap_exact_in` would deliver right now, without executing it
    fn quote_exact_in(
        &self,
        pool: PoolHandle,
        asset_in: AssetId,
        amount_in: Balance,
    ) -> Result<Balance, EngineError>;
}
