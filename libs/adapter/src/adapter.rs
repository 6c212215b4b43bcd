//! Adapter facade
//!
//! Owns the pair registry and both collaborators, and runs every public
//! operation as one transaction: re-entry check, savepoint, operation,
//! then commit or full rollback. Callers on other threads are serialized
//! by the lock; a collaborator calling back in on the same thread gets
//! [`AdapterError::Reentrancy`].

use crate::config::AdapterConfig;
use crate::engine::{AmmEngine, LiquidityAdded, LiquidityRemoved};
use crate::errors::{AdapterError, Result};
use crate::ledger::AssetLedger;
use crate::liquidity::LiquidityManager;
use crate::logging::LogEmoji;
use crate::registry::PairRegistry;
use crate::router::SwapRouter;
use crate::transaction::{OperationGuard, Savepoint, Transactional};
use crate::types::{Address, AssetId, Balance, CallContext, PairKey, PoolHandle, SwapPath};
use parking_lot::ReentrantMutex;
use std::cell::{Cell, RefCell};
use tracing::{debug, info, warn};

/// Mutable state touched by an operation
///
/// `account` is the ledger account funds sit under while an operation is
/// in flight; it holds nothing between operations.
pub(crate) struct Core<E, L> {
    pub(crate) registry: PairRegistry,
    pub(crate) engine: E,
    pub(crate) ledger: L,
    pub(crate) account: Address,
    pub(crate) max_hops: usize,
}

impl<E, L> Core<E, L>
where
    L: AssetLedger,
    E: AmmEngine<L>,
{
    /// Map native currency onto the token pools actually hold
    pub(crate) fn normalize(&self, asset: AssetId) -> AssetId {
        match asset {
            AssetId::Native => self.ledger.wrapped_native(),
            token => token,
        }
    }

    /// Canonical key for two caller-facing assets
    pub(crate) fn pair_key(&self, a: AssetId, b: AssetId) -> Result<PairKey> {
        PairKey::new(self.normalize(a), self.normalize(b))
    }

    /// Pull `amount` of `asset` from `owner` into adapter custody using
    /// the allowance `owner` granted the adapter
    pub(crate) fn pull(&mut self, asset: AssetId, owner: Address, amount: Balance) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.ledger
            .transfer_from(asset, self.account, owner, self.account, amount)?;
        Ok(())
    }

    /// Collect the native value attached to the call and wrap it
    pub(crate) fn collect_value(&mut self, ctx: &CallContext) -> Result<()> {
        if ctx.value == 0 {
            return Ok(());
        }
        self.ledger
            .transfer(AssetId::Native, ctx.caller, self.account, ctx.value)?;
        self.ledger.wrap_native(self.account, ctx.value)?;
        Ok(())
    }

    /// Send `amount` out of custody; `asset` is caller-facing, so native
    /// is unwrapped first
    pub(crate) fn deliver(&mut self, asset: AssetId, recipient: Address, amount: Balance) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        if asset.is_native() {
            self.ledger.unwrap_native(self.account, amount)?;
        }
        self.ledger.transfer(asset, self.account, recipient, amount)?;
        Ok(())
    }

    /// Grant the router exactly `amount` of `asset`
    pub(crate) fn approve_router(&mut self, asset: AssetId, amount: Balance) -> Result<()> {
        let router = self.engine.router_address();
        self.ledger.approve(asset, self.account, router, amount)?;
        Ok(())
    }

    /// Drop any allowance the router did not consume
    pub(crate) fn revoke_router(&mut self, asset: AssetId) -> Result<()> {
        let router = self.engine.router_address();
        if self.ledger.allowance(asset, self.account, router) > 0 {
            self.ledger.approve(asset, self.account, router, 0)?;
        }
        Ok(())
    }
}

impl<E, L> Core<E, L>
where
    E: Transactional,
    L: Transactional,
{
    fn savepoint(&self) -> Savepoint<E::Checkpoint, L::Checkpoint> {
        Savepoint {
            engine: self.engine.checkpoint(),
            ledger: self.ledger.checkpoint(),
            registry: self.registry.checkpoint(),
        }
    }

    fn restore(&mut self, savepoint: Savepoint<E::Checkpoint, L::Checkpoint>) {
        self.engine.rollback(savepoint.engine);
        self.ledger.rollback(savepoint.ledger);
        self.registry.rollback(savepoint.registry);
    }
}

struct AdapterState<E, L> {
    in_progress: Cell<bool>,
    core: RefCell<Core<E, L>>,
}

/// Orchestration front-end over an AMM engine and an asset ledger
pub struct Adapter<E, L> {
    config: AdapterConfig,
    state: ReentrantMutex<AdapterState<E, L>>,
}

impl<E, L> Adapter<E, L>
where
    L: AssetLedger + Transactional,
    E: AmmEngine<L> + Transactional,
{
    /// Wire an adapter to its collaborators
    ///
    /// The engine's factory and router must be the ones named in `config`.
    pub fn new(config: AdapterConfig, engine: E, ledger: L) -> Result<Self> {
        config.validate()?;
        if engine.factory_address() != config.factory {
            return Err(AdapterError::InvalidConfig {
                reason: format!(
                    "engine factory {} does not match configured {}",
                    engine.factory_address(),
                    config.factory
                ),
            });
        }
        if engine.router_address() != config.router {
            return Err(AdapterError::InvalidConfig {
                reason: format!(
                    "engine router {} does not match configured {}",
                    engine.router_address(),
                    config.router
                ),
            });
        }

        info!(
            "Adapter {} wired to factory {} / router {}",
            config.account, config.factory, config.router
        );

        let core = Core {
            registry: PairRegistry::new(),
            engine,
            ledger,
            account: config.account,
            max_hops: config.max_hops,
        };
        Ok(Self {
            config,
            state: ReentrantMutex::new(AdapterState {
                in_progress: Cell::new(false),
                core: RefCell::new(core),
            }),
        })
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Ledger account the adapter operates under
    pub fn account(&self) -> Address {
        self.config.account
    }

    /// Create (or return the existing) pool for a pair
    pub fn create_pair(&self, asset_a: AssetId, asset_b: AssetId) -> Result<PoolHandle> {
        self.transact("create_pair", |core| {
            let key = core.pair_key(asset_a, asset_b)?;
            core.registry
                .create(&mut core.engine, key.first(), key.second())
        })
    }

    /// Registry accessor; `None` means the pair has no pool yet
    pub fn pairs(&self, asset_a: AssetId, asset_b: AssetId) -> Result<Option<PoolHandle>> {
        self.read("pairs", |core| {
            core.pair_key(asset_a, asset_b)
                .ok()
                .and_then(|key| core.registry.get(&key))
        })
    }

    pub fn pair_count(&self) -> Result<usize> {
        self.read("pair_count", |core| core.registry.len())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        &self,
        ctx: CallContext,
        asset_a: AssetId,
        asset_b: AssetId,
        amount_a_desired: Balance,
        amount_b_desired: Balance,
        amount_a_min: Balance,
        amount_b_min: Balance,
    ) -> Result<LiquidityAdded> {
        self.transact("add_liquidity", |core| {
            LiquidityManager::new(core).add_liquidity(
                &ctx,
                asset_a,
                asset_b,
                amount_a_desired,
                amount_b_desired,
                amount_a_min,
                amount_b_min,
            )
        })
    }

    /// Add liquidity to an `asset`/native pool; the native leg is the value
    /// attached to `ctx`. `amount_a` of the result is `asset`, `amount_b`
    /// is native.
    pub fn add_liquidity_native(
        &self,
        ctx: CallContext,
        asset: AssetId,
        amount_desired: Balance,
        amount_min: Balance,
        native_amount_min: Balance,
    ) -> Result<LiquidityAdded> {
        self.transact("add_liquidity_native", |core| {
            LiquidityManager::new(core).add_liquidity_native(
                &ctx,
                asset,
                amount_desired,
                amount_min,
                native_amount_min,
            )
        })
    }

    pub fn remove_liquidity(
        &self,
        ctx: CallContext,
        asset_a: AssetId,
        asset_b: AssetId,
        liquidity: Balance,
        amount_a_min: Balance,
        amount_b_min: Balance,
    ) -> Result<LiquidityRemoved> {
        self.transact("remove_liquidity", |core| {
            LiquidityManager::new(core).remove_liquidity(
                &ctx,
                asset_a,
                asset_b,
                liquidity,
                amount_a_min,
                amount_b_min,
            )
        })
    }

    pub fn remove_liquidity_native(
        &self,
        ctx: CallContext,
        asset: AssetId,
        liquidity: Balance,
        amount_min: Balance,
        native_amount_min: Balance,
    ) -> Result<LiquidityRemoved> {
        self.transact("remove_liquidity_native", |core| {
            LiquidityManager::new(core).remove_liquidity_native(
                &ctx,
                asset,
                liquidity,
                amount_min,
                native_amount_min,
            )
        })
    }

    pub fn swap(
        &self,
        ctx: CallContext,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_in: Balance,
        amount_out_min: Balance,
    ) -> Result<Balance> {
        self.transact("swap", |core| {
            SwapRouter::new(core).swap(&ctx, asset_in, asset_out, amount_in, amount_out_min)
        })
    }

    pub fn swap_by_path(
        &self,
        ctx: CallContext,
        path: &SwapPath,
        amount_in: Balance,
        amount_out_min: Balance,
    ) -> Result<Balance> {
        self.transact("swap_by_path", |core| {
            SwapRouter::new(core).swap_by_path(&ctx, path, amount_in, amount_out_min)
        })
    }

    /// Per-hop amounts a `swap_by_path` would produce right now, starting
    /// with `amount_in`
    pub fn quote_by_path(&self, path: &SwapPath, amount_in: Balance) -> Result<Vec<Balance>> {
        self.read("quote_by_path", |core| {
            SwapRouter::quote_by_path(core, path, amount_in)
        })?
    }

    /// Read-only view of both collaborators
    pub fn inspect<R>(&self, f: impl FnOnce(&E, &L) -> R) -> Result<R> {
        self.read("inspect", |core| f(&core.engine, &core.ledger))
    }

    /// Take the collaborators back
    pub fn into_parts(self) -> (E, L) {
        let core = self.state.into_inner().core.into_inner();
        (core.engine, core.ledger)
    }

    fn transact<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Core<E, L>) -> Result<R>,
    ) -> Result<R> {
        let state = self.state.lock();
        let _guard = match OperationGuard::enter(&state.in_progress, operation) {
            Ok(guard) => guard,
            Err(err) => {
                warn!("{} {} rejected: {}", LogEmoji::WARNING, operation, err);
                return Err(err);
            }
        };
        let mut core = state.core.borrow_mut();
        let savepoint = core.savepoint();

        match f(&mut *core) {
            Ok(value) => {
                core.registry.commit();
                debug!("{} {} committed", LogEmoji::SUCCESS, operation);
                Ok(value)
            }
            Err(err) => {
                core.restore(savepoint);
                crate::log_revert!("{} reverted: {}", operation, err);
                Err(err)
            }
        }
    }

    fn read<R>(&self, operation: &'static str, f: impl FnOnce(&Core<E, L>) -> R) -> Result<R> {
        let state = self.state.lock();
        if state.in_progress.get() {
            return Err(AdapterError::Reentrancy { operation });
        }
        let core = state.core.borrow();
        Ok(f(&*core))
    }
}
