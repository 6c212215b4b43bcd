//! Liquidity Manager
//!
//! Wraps add/remove liquidity for token/token and token/native pools.
//! Funds are pulled into adapter custody, handed to the router, and
//! whatever the engine did not consume goes straight back to the caller
//! in the same operation. Pool tokens are minted to the caller, never to
//! the adapter.

use crate::adapter::Core;
use crate::engine::{
    AddLiquidityParams, AmmEngine, LiquidityAdded, LiquidityRemoved, RemoveLiquidityParams,
};
use crate::errors::{AdapterError, EngineError, Result};
use crate::ledger::AssetLedger;
use crate::types::{AssetId, Balance, CallContext, PairKey, PoolHandle};
use crate::{log_burn, log_mint, log_refund};

/// One side of a liquidity operation
///
/// `asset` is what the caller named (possibly native); `pooled` is what the
/// pool holds (native replaced by the wrapped token).
#[derive(Debug, Clone, Copy)]
struct Leg {
    asset: AssetId,
    pooled: AssetId,
    desired: Balance,
    min: Balance,
}

pub struct LiquidityManager<'a, E, L> {
    core: &'a mut Core<E, L>,
}

impl<'a, E, L> LiquidityManager<'a, E, L>
where
    L: AssetLedger,
    E: AmmEngine<L>,
{
    pub(crate) fn new(core: &'a mut Core<E, L>) -> Self {
        Self { core }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        &mut self,
        ctx: &CallContext,
        asset_a: AssetId,
        asset_b: AssetId,
        amount_a_desired: Balance,
        amount_b_desired: Balance,
        amount_a_min: Balance,
        amount_b_min: Balance,
    ) -> Result<LiquidityAdded> {
        ensure_no_value(ctx)?;
        if asset_a.is_native() || asset_b.is_native() {
            return Err(AdapterError::invalid_amount(
                "native currency must be supplied through add_liquidity_native",
            ));
        }
        let leg_a = self.leg(asset_a, amount_a_desired, amount_a_min)?;
        let leg_b = self.leg(asset_b, amount_b_desired, amount_b_min)?;
        let pair = PairKey::new(leg_a.pooled, leg_b.pooled)?;

        let pool = self.ensure_pool(pair)?;
        self.core.pull(leg_a.pooled, ctx.caller, leg_a.desired)?;
        self.core.pull(leg_b.pooled, ctx.caller, leg_b.desired)?;

        self.provide(ctx, pool, leg_a, leg_b)
    }

    pub fn add_liquidity_native(
        &mut self,
        ctx: &CallContext,
        asset: AssetId,
        amount_desired: Balance,
        amount_min: Balance,
        native_amount_min: Balance,
    ) -> Result<LiquidityAdded> {
        if ctx.value == 0 {
            return Err(AdapterError::invalid_amount(
                "native liquidity requires attached value",
            ));
        }
        let leg_token = self.leg(asset, amount_desired, amount_min)?;
        let leg_native = self.leg(AssetId::Native, ctx.value, native_amount_min)?;
        let pair = PairKey::new(leg_token.pooled, leg_native.pooled)?;

        let pool = self.ensure_pool(pair)?;
        self.core.pull(leg_token.pooled, ctx.caller, leg_token.desired)?;
        self.core.collect_value(ctx)?;

        self.provide(ctx, pool, leg_token, leg_native)
    }

    pub fn remove_liquidity(
        &mut self,
        ctx: &CallContext,
        asset_a: AssetId,
        asset_b: AssetId,
        liquidity: Balance,
        amount_a_min: Balance,
        amount_b_min: Balance,
    ) -> Result<LiquidityRemoved> {
        ensure_no_value(ctx)?;
        if asset_a.is_native() || asset_b.is_native() {
            return Err(AdapterError::invalid_amount(
                "native currency must be withdrawn through remove_liquidity_native",
            ));
        }
        self.withdraw(ctx, asset_a, asset_b, liquidity, amount_a_min, amount_b_min)
    }

    /// `amount_a` of the result is `asset`, `amount_b` the unwrapped native
    pub fn remove_liquidity_native(
        &mut self,
        ctx: &CallContext,
        asset: AssetId,
        liquidity: Balance,
        amount_min: Balance,
        native_amount_min: Balance,
    ) -> Result<LiquidityRemoved> {
        ensure_no_value(ctx)?;
        self.withdraw(
            ctx,
            asset,
            AssetId::Native,
            liquidity,
            amount_min,
            native_amount_min,
        )
    }

    fn leg(&self, asset: AssetId, desired: Balance, min: Balance) -> Result<Leg> {
        if desired == 0 {
            return Err(AdapterError::invalid_amount(format!(
                "desired amount of {} must be positive",
                asset
            )));
        }
        if min > desired {
            return Err(AdapterError::invalid_amount(format!(
                "minimum {} of {} exceeds desired {}",
                min, asset, desired
            )));
        }
        Ok(Leg {
            asset,
            pooled: self.core.normalize(asset),
            desired,
            min,
        })
    }

    /// Resolve or lazily create the pool; creation failures become
    /// `PoolUnavailable`
    fn ensure_pool(&mut self, pair: PairKey) -> Result<PoolHandle> {
        let core = &mut *self.core;
        core.registry
            .create(&mut core.engine, pair.first(), pair.second())
            .map_err(|err| match err {
                AdapterError::EngineFailure(source) => AdapterError::PoolUnavailable { pair, source },
                other => other,
            })
    }

    /// Hand both legs (already in custody) to the router, check the
    /// outcome, and refund the unconsumed remainder
    fn provide(&mut self, ctx: &CallContext, pool: PoolHandle, a: Leg, b: Leg) -> Result<LiquidityAdded> {
        self.core.approve_router(a.pooled, a.desired)?;
        self.core.approve_router(b.pooled, b.desired)?;

        let core = &mut *self.core;
        let added = core.engine.add_liquidity(
            &mut core.ledger,
            AddLiquidityParams {
                pool,
                asset_a: a.pooled,
                asset_b: b.pooled,
                amount_a_desired: a.desired,
                amount_b_desired: b.desired,
                amount_a_min: a.min,
                amount_b_min: b.min,
                payer: core.account,
                recipient: ctx.caller,
            },
        )?;

        self.core.revoke_router(a.pooled)?;
        self.core.revoke_router(b.pooled)?;

        check_consumed(a, added.amount_a)?;
        check_consumed(b, added.amount_b)?;

        self.refund(ctx, a, added.amount_a)?;
        self.refund(ctx, b, added.amount_b)?;

        log_mint!(
            "Added {} {} + {} {} to {}, minted {} to {}",
            added.amount_a,
            a.asset,
            added.amount_b,
            b.asset,
            pool,
            added.liquidity,
            ctx.caller
        );
        Ok(added)
    }

    fn refund(&mut self, ctx: &CallContext, leg: Leg, consumed: Balance) -> Result<()> {
        let unused = leg.desired - consumed;
        if unused > 0 {
            log_refund!("Refunding {} unused {} to {}", unused, leg.asset, ctx.caller);
            self.core.deliver(leg.asset, ctx.caller, unused)?;
        }
        Ok(())
    }

    /// Burn pool tokens pulled from the caller and forward both underlying
    /// assets; `asset_b` may be native
    fn withdraw(
        &mut self,
        ctx: &CallContext,
        asset_a: AssetId,
        asset_b: AssetId,
        liquidity: Balance,
        amount_a_min: Balance,
        amount_b_min: Balance,
    ) -> Result<LiquidityRemoved> {
        if liquidity == 0 {
            return Err(AdapterError::invalid_amount("liquidity to remove must be positive"));
        }
        let pooled_a = self.core.normalize(asset_a);
        let pooled_b = self.core.normalize(asset_b);
        let pair = PairKey::new(pooled_a, pooled_b)?;

        let core = &mut *self.core;
        let pool = core.registry.lookup(&core.engine, pair)?;
        let lp_token = pool.liquidity_token();

        self.core.pull(lp_token, ctx.caller, liquidity)?;
        self.core.approve_router(lp_token, liquidity)?;

        let core = &mut *self.core;
        let removed = core.engine.remove_liquidity(
            &mut core.ledger,
            RemoveLiquidityParams {
                pool,
                asset_a: pooled_a,
                asset_b: pooled_b,
                liquidity,
                amount_a_min,
                amount_b_min,
                payer: core.account,
                recipient: core.account,
            },
        )?;
        self.core.revoke_router(lp_token)?;

        check_minimum(asset_a, amount_a_min, removed.amount_a)?;
        check_minimum(asset_b, amount_b_min, removed.amount_b)?;

        self.core.deliver(asset_a, ctx.caller, removed.amount_a)?;
        self.core.deliver(asset_b, ctx.caller, removed.amount_b)?;

        log_burn!(
            "Burned {} of {} for {} {} + {} {} to {}",
            liquidity,
            pool,
            removed.amount_a,
            asset_a,
            removed.amount_b,
            asset_b,
            ctx.caller
        );
        Ok(removed)
    }
}

fn ensure_no_value(ctx: &CallContext) -> Result<()> {
    if ctx.value != 0 {
        return Err(AdapterError::invalid_amount(format!(
            "unexpected attached value {}",
            ctx.value
        )));
    }
    Ok(())
}

fn check_minimum(asset: AssetId, minimum: Balance, actual: Balance) -> Result<()> {
    if actual < minimum {
        return Err(AdapterError::SlippageExceeded {
            asset,
            minimum,
            actual,
        });
    }
    Ok(())
}

/// The engine may consume less than desired, never more, and never less
/// than the caller's minimum
fn check_consumed(leg: Leg, consumed: Balance) -> Result<()> {
    if consumed > leg.desired {
        return Err(AdapterError::EngineFailure(EngineError::Rejected(format!(
            "engine consumed {} of {}, more than the {} offered",
            consumed, leg.asset, leg.desired
        ))));
    }
    check_minimum(leg.asset, leg.min, consumed)
}
