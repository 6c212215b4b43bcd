//! Swap Router
//!
//! Single-hop and multi-hop exact-input swaps. The input is pulled once,
//! up front; each hop's output stays in adapter custody and feeds the next
//! hop directly. Only the final output is checked against the caller's
//! minimum: intermediate hops carry no bound of their own.

use crate::adapter::Core;
use crate::engine::{AmmEngine, SwapParams};
use crate::errors::{AdapterError, Result};
use crate::ledger::AssetLedger;
use crate::log_swap;
use crate::types::{AssetId, Balance, CallContext, PoolHandle, SwapPath};
use std::collections::HashSet;
use tracing::debug;

/// A resolved leg of a path
#[derive(Debug, Clone, Copy)]
struct Hop {
    pool: PoolHandle,
    asset_in: AssetId,
    asset_out: AssetId,
}

pub struct SwapRouter<'a, E, L> {
    core: &'a mut Core<E, L>,
}

impl<'a, E, L> SwapRouter<'a, E, L>
where
    L: AssetLedger,
    E: AmmEngine<L>,
{
    pub(crate) fn new(core: &'a mut Core<E, L>) -> Self {
        Self { core }
    }

    /// Direct swap through the `{asset_in, asset_out}` pool
    pub fn swap(
        &mut self,
        ctx: &CallContext,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_in: Balance,
        amount_out_min: Balance,
    ) -> Result<Balance> {
        // Surface identical assets as a pair error rather than a path error
        self.core.pair_key(asset_in, asset_out)?;
        let path = SwapPath::new(vec![asset_in, asset_out])?;
        self.swap_by_path(ctx, &path, amount_in, amount_out_min)
    }

    pub fn swap_by_path(
        &mut self,
        ctx: &CallContext,
        path: &SwapPath,
        amount_in: Balance,
        amount_out_min: Balance,
    ) -> Result<Balance> {
        if amount_in == 0 {
            return Err(AdapterError::invalid_amount("amount in must be positive"));
        }
        check_path(self.core, path)?;
        check_attached_value(ctx, path, amount_in)?;

        // Every pool must exist before any funds move
        let hops = self.resolve_hops(path)?;

        let input = path.input();
        if input.is_native() {
            self.core.collect_value(ctx)?;
        } else {
            self.core.pull(input, ctx.caller, amount_in)?;
        }

        let last = hops.len() - 1;
        let mut amount = amount_in;
        for (index, hop) in hops.iter().enumerate() {
            let hop_min = if index == last { amount_out_min } else { 0 };
            amount = self.execute_hop(hop, amount, hop_min)?;
            debug!(
                "Hop {}/{}: {} -> {} via {} yielded {}",
                index + 1,
                hops.len(),
                hop.asset_in,
                hop.asset_out,
                hop.pool,
                amount
            );
        }

        let output = path.output();
        if amount < amount_out_min {
            return Err(AdapterError::SlippageExceeded {
                asset: output,
                minimum: amount_out_min,
                actual: amount,
            });
        }
        self.core.deliver(output, ctx.caller, amount)?;

        log_swap!(
            "Swapped {} {} for {} {} over {} hop(s) for {}",
            amount_in,
            input,
            amount,
            output,
            hops.len(),
            ctx.caller
        );
        Ok(amount)
    }

    /// Amounts along `path` starting with `amount_in`, without moving funds
    pub(crate) fn quote_by_path(
        core: &Core<E, L>,
        path: &SwapPath,
        amount_in: Balance,
    ) -> Result<Vec<Balance>> {
        if amount_in == 0 {
            return Err(AdapterError::invalid_amount("amount in must be positive"));
        }
        check_path(core, path)?;
        let mut amounts = Vec::with_capacity(path.assets().len());
        amounts.push(amount_in);

        let mut amount = amount_in;
        for (asset_in, asset_out) in path.hops() {
            let pair = core.pair_key(asset_in, asset_out)?;
            let pool = core.registry.peek(&core.engine, pair)?;
            amount = core
                .engine
                .quote_exact_in(pool, core.normalize(asset_in), amount)?;
            amounts.push(amount);
        }
        Ok(amounts)
    }

    fn resolve_hops(&mut self, path: &SwapPath) -> Result<Vec<Hop>> {
        let mut hops = Vec::with_capacity(path.hop_count());
        for (asset_in, asset_out) in path.hops() {
            let pair = self.core.pair_key(asset_in, asset_out)?;
            let core = &mut *self.core;
            let pool = core.registry.lookup(&core.engine, pair)?;
            hops.push(Hop {
                pool,
                asset_in: core.normalize(asset_in),
                asset_out: core.normalize(asset_out),
            });
        }
        Ok(hops)
    }

    /// Approve exactly `amount_in`, swap into adapter custody, drop any
    /// leftover allowance
    fn execute_hop(&mut self, hop: &Hop, amount_in: Balance, amount_out_min: Balance) -> Result<Balance> {
        self.core.approve_router(hop.asset_in, amount_in)?;

        let core = &mut *self.core;
        let amount_out = core.engine.swap_exact_in(
            &mut core.ledger,
            SwapParams {
                pool: hop.pool,
                asset_in: hop.asset_in,
                amount_in,
                amount_out_min,
                payer: core.account,
                recipient: core.account,
            },
        )?;

        self.core.revoke_router(hop.asset_in)?;
        Ok(amount_out)
    }
}

/// Hop limit, and no pooled asset visited twice once native currency is
/// wrapped
fn check_path<E, L>(core: &Core<E, L>, path: &SwapPath) -> Result<()>
where
    L: AssetLedger,
    E: AmmEngine<L>,
{
    if path.hop_count() > core.max_hops {
        return Err(AdapterError::InvalidPath {
            reason: format!(
                "{} hops exceeds the limit of {}",
                path.hop_count(),
                core.max_hops
            ),
        });
    }
    let mut seen = HashSet::with_capacity(path.assets().len());
    for &asset in path.assets() {
        let pooled = core.normalize(asset);
        if !seen.insert(pooled) {
            return Err(AdapterError::InvalidPath {
                reason: format!("{} appears more than once as {}", asset, pooled),
            });
        }
    }
    Ok(())
}

/// Attached value is only meaningful when the path starts with native
/// currency, and then it must be exactly the input amount
fn check_attached_value(ctx: &CallContext, path: &SwapPath, amount_in: Balance) -> Result<()> {
    if path.input().is_native() {
        if ctx.value != amount_in {
            return Err(AdapterError::invalid_amount(format!(
                "attached value {} does not match native input {}",
                ctx.value, amount_in
            )));
        }
    } else if ctx.value != 0 {
        return Err(AdapterError::invalid_amount(format!(
            "unexpected attached value {}",
            ctx.value
        )));
    }
    Ok(())
}
