//! Common Test Utilities for the AMM adapter
//!
//! In-memory collaborators (a fungible-asset ledger with optional transfer
//! hooks and a constant-product engine with a 0.3% fee) plus fixtures
//! shared by every integration suite.

#![allow(dead_code)]

use amm_adapter::{
    AddLiquidityParams, Adapter, AdapterConfig, Address, AmmEngine, AssetId, AssetLedger, Balance,
    EngineError, LedgerError, LiquidityAdded, LiquidityRemoved, PairKey, PoolFactory, PoolHandle,
    RemoveLiquidityParams, SwapParams, Transactional,
};
use std::collections::{HashMap, HashSet};

pub const ADAPTER: Address = Address::repeat_byte(0xad);
pub const FACTORY: Address = Address::repeat_byte(0xfa);
pub const ROUTER: Address = Address::repeat_byte(0xee);

pub const ALICE: Address = Address::repeat_byte(0xa1);
pub const BOB: Address = Address::repeat_byte(0xb0);

pub const WNATIVE: AssetId = AssetId::Token(Address::repeat_byte(0x0e));
pub const TOKEN_A: AssetId = AssetId::Token(Address::repeat_byte(0x0a));
pub const TOKEN_B: AssetId = AssetId::Token(Address::repeat_byte(0x0b));
pub const TOKEN_C: AssetId = AssetId::Token(Address::repeat_byte(0x0c));
pub const TOKEN_D: AssetId = AssetId::Token(Address::repeat_byte(0x0d));

pub const TOKENS: [AssetId; 4] = [TOKEN_A, TOKEN_B, TOKEN_C, TOKEN_D];

/// Starting balance of every funded account in every asset
pub const INITIAL_BALANCE: Balance = 1_000_000_000;

pub type TestAdapter = Adapter<ConstantProductEngine, InMemoryLedger>;

/// Called after every successful balance movement with
/// `(asset, from, to, amount)`
pub type TransferHook = Box<dyn FnMut(AssetId, Address, Address, Balance) + Send>;

// =========================================================================
// Ledger
// =========================================================================

/// Balances and allowances; the part of the ledger that rolls back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    balances: HashMap<(AssetId, Address), Balance>,
    allowances: HashMap<(AssetId, Address, Address), Balance>,
}

pub struct InMemoryLedger {
    state: LedgerSnapshot,
    /// `(owner, spender)` pairs with unlimited allowance over every token
    operators: HashSet<(Address, Address)>,
    /// Recipients whose incoming transfers are refused
    blocked: HashSet<Address>,
    wrapped: AssetId,
    hook: Option<TransferHook>,
}

impl InMemoryLedger {
    pub fn new(wrapped: AssetId) -> Self {
        Self {
            state: LedgerSnapshot::default(),
            operators: HashSet::new(),
            blocked: HashSet::new(),
            wrapped,
            hook: None,
        }
    }

    pub fn mint(&mut self, asset: AssetId, holder: Address, amount: Balance) -> Result<(), LedgerError> {
        let balance = self.balance_of(asset, holder);
        let updated = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { asset })?;
        self.state.balances.insert((asset, holder), updated);
        Ok(())
    }

    pub fn burn(&mut self, asset: AssetId, holder: Address, amount: Balance) -> Result<(), LedgerError> {
        let balance = self.balance_of(asset, holder);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                asset,
                holder,
                needed: amount,
                available: balance,
            });
        }
        self.state.balances.insert((asset, holder), balance - amount);
        Ok(())
    }

    /// Unlimited allowance from `owner` to `spender` over every token
    pub fn approve_all(&mut self, owner: Address, spender: Address) {
        self.operators.insert((owner, spender));
    }

    pub fn block_recipient(&mut self, recipient: Address) {
        self.blocked.insert(recipient);
    }

    pub fn set_hook(&mut self, hook: TransferHook) {
        self.hook = Some(hook);
    }

    /// Every non-zero balance held by `holder`
    pub fn holdings(&self, holder: Address) -> Vec<(AssetId, Balance)> {
        let mut holdings: Vec<_> = self
            .state
            .balances
            .iter()
            .filter(|((_, owner), amount)| *owner == holder && **amount > 0)
            .map(|((asset, _), amount)| (*asset, *amount))
            .collect();
        holdings.sort();
        holdings
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.clone()
    }

    /// Checks both sides before touching either, then fires the hook
    fn move_balance(
        &mut self,
        asset: AssetId,
        from: Address,
        to: Address,
        amount: Balance,
    ) -> Result<(), LedgerError> {
        if self.blocked.contains(&to) {
            return Err(LedgerError::Rejected {
                asset,
                reason: format!("recipient {} is blocked", to),
            });
        }
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                asset,
                holder: from,
                needed: amount,
                available,
            });
        }
        if from != to {
            let credited = self
                .balance_of(asset, to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow { asset })?;
            self.state.balances.insert((asset, from), available - amount);
            self.state.balances.insert((asset, to), credited);
        }

        if let Some(hook) = self.hook.as_mut() {
            hook(asset, from, to, amount);
        }
        Ok(())
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance_of(&self, asset: AssetId, holder: Address) -> Balance {
        self.state
            .balances
            .get(&(asset, holder))
            .copied()
            .unwrap_or(0)
    }

    fn allowance(&self, asset: AssetId, owner: Address, spender: Address) -> Balance {
        if !asset.is_native() && self.operators.contains(&(owner, spender)) {
            return Balance::MAX;
        }
        self.state
            .allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        asset: AssetId,
        sender: Address,
        recipient: Address,
        amount: Balance,
    ) -> Result<(), LedgerError> {
        self.move_balance(asset, sender, recipient, amount)
    }

    fn transfer_from(
        &mut self,
        asset: AssetId,
        spender: Address,
        owner: Address,
        recipient: Address,
        amount: Balance,
    ) -> Result<(), LedgerError> {
        if asset.is_native() {
            return Err(LedgerError::Unsupported {
                asset,
                operation: "transfer_from",
            });
        }
        let unlimited = self.operators.contains(&(owner, spender));
        let allowance = self.allowance(asset, owner, spender);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                asset,
                owner,
                spender,
                needed: amount,
                available: allowance,
            });
        }

        // The hook may observe the allowance, so spend it before moving
        let before = self.state.clone();
        if !unlimited {
            self.state
                .allowances
                .insert((asset, owner, spender), allowance - amount);
        }
        if let Err(err) = self.move_balance(asset, owner, recipient, amount) {
            self.state = before;
            return Err(err);
        }
        Ok(())
    }

    fn approve(
        &mut self,
        asset: AssetId,
        owner: Address,
        spender: Address,
        amount: Balance,
    ) -> Result<(), LedgerError> {
        if asset.is_native() {
            return Err(LedgerError::Unsupported {
                asset,
                operation: "approve",
            });
        }
        if amount == 0 {
            self.state.allowances.remove(&(asset, owner, spender));
        } else {
            self.state.allowances.insert((asset, owner, spender), amount);
        }
        Ok(())
    }

    fn wrapped_native(&self) -> AssetId {
        self.wrapped
    }

    fn wrap_native(&mut self, holder: Address, amount: Balance) -> Result<(), LedgerError> {
        let before = self.state.clone();
        self.burn(AssetId::Native, holder, amount)?;
        if let Err(err) = self.mint(self.wrapped, holder, amount) {
            self.state = before;
            return Err(err);
        }
        Ok(())
    }

    fn unwrap_native(&mut self, holder: Address, amount: Balance) -> Result<(), LedgerError> {
        let before = self.state.clone();
        self.burn(self.wrapped, holder, amount)?;
        if let Err(err) = self.mint(AssetId::Native, holder, amount) {
            self.state = before;
            return Err(err);
        }
        Ok(())
    }
}

impl Transactional for InMemoryLedger {
    type Checkpoint = LedgerSnapshot;

    fn checkpoint(&self) -> LedgerSnapshot {
        self.state.clone()
    }

    fn rollback(&mut self, checkpoint: LedgerSnapshot) {
        self.state = checkpoint;
    }
}

// =========================================================================
// Engine
// =========================================================================

/// Reserves in canonical pair order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub pair: PairKey,
    pub reserve0: Balance,
    pub reserve1: Balance,
    pub total_supply: Balance,
}

impl PoolState {
    fn oriented(&self, a: AssetId, b: AssetId) -> Result<(Balance, Balance), EngineError> {
        if a == self.pair.first() && b == self.pair.second() {
            Ok((self.reserve0, self.reserve1))
        } else if a == self.pair.second() && b == self.pair.first() {
            Ok((self.reserve1, self.reserve0))
        } else {
            Err(EngineError::Rejected(format!(
                "{}/{} does not match pool {}",
                a, b, self.pair
            )))
        }
    }

    fn set_oriented(&mut self, a: AssetId, reserve_a: Balance, reserve_b: Balance) {
        if a == self.pair.first() {
            self.reserve0 = reserve_a;
            self.reserve1 = reserve_b;
        } else {
            self.reserve0 = reserve_b;
            self.reserve1 = reserve_a;
        }
    }
}

/// Uniswap-V2 style factory and router over [`InMemoryLedger`]
///
/// Pool tokens are held by the pool address in the ledger; reserves are
/// tracked here and always match those balances.
#[derive(Debug, Clone)]
pub struct ConstantProductEngine {
    factory: Address,
    router: Address,
    pools: HashMap<PairKey, PoolHandle>,
    states: HashMap<PoolHandle, PoolState>,
    created: u32,
    paused: bool,
}

impl ConstantProductEngine {
    pub fn new(factory: Address, router: Address) -> Self {
        Self {
            factory,
            router,
            pools: HashMap::new(),
            states: HashMap::new(),
            created: 0,
            paused: false,
        }
    }

    /// Refuse every further `create_pool`
    pub fn pause_factory(&mut self) {
        self.paused = true;
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Reserves of `pool` in `(a, b)` order
    pub fn reserves(&self, pool: PoolHandle, a: AssetId, b: AssetId) -> Option<(Balance, Balance)> {
        self.states.get(&pool)?.oriented(a, b).ok()
    }

    pub fn total_supply(&self, pool: PoolHandle) -> Balance {
        self.states.get(&pool).map_or(0, |s| s.total_supply)
    }

    fn pool_address(index: u32) -> Address {
        let mut bytes = [0u8; 20];
        bytes[0] = 0x9f;
        bytes[16..].copy_from_slice(&index.to_be_bytes());
        Address::new(bytes)
    }

    fn state(&self, pool: PoolHandle) -> Result<PoolState, EngineError> {
        self.states
            .get(&pool)
            .cloned()
            .ok_or(EngineError::UnknownPool(pool))
    }

    /// Run `f` against the ledger, undoing its ledger effects on error
    fn atomically<T>(
        ledger: &mut InMemoryLedger,
        f: impl FnOnce(&mut InMemoryLedger) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let checkpoint = ledger.checkpoint();
        let result = f(ledger);
        if result.is_err() {
            ledger.rollback(checkpoint);
        }
        result
    }
}

fn overflow() -> EngineError {
    EngineError::Rejected("arithmetic overflow".to_string())
}

/// Output for `amount_in` against `(reserve_in, reserve_out)` with a 0.3% fee
pub fn get_amount_out(
    amount_in: Balance,
    reserve_in: Balance,
    reserve_out: Balance,
) -> Result<Balance, EngineError> {
    let amount_in_with_fee = amount_in.checked_mul(997).ok_or_else(overflow)?;
    let numerator = amount_in_with_fee
        .checked_mul(reserve_out)
        .ok_or_else(overflow)?;
    let denominator = reserve_in
        .checked_mul(1000)
        .and_then(|r| r.checked_add(amount_in_with_fee))
        .ok_or_else(overflow)?;
    Ok(numerator / denominator)
}

pub fn isqrt(value: Balance) -> Balance {
    if value < 2 {
        return value;
    }
    let mut x = value;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x
}

impl PoolFactory for ConstantProductEngine {
    fn factory_address(&self) -> Address {
        self.factory
    }

    fn create_pool(&mut self, pair: PairKey) -> Result<PoolHandle, EngineError> {
        if self.paused {
            return Err(EngineError::Rejected("factory paused".to_string()));
        }
        if self.pools.contains_key(&pair) {
            return Err(EngineError::PoolExists(pair));
        }
        self.created += 1;
        let handle = PoolHandle(Self::pool_address(self.created));
        self.pools.insert(pair, handle);
        self.states.insert(
            handle,
            PoolState {
                pair,
                reserve0: 0,
                reserve1: 0,
                total_supply: 0,
            },
        );
        Ok(handle)
    }

    fn get_pool(&self, pair: PairKey) -> Option<PoolHandle> {
        self.pools.get(&pair).copied()
    }
}

impl AmmEngine<InMemoryLedger> for ConstantProductEngine {
    fn router_address(&self) -> Address {
        self.router
    }

    fn add_liquidity(
        &mut self,
        ledger: &mut InMemoryLedger,
        params: AddLiquidityParams,
    ) -> Result<LiquidityAdded, EngineError> {
        if params.asset_a == params.asset_b {
            return Err(EngineError::IdenticalAssets);
        }
        let mut state = self.state(params.pool)?;
        let (reserve_a, reserve_b) = state.oriented(params.asset_a, params.asset_b)?;

        let (amount_a, amount_b) = if reserve_a == 0 && reserve_b == 0 {
            (params.amount_a_desired, params.amount_b_desired)
        } else {
            let b_optimal = params
                .amount_a_desired
                .checked_mul(reserve_b)
                .ok_or_else(overflow)?
                / reserve_a;
            if b_optimal <= params.amount_b_desired {
                if b_optimal < params.amount_b_min {
                    return Err(EngineError::InsufficientAmount {
                        asset: params.asset_b,
                        minimum: params.amount_b_min,
                        actual: b_optimal,
                    });
                }
                (params.amount_a_desired, b_optimal)
            } else {
                let a_optimal = params
                    .amount_b_desired
                    .checked_mul(reserve_a)
                    .ok_or_else(overflow)?
                    / reserve_b;
                if a_optimal < params.amount_a_min {
                    return Err(EngineError::InsufficientAmount {
                        asset: params.asset_a,
                        minimum: params.amount_a_min,
                        actual: a_optimal,
                    });
                }
                (a_optimal, params.amount_b_desired)
            }
        };

        let liquidity = if state.total_supply == 0 {
            isqrt(amount_a.checked_mul(amount_b).ok_or_else(overflow)?)
        } else {
            let by_a = amount_a
                .checked_mul(state.total_supply)
                .ok_or_else(overflow)?
                / reserve_a;
            let by_b = amount_b
                .checked_mul(state.total_supply)
                .ok_or_else(overflow)?
                / reserve_b;
            by_a.min(by_b)
        };
        if liquidity == 0 {
            return Err(EngineError::InsufficientLiquidity(params.pool));
        }

        let pool_address = params.pool.address();
        let router = self.router;
        Self::atomically(ledger, |ledger| {
            ledger.transfer_from(params.asset_a, router, params.payer, pool_address, amount_a)?;
            ledger.transfer_from(params.asset_b, router, params.payer, pool_address, amount_b)?;
            ledger.mint(params.pool.liquidity_token(), params.recipient, liquidity)?;
            Ok(())
        })?;

        state.set_oriented(params.asset_a, reserve_a + amount_a, reserve_b + amount_b);
        state.total_supply += liquidity;
        self.states.insert(params.pool, state);

        Ok(LiquidityAdded {
            amount_a,
            amount_b,
            liquidity,
        })
    }

    fn remove_liquidity(
        &mut self,
        ledger: &mut InMemoryLedger,
        params: RemoveLiquidityParams,
    ) -> Result<LiquidityRemoved, EngineError> {
        let mut state = self.state(params.pool)?;
        let (reserve_a, reserve_b) = state.oriented(params.asset_a, params.asset_b)?;
        if state.total_supply == 0 || params.liquidity > state.total_supply {
            return Err(EngineError::InsufficientLiquidity(params.pool));
        }

        let amount_a = params
            .liquidity
            .checked_mul(reserve_a)
            .ok_or_else(overflow)?
            / state.total_supply;
        let amount_b = params
            .liquidity
            .checked_mul(reserve_b)
            .ok_or_else(overflow)?
            / state.total_supply;
        if amount_a == 0 || amount_b == 0 {
            return Err(EngineError::InsufficientLiquidity(params.pool));
        }
        if amount_a < params.amount_a_min {
            return Err(EngineError::InsufficientAmount {
                asset: params.asset_a,
                minimum: params.amount_a_min,
                actual: amount_a,
            });
        }
        if amount_b < params.amount_b_min {
            return Err(EngineError::InsufficientAmount {
                asset: params.asset_b,
                minimum: params.amount_b_min,
                actual: amount_b,
            });
        }

        let pool_address = params.pool.address();
        let lp_token = params.pool.liquidity_token();
        let router = self.router;
        Self::atomically(ledger, |ledger| {
            ledger.transfer_from(lp_token, router, params.payer, pool_address, params.liquidity)?;
            ledger.burn(lp_token, pool_address, params.liquidity)?;
            ledger.transfer(params.asset_a, pool_address, params.recipient, amount_a)?;
            ledger.transfer(params.asset_b, pool_address, params.recipient, amount_b)?;
            Ok(())
        })?;

        state.set_oriented(params.asset_a, reserve_a - amount_a, reserve_b - amount_b);
        state.total_supply -= params.liquidity;
        self.states.insert(params.pool, state);

        Ok(LiquidityRemoved { amount_a, amount_b })
    }

    fn swap_exact_in(
        &mut self,
        ledger: &mut InMemoryLedger,
        params: SwapParams,
    ) -> Result<Balance, EngineError> {
        let mut state = self.state(params.pool)?;
        let asset_out = state
            .pair
            .other(&params.asset_in)
            .ok_or_else(|| EngineError::Rejected(format!("{} not in {}", params.asset_in, state.pair)))?;
        let amount_out = self.quote_exact_in(params.pool, params.asset_in, params.amount_in)?;
        if amount_out == 0 || amount_out < params.amount_out_min {
            return Err(EngineError::InsufficientOutputAmount {
                asset: asset_out,
                minimum: params.amount_out_min.max(1),
                actual: amount_out,
            });
        }

        let (reserve_in, reserve_out) = state.oriented(params.asset_in, asset_out)?;
        let pool_address = params.pool.address();
        let router = self.router;
        Self::atomically(ledger, |ledger| {
            ledger.transfer_from(params.asset_in, router, params.payer, pool_address, params.amount_in)?;
            ledger.transfer(asset_out, pool_address, params.recipient, amount_out)?;
            Ok(())
        })?;

        state.set_oriented(
            params.asset_in,
            reserve_in + params.amount_in,
            reserve_out - amount_out,
        );
        self.states.insert(params.pool, state);
        Ok(amount_out)
    }

    fn quote_exact_in(
        &self,
        pool: PoolHandle,
        asset_in: AssetId,
        amount_in: Balance,
    ) -> Result<Balance, EngineError> {
        let state = self.states.get(&pool).ok_or(EngineError::UnknownPool(pool))?;
        let asset_out = state
            .pair
            .other(&asset_in)
            .ok_or_else(|| EngineError::Rejected(format!("{} not in {}", asset_in, state.pair)))?;
        let (reserve_in, reserve_out) = state.oriented(asset_in, asset_out)?;
        if reserve_in == 0 || reserve_out == 0 {
            return Err(EngineError::InsufficientLiquidity(pool));
        }
        get_amount_out(amount_in, reserve_in, reserve_out)
    }
}

impl Transactional for ConstantProductEngine {
    type Checkpoint = ConstantProductEngine;

    fn checkpoint(&self) -> Self::Checkpoint {
        self.clone()
    }

    fn rollback(&mut self, checkpoint: Self::Checkpoint) {
        *self = checkpoint;
    }
}

// =========================================================================
// Fixtures
// =========================================================================

pub fn config() -> AdapterConfig {
    AdapterConfig::new(ADAPTER, FACTORY, ROUTER)
}

pub fn engine() -> ConstantProductEngine {
    ConstantProductEngine::new(FACTORY, ROUTER)
}

/// Ledger where ALICE holds `INITIAL_BALANCE` of every token and of native
/// currency, and has granted the adapter unlimited allowance
pub fn funded_ledger() -> InMemoryLedger {
    let mut ledger = InMemoryLedger::new(WNATIVE);
    for asset in TOKENS.into_iter().chain([AssetId::Native]) {
        ledger.mint(asset, ALICE, INITIAL_BALANCE).unwrap();
    }
    ledger.approve_all(ALICE, ADAPTER);
    ledger
}

pub fn setup() -> TestAdapter {
    setup_with(|_| {})
}

/// Like [`setup`], with a chance to adjust the ledger first
pub fn setup_with(customize: impl FnOnce(&mut InMemoryLedger)) -> TestAdapter {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("amm_adapter=debug")
        .with_test_writer()
        .try_init();

    let mut ledger = funded_ledger();
    customize(&mut ledger);
    Adapter::new(config(), engine(), ledger).unwrap()
}

pub fn balance(adapter: &TestAdapter, asset: AssetId, holder: Address) -> Balance {
    adapter
        .inspect(|_, ledger| ledger.balance_of(asset, holder))
        .unwrap()
}

pub fn reserves(adapter: &TestAdapter, pool: PoolHandle, a: AssetId, b: AssetId) -> (Balance, Balance) {
    adapter
        .inspect(|engine, _| engine.reserves(pool, a, b))
        .unwrap()
        .unwrap()
}

pub fn ledger_snapshot(adapter: &TestAdapter) -> LedgerSnapshot {
    adapter.inspect(|_, ledger| ledger.snapshot()).unwrap()
}

/// The adapter must end every operation holding nothing and owing the
/// router nothing
pub fn assert_custody_clear(adapter: &TestAdapter) {
    let account = adapter.account();
    assert_eq!(account, ADAPTER);
    adapter
        .inspect(|engine, ledger| {
            assert!(
                ledger.holdings(account).is_empty(),
                "adapter still holds {:?}",
                ledger.holdings(account)
            );
            let mut assets: Vec<AssetId> = TOKENS.to_vec();
            assets.push(WNATIVE);
            assets.extend(engine.pools.values().map(|p| p.liquidity_token()));
            for asset in assets {
                assert_eq!(ledger.allowance(asset, account, ROUTER), 0, "router allowance left on {}", asset);
            }
        })
        .unwrap();
}

/// ALICE seeds A/B at 1000/1000 and B/C at 1000 B / 500 C
pub fn seed_three_asset_pools(adapter: &TestAdapter) -> (PoolHandle, PoolHandle) {
    let alice = amm_adapter::CallContext::new(ALICE);
    adapter
        .add_liquidity(alice, TOKEN_A, TOKEN_B, 1000, 1000, 0, 0)
        .unwrap();
    adapter
        .add_liquidity(alice, TOKEN_B, TOKEN_C, 1000, 500, 0, 0)
        .unwrap();
    let ab = adapter.pairs(TOKEN_A, TOKEN_B).unwrap().unwrap();
    let bc = adapter.pairs(TOKEN_B, TOKEN_C).unwrap().unwrap();
    (ab, bc)
}
