//! Asset ledger capability
//!
//! The fungible-asset side of the world: balances, allowances and the
//! wrapped-native token. The adapter only ever moves its own custody or
//! spends allowances it was granted; it never writes balances directly.
//!
//! Implementations may run arbitrary code (callbacks, hooks) while a
//! transfer is in flight. The adapter treats such code as untrusted and
//! rejects any attempt to re-enter it.

use crate::errors::LedgerError;
use crate::types::{Address, AssetId, Balance};

pub trait AssetLedger {
    /// Current balance of `holder` in `asset`
    fn balance_of(&self, asset: AssetId, holder: Address) -> Balance;

    /// Amount `spender` may still move out of `owner`'s balance
    fn allowance(&self, asset: AssetId, owner: Address, spender: Address) -> Balance;

    /// Move `amount` out of `sender`'s own balance.
    ///
    /// Works for every asset, including [`AssetId::Native`].
    fn transfer(
        &mut self,
        asset: AssetId,
        sender: Address,
        recipient: Address,
        amount: Balance,
    ) -> Result<(), LedgerError>;

    /// Move `amount` from `owner` to `recipient` on behalf of `spender`,
    /// consuming `spender`'s allowance.
    ///
    /// Native currency has no allowances; ledgers reject it here.
    fn transfer_from(
        &mut self,
        asset: AssetId,
        spender: Address,
        owner: Address,
        recipient: Address,
        amount: Balance,
    ) -> Result<(), LedgerError>;

    /// Set `spender`'s allowance over `owner`'s balance to exactly `amount`
    fn approve(
        &mut self,
        asset: AssetId,
        owner: Address,
        spender: Address,
        amount: Balance,
    ) -> Result<(), LedgerError>;

    /// Token standing in for native currency inside pools
    fn wrapped_native(&self) -> AssetId;

    /// Convert `amount` of `holder`'s native currency into wrapped tokens
    fn wrap_native(&mut self, holder: Address, amount: Balance) -> Result<(), LedgerError>;

    /// Convert `amount` of `holder`'s wrapped tokens back into native currency
    fn unwrap_native(&mut self, holder: Address, amount: Balance) -> Result<(), LedgerError>;
}
