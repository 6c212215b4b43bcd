//! Standardized emoji logging for adapter operations
//!
//! Keeps log lines for pool creation, liquidity and swaps visually
//! consistent across the registry, liquidity manager and router.

/// Standard emoji set for adapter logging
pub struct LogEmoji;

impl LogEmoji {
    // Status indicators
    pub const SUCCESS: &'static str = "✅"; // Operation committed
    pub const REVERT: &'static str = "↩️"; // Operation rolled back
    pub const WARNING: &'static str = "⚠️"; // Warning or caution

    // Operation types
    pub const POOL: &'static str = "🏊"; // Pool creation/adoption
    pub const SWAP: &'static str = "🔄"; // Swap or hop
    pub const MINT: &'static str = "➕"; // Liquidity add
    pub const BURN: &'static str = "➖"; // Liquidity remove
    pub const REFUND: &'static str = "💰"; // Unused funds returned
}

#[macro_export]
macro_rules! log_swap {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SWAP, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_mint {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::MINT, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_burn {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::BURN, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_refund {
    ($($arg:tt)*) => {
        tracing::debug!("{} {}", $crate::logging::LogEmoji::REFUND, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_revert {
    ($($arg:tt)*) => {
        tracing::warn!("{} {}", $crate::logging::LogEmoji::REVERT, format!($($arg)*))
    };
}
