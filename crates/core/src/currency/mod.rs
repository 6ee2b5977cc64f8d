//! Multi-currency handling and exchange rates.

pub mod conversion;
pub mod exchange;

#[cfg(test)]
mod props;

pub use conversion::{
    DEFAULT_BASE_CURRENCY, RateLookupMethod, RateMap, add_money, convert, round_money, sum_money,
};
pub use exchange::{ExchangeRate, ExchangeRateSnapshot};
