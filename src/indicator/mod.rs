pub mod atr;
pub mod ema;
pub mod rolling;
pub mod sma;
