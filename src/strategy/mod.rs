pub mod band;
pub mod factor_quantile;
pub mod turtle_breakout;
