pub mod breakout;
pub mod portfolio;
