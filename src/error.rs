use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("empty data: {0}")]
    EmptyData(String),

    #[error("empty quantile fit window: {0}")]
    EmptyFitWindow(String),

    #[error("bad timestamp '{0}': expected unix seconds or YYYY-MM-DD[ HH:MM:SS]")]
    BadTimestamp(String),
}
