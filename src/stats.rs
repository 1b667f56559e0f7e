//! Performance statistics over a net-value series.
//!
//! The summary resamples the series to one observation per calendar day
//! (last value of the day) before computing return/risk figures, so bar
//! frequency does not leak into annualization.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::engine::portfolio::NetPoint;
use crate::model::signal::SignalRecord;

const DAYS_PER_YEAR: f64 = 365.0;
const EXPOSURE_EPS: f64 = 1e-9;

fn utc(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
}

/// Last observation of each calendar day.
pub fn daily_resample(net: &[NetPoint]) -> Vec<NetPoint> {
    let mut out: Vec<NetPoint> = Vec::new();
    let mut current_day: Option<(i32, u32, u32)> = None;
    for point in net {
        let d = utc(point.timestamp);
        let key = (d.year(), d.month(), d.day());
        if current_day == Some(key) {
            *out.last_mut().expect("day started") = *point;
        } else {
            current_day = Some(key);
            out.push(*point);
        }
    }
    out
}

fn pct_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

pub fn total_ret(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if first != 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

/// Geometric annualization over the covered span.
pub fn annual_ret(start: i64, end: i64, values: &[f64]) -> f64 {
    let days = ((end - start) as f64 / 86_400.0).max(1.0);
    let tot = total_ret(values);
    (1.0 + tot).powf(DAYS_PER_YEAR / days) - 1.0
}

pub fn sharpe_ratio(daily_returns: &[f64]) -> f64 {
    let sd = std_dev(daily_returns);
    if sd == 0.0 {
        0.0
    } else {
        mean(daily_returns) / sd * DAYS_PER_YEAR.sqrt()
    }
}

pub fn annual_volatility(daily_returns: &[f64]) -> f64 {
    std_dev(daily_returns) * DAYS_PER_YEAR.sqrt()
}

pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for &v in values {
        peak = peak.max(v);
        if peak > 0.0 {
            worst = worst.max(1.0 - v / peak);
        }
    }
    worst
}

/// OLS of net daily returns on underlying daily returns; alpha annualized.
pub fn alpha_beta(base_returns: &[f64], net_returns: &[f64]) -> (f64, f64) {
    let n = base_returns.len().min(net_returns.len());
    if n < 2 {
        return (0.0, 0.0);
    }
    let b = &base_returns[..n];
    let r = &net_returns[..n];
    let mb = mean(b);
    let mr = mean(r);
    let var: f64 = b.iter().map(|v| (v - mb).powi(2)).sum::<f64>();
    if var == 0.0 {
        return (0.0, 0.0);
    }
    let cov: f64 = b.iter().zip(r).map(|(x, y)| (x - mb) * (y - mr)).sum::<f64>();
    let beta = cov / var;
    let alpha = (mr - beta * mb) * DAYS_PER_YEAR;
    (alpha, beta)
}

pub fn information_ratio(base_returns: &[f64], net_returns: &[f64]) -> f64 {
    let n = base_returns.len().min(net_returns.len());
    let active: Vec<f64> = (0..n).map(|i| net_returns[i] - base_returns[i]).collect();
    let sd = std_dev(&active);
    if sd == 0.0 {
        0.0
    } else {
        mean(&active) / sd * DAYS_PER_YEAR.sqrt()
    }
}

/// Mean run length of long and short exposure, in bars.
pub fn mean_hold(pos: &[f64]) -> (f64, f64) {
    fn runs(pos: &[f64], long: bool) -> f64 {
        let mut lengths = Vec::new();
        let mut current = 0usize;
        for &p in pos {
            let on = if long {
                p > EXPOSURE_EPS
            } else {
                p < -EXPOSURE_EPS
            };
            if on {
                current += 1;
            } else if current > 0 {
                lengths.push(current as f64);
                current = 0;
            }
        }
        if current > 0 {
            lengths.push(current as f64);
        }
        mean(&lengths)
    }
    (runs(pos, true), runs(pos, false))
}

/// Mean absolute exposure.
pub fn mean_position(pos: &[f64]) -> f64 {
    mean(&pos.iter().map(|p| p.abs()).collect::<Vec<f64>>())
}

/// Entries into long and into short exposure.
pub fn trade_times(pos: &[f64]) -> (u32, u32) {
    let mut long_times = 0;
    let mut short_times = 0;
    let mut prev = 0.0;
    for &p in pos {
        if p > EXPOSURE_EPS && prev <= EXPOSURE_EPS {
            long_times += 1;
        }
        if p < -EXPOSURE_EPS && prev >= -EXPOSURE_EPS {
            short_times += 1;
        }
        prev = p;
    }
    (long_times, short_times)
}

/// Cumulative return earned while long and while short.
pub fn long_short_ret(net: &[NetPoint]) -> (f64, f64) {
    let mut long_prod = 1.0;
    let mut short_prod = 1.0;
    for i in 1..net.len() {
        if net[i - 1].net == 0.0 {
            continue;
        }
        let step = net[i].net / net[i - 1].net;
        if net[i].pos > EXPOSURE_EPS {
            long_prod *= step;
        } else if net[i].pos < -EXPOSURE_EPS {
            short_prod *= step;
        }
    }
    (long_prod - 1.0, short_prod - 1.0)
}

/// Long/short return broken down by calendar month.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub long_return: f64,
    pub short_return: f64,
}

pub fn month_profit(net: &[NetPoint]) -> Vec<MonthlyReturn> {
    let mut out: Vec<MonthlyReturn> = Vec::new();
    let mut group: Vec<NetPoint> = Vec::new();
    let mut key: Option<(i32, u32)> = None;

    let mut flush = |key: Option<(i32, u32)>, group: &mut Vec<NetPoint>, out: &mut Vec<MonthlyReturn>| {
        if let Some((year, month)) = key {
            let (long_return, short_return) = long_short_ret(group);
            out.push(MonthlyReturn {
                year,
                month,
                long_return,
                short_return,
            });
        }
        group.clear();
    };

    for point in net {
        let d = utc(point.timestamp);
        let k = (d.year(), d.month());
        if key != Some(k) {
            flush(key, &mut group, &mut out);
            key = Some(k);
        }
        group.push(*point);
    }
    flush(key, &mut group, &mut out);
    out
}

/// Win rate and mean-win over mean-loss ratio of paired open/close records.
pub fn win_profit_ratio(signals: &[SignalRecord]) -> (f64, f64) {
    let mut open: Option<(bool, f64)> = None;
    let mut wins = Vec::new();
    let mut losses = Vec::new();

    for record in signals {
        let (Some(label), Some(price)) = (record.label, record.price) else {
            continue;
        };
        if label.opens() {
            open = Some((matches!(label, crate::model::signal::SignalLabel::OpenLong), price));
        } else if let Some((is_long, open_price)) = open.take() {
            if open_price == 0.0 || price == 0.0 {
                continue;
            }
            let ret = if is_long {
                price / open_price - 1.0
            } else {
                open_price / price - 1.0
            };
            if ret > 0.0 {
                wins.push(ret);
            } else if ret < 0.0 {
                losses.push(-ret);
            }
        }
    }

    let total = wins.len() + losses.len();
    let win_r = if total == 0 {
        0.0
    } else {
        wins.len() as f64 / total as f64
    };
    let profit_r = if losses.is_empty() || wins.is_empty() {
        0.0
    } else {
        mean(&wins) / mean(&losses)
    };
    (win_r, profit_r)
}

/// Aggregate summary of one net-value series.
#[derive(Debug, Clone, Serialize)]
pub struct NetSummary {
    pub tot_ret: f64,
    pub ann_ret: f64,
    pub sharpe: f64,
    pub annual_volatility: f64,
    pub max_drawdown: f64,
    pub alpha: f64,
    pub beta: f64,
    /// Annual return over max drawdown.
    pub ret_ratio: f64,
    pub information_ratio: f64,
    pub long_hold: f64,
    pub short_hold: f64,
    pub position: f64,
    pub long_times: u32,
    pub short_times: u32,
    pub long_return: f64,
    pub short_return: f64,
    pub win_rate: f64,
    pub profit_ratio: f64,
    pub start_time: i64,
    pub end_time: i64,
    pub monthly: Vec<MonthlyReturn>,
}

impl NetSummary {
    pub fn compute(net: &[NetPoint], signals: &[SignalRecord]) -> Self {
        let monthly = month_profit(net);
        let (long_return, short_return) = long_short_ret(net);
        let pos: Vec<f64> = net.iter().map(|p| p.pos).collect();
        let (long_hold, short_hold) = mean_hold(&pos);
        let (long_times, short_times) = trade_times(&pos);
        let position = mean_position(&pos);
        let (win_rate, profit_ratio) = win_profit_ratio(signals);

        let daily = daily_resample(net);
        let values: Vec<f64> = daily.iter().map(|p| p.net).collect();
        let closes: Vec<f64> = daily.iter().map(|p| p.close).collect();
        let net_returns = pct_returns(&values);
        let base_returns = pct_returns(&closes);

        let start_time = net.first().map_or(0, |p| p.timestamp);
        let end_time = net.last().map_or(0, |p| p.timestamp);

        let tot = total_ret(&values);
        let ann = annual_ret(start_time, end_time, &values);
        let drawdown = max_drawdown(&values);
        let (alpha, beta) = alpha_beta(&base_returns, &net_returns);

        Self {
            tot_ret: tot,
            ann_ret: ann,
            sharpe: sharpe_ratio(&net_returns),
            annual_volatility: annual_volatility(&net_returns),
            max_drawdown: drawdown,
            alpha,
            beta,
            ret_ratio: if drawdown > 0.0 { ann / drawdown } else { 0.0 },
            information_ratio: information_ratio(&base_returns, &net_returns),
            long_hold,
            short_hold,
            position,
            long_times,
            short_times,
            long_return,
            short_return,
            win_rate,
            profit_ratio,
            start_time,
            end_time,
            monthly,
        }
    }
}

impl std::fmt::Display for NetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Net-Value Summary")?;
        writeln!(f, "=================")?;
        writeln!(
            f,
            "Period: {} .. {}",
            utc(self.start_time).format("%Y-%m-%d"),
            utc(self.end_time).format("%Y-%m-%d")
        )?;
        writeln!(f, "Total Return: {:.2}%", self.tot_ret * 100.0)?;
        writeln!(f, "Annual Return: {:.2}%", self.ann_ret * 100.0)?;
        writeln!(f, "Sharpe: {:.2}", self.sharpe)?;
        writeln!(f, "Annual Volatility: {:.2}%", self.annual_volatility * 100.0)?;
        writeln!(f, "Max Drawdown: {:.2}%", self.max_drawdown * 100.0)?;
        writeln!(f, "Alpha: {:.4}  Beta: {:.4}", self.alpha, self.beta)?;
        writeln!(f, "Return/Drawdown: {:.2}", self.ret_ratio)?;
        writeln!(f, "Information Ratio: {:.2}", self.information_ratio)?;
        writeln!(
            f,
            "Mean Hold (bars): long {:.1}, short {:.1}",
            self.long_hold, self.short_hold
        )?;
        writeln!(f, "Mean |Exposure|: {:.2}", self.position)?;
        writeln!(
            f,
            "Trades: {} long, {} short",
            self.long_times, self.short_times
        )?;
        writeln!(
            f,
            "Long Return: {:.2}%  Short Return: {:.2}%",
            self.long_return * 100.0,
            self.short_return * 100.0
        )?;
        writeln!(
            f,
            "Win Rate: {:.2}%  Profit Ratio: {:.2}",
            self.win_rate * 100.0,
            self.profit_ratio
        )?;
        Ok(())
    }
}
