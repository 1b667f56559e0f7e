//! Run output: stdout tables, optional JSON dump, optional PNG chart.

use std::path::Path;

use anyhow::{Context, Result};

use crate::engine::breakout::BreakoutOutcome;
#[cfg(feature = "plot")]
use crate::engine::portfolio::NetPoint;
use crate::feature::BarFeatures;
use crate::model::bar::Bar;
use crate::stats::{MonthlyReturn, NetSummary};

/// Tail preview of the engineered bar features, for eyeballing a run the
/// way the research notebooks print frame tails.
pub fn print_feature_preview(bars: &[Bar], features: &BarFeatures, rows: usize) {
    println!(
        "{:>12} {:>10} {:>8} {:>10} {:>10} {:>10} {:>10} {:>8} {:>8}",
        "timestamp", "close", "growth", "high_slow", "low_slow", "ma_exit", "ma_trend", "lowday", "impulse"
    );
    let start = bars.len().saturating_sub(rows);
    for i in start..bars.len() {
        println!(
            "{:>12} {:>10.4} {:>8.0} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>8.0} {:>8.0}",
            bars[i].timestamp,
            bars[i].close,
            features.growth[i],
            features.high_slow[i],
            features.low_slow[i],
            features.ma_exit[i],
            features.ma_trend[i],
            features.low_days[i],
            features.ma_impulse[i],
        );
    }
}

pub fn print_breakout_summary(outcome: &BreakoutOutcome, initial_cash: f64) {
    let final_equity = outcome.final_equity();
    let c = &outcome.counters;
    println!("Breakout Simulation Summary");
    println!("===========================");
    println!("Ticks simulated: {}", outcome.equity.len());
    println!("Initial cash: {:.2}", initial_cash);
    println!("Final equity: {:.2}", final_equity);
    println!(
        "Total return: {:.2}%",
        (final_equity / initial_cash - 1.0) * 100.0
    );
    println!(
        "Round trips: {} (wins {}, losses {})",
        c.trades, c.wins, c.losses
    );
    if c.trades > 0 {
        println!(
            "Win rate: {:.2}%",
            c.wins as f64 / c.trades as f64 * 100.0
        );
    }
    println!(
        "Gross win P&L: {:.2}  Gross loss P&L: {:.2}",
        c.win_pnl, c.loss_pnl
    );
    println!("Fills:");
    for fill in &outcome.fills {
        println!(
            "  {:>12} {:?} @ {:.6}",
            fill.timestamp, fill.side, fill.price
        );
    }
}

pub fn print_monthly(monthly: &[MonthlyReturn]) {
    if monthly.is_empty() {
        return;
    }
    println!("Monthly Returns");
    println!("{:>8} {:>12} {:>12}", "month", "long", "short");
    for m in monthly {
        println!(
            "{:>4}-{:02} {:>11.2}% {:>11.2}%",
            m.year,
            m.month,
            m.long_return * 100.0,
            m.short_return * 100.0
        );
    }
}

pub fn write_summary_json(path: &Path, summary: &NetSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("failed to serialize summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Two-panel PNG: normalized close vs. net curve, and monthly long/short
/// return bars.
#[cfg(feature = "plot")]
pub fn render_net_chart(path: &Path, net: &[NetPoint], monthly: &[MonthlyReturn]) -> Result<()> {
    use plotters::prelude::*;

    if net.is_empty() {
        anyhow::bail!("nothing to plot: empty net series");
    }

    let root = BitMapBackend::new(path, (1280, 960)).into_drawing_area();
    root.fill(&WHITE).context("failed to prepare chart")?;
    let (upper, lower) = root.split_vertically(560);

    let first_close = net[0].close;
    let first_net = net[0].net;
    let curve: Vec<(i64, f64, f64)> = net
        .iter()
        .map(|p| (p.timestamp, p.close / first_close, p.net / first_net))
        .collect();

    let t0 = curve.first().map(|c| c.0).unwrap_or(0);
    let t1 = curve.last().map(|c| c.0).unwrap_or(1).max(t0 + 1);
    let y_min = curve
        .iter()
        .flat_map(|c| [c.1, c.2])
        .fold(f64::INFINITY, f64::min);
    let y_max = curve
        .iter()
        .flat_map(|c| [c.1, c.2])
        .fold(f64::NEG_INFINITY, f64::max);

    let mut chart = ChartBuilder::on(&upper)
        .caption("net value vs underlying", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(32)
        .y_label_area_size(48)
        .build_cartesian_2d(t0..t1, y_min..y_max)
        .context("failed to build net-value chart")?;
    chart.configure_mesh().draw()?;
    chart
        .draw_series(LineSeries::new(curve.iter().map(|c| (c.0, c.1)), &RED))?
        .label("close")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], RED));
    chart
        .draw_series(LineSeries::new(curve.iter().map(|c| (c.0, c.2)), &BLUE))?
        .label("net")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], BLUE));
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .draw()?;

    if !monthly.is_empty() {
        let bar_min = monthly
            .iter()
            .flat_map(|m| [m.long_return, m.short_return])
            .fold(0.0f64, f64::min);
        let bar_max = monthly
            .iter()
            .flat_map(|m| [m.long_return, m.short_return])
            .fold(0.0f64, f64::max);
        let mut bars = ChartBuilder::on(&lower)
            .caption("monthly long/short return", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(32)
            .y_label_area_size(48)
            .build_cartesian_2d(0.0..monthly.len() as f64, bar_min..(bar_max + 1e-9))
            .context("failed to build monthly chart")?;
        bars.configure_mesh().draw()?;
        bars.draw_series(monthly.iter().enumerate().map(|(i, m)| {
            let x = i as f64;
            Rectangle::new([(x + 0.1, 0.0), (x + 0.45, m.long_return)], RED.filled())
        }))?;
        bars.draw_series(monthly.iter().enumerate().map(|(i, m)| {
            let x = i as f64;
            Rectangle::new([(x + 0.55, 0.0), (x + 0.9, m.short_return)], BLUE.filled())
        }))?;
    }

    root.present()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
