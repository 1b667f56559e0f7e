use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use ticklab::config::Config;
use ticklab::data;
use ticklab::engine::breakout;
use ticklab::engine::portfolio::{self, Capital, NetPoint, PortfolioRun};
use ticklab::feature::{self, BarFeatures};
use ticklab::model::bar::Bar;
use ticklab::model::signal::SignalFlags;
use ticklab::report;
use ticklab::stats::{win_profit_ratio, NetSummary};
use ticklab::strategy::band;
use ticklab::strategy::factor_quantile::{self, FactorQuantileParams};
use ticklab::strategy::turtle_breakout::TurtleBreakoutStrategy;

#[derive(Parser)]
#[command(
    name = "ticklab",
    version,
    about = "Tick-level breakout and multi-factor portfolio backtester"
)]
struct Cli {
    /// TOML run configuration; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tick-level breakout backtest over a tick CSV merged with a bar CSV.
    Breakout {
        #[arg(long)]
        ticks: PathBuf,
        #[arg(long)]
        bars: PathBuf,
        /// Bar-feature rows to preview before simulating.
        #[arg(long, default_value_t = 10)]
        preview: usize,
    },
    /// ATR-band strategy backtest over a bar CSV.
    Band {
        #[arg(long)]
        bars: PathBuf,
        /// Backtest period start (unix seconds or YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,
        /// Backtest period end, exclusive.
        #[arg(long)]
        end: Option<String>,
        /// Write the summary as JSON here.
        #[arg(long)]
        json: Option<PathBuf>,
        /// Render a PNG chart here (requires the `plot` feature).
        #[arg(long)]
        chart: Option<PathBuf>,
    },
    /// Alpha-factor decile backtest; repeat --data/--column/--corr to
    /// combine several factors into one equal-weight book.
    Factor {
        #[arg(long = "data", required = true)]
        data: Vec<PathBuf>,
        #[arg(long = "column", required = true)]
        columns: Vec<String>,
        /// Factor-return correlation sign per factor (+1 or -1).
        #[arg(long = "corr", required = true)]
        corr: Vec<f64>,
        /// Quantile fit window start; defaults to the full series.
        #[arg(long)]
        fit_start: Option<String>,
        /// Quantile fit window end, exclusive.
        #[arg(long)]
        fit_end: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long)]
        chart: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                config
                    .logging
                    .level
                    .parse()
                    .unwrap_or_else(|_| "info".parse().unwrap())
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Breakout {
            ticks,
            bars,
            preview,
        } => run_breakout(&config, &ticks, &bars, preview),
        Command::Band {
            bars,
            start,
            end,
            json,
            chart,
        } => run_band(&config, &bars, start, end, json, chart),
        Command::Factor {
            data,
            columns,
            corr,
            fit_start,
            fit_end,
            start,
            end,
            json,
            chart,
        } => run_factor(
            &config, &data, &columns, &corr, fit_start, fit_end, start, end, json, chart,
        ),
    }
}

fn parse_bound(raw: Option<String>, fallback: i64) -> Result<i64> {
    match raw {
        Some(s) => Ok(data::parse_timestamp(&s)?),
        None => Ok(fallback),
    }
}

fn run_breakout(config: &Config, ticks: &Path, bars: &Path, preview: usize) -> Result<()> {
    let ticks = data::load_ticks(ticks)?;
    let bars = data::load_bars(bars)?;
    if bars.is_empty() {
        bail!("bar file is empty");
    }

    let features = BarFeatures::compute(&bars, &config.breakout);
    if preview > 0 {
        report::print_feature_preview(&bars, &features, preview);
    }

    let rows = feature::merge_ticks(&bars, &features, &ticks);
    let mut strategy = TurtleBreakoutStrategy::new();
    let outcome = breakout::run(&rows, &mut strategy, &config.backtest)?;
    report::print_breakout_summary(&outcome, config.backtest.initial_cash);
    Ok(())
}

fn run_band(
    config: &Config,
    bars_path: &Path,
    start: Option<String>,
    end: Option<String>,
    json: Option<PathBuf>,
    chart: Option<PathBuf>,
) -> Result<()> {
    let bars = data::load_bars(bars_path)?;
    if bars.is_empty() {
        bail!("bar file is empty");
    }
    let flags = band::signals(&bars, &config.band);

    let start = parse_bound(start, i64::MIN)?;
    let end = parse_bound(end, i64::MAX)?;
    let (bars, flags) = filter_period(&bars, &flags, start, end);

    let run = portfolio::run(&bars, &flags, &config.backtest, Capital::flat(1.0))?;
    let summary = NetSummary::compute(&run.net, &run.signals);
    print_portfolio(&summary);
    finish_outputs(&summary, &run.net, json, chart)
}

#[allow(clippy::too_many_arguments)]
fn run_factor(
    config: &Config,
    data_paths: &[PathBuf],
    columns: &[String],
    corr: &[f64],
    fit_start: Option<String>,
    fit_end: Option<String>,
    start: Option<String>,
    end: Option<String>,
    json: Option<PathBuf>,
    chart: Option<PathBuf>,
) -> Result<()> {
    if data_paths.len() != columns.len() || data_paths.len() != corr.len() {
        bail!(
            "--data, --column, and --corr must repeat in lockstep ({} / {} / {})",
            data_paths.len(),
            columns.len(),
            corr.len()
        );
    }

    let fit_start = parse_bound(fit_start, i64::MIN)?;
    let fit_end = parse_bound(fit_end, i64::MAX)?;
    let start = parse_bound(start, i64::MIN)?;
    let end = parse_bound(end, i64::MAX)?;

    let mut runs: Vec<PortfolioRun> = Vec::new();
    let mut signal_stats: Vec<(f64, f64)> = Vec::new();
    for ((path, column), &corr_sign) in data_paths.iter().zip(columns).zip(corr) {
        let factor_bars = data::load_factor_bars(path, column)?;
        let params = FactorQuantileParams {
            quantiles: config.factor.quantiles,
            positive_corr: corr_sign > 0.0,
            fit_start,
            fit_end,
        };
        let flags = factor_quantile::signals(&factor_bars, &params)?;
        let bars: Vec<Bar> = factor_bars
            .iter()
            .map(|fb| Bar {
                timestamp: fb.timestamp,
                open: fb.open,
                high: fb.high,
                low: fb.low,
                close: fb.close,
            })
            .collect();
        let (bars, flags) = filter_period(&bars, &flags, start, end);

        let run = portfolio::run(&bars, &flags, &config.backtest, Capital::flat(1.0))?;
        signal_stats.push(win_profit_ratio(&run.signals));
        runs.push(run);
    }

    let combined = portfolio::combine_runs(&runs)?;
    let mut summary = NetSummary::compute(&combined, &[]);
    // Trade-level stats come from the per-factor logs, averaged.
    let n = signal_stats.len() as f64;
    summary.win_rate = signal_stats.iter().map(|s| s.0).sum::<f64>() / n;
    summary.profit_ratio = signal_stats.iter().map(|s| s.1).sum::<f64>() / n;

    print_portfolio(&summary);
    finish_outputs(&summary, &combined, json, chart)
}

fn filter_period(
    bars: &[Bar],
    flags: &[SignalFlags],
    start: i64,
    end: i64,
) -> (Vec<Bar>, Vec<SignalFlags>) {
    bars.iter()
        .zip(flags)
        .filter(|(b, _)| b.timestamp >= start && b.timestamp < end)
        .map(|(b, f)| (b.clone(), *f))
        .unzip()
}

fn print_portfolio(summary: &NetSummary) {
    println!("{summary}");
    report::print_monthly(&summary.monthly);
}

fn finish_outputs(
    summary: &NetSummary,
    net: &[NetPoint],
    json: Option<PathBuf>,
    chart: Option<PathBuf>,
) -> Result<()> {
    if let Some(path) = json {
        report::write_summary_json(&path, summary)?;
        println!("summary written to {}", path.display());
    }
    if let Some(path) = chart {
        render_chart(&path, net, summary)?;
    }
    Ok(())
}

#[cfg(feature = "plot")]
fn render_chart(path: &Path, net: &[NetPoint], summary: &NetSummary) -> Result<()> {
    use anyhow::Context;
    report::render_net_chart(path, net, &summary.monthly)
        .with_context(|| format!("failed to render {}", path.display()))?;
    println!("chart written to {}", path.display());
    Ok(())
}

#[cfg(not(feature = "plot"))]
fn render_chart(_path: &Path, _net: &[NetPoint], _summary: &NetSummary) -> Result<()> {
    bail!("this binary was built without the `plot` feature; rebuild with --features plot")
}
