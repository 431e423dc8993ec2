//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_result_adapter::JsonResultAdapter;
use crate::domain::config_validation::{validate_optimizer_config, validate_strategies_config};
use crate::domain::error::TrendscopeError;
use crate::domain::evaluation::{EvaluationRecord, EvaluationSettings};
use crate::domain::market_data::{load_market_data, parse_assets};
use crate::domain::metrics::trailing_performance;
use crate::domain::optimizer::{OptimizationResult, Optimizer, OptimizerConfig, WindowGrid};
use crate::domain::rebalance::RebalanceFrequency;
use crate::domain::strategy::StrategyFamily;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::result_port::ResultPort;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT_PATH: &str = "data/strategy_results.json";

/// Trailing spans reported in console summaries, in years.
const TRAILING_YEARS: [u32; 3] = [1, 3, 5];

#[derive(Parser, Debug)]
#[command(
    name = "trendscope",
    about = "Moving-average trend backtests and window optimization"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find the best moving-average window for every strategy family
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Evaluate one strategy family with a fixed window
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: String,
        #[arg(short, long)]
        window: usize,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List assets available in the data directory
    ListAssets {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Optimize {
            config,
            output,
            data_dir,
        } => run_optimize(&config, output.as_deref(), data_dir.as_deref()),
        Command::Evaluate {
            config,
            strategy,
            window,
            data_dir,
        } => run_evaluate(&config, &strategy, window, data_dir.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListAssets { config, data_dir } => {
            run_list_assets(config.as_deref(), data_dir.as_deref())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TrendscopeError> {
    FileConfigAdapter::from_file(path).map_err(|e| TrendscopeError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn to_usize(adapter: &dyn ConfigPort, key: &str, default: i64) -> Result<usize, TrendscopeError> {
    let value = adapter.get_int("optimizer", key, default);
    usize::try_from(value).map_err(|_| TrendscopeError::ConfigInvalid {
        section: "optimizer".into(),
        key: key.into(),
        reason: format!("{value} is out of range"),
    })
}

pub fn build_optimizer_config(
    adapter: &dyn ConfigPort,
) -> Result<OptimizerConfig, TrendscopeError> {
    let defaults = OptimizerConfig::default();
    Ok(OptimizerConfig {
        grid: WindowGrid {
            start: to_usize(adapter, "window_start", defaults.grid.start as i64)?,
            end: to_usize(adapter, "window_end", defaults.grid.end as i64)?,
            step: to_usize(adapter, "window_step", defaults.grid.step as i64)?,
        },
        settings: EvaluationSettings {
            fee: adapter.get_double("optimizer", "fee", defaults.settings.fee),
            risk_free_rate: adapter.get_double(
                "optimizer",
                "risk_free_rate",
                defaults.settings.risk_free_rate,
            ),
        },
        threads: to_usize(adapter, "threads", 0)?,
    })
}

fn required_asset(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, TrendscopeError> {
    adapter
        .get_string(section, key)
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TrendscopeError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })
}

/// Builds one family from its `[<key>]` section, falling back to the
/// built-in definition when the section has no `kind`.
pub fn build_strategy_family(
    adapter: &dyn ConfigPort,
    key: &str,
) -> Result<StrategyFamily, TrendscopeError> {
    let Some(kind) = adapter.get_string(key, "kind") else {
        return StrategyFamily::builtin(key).ok_or_else(|| TrendscopeError::ConfigMissing {
            section: key.into(),
            key: "kind".into(),
        });
    };

    match kind.trim().to_lowercase().as_str() {
        "single" => Ok(StrategyFamily::single(
            key,
            required_asset(adapter, key, "asset")?,
        )),
        "rebalance" => {
            let frequency = match adapter.get_string(key, "frequency") {
                Some(raw) => raw
                    .parse::<RebalanceFrequency>()
                    .map_err(|reason| TrendscopeError::ConfigInvalid {
                        section: key.into(),
                        key: "frequency".into(),
                        reason,
                    })?,
                None => RebalanceFrequency::default(),
            };
            Ok(StrategyFamily::rebalanced(
                key,
                required_asset(adapter, key, "asset_a")?,
                required_asset(adapter, key, "asset_b")?,
                adapter.get_double(key, "weight_a", 0.5),
                frequency,
            ))
        }
        other => Err(TrendscopeError::ConfigInvalid {
            section: key.into(),
            key: "kind".into(),
            reason: format!("unknown kind '{other}'"),
        }),
    }
}

/// Families named in `[strategies] names`, or the built-in four.
pub fn build_strategy_families(
    adapter: &dyn ConfigPort,
) -> Result<Vec<StrategyFamily>, TrendscopeError> {
    match adapter.get_list("strategies", "names") {
        Some(names) => names
            .iter()
            .map(|name| build_strategy_family(adapter, name))
            .collect(),
        None => Ok(StrategyFamily::defaults()),
    }
}

/// Assets to load: `[data] assets` if set, otherwise every asset the families
/// reference, in first-use order.
pub fn resolve_assets(
    adapter: &dyn ConfigPort,
    families: &[StrategyFamily],
) -> Result<Vec<String>, TrendscopeError> {
    if let Some(raw) = adapter.get_string("data", "assets") {
        return parse_assets(&raw).map_err(|e| TrendscopeError::ConfigInvalid {
            section: "data".into(),
            key: "assets".into(),
            reason: e.to_string(),
        });
    }

    let mut assets: Vec<String> = Vec::new();
    for family in families {
        for asset in family.assets() {
            if !assets.iter().any(|a| a == asset) {
                assets.push(asset.to_string());
            }
        }
    }
    Ok(assets)
}

pub fn resolve_data_dir(adapter: &dyn ConfigPort, override_dir: Option<&Path>) -> PathBuf {
    match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from(
            adapter
                .get_string("data", "dir")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        ),
    }
}

pub fn resolve_output_path(adapter: &dyn ConfigPort, override_path: Option<&Path>) -> PathBuf {
    match override_path {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(
            adapter
                .get_string("output", "path")
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
        ),
    }
}

fn validate_all(adapter: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    validate_optimizer_config(adapter)?;
    validate_strategies_config(adapter)?;
    Ok(())
}

/// Load, optimize and persist. Everything after config loading, so it can be
/// driven with any data and result port.
pub fn run_optimize_pipeline(
    adapter: &dyn ConfigPort,
    data_port: &dyn PriceDataPort,
    result_port: &dyn ResultPort,
    output_path: &Path,
) -> Result<OptimizationResult, TrendscopeError> {
    validate_all(adapter)?;
    let config = build_optimizer_config(adapter)?;
    let families = build_strategy_families(adapter)?;
    let assets = resolve_assets(adapter, &families)?;

    info!(
        families = families.len(),
        assets = %assets.join(","),
        windows = config.grid.windows().len(),
        fee = config.settings.fee,
        "starting optimization"
    );

    let market = load_market_data(data_port, &assets)?;
    let optimizer = Optimizer::new(config)?;
    let result = optimizer.run(&families, &market)?;

    print_optimization_summary(&result);

    result_port.write(&result, output_path)?;
    info!(path = %output_path.display(), "results written");
    Ok(result)
}

fn run_optimize(
    config_path: &Path,
    output: Option<&Path>,
    data_dir: Option<&Path>,
) -> Result<(), TrendscopeError> {
    info!(path = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;
    let data_port = CsvAdapter::new(resolve_data_dir(&adapter, data_dir));
    let result_port = JsonResultAdapter::new(adapter.get_bool("output", "pretty", true));
    let output_path = resolve_output_path(&adapter, output);

    run_optimize_pipeline(&adapter, &data_port, &result_port, &output_path)?;
    Ok(())
}

/// Evaluates one family at one window over the same aligned data an
/// optimization run would use.
pub fn evaluate_strategy(
    adapter: &dyn ConfigPort,
    data_port: &dyn PriceDataPort,
    key: &str,
    window: usize,
) -> Result<EvaluationRecord, TrendscopeError> {
    validate_all(adapter)?;
    let config = build_optimizer_config(adapter)?;
    let mut families = build_strategy_families(adapter)?;
    let family = match families.iter().find(|f| f.key.eq_ignore_ascii_case(key)) {
        Some(family) => family.clone(),
        None => {
            let family = build_strategy_family(adapter, key)?;
            families.push(family.clone());
            family
        }
    };

    let assets = resolve_assets(adapter, &families)?;
    let market = load_market_data(data_port, &assets)?;
    let resolved = family.resolve(&market.series)?;
    Ok(resolved.evaluate(window, &config.settings))
}

fn run_evaluate(
    config_path: &Path,
    key: &str,
    window: usize,
    data_dir: Option<&Path>,
) -> Result<(), TrendscopeError> {
    let adapter = load_config(config_path)?;
    let data_port = CsvAdapter::new(resolve_data_dir(&adapter, data_dir));
    let record = evaluate_strategy(&adapter, &data_port, key, window)?;
    for line in summary_lines(key, &record) {
        println!("{line}");
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TrendscopeError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;

    let config = build_optimizer_config(&adapter)?;
    let families = build_strategy_families(&adapter)?;
    let assets = resolve_assets(&adapter, &families)?;

    eprintln!(
        "\nWindows: {} ({}..={} step {})",
        config.grid.windows().len(),
        config.grid.start,
        config.grid.end,
        config.grid.step
    );
    eprintln!("Fee: {}", config.settings.fee);
    eprintln!("Risk-free rate: {}", config.settings.risk_free_rate);
    eprintln!("Assets: {}", assets.join(", "));
    eprintln!("\nStrategies:");
    for family in &families {
        eprintln!("  {}: {}", family.key, family.assets().join(" / "));
    }
    eprintln!("\nConfiguration is valid");
    Ok(())
}

fn run_list_assets(
    config_path: Option<&Path>,
    data_dir: Option<&Path>,
) -> Result<(), TrendscopeError> {
    let dir = match config_path {
        Some(path) => resolve_data_dir(&load_config(path)?, data_dir),
        None => data_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
    };

    let assets = CsvAdapter::new(dir.clone()).list_assets()?;
    if assets.is_empty() {
        eprintln!("No assets found in {}", dir.display());
    } else {
        for asset in &assets {
            println!("{asset}");
        }
        eprintln!("{} assets found", assets.len());
    }
    Ok(())
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Human-readable summary of one evaluation record.
pub fn summary_lines(key: &str, record: &EvaluationRecord) -> Vec<String> {
    let mut lines = vec![
        format!("=== {} (MA {}) ===", key, record.window),
        format!("Combined Sortino: {}", record.combined_sortino),
        format!("Sortino Ratio:    {}", record.sortino),
        format!("Sharpe Ratio:     {:.2}", record.sharpe),
        format!("CAGR:             {}", percent(record.cagr)),
        format!("Max Drawdown:     {}", percent(record.drawdown)),
        format!("Volatility:       {}", percent(record.volatility)),
        format!("Final Value:      {:.4}x", record.final_value),
        format!("Signal:           {}", record.signal),
    ];

    for years in TRAILING_YEARS {
        if let Some(period) = trailing_performance(&record.cumulative_series, years) {
            lines.push(format!(
                "  {}y: return {}, CAGR {}, MDD {}",
                years,
                percent(period.total_return),
                percent(period.cagr),
                percent(period.max_drawdown)
            ));
        }
    }
    lines
}

fn print_optimization_summary(result: &OptimizationResult) {
    if let Some((start, end)) = result.data_period {
        eprintln!("\nData period: {start} to {end}");
    }
    for strategy in &result.strategies {
        eprintln!();
        for line in summary_lines(&strategy.key, &strategy.best) {
            eprintln!("{line}");
        }
    }
    if !result.skipped.is_empty() {
        eprintln!("\n=== Skipped ===");
        for skipped in &result.skipped {
            eprintln!("  {}: {}", skipped.key, skipped.reason);
        }
    }
}
