//! Configuration validation.
//!
//! Validates all config fields before an optimization run.

use crate::domain::error::TrendscopeError;
use crate::domain::rebalance::RebalanceFrequency;
use crate::domain::strategy::StrategyFamily;
use crate::ports::config_port::ConfigPort;
use std::str::FromStr;

pub fn validate_optimizer_config(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    validate_parses::<f64>(config, "optimizer", &["fee", "risk_free_rate"], "a number")?;
    validate_parses::<i64>(
        config,
        "optimizer",
        &["window_start", "window_end", "window_step", "threads"],
        "an integer",
    )?;
    validate_fee(config)?;
    validate_risk_free_rate(config)?;
    validate_window_grid(config)?;
    validate_threads(config)?;
    Ok(())
}

/// Validates `[strategies] names` and the section of every named family.
pub fn validate_strategies_config(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    let Some(names) = config.get_list("strategies", "names") else {
        return Ok(());
    };
    if names.is_empty() {
        return Err(invalid("strategies", "names", "at least one strategy is required"));
    }
    for (i, name) in names.iter().enumerate() {
        if names[..i].iter().any(|n| n.eq_ignore_ascii_case(name)) {
            return Err(invalid(
                "strategies",
                "names",
                &format!("duplicate strategy: {name}"),
            ));
        }
        validate_strategy_config(config, name)?;
    }
    Ok(())
}

/// A family section may be omitted only for one of the built-in families.
pub fn validate_strategy_config(config: &dyn ConfigPort, key: &str) -> Result<(), TrendscopeError> {
    let kind = match config.get_string(key, "kind") {
        Some(kind) => kind.trim().to_lowercase(),
        None if StrategyFamily::builtin(key).is_some() => return Ok(()),
        None => {
            return Err(TrendscopeError::ConfigMissing {
                section: key.to_string(),
                key: "kind".to_string(),
            })
        }
    };

    match kind.as_str() {
        "single" => require_non_empty(config, key, "asset"),
        "rebalance" => {
            require_non_empty(config, key, "asset_a")?;
            require_non_empty(config, key, "asset_b")?;
            validate_weight(config, key)?;
            validate_frequency(config, key)
        }
        other => Err(invalid(
            key,
            "kind",
            &format!("unknown kind '{other}', expected single or rebalance"),
        )),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> TrendscopeError {
    TrendscopeError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Present values must parse as numbers; the typed getters would silently
/// fall back to defaults otherwise.
fn validate_parses<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    keys: &[&str],
    expected: &str,
) -> Result<(), TrendscopeError> {
    for key in keys {
        if let Some(raw) = config.get_string(section, key) {
            if raw.trim().parse::<T>().is_err() {
                return Err(invalid(section, key, &format!("'{raw}' is not {expected}")));
            }
        }
    }
    Ok(())
}

fn validate_fee(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    let value = config.get_double("optimizer", "fee", 0.0025);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid("optimizer", "fee", "fee must be in [0, 1)"));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    let value = config.get_double("optimizer", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "optimizer",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_window_grid(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    let start = config.get_int("optimizer", "window_start", 10);
    let end = config.get_int("optimizer", "window_end", 200);
    let step = config.get_int("optimizer", "window_step", 10);

    if start < 1 {
        return Err(invalid("optimizer", "window_start", "window_start must be at least 1"));
    }
    if end < start {
        return Err(invalid(
            "optimizer",
            "window_end",
            "window_end must not be below window_start",
        ));
    }
    if step < 1 {
        return Err(invalid("optimizer", "window_step", "window_step must be positive"));
    }
    Ok(())
}

fn validate_threads(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    if config.get_int("optimizer", "threads", 0) < 0 {
        return Err(invalid("optimizer", "threads", "threads must be non-negative"));
    }
    Ok(())
}

fn require_non_empty(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), TrendscopeError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TrendscopeError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_weight(config: &dyn ConfigPort, section: &str) -> Result<(), TrendscopeError> {
    validate_parses::<f64>(config, section, &["weight_a"], "a number")?;
    let weight = config.get_double(section, "weight_a", 0.5);
    if !(0.0..=1.0).contains(&weight) {
        return Err(invalid(section, "weight_a", "weight_a must be between 0 and 1"));
    }
    Ok(())
}

fn validate_frequency(config: &dyn ConfigPort, section: &str) -> Result<(), TrendscopeError> {
    match config.get_string(section, "frequency") {
        None => Ok(()),
        Some(raw) => raw
            .parse::<RebalanceFrequency>()
            .map(|_| ())
            .map_err(|reason| invalid(section, "frequency", &reason)),
    }
}
