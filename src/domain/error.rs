//! Domain error types.
//!
//! Numeric degeneracy (short history, wipeout, zero deviation) is never an error;
//! it is absorbed into sentinel values by the evaluators. Only configuration,
//! data source and output failures surface here.

/// Top-level error type for trendscope.
#[derive(Debug, thiserror::Error)]
pub enum TrendscopeError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {asset}")]
    NoData { asset: String },

    #[error("no strategy family could be evaluated")]
    NothingEvaluated,

    #[error("worker pool error: {reason}")]
    WorkerPool { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TrendscopeError> for std::process::ExitCode {
    fn from(err: &TrendscopeError) -> Self {
        let code: u8 = match err {
            TrendscopeError::Io(_) | TrendscopeError::WorkerPool { .. } => 1,
            TrendscopeError::ConfigParse { .. }
            | TrendscopeError::ConfigMissing { .. }
            | TrendscopeError::ConfigInvalid { .. } => 2,
            TrendscopeError::DataSource { .. } => 3,
            TrendscopeError::NoData { .. } | TrendscopeError::NothingEvaluated => 5,
            TrendscopeError::Json(_) => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_section_and_key() {
        let err = TrendscopeError::ConfigInvalid {
            section: "optimizer".into(),
            key: "fee".into(),
            reason: "fee must be in [0, 1)".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [optimizer] fee: fee must be in [0, 1)"
        );
    }

    #[test]
    fn no_data_names_asset() {
        let err = TrendscopeError::NoData {
            asset: "ETH".into(),
        };
        assert_eq!(err.to_string(), "no data for ETH");
    }

    #[test]
    fn exit_codes_group_by_family() {
        let config = TrendscopeError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        };
        let missing = TrendscopeError::NoData {
            asset: "BTC".into(),
        };
        assert_eq!(
            std::process::ExitCode::from(&config),
            std::process::ExitCode::from(2)
        );
        assert_eq!(
            std::process::ExitCode::from(&missing),
            std::process::ExitCode::from(5)
        );
    }
}
