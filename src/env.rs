//! Environment variable names used by this crate for convenient
//! configuration of the reporting core from services.
//!
//! These are purely helpers; [`ReportCore`](crate::core::ReportCore)
//! itself never reads the environment.

use crate::core::ReportConfig;
use crate::error::ParseError;

/// Minimum severity forwarded to the backend, e.g. `warn`.
pub const REPORT_SINK_MIN_LEVEL_ENV: &str = "REPORT_SINK_MIN_LEVEL";

/// Merge policy for persistent fields: `flat` or `nested`.
pub const REPORT_SINK_MERGE_POLICY_ENV: &str = "REPORT_SINK_MERGE_POLICY";

/// Level mapping: `full` or `narrow`.
pub const REPORT_SINK_LEVEL_MAPPING_ENV: &str = "REPORT_SINK_LEVEL_MAPPING";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Build a [`ReportConfig`] from the `REPORT_SINK_*` variables, using
/// [`ReportConfig::default`] for the ones that are unset.
pub fn report_config_from_env() -> Result<ReportConfig, ParseError> {
    let defaults = ReportConfig::default();
    Ok(ReportConfig {
        min_level: env_or(REPORT_SINK_MIN_LEVEL_ENV, defaults.min_level.as_str()).parse()?,
        merge_policy: match std::env::var(REPORT_SINK_MERGE_POLICY_ENV) {
            Ok(value) => value.parse()?,
            Err(_) => defaults.merge_policy,
        },
        level_mapping: match std::env::var(REPORT_SINK_LEVEL_MAPPING_ENV) {
            Ok(value) => value.parse()?,
            Err(_) => defaults.level_mapping,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_when_unset() {
        assert_eq!(env_or("REPORT_SINK_TEST_SURELY_UNSET", "fallback"), "fallback");
    }

    // The only test touching the REPORT_SINK_* variables.
    #[test]
    fn config_reads_variables_and_rejects_garbage() {
        use crate::level::Severity;
        use crate::merge::MergePolicy;
        use crate::translate::LevelMapping;

        std::env::set_var(REPORT_SINK_MIN_LEVEL_ENV, "error");
        std::env::set_var(REPORT_SINK_MERGE_POLICY_ENV, "nested");
        std::env::remove_var(REPORT_SINK_LEVEL_MAPPING_ENV);

        let config = report_config_from_env().unwrap();
        assert_eq!(config.min_level, Severity::Error);
        assert_eq!(config.merge_policy, MergePolicy::Nested);
        assert_eq!(config.level_mapping, LevelMapping::Full);

        std::env::set_var(REPORT_SINK_LEVEL_MAPPING_ENV, "sideways");
        assert!(report_config_from_env().is_err());

        std::env::remove_var(REPORT_SINK_MIN_LEVEL_ENV);
        std::env::remove_var(REPORT_SINK_MERGE_POLICY_ENV);
        std::env::remove_var(REPORT_SINK_LEVEL_MAPPING_ENV);
    }
}
