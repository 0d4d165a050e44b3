use std::env;

use crate::domain::CopyReductionPolicy;
use crate::domain::circulation::{DEFAULT_LOAN_PERIOD_DAYS, MAX_LOAN_PERIOD_DAYS};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub loan_period_days: i64,
    pub copy_reduction_policy: CopyReductionPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://circulation.db?mode=rwc".to_string());

        let loan_period_days = match lookup("LOAN_PERIOD_DAYS") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(days) if (1..=MAX_LOAN_PERIOD_DAYS).contains(&days) => days,
                _ => {
                    tracing::warn!(
                        "LOAN_PERIOD_DAYS '{}' must be between 1 and {}, falling back to {}",
                        raw,
                        MAX_LOAN_PERIOD_DAYS,
                        DEFAULT_LOAN_PERIOD_DAYS
                    );
                    DEFAULT_LOAN_PERIOD_DAYS
                }
            },
            None => DEFAULT_LOAN_PERIOD_DAYS,
        };

        let copy_reduction_policy = match lookup("COPY_REDUCTION_POLICY") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to clamp", e);
                CopyReductionPolicy::Clamp
            }),
            None => CopyReductionPolicy::default(),
        };

        Self {
            database_url,
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            loan_period_days,
            copy_reduction_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.database_url, "sqlite://circulation.db?mode=rwc");
        assert_eq!(config.port, 8000);
        assert_eq!(config.loan_period_days, 14);
        assert_eq!(config.copy_reduction_policy, CopyReductionPolicy::Clamp);
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "9100"),
            ("LOAN_PERIOD_DAYS", "21"),
            ("COPY_REDUCTION_POLICY", "reject"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
        ]);
        assert_eq!(config.port, 9100);
        assert_eq!(config.loan_period_days, 21);
        assert_eq!(config.copy_reduction_policy, CopyReductionPolicy::Reject);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn ignores_invalid_values() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("LOAN_PERIOD_DAYS", "-3"),
            ("COPY_REDUCTION_POLICY", "deficit"),
        ]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.loan_period_days, 14);
        assert_eq!(config.copy_reduction_policy, CopyReductionPolicy::Clamp);
    }

    #[test]
    fn caps_the_loan_period() {
        let config = config_from(&[("LOAN_PERIOD_DAYS", "9999999999999")]);
        assert_eq!(config.loan_period_days, DEFAULT_LOAN_PERIOD_DAYS);

        let config = config_from(&[("LOAN_PERIOD_DAYS", "3651")]);
        assert_eq!(config.loan_period_days, DEFAULT_LOAN_PERIOD_DAYS);

        let config = config_from(&[("LOAN_PERIOD_DAYS", "3650")]);
        assert_eq!(config.loan_period_days, MAX_LOAN_PERIOD_DAYS);
    }
}
