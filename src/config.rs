use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_DB_PATH: &str = "data/surebets.db";
pub const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path:       String,
    pub log_dir:       String,
    pub total_stake:   Decimal,
    pub fetch_timeout: Duration,
    pub ntfy_topic:    Option<String>,
}

impl AppConfig {
    /// Čte proměnné prostředí (po `dotenv`); vadná čísla → default + warn
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let total_stake = match lookup("SUREBETS_TOTAL_STAKE") {
            Some(raw) => match Decimal::from_str(raw.trim()) {
                Ok(v) if v > Decimal::ZERO => v,
                _ => {
                    warn!("Invalid SUREBETS_TOTAL_STAKE `{}`, using 100", raw);
                    Decimal::ONE_HUNDRED
                }
            },
            None => Decimal::ONE_HUNDRED,
        };

        let fetch_timeout_secs = match lookup("SUREBETS_FETCH_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                warn!("Invalid SUREBETS_FETCH_TIMEOUT_SECS `{}`, using {}", raw, DEFAULT_FETCH_TIMEOUT_SECS);
                DEFAULT_FETCH_TIMEOUT_SECS
            }),
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        Self {
            db_path:       lookup("SUREBETS_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            log_dir:       lookup("SUREBETS_LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
            total_stake,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            ntfy_topic:    lookup("NTFY_TOPIC").filter(|t| !t.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.db_path, DEFAULT_DB_PATH);
        assert_eq!(cfg.log_dir, DEFAULT_LOG_DIR);
        assert_eq!(cfg.total_stake, dec!(100));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(20));
        assert_eq!(cfg.ntfy_topic, None);
    }

    #[test]
    fn reads_overrides() {
        let cfg = config_from(&[
            ("SUREBETS_DB_PATH", "/tmp/sb.db"),
            ("SUREBETS_LOG_DIR", "/tmp/journal"),
            ("SUREBETS_TOTAL_STAKE", "250.50"),
            ("SUREBETS_FETCH_TIMEOUT_SECS", "45"),
            ("NTFY_TOPIC", "surebets-alerts"),
        ]);
        assert_eq!(cfg.db_path, "/tmp/sb.db");
        assert_eq!(cfg.log_dir, "/tmp/journal");
        assert_eq!(cfg.total_stake, dec!(250.50));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(45));
        assert_eq!(cfg.ntfy_topic.as_deref(), Some("surebets-alerts"));
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let cfg = config_from(&[
            ("SUREBETS_TOTAL_STAKE", "-5"),
            ("SUREBETS_FETCH_TIMEOUT_SECS", "soon"),
            ("NTFY_TOPIC", "  "),
        ]);
        assert_eq!(cfg.total_stake, dec!(100));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(20));
        assert_eq!(cfg.ntfy_topic, None);
    }
}
