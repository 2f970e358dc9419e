/* src/config.rs */

use crate::upstream::{DEFAULT_UPSTREAM_TIMEOUT, UpstreamList};
use anyhow::{Context, Result, bail};
use std::env;
use std::time::Duration;

const DEFAULT_UPSTREAMS: &str = "https://blockstream.info/api";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upstreams: UpstreamList,
    /// Zero disables effective caching: every lookup is already stale.
    pub cache_ttl: Duration,
    /// Calls per second across all upstreams; `<= 0` disables throttling.
    pub rate_limit_rps: f64,
    pub upstream_timeout: Duration,
}

/// Reads the configuration from the process environment.
pub fn load_config() -> Result<AppConfig> {
    from_lookup(|key| env::var(key).ok())
}

/// Builds the configuration from any key lookup, falling back to defaults for
/// missing keys.
pub fn from_lookup<F>(lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

    let host = var("HOST", "0.0.0.0");

    let port = var("PORT", "8000")
        .trim()
        .parse::<u16>()
        .context("Invalid PORT")?;

    let upstreams = UpstreamList::parse(&var("UPSTREAMS", DEFAULT_UPSTREAMS));

    let cache_ttl = var("CACHE_TTL", "30")
        .trim()
        .parse::<i64>()
        .context("Invalid CACHE_TTL")?;
    let cache_ttl = Duration::from_secs(u64::try_from(cache_ttl).unwrap_or(0));

    let rate_limit_rps = var("RATE_LIMIT_RPS", "5")
        .trim()
        .parse::<f64>()
        .context("Invalid RATE_LIMIT_RPS")?;

    let upstream_timeout = match lookup("UPSTREAM_TIMEOUT") {
        Some(raw) => {
            let secs = raw
                .trim()
                .parse::<f64>()
                .context("Invalid UPSTREAM_TIMEOUT")?;
            if secs.is_nan() || secs <= 0.0 {
                bail!("UPSTREAM_TIMEOUT must be a positive number of seconds, got {secs}");
            }
            Duration::try_from_secs_f64(secs).context("Invalid UPSTREAM_TIMEOUT")?
        }
        None => DEFAULT_UPSTREAM_TIMEOUT,
    };

    Ok(AppConfig {
        host,
        port,
        upstreams,
        cache_ttl,
        rate_limit_rps,
        upstream_timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.upstreams, UpstreamList::parse(DEFAULT_UPSTREAMS));
        assert_eq!(cfg.cache_ttl, Duration::from_secs(30));
        assert!((cfg.rate_limit_rps - 5.0).abs() < f64::EPSILON);
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(10));
    }

    #[test]
    fn explicit_values_are_parsed() {
        let cfg = config(&[
            ("UPSTREAMS", "https://mempool.space/api/,https://blockstream.info/api"),
            ("CACHE_TTL", "5"),
            ("RATE_LIMIT_RPS", "0.5"),
            ("UPSTREAM_TIMEOUT", "2.5"),
            ("PORT", "9000"),
        ])
        .unwrap();

        assert_eq!(
            cfg.upstreams.iter().collect::<Vec<_>>(),
            vec!["https://mempool.space/api", "https://blockstream.info/api"]
        );
        assert_eq!(cfg.cache_ttl, Duration::from_secs(5));
        assert!((cfg.rate_limit_rps - 0.5).abs() < f64::EPSILON);
        assert_eq!(cfg.upstream_timeout, Duration::from_millis(2500));
        assert_eq!(cfg.port, 9000);
    }

    #[test]
    fn negative_ttl_disables_caching() {
        let cfg = config(&[("CACHE_TTL", "-10")]).unwrap();
        assert_eq!(cfg.cache_ttl, Duration::ZERO);
    }

    #[test]
    fn empty_upstream_list_is_accepted() {
        let cfg = config(&[("UPSTREAMS", " , ")]).unwrap();
        assert!(cfg.upstreams.is_empty());
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(config(&[("CACHE_TTL", "soon")]).is_err());
        assert!(config(&[("RATE_LIMIT_RPS", "fast")]).is_err());
        assert!(config(&[("PORT", "70000")]).is_err());
        assert!(config(&[("UPSTREAM_TIMEOUT", "0")]).is_err());
    }
}
