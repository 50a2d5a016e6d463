use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// `AV_JAVBUS_BASE`: mirror host to scrape instead of the default.
    pub base_url: Option<String>,
    /// `AV_HTTP_PROXY`
    pub proxy: Option<String>,
    /// `AV_HTTP_TIMEOUT_SECS`
    pub timeout: Duration,
    /// `AV_COOKIE`: `k=v; k2=v2`, seeded into the cookie jar for the site host.
    pub cookie: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: None,
            proxy: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cookie: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let timeout = get("AV_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Config {
            base_url: get("AV_JAVBUS_BASE"),
            proxy: get("AV_HTTP_PROXY"),
            timeout: Duration::from_secs(timeout),
            cookie: get("AV_COOKIE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = from(&[]);
        assert!(c.base_url.is_none());
        assert!(c.proxy.is_none());
        assert_eq!(c.timeout, Duration::from_secs(30));
    }

    #[test]
    fn reads_values() {
        let c = from(&[
            ("AV_JAVBUS_BASE", "https://mirror.test/"),
            ("AV_HTTP_PROXY", "socks5://127.0.0.1:1080"),
            ("AV_HTTP_TIMEOUT_SECS", "5"),
            ("AV_COOKIE", " existmag=all "),
        ]);
        assert_eq!(c.base_url.as_deref(), Some("https://mirror.test/"));
        assert_eq!(c.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert_eq!(c.timeout, Duration::from_secs(5));
        assert_eq!(c.cookie.as_deref(), Some("existmag=all"));
    }

    #[test]
    fn bad_timeout_falls_back() {
        assert_eq!(from(&[("AV_HTTP_TIMEOUT_SECS", "soon")]).timeout, Duration::from_secs(30));
        assert_eq!(from(&[("AV_HTTP_TIMEOUT_SECS", "0")]).timeout, Duration::from_secs(30));
        assert!(from(&[("AV_JAVBUS_BASE", "  ")]).base_url.is_none());
    }
}
