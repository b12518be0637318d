use std::env;
use std::time::Duration;

/// Tunables for the coordination core. All read from environment variables with
/// sensible defaults, in the style of `RateLimitConfig::from_env()`.
///
/// Environment variables:
/// - `ROOMCORE_TOPIC_PREFIX` — bus topic prefix (default: "settlechat")
/// - `ROOMCORE_ENV` — suffix appended directly onto the prefix, e.g. "-staging" (default: "")
/// - `ROOMCORE_HISTORY_PAGE_SIZE` — messages replayed to a joining session (default: 50)
/// - `ROOMCORE_AGENT_IDLE_TIMEOUT_SECS` — AI agent eviction idle window (default: 1800)
/// - `ROOMCORE_AGENT_CLEANUP_INTERVAL_SECS` — AI agent sweep period (default: 600)
/// - `ROOMCORE_SESSION_QUEUE_DEPTH` — outbound queue capacity per session (default: 256)
/// - `ROOMCORE_MAX_MESSAGE_BYTES` — max inbound frame payload (default: 1024)
/// - `ROOMCORE_READ_DEADLINE_SECS` — pong/read liveness window (default: 120)
/// - `ROOMCORE_WRITE_DEADLINE_SECS` — per-write deadline (default: 10)
/// - `ROOMCORE_STORE_DEADLINE_SECS` — store call deadline (default: 5)
/// - `ROOMCORE_PROVIDER_DEADLINE_SECS` — AI provider call deadline (default: 30)
#[derive(Debug, Clone)]
pub struct Config {
    pub topic_prefix: String,
    pub history_page_size: i64,
    pub agent_idle_timeout: Duration,
    pub agent_cleanup_interval: Duration,
    pub session_queue_depth: usize,
    pub max_message_bytes: usize,
    pub read_deadline: Duration,
    pub write_deadline: Duration,
    pub store_deadline: Duration,
    pub provider_deadline: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topic_prefix: "settlechat".to_string(),
            history_page_size: 50,
            agent_idle_timeout: Duration::from_secs(30 * 60),
            agent_cleanup_interval: Duration::from_secs(10 * 60),
            session_queue_depth: 256,
            max_message_bytes: 1024,
            read_deadline: Duration::from_secs(120),
            write_deadline: Duration::from_secs(10),
            store_deadline: Duration::from_secs(5),
            provider_deadline: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(prefix) = env::var("ROOMCORE_TOPIC_PREFIX") {
            config.topic_prefix = prefix;
        }
        if let Ok(suffix) = env::var("ROOMCORE_ENV") {
            config.topic_prefix.push_str(&suffix);
        }
        if let Ok(val) = env::var("ROOMCORE_HISTORY_PAGE_SIZE")
            && let Ok(n) = val.parse::<i64>()
        {
            config.history_page_size = n;
        }
        if let Ok(val) = env::var("ROOMCORE_AGENT_IDLE_TIMEOUT_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.agent_idle_timeout = Duration::from_secs(n);
        }
        if let Ok(val) = env::var("ROOMCORE_AGENT_CLEANUP_INTERVAL_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.agent_cleanup_interval = Duration::from_secs(n);
        }
        if let Ok(val) = env::var("ROOMCORE_SESSION_QUEUE_DEPTH")
            && let Ok(n) = val.parse::<usize>()
        {
            config.session_queue_depth = n;
        }
        if let Ok(val) = env::var("ROOMCORE_MAX_MESSAGE_BYTES")
            && let Ok(n) = val.parse::<usize>()
        {
            config.max_message_bytes = n;
        }
        if let Ok(val) = env::var("ROOMCORE_READ_DEADLINE_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.read_deadline = Duration::from_secs(n);
        }
        if let Ok(val) = env::var("ROOMCORE_WRITE_DEADLINE_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.write_deadline = Duration::from_secs(n);
        }
        if let Ok(val) = env::var("ROOMCORE_STORE_DEADLINE_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.store_deadline = Duration::from_secs(n);
        }
        if let Ok(val) = env::var("ROOMCORE_PROVIDER_DEADLINE_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.provider_deadline = Duration::from_secs(n);
        }

        config
    }

    /// Ping period is 90% of the read deadline, matching the original client's
    /// 108s/120s ratio.
    pub fn ping_period(&self) -> Duration {
        self.read_deadline.mul_f64(0.9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let c = Config::default();
        assert_eq!(c.topic_prefix, "settlechat");
        assert_eq!(c.history_page_size, 50);
        assert_eq!(c.agent_idle_timeout, Duration::from_secs(1800));
        assert_eq!(c.max_message_bytes, 1024);
        assert_eq!(c.ping_period(), Duration::from_millis(108_000));
    }

    #[test]
    fn env_suffix_concatenates_without_separator() {
        unsafe {
            env::set_var("ROOMCORE_ENV", "-staging");
        }
        let c = Config::from_env();
        assert_eq!(c.topic_prefix, "settlechat-staging");
        unsafe {
            env::remove_var("ROOMCORE_ENV");
        }
    }
}
