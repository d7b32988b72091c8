use std::time::Duration;

/// Signal API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    /// How often the server pings each WebSocket connection.
    pub heartbeat_interval: Duration,
    /// How long a created room may sit without ever gaining a member.
    pub room_reservation_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; unparsable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parsed_var("PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or(defaults.cors_origins),
            heartbeat_interval: parsed_var("HEARTBEAT_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.heartbeat_interval),
            room_reservation_ttl: parsed_var("ROOM_RESERVATION_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.room_reservation_ttl),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4003,
            cors_origins: Vec::new(),
            heartbeat_interval: Duration::from_secs(25),
            room_reservation_ttl: Duration::from_secs(600),
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Split a comma-separated origin list. `*` anywhere means "any origin".
fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if origins.iter().any(|o| o == "*") {
        return Vec::new();
    }
    origins
}
