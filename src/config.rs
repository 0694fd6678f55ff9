//! Server configuration: compile-time defaults plus environment overrides

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::CanvasError;

/// Default listen port (same as the Node server)
pub const DEFAULT_PORT: u16 = 3000;

/// Grid size bounds and default
pub const MIN_GRID_SIZE: i64 = 10;
pub const MAX_GRID_SIZE: i64 = 150;
pub const DEFAULT_GRID_SIZE: i64 = 50;

/// Advisory placement cooldown bounds and default (seconds)
pub const MIN_COOLDOWN_SEC: i64 = 1;
pub const MAX_COOLDOWN_SEC: i64 = 30;
pub const DEFAULT_COOLDOWN_SEC: i64 = 5;

/// Erase brush size bounds
pub const MIN_ERASE_SIZE: i64 = 1;
pub const MAX_ERASE_SIZE: i64 = 150;

/// How long a disconnected player keeps their seat
pub const DEFAULT_GRACE_SECS: u64 = 120;

/// Directory served at `/`
pub const DEFAULT_STATIC_DIR: &str = "public";

/// Runtime configuration read once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub grace_period: Duration,
    pub enforce_cooldown: bool,
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            grace_period: Duration::from_secs(DEFAULT_GRACE_SECS),
            enforce_cooldown: false,
            static_dir: DEFAULT_STATIC_DIR.to_string(),
        }
    }
}

impl ServerConfig {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self, CanvasError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CanvasError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(bind) = lookup("CANVAS_BIND") {
            config.bind = parse_var("CANVAS_BIND", &bind)?;
        }
        if let Some(port) = lookup("PORT") {
            config.port = parse_var("PORT", &port)?;
        }
        if let Some(secs) = lookup("CANVAS_GRACE_SECS") {
            config.grace_period = Duration::from_secs(parse_var("CANVAS_GRACE_SECS", &secs)?);
        }
        if let Some(flag) = lookup("CANVAS_ENFORCE_COOLDOWN") {
            config.enforce_cooldown = parse_flag("CANVAS_ENFORCE_COOLDOWN", &flag)?;
        }
        if let Some(dir) = lookup("CANVAS_STATIC_DIR") {
            config.static_dir = dir;
        }

        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, CanvasError> {
    value
        .trim()
        .parse()
        .map_err(|_| CanvasError::InvalidConfig(format!("{}={:?}", key, value)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, CanvasError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(CanvasError::InvalidConfig(format!("{}={:?}", key, value))),
    }
}

/// Turn a client-supplied number into an integer request.
///
/// Zero and NaN mean "not given". Other values round toward zero, except that
/// fractions between -1 and 1 keep their sign so they clamp like the client
/// intended rather than falling back to the default.
pub fn requested_integer(value: Option<f64>) -> Option<i64> {
    let value = value.filter(|v| !v.is_nan() && *v != 0.0)?;
    let whole = value.trunc();
    Some(if whole == 0.0 { value.signum() as i64 } else { whole as i64 })
}

/// Clamp a requested grid size; missing or zero falls back to the default
pub fn clamp_grid_size(requested: Option<i64>) -> i64 {
    normalize(requested, DEFAULT_GRID_SIZE).clamp(MIN_GRID_SIZE, MAX_GRID_SIZE)
}

/// Clamp a requested cooldown; missing or zero falls back to the default
pub fn clamp_cooldown(requested: Option<i64>) -> i64 {
    normalize(requested, DEFAULT_COOLDOWN_SEC).clamp(MIN_COOLDOWN_SEC, MAX_COOLDOWN_SEC)
}

fn normalize(requested: Option<i64>, default: i64) -> i64 {
    match requested {
        Some(0) | None => default,
        Some(value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.grace_period, Duration::from_secs(120));
        assert!(!config.enforce_cooldown);
        assert_eq!(config.static_dir, "public");
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("CANVAS_GRACE_SECS", "5"),
            ("CANVAS_ENFORCE_COOLDOWN", "true"),
            ("CANVAS_BIND", "127.0.0.1"),
        ]))
        .unwrap();
        assert_eq!(config.addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.grace_period, Duration::from_secs(5));
        assert!(config.enforce_cooldown);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = ServerConfig::from_lookup(lookup(&[("PORT", "not-a-port")]));
        assert!(matches!(result, Err(CanvasError::InvalidConfig(_))));
    }

    #[test]
    fn test_requested_integer() {
        assert_eq!(requested_integer(None), None);
        assert_eq!(requested_integer(Some(0.0)), None);
        assert_eq!(requested_integer(Some(f64::NAN)), None);
        assert_eq!(requested_integer(Some(12.7)), Some(12));
        assert_eq!(requested_integer(Some(0.5)), Some(1));
        assert_eq!(requested_integer(Some(-0.5)), Some(-1));
        assert_eq!(requested_integer(Some(1e300)), Some(i64::MAX));

        assert_eq!(clamp_grid_size(requested_integer(Some(0.5))), 10);
        assert_eq!(clamp_cooldown(requested_integer(Some(0.5))), 1);
        assert_eq!(clamp_grid_size(requested_integer(Some(f64::INFINITY))), 150);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(clamp_grid_size(None), 50);
        assert_eq!(clamp_grid_size(Some(0)), 50);
        assert_eq!(clamp_grid_size(Some(3)), 10);
        assert_eq!(clamp_grid_size(Some(999)), 150);
        assert_eq!(clamp_cooldown(Some(-4)), 1);
        assert_eq!(clamp_cooldown(Some(60)), 30);
        assert_eq!(clamp_cooldown(None), 5);
    }
}
