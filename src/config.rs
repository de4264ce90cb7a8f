use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use log::{info, warn};

use crate::model::Pallet;
use crate::optimizer::PackingConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub pallet: PalletConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            pallet: PalletConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value =
            env_string("PALLET_STACKER_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                warn!(
                    "⚠️ Could not parse PALLET_STACKER_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string("PALLET_STACKER_API_PORT") {
            Some(raw) => parse_port(&raw).unwrap_or(Self::DEFAULT_PORT),
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Default pallet used when a request does not bring its own.
#[derive(Clone, Copy, Debug)]
pub struct PalletConfig {
    pallet: Pallet,
}

impl PalletConfig {
    const LENGTH_VAR: &'static str = "PALLET_STACKER_PALLET_LENGTH";
    const WIDTH_VAR: &'static str = "PALLET_STACKER_PALLET_WIDTH";
    const MAX_HEIGHT_VAR: &'static str = "PALLET_STACKER_PALLET_MAX_HEIGHT";
    const BASE_HEIGHT_VAR: &'static str = "PALLET_STACKER_PALLET_BASE_HEIGHT";
    const MAX_WEIGHT_VAR: &'static str = "PALLET_STACKER_PALLET_MAX_WEIGHT";

    fn from_env() -> Self {
        let positive = |value: f64| value > 0.0;
        let length = load_f64(Self::LENGTH_VAR, Pallet::DEFAULT_LENGTH, positive, "must be greater than 0");
        let width = load_f64(Self::WIDTH_VAR, Pallet::DEFAULT_WIDTH, positive, "must be greater than 0");
        let max_height = load_f64(
            Self::MAX_HEIGHT_VAR,
            Pallet::DEFAULT_MAX_HEIGHT,
            positive,
            "must be greater than 0",
        );
        let base_height = load_f64(
            Self::BASE_HEIGHT_VAR,
            Pallet::DEFAULT_BASE_HEIGHT,
            |value| value >= 0.0,
            "must not be negative",
        );
        let max_weight = load_f64(
            Self::MAX_WEIGHT_VAR,
            Pallet::DEFAULT_MAX_WEIGHT,
            positive,
            "must be greater than 0",
        );

        let pallet = match Pallet::new(length, width, max_height, base_height, max_weight) {
            Ok(pallet) => pallet,
            Err(err) => {
                warn!("⚠️ Pallet configuration rejected ({}). Using defaults.", err);
                Pallet::default()
            }
        };
        if pallet.effective_height() <= 0.0 {
            warn!(
                "⚠️ Base height {} leaves no stacking room below {}",
                pallet.base_height, pallet.max_height
            );
        }

        Self { pallet }
    }

    pub fn pallet(&self) -> Pallet {
        self.pallet
    }
}

/// Configuration for the layout heuristic.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    packing: PackingConfig,
}

impl OptimizerConfig {
    const TOLERANCE_VAR: &'static str = "PALLET_STACKER_OVERHANG_TOLERANCE";
    const RATIO_VAR: &'static str = "PALLET_STACKER_OVERHANG_RATIO";
    const MIN_LENGTH_VAR: &'static str = "PALLET_STACKER_OVERHANG_MIN_LENGTH";
    const MIN_WIDTH_VAR: &'static str = "PALLET_STACKER_OVERHANG_MIN_WIDTH";
    const ALLOW_OVERHANG_VAR: &'static str = "PALLET_STACKER_ALLOW_OVERHANG";

    fn from_env() -> Self {
        let overhang_tolerance = load_f64(
            Self::TOLERANCE_VAR,
            PackingConfig::DEFAULT_OVERHANG_TOLERANCE,
            |value| value >= 0.0,
            "must not be negative",
        );
        // Above 0.5 a single item could hang off by more than half its own size.
        let overhang_ratio = load_f64(
            Self::RATIO_VAR,
            PackingConfig::DEFAULT_OVERHANG_RATIO,
            |value| (0.0..=0.5).contains(&value),
            "must be between 0 and 0.5",
        );
        let overhang_min_length = load_f64(
            Self::MIN_LENGTH_VAR,
            PackingConfig::DEFAULT_OVERHANG_MIN_LENGTH,
            |value| value >= 0.0,
            "must not be negative",
        );
        let overhang_min_width = load_f64(
            Self::MIN_WIDTH_VAR,
            PackingConfig::DEFAULT_OVERHANG_MIN_WIDTH,
            |value| value >= 0.0,
            "must not be negative",
        );
        let allow_overhang = env_string(Self::ALLOW_OVERHANG_VAR)
            .and_then(|raw| parse_bool(&raw, Self::ALLOW_OVERHANG_VAR))
            .unwrap_or(PackingConfig::DEFAULT_ALLOW_OVERHANG);

        let packing = PackingConfig::builder()
            .overhang_tolerance(overhang_tolerance)
            .overhang_ratio(overhang_ratio)
            .overhang_min_length(overhang_min_length)
            .overhang_min_width(overhang_min_width)
            .allow_overhang(allow_overhang)
            .build();

        Self { packing }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("⚠️ Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.parse::<u16>() {
        Ok(0) => {
            warn!("⚠️ PALLET_STACKER_API_PORT must not be 0. Using default port.");
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "⚠️ Could not parse PALLET_STACKER_API_PORT ('{}'): {}. Using default port.",
                raw, err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn load_f64(var_name: &str, default: f64, validator: impl Fn(f64) -> bool, invalid_hint: &str) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64(var_name, &raw, default, validator, invalid_hint),
        None => default,
    }
}

fn parse_f64(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => {
            let tolerance = (default.abs().max(1.0)) * 1e-9;
            if (value - default).abs() > tolerance {
                info!("🔧 {} = {} (default {})", var_name, value, default);
            }
            value
        }
        Ok(_) => {
            warn!(
                "⚠️ {} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_true_values() {
        for raw in ["1", "true", "yes", "y", "on", "TRUE", "Yes", " on ", "  1  "] {
            assert_eq!(parse_bool(raw, "TEST_VAR"), Some(true), "{raw:?}");
        }
    }

    #[test]
    fn test_parse_bool_false_values() {
        for raw in ["0", "false", "no", "n", "off", "FALSE", "No", " off "] {
            assert_eq!(parse_bool(raw, "TEST_VAR"), Some(false), "{raw:?}");
        }
    }

    #[test]
    fn test_parse_bool_invalid_values() {
        assert_eq!(parse_bool("invalid", "TEST_VAR"), None);
        assert_eq!(parse_bool("2", "TEST_VAR"), None);
        assert_eq!(parse_bool("", "TEST_VAR"), None);
    }

    #[test]
    fn test_parse_f64_falls_back_on_bad_input() {
        let positive = |v: f64| v > 0.0;
        assert_eq!(parse_f64("V", "110.5", 120.0, positive, "hint"), 110.5);
        assert_eq!(parse_f64("V", "-3", 120.0, positive, "hint"), 120.0);
        assert_eq!(parse_f64("V", "abc", 120.0, positive, "hint"), 120.0);
        assert_eq!(parse_f64("V", "inf", 120.0, positive, "hint"), 120.0);
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("9090"), Some(9090));
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("70000"), None);
    }

    #[test]
    fn test_unset_variables_use_defaults() {
        assert_eq!(
            load_f64("PALLET_STACKER_TEST_SURELY_UNSET", 14.5, |_| true, "hint"),
            14.5
        );
        assert_eq!(env_string("PALLET_STACKER_TEST_SURELY_UNSET"), None);
    }
}
