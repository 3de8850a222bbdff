use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Runtime configuration. Every key has a default so the daemon starts with
/// no file and no environment at all.
#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_ban_log_path")]
    pub ban_log_path: String,

    #[serde(default = "default_sample_interval_secs")]
    pub sample_interval_secs: u64,

    #[serde(default = "default_warmup_cycles")]
    pub warmup_cycles: u32,

    #[serde(default = "default_retention_hours")]
    pub retention_hours: i64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_preferred_interfaces")]
    pub preferred_interfaces: Vec<String>,

    #[serde(default = "default_fallback_interface")]
    pub fallback_interface: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    listen_addr: Option<String>,
    db_path: Option<String>,
    log_dir: Option<String>,
    ban_log_path: Option<String>,
    sample_interval_secs: Option<u64>,
    warmup_cycles: Option<u32>,
    retention_hours: Option<i64>,
    sweep_interval_secs: Option<u64>,
    preferred_interfaces: Option<Vec<String>>,
    fallback_interface: Option<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_db_path() -> String {
    "data/router.db".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_ban_log_path() -> String {
    "/var/log/fail2ban.log".to_string()
}

fn default_sample_interval_secs() -> u64 {
    30
}

fn default_warmup_cycles() -> u32 {
    3
}

fn default_retention_hours() -> i64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_preferred_interfaces() -> Vec<String> {
    ["ppp0", "enp2s0", "enp3s0", "eth0"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_fallback_interface() -> String {
    "eno1".to_string()
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = if let Some(path_str) = config_path {
            let path = Path::new(path_str);
            if path.exists() {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            } else {
                PartialServerConfig::default()
            }
        } else {
            PartialServerConfig::default()
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file, defaults fill the rest
        let final_config = ServerConfig {
            listen_addr: env_config
                .listen_addr
                .or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            db_path: env_config
                .db_path
                .or(file_config.db_path)
                .unwrap_or_else(default_db_path),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            ban_log_path: env_config
                .ban_log_path
                .or(file_config.ban_log_path)
                .unwrap_or_else(default_ban_log_path),
            sample_interval_secs: env_config
                .sample_interval_secs
                .or(file_config.sample_interval_secs)
                .unwrap_or_else(default_sample_interval_secs),
            warmup_cycles: env_config
                .warmup_cycles
                .or(file_config.warmup_cycles)
                .unwrap_or_else(default_warmup_cycles),
            retention_hours: env_config
                .retention_hours
                .or(file_config.retention_hours)
                .unwrap_or_else(default_retention_hours),
            sweep_interval_secs: env_config
                .sweep_interval_secs
                .or(file_config.sweep_interval_secs)
                .unwrap_or_else(default_sweep_interval_secs),
            preferred_interfaces: env_config
                .preferred_interfaces
                .or(file_config.preferred_interfaces)
                .unwrap_or_else(default_preferred_interfaces),
            fallback_interface: env_config
                .fallback_interface
                .or(file_config.fallback_interface)
                .unwrap_or_else(default_fallback_interface),
        };

        Ok(final_config)
    }
}
