// 环境变量配置
// BANANAPREP_ 前缀的环境变量反序列化为配置，缺省时使用内置默认值

use log::warn;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::OctaveConfig;
use crate::utils;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// SQLite 文件路径，缺省在应用数据目录下
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_problems_path")]
    pub problems_path: PathBuf,
    #[serde(default = "default_octave_binary")]
    pub octave_binary: PathBuf,
    #[serde(default = "default_octave_timeout_secs")]
    pub octave_timeout_secs: u64,
    /// Octave 临时工作目录的父目录，缺省用系统临时目录
    #[serde(default)]
    pub octave_scratch_dir: Option<PathBuf>,
    /// 远程 MATLAB Engine API 地址，未配置时数值挑战接口不可用
    #[serde(default)]
    pub matlab_api_url: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_problems_path() -> PathBuf {
    PathBuf::from("data/problems.json")
}

fn default_octave_binary() -> PathBuf {
    PathBuf::from("octave")
}

fn default_octave_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            database_path: None,
            problems_path: default_problems_path(),
            octave_binary: default_octave_binary(),
            octave_timeout_secs: default_octave_timeout_secs(),
            octave_scratch_dir: None,
            matlab_api_url: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        match envy::prefixed("BANANAPREP_").from_env::<Config>() {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid environment configuration ({}), using defaults", e);
                Config::default()
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(utils::get_database_path)
    }

    pub fn octave(&self) -> OctaveConfig {
        OctaveConfig {
            binary: self.octave_binary.clone(),
            timeout: Duration::from_secs(self.octave_timeout_secs),
            scratch_root: self.octave_scratch_dir.clone(),
        }
    }
}
