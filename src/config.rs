//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，并允许环境变量覆盖关键项

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite 连接串
    #[serde(default = "default_database_url")]
    pub url: String,
    /// 连接池最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// 行情数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 数据源根地址
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// 会话页地址，用于获取 cookie
    #[serde(default = "default_provider_session_url")]
    pub session_url: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// 实际加载的配置文件路径
    #[serde(skip)]
    pub source: Option<String>,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_database_url() -> String { "sqlite://stocks.db?mode=rwc".to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_provider_base_url() -> String { "https://query2.finance.yahoo.com".to_string() }
fn default_provider_session_url() -> String { "https://fc.yahoo.com".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            session_url: default_provider_session_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，没有配置文件则使用默认值，最后应用环境变量覆盖
    ///
    /// 配置文件存在但无法解析时返回错误，不静默回退
    pub fn load() -> anyhow::Result<Self> {
        let config_paths = ["config.json", "config/config.json"];

        let mut config = Self::default();
        for path in config_paths {
            if Path::new(path).exists() {
                config = Self::from_file(path)
                    .with_context(|| format!("加载配置文件 {} 失败", path))?;
                config.source = Some(path.to_string());
                break;
            }
        }

        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// 用环境变量覆盖配置项
    ///
    /// 支持 DATABASE_URL、PROVIDER_BASE_URL、HOST、PORT
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(base_url) = lookup("PROVIDER_BASE_URL") {
            self.provider.base_url = base_url;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            // 非法端口忽略，保留原值
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
