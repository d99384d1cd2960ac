// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;
use std::time::Duration;

use crate::param::{
    DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_HEADER_SIZE, DEFAULT_TIMEOUT_MS, SERVER_NAME,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_read_timeout_ms")]
    read_timeout_ms: u64,
    #[serde(default = "default_max_header_size")]
    max_header_size: usize,
    #[serde(default = "default_max_body_size")]
    max_body_size: usize,
    #[serde(default = "default_server_name")]
    server_name: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_header_size() -> usize {
    DEFAULT_MAX_HEADER_SIZE
}

fn default_max_body_size() -> usize {
    DEFAULT_MAX_BODY_SIZE
}

fn default_server_name() -> String {
    SERVER_NAME.to_string()
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            worker_threads: num_cpus::get(),
            read_timeout_ms: default_read_timeout_ms(),
            max_header_size: default_max_header_size(),
            max_body_size: default_max_body_size(),
            server_name: default_server_name(),
        }
    }

    /// 从 TOML 文件读取配置。文件缺失或格式错误时记录日志并使用默认配置。
    pub fn from_toml(filename: &str) -> Self {
        let mut file = match File::open(filename) {
            Ok(f) => f,
            Err(e) => {
                warn!("无法打开配置文件{}：{}，使用默认配置", filename, e);
                return Config::new();
            }
        };
        let mut str_val = String::new();
        if let Err(e) = file.read_to_string(&mut str_val) {
            error!("读取配置文件{}失败：{}，使用默认配置", filename, e);
            return Config::new();
        }
        Self::from_toml_str(&str_val)
    }

    pub fn from_toml_str(s: &str) -> Self {
        let raw_config: Config = match toml::from_str(s) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        };
        raw_config.sanitize()
    }

    /// 修正会让服务端无法工作的零值
    fn sanitize(mut self) -> Self {
        if self.worker_threads == 0 {
            self.worker_threads = num_cpus::get();
        }
        if self.max_header_size == 0 {
            warn!("max_header_size被设置为0，这将拒绝所有请求，因此该值将被改为{}。", DEFAULT_MAX_HEADER_SIZE);
            self.max_header_size = DEFAULT_MAX_HEADER_SIZE;
        }
        if self.read_timeout_ms == 0 {
            warn!("read_timeout_ms被设置为0，该值将被改为{}。", DEFAULT_TIMEOUT_MS);
            self.read_timeout_ms = DEFAULT_TIMEOUT_MS;
        }
        self
    }

    /// 覆盖监听地址（测试与命令行使用）
    pub fn with_address(mut self, host: &str, port: u16) -> Self {
        self.host = host.to_string();
        self.port = port;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.sanitize()
    }

    pub fn with_limits(mut self, max_header_size: usize, max_body_size: usize) -> Self {
        self.max_header_size = max_header_size;
        self.max_body_size = max_body_size;
        self.sanitize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn max_header_size(&self) -> usize {
        self.max_header_size
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_toml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
host = "0.0.0.0"
port = 9090
worker_threads = 2
read_timeout_ms = 250
server_name = "My server name"
"#
        )
        .unwrap();

        let config = Config::from_toml(file.path().to_str().unwrap());

        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.port(), 9090);
        assert_eq!(config.worker_threads(), 2);
        assert_eq!(config.read_timeout(), Duration::from_millis(250));
        assert_eq!(config.server_name(), "My server name");
        // 未给出的字段使用默认值
        assert_eq!(config.max_header_size(), DEFAULT_MAX_HEADER_SIZE);
        assert_eq!(config.max_body_size(), DEFAULT_MAX_BODY_SIZE);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = Config::from_toml(path.to_str().unwrap());
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_invalid_toml_uses_defaults() {
        let config = Config::from_toml_str("port = \"not a number\"");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.host(), "127.0.0.1");
    }

    #[test]
    fn test_zero_values_are_replaced() {
        let config = Config::from_toml_str("worker_threads = 0\nmax_header_size = 0\nread_timeout_ms = 0");

        assert_eq!(config.worker_threads(), num_cpus::get());
        assert_eq!(config.max_header_size(), DEFAULT_MAX_HEADER_SIZE);
        assert_eq!(config.read_timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_builders() {
        let config = Config::new()
            .with_address("localhost", 0)
            .with_read_timeout(Duration::from_millis(100))
            .with_limits(64, 16);

        assert_eq!(config.host(), "localhost");
        assert_eq!(config.port(), 0);
        assert_eq!(config.read_timeout(), Duration::from_millis(100));
        assert_eq!(config.max_header_size(), 64);
        assert_eq!(config.max_body_size(), 16);
    }

    #[test]
    fn test_builders_replace_zero_values() {
        let config = Config::new()
            .with_read_timeout(Duration::ZERO)
            .with_limits(0, 0);

        assert_eq!(config.read_timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.max_header_size(), DEFAULT_MAX_HEADER_SIZE);
        // 请求体上限为 0 表示只接受空请求体，保持不变
        assert_eq!(config.max_body_size(), 0);
    }

    #[test]
    fn test_huge_read_timeout_saturates() {
        let config = Config::new().with_read_timeout(Duration::MAX);

        assert_eq!(config.read_timeout(), Duration::from_millis(u64::MAX));
    }
}
