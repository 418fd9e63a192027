use crate::utils::error::TarotError;
use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;

/// 模型输入边长（正方形输入）
pub const DEFAULT_INPUT_SIZE: u32 = 224;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件路径
    pub model_path: PathBuf,

    /// 标签文件路径，缺省使用内置标签
    pub labels_path: Option<PathBuf>,

    /// 模型输入边长
    pub input_size: u32,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: String,
        labels_path: Option<String>,
        dev_mode: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: 50 * 1024 * 1024, // 50MB
        };

        let config = Self {
            bind_addr,
            model_path: PathBuf::from(model_path),
            labels_path: labels_path.map(PathBuf::from),
            input_size: DEFAULT_INPUT_SIZE,
            dev_mode,
            onnx_config,
            server_config,
        };

        // 尽早暴露非法地址
        config.socket_addr()?;

        Ok(config)
    }

    /// 解析绑定地址
    pub fn socket_addr(&self) -> crate::Result<SocketAddr> {
        self.bind_addr.parse().map_err(|e| {
            TarotError::Config(format!("Invalid bind address {}: {}", self.bind_addr, e))
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            model_path: PathBuf::from("model/model.onnx"),
            labels_path: None,
            input_size: DEFAULT_INPUT_SIZE,
            dev_mode: false,
            onnx_config: OnnxConfig {
                intra_threads: (num_cpus::get() * 3 / 4).max(1),
                optimization_level: 3,
            },
            server_config: ServerConfig {
                request_timeout: 60,
                max_request_size: 50 * 1024 * 1024,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_service_values() {
        let config = Config::default();
        assert_eq!(config.socket_addr().unwrap().port(), 3000);
        assert_eq!(config.model_path, PathBuf::from("model/model.onnx"));
        assert_eq!(config.input_size, 224);
        assert!(config.onnx_config.intra_threads >= 1);
    }

    #[test]
    fn dev_mode_extends_timeout() {
        let config = Config::new("127.0.0.1:3000".into(), "m.onnx".into(), None, true).unwrap();
        assert_eq!(config.server_config.request_timeout, 300);
        assert!(config.labels_path.is_none());
    }

    #[test]
    fn rejects_invalid_bind_address() {
        let err = Config::new("not-an-address".into(), "m.onnx".into(), None, false).unwrap_err();
        assert!(err.to_string().contains("Invalid bind address"));
    }
}
