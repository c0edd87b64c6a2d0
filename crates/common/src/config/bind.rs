use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// HTTP 服务绑定配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BindConfig {
    /// 绑定 IP 地址
    ///
    /// 服务实际绑定的网络接口 IP 地址。
    /// 通常使用 "0.0.0.0" 监听所有接口。
    #[serde(default = "default_ip")]
    pub ip: String,

    /// 绑定端口
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            port: default_port(),
        }
    }
}

fn default_ip() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

impl BindConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.ip, self.port).parse()
    }
}
