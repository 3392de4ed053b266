use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// 千千静听默认的歌词服务器端口
const DEFAULT_PORT: u16 = 25168;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// HTTP 监听端口
    pub port: u16,

    /// 歌词源特定配置
    pub sources: SourcesConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourcesConfig {
    /// 网易云音乐API配置
    pub netease: Option<NeteaseConfig>,

    /// QQ音乐API配置
    pub qqmusic: Option<QQMusicConfig>,
}

/// 网易云音乐配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NeteaseConfig {}

/// QQ音乐配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QQMusicConfig {}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            sources: SourcesConfig {
                netease: Some(NeteaseConfig {}),
                qqmusic: Some(QQMusicConfig {}),
            },
        }
    }
}

impl Config {
    /// 加载配置，支持从指定路径或默认路径加载
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let pkg_name = env!("CARGO_PKG_NAME");
        let config_path = path.unwrap_or_else(|| {
            dirs::config_dir()
                .map(|p| p.join(pkg_name).join("config.toml"))
                .unwrap_or_else(|| PathBuf::from(format!("{}-config.toml", pkg_name)))
        });

        debug!("尝试从 {:?} 加载配置文件", config_path);

        if !config_path.exists() {
            debug!("配置文件 {:?} 不存在，将创建默认配置", config_path);
            let default_config = Config::default();
            let toml = toml::to_string_pretty(&default_config)?;

            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, toml)?;
            info!("已创建默认配置文件: {:?}", config_path);
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = match toml::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("解析配置文件 {:?} 失败: {}", config_path, e);
                warn!("由于解析错误，将加载默认配置");
                Config::default()
            }
        };

        debug!("已成功加载配置文件");
        Ok(config)
    }
}
