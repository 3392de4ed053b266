mod manager;

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{netease::NeteaseApi, qq::QQMusicApi};
use crate::config::Config;

pub use manager::LyricsManager;

/// 歌词源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Netease,
    QQMusic,
}

impl Source {
    /// 按老客户端路径段解析歌词源，大小写不敏感
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "netease" => Some(Source::Netease),
            "qqmusic" | "qq" => Some(Source::QQMusic),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Netease => write!(f, "netease"),
            Source::QQMusic => write!(f, "qqmusic"),
        }
    }
}

/// 一次搜索请求
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub source: Source,
    pub title: String,
    pub artist: String,
}

impl SearchQuery {
    /// 缓存键：source、title、artist 原文拼接，不做归一化
    pub fn cache_key(&self) -> String {
        format!("{}_{}_{}", self.source, self.title, self.artist)
    }
}

/// 带临时 ID 的候选歌曲，ID 只在本轮搜索结果的生命周期内有效
#[derive(Debug, Clone)]
pub struct CandidateTrack {
    pub id: u32,
    pub platform_id: String,
    pub source: Source,
    pub artist: String,
    pub title: String,
    pub album: String,
}

/// 按配置装配歌词管理器
pub fn setup_lyrics_manager(config: &Config) -> LyricsManager {
    let mut manager = LyricsManager::new();

    if let Some(netease_config) = &config.sources.netease {
        info!("启用网易云音乐歌词源");
        let api = Arc::new(NeteaseApi::new(netease_config.clone()));
        manager.register(Source::Netease, api.clone(), api);
    } else {
        warn!("未配置网易云音乐歌词源");
    }

    if let Some(qqmusic_config) = &config.sources.qqmusic {
        info!("启用QQ音乐歌词源");
        let api = Arc::new(QQMusicApi::new(qqmusic_config.clone()));
        manager.register(Source::QQMusic, api.clone(), api);
    } else {
        warn!("未配置QQ音乐歌词源");
    }

    manager
}
