use async_trait::async_trait;
use thiserror::Error;

pub mod netease;
pub mod qq;

pub const REQWEST_TIMEOUT: u64 = 10;

/// 上游平台返回的候选歌曲
#[derive(Debug, Clone)]
pub struct TrackCandidate {
    /// 平台原生 ID（网易为歌曲数字 id，QQ 为 songmid）
    pub platform_id: String,
    pub artist: String,
    pub title: String,
    pub album: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("unexpected http status: {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("no such field in response json: {0}")]
    JsonNoSuchField(&'static str),
    #[error("field is not an array: {0}")]
    JsonNotArray(&'static str),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// 歌曲搜索能力
#[async_trait]
pub trait SearchBackend: Send + Sync {
    // 获取歌词源名称
    fn name(&self) -> &'static str;

    /// 按标题与艺术家搜索，保留平台返回的排序
    async fn search_tracks(
        &self,
        title: &str,
        artist: &str,
    ) -> ProviderResult<Vec<TrackCandidate>>;
}

/// 歌词获取能力
#[async_trait]
pub trait LyricFetchBackend: Send + Sync {
    /// 用平台原生 ID 拉取歌词全文（LRC 或纯文本）
    async fn fetch_lyric(&self, platform_id: &str) -> ProviderResult<String>;
}
