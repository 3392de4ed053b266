use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{REFERER, USER_AGENT};
use serde_json::{json, Value};
use tracing::{debug, error};

use super::{
    LyricFetchBackend, ProviderError, ProviderResult, SearchBackend, TrackCandidate,
    REQWEST_TIMEOUT,
};
use crate::config::QQMusicConfig;

/// QQ音乐客户端
pub struct QQMusicApi {
    client: reqwest::Client,
}

impl QQMusicApi {
    pub fn new(_config: QQMusicConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQWEST_TIMEOUT))
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// 搜索歌曲，原样保留平台排序
    async fn search(&self, keyword: &str) -> ProviderResult<Vec<TrackCandidate>> {
        let url = "https://u.y.qq.com/cgi-bin/musicu.fcg";
        let body = json!({
          "comm": {
            "ct": 19,
            "cv": "1845",
            "v": "1003006",
            "os_ver": "12",
            "phonetype": "0",
            "devicelevel": "31",
            "tmeAppID": "qqmusiclight",
            "nettype": "NETWORK_WIFI"
          },
          "req": {
            "module": "music.search.SearchCgiService",
            "method": "DoSearchForQQMusicLite",
            "param": {
              "query": keyword,
              "search_type": 0,
              "num_per_page": 50,
              "page_num": 0,
              "nqc_flag": 0,
              "grp": 0
            }
          }
        });

        debug!("QQ音乐搜索关键词: '{}'", keyword);

        let resp = self
            .client
            .post(url)
            .json(&body)
            .header(
                USER_AGENT,
                "Mozilla/5.0 (compatible; MSIE 9.0; Windows NT 6.1; WOW64; Trident/5.0)",
            )
            .send()
            .await
            .map_err(ProviderError::RequestFailed)?;

        let status = resp.status();
        if !status.is_success() {
            error!("QQ音乐搜索请求失败: HTTP {}", status);
            return Err(ProviderError::HttpStatus(status));
        }

        let data: Value = resp.json().await.map_err(ProviderError::RequestFailed)?;

        let all_song = data
            .pointer("/req/data/body/item_song")
            .ok_or(ProviderError::JsonNoSuchField("/req/data/body/item_song"))?
            .as_array()
            .ok_or(ProviderError::JsonNotArray("/req/data/body/item_song"))?;

        let mut candidates = Vec::with_capacity(all_song.len());
        for song in all_song {
            let mid = song["mid"].as_str().unwrap_or_default();
            if mid.is_empty() {
                continue;
            }

            let mut artist = String::new();
            if let Some(singers) = song["singer"].as_array() {
                for singer in singers {
                    let name = singer["name"].as_str().unwrap_or_default();
                    if name.is_empty() {
                        continue;
                    }
                    if !artist.is_empty() {
                        artist.push_str(", ");
                    }
                    artist.push_str(name);
                }
            }

            candidates.push(TrackCandidate {
                platform_id: mid.to_string(),
                artist,
                title: song["songname"].as_str().unwrap_or_default().to_string(),
                album: song["albumname"].as_str().unwrap_or_default().to_string(),
            });
        }

        debug!("QQ音乐搜索结果数量: {}", candidates.len());
        Ok(candidates)
    }

    async fn get_lyric(&self, mid: &str) -> ProviderResult<String> {
        let url = "https://i.y.qq.com/lyric/fcgi-bin/fcg_query_lyric_new.fcg";
        let params = [
            ("songmid", mid),
            ("g_tk", "5381"),
            ("format", "json"),
            ("inCharset", "utf8"),
            ("outCharset", "utf-8"),
            ("nobase64", "1"),
        ];

        debug!("获取QQ音乐歌词, MID: {}", mid);

        let resp = self
            .client
            .get(url)
            .query(&params)
            .header(REFERER, "https://y.qq.com")
            .timeout(Duration::from_secs(REQWEST_TIMEOUT))
            .send()
            .await
            .map_err(ProviderError::RequestFailed)?;

        let status = resp.status();
        if !status.is_success() {
            error!("QQ音乐歌词请求失败: HTTP {}", status);
            return Err(ProviderError::HttpStatus(status));
        }

        let data: Value = resp.json().await.map_err(ProviderError::RequestFailed)?;
        let lyric_text = data
            .pointer("/lyric")
            .and_then(Value::as_str)
            .ok_or(ProviderError::JsonNoSuchField("/lyric"))?;

        Ok(lyric_text.to_string())
    }
}

#[async_trait]
impl SearchBackend for QQMusicApi {
    fn name(&self) -> &'static str {
        "qqmusic"
    }

    async fn search_tracks(
        &self,
        title: &str,
        artist: &str,
    ) -> ProviderResult<Vec<TrackCandidate>> {
        let keyword = if artist.is_empty() {
            title.to_string()
        } else {
            format!("{} {}", title, artist)
        };
        self.search(&keyword).await
    }
}

#[async_trait]
impl LyricFetchBackend for QQMusicApi {
    async fn fetch_lyric(&self, platform_id: &str) -> ProviderResult<String> {
        self.get_lyric(platform_id).await
    }
}
