use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use openssl::rsa::{Padding, Rsa};
use openssl::symm::{encrypt, Cipher};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use super::{
    LyricFetchBackend, ProviderError, ProviderResult, SearchBackend, TrackCandidate,
    REQWEST_TIMEOUT,
};
use crate::config::NeteaseConfig;

const BASE62_CHARSET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const WEAPI_PRESET_KEY: &[u8] = b"0CoJUm6Qyw8W8jud";
const WEAPI_IV: &[u8] = b"0102030405060708";
const WEAPI_PUBKEY: &[u8] = b"-----BEGIN PUBLIC KEY-----\nMIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQDgtQn2JZ34ZC28NWYpAUd98iZ37BUrX/aKzmFbt7clFSs6sXqHauqKWqdtLkF2KexO40H1YTX8z2lSgBBOAxLsvaklV8k4cBFK9snQXE9/DDaFt6Rr7iVZMldczhC0JNgTz+SHXT6CBHuX3e9SdB1Ua44oncaTWz7OBGLbCiK45wIDAQAB\n-----END PUBLIC KEY-----";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_1_0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.87 Safari/537.36";

// get 16 length secret from base62
fn get_secret() -> [u8; 16] {
    let mut key = [0; 16];
    let mut rng = rand::rng();
    for i in 0..16 {
        let index = rng.random_range(0..62);
        key[i] = BASE62_CHARSET.as_bytes()[index];
    }
    key
}

fn aes_128_cbc_b64(data: &[u8], key: &[u8], iv: &[u8]) -> String {
    let cipher = Cipher::aes_128_cbc();
    let enc_data = encrypt(cipher, key, Some(iv), data).unwrap();
    general_purpose::STANDARD_NO_PAD.encode(enc_data)
}

fn do_rsa_with_reverse_secret(data: &[u8], to: &mut [u8; 128]) {
    let rsa = Rsa::public_key_from_pem(WEAPI_PUBKEY).unwrap();

    // pad data to 128 bytes
    let data = data.to_vec();
    let extend_data = [vec![0; 128 - data.len()], data].concat();

    rsa.public_encrypt(extend_data.as_slice(), to, Padding::NONE)
        .unwrap();
}

fn weapi_encrypt(data: Value) -> WeApiReqForm {
    let mut secret = get_secret();

    let data = data.to_string().into_bytes();
    let params = aes_128_cbc_b64(
        aes_128_cbc_b64(&data, WEAPI_PRESET_KEY, WEAPI_IV).as_bytes(),
        secret.as_ref(),
        WEAPI_IV,
    );

    secret.reverse();
    let mut enc_sec_key = [0; 128];
    do_rsa_with_reverse_secret(secret.as_ref(), &mut enc_sec_key);

    WeApiReqForm {
        params,
        encSecKey: hex::encode(enc_sec_key),
    }
}

#[derive(Serialize, Debug)]
#[allow(non_snake_case)]
struct WeApiReqForm {
    params: String,
    encSecKey: String,
}

/// 网易云音乐客户端
pub struct NeteaseApi {
    client: reqwest::Client,
}

impl NeteaseApi {
    pub fn new(_config: NeteaseConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQWEST_TIMEOUT))
            .build()
            .unwrap_or_default();

        Self { client }
    }

    async fn post_weapi(&self, url: &str, data: Value) -> ProviderResult<Value> {
        let req_form = weapi_encrypt(data);

        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Referer", "https://music.163.com/")
            .header("User-Agent", USER_AGENT)
            .form(&req_form)
            .send()
            .await
            .map_err(ProviderError::RequestFailed)?;

        let status = resp.status();
        if !status.is_success() {
            error!("网易云音乐请求失败: HTTP {}", status);
            return Err(ProviderError::HttpStatus(status));
        }

        resp.json().await.map_err(ProviderError::RequestFailed)
    }

    /// 搜索歌曲，原样保留平台排序
    async fn search(&self, keyword: &str) -> ProviderResult<Vec<TrackCandidate>> {
        let url = "https://music.163.com/weapi/cloudsearch/pc";
        let data = json!({
            "s": keyword,
            "type": 1,
            "offset": 0,
            "total": true,
            "limit": 50
        });

        debug!("网易云音乐搜索关键词: '{}'", keyword);

        let json = self.post_weapi(url, data).await?;

        let all_song = json
            .pointer("/result/songs")
            .ok_or(ProviderError::JsonNoSuchField("/result/songs"))?
            .as_array()
            .ok_or(ProviderError::JsonNotArray("/result/songs"))?;

        let mut candidates = Vec::with_capacity(all_song.len());
        for song in all_song {
            let id = match song["id"].as_u64() {
                Some(id) => id.to_string(),
                None => continue,
            };

            // 多艺术家用逗号连接
            let mut artist = String::new();
            if let Some(artists) = song["ar"].as_array() {
                for ar in artists {
                    let name = ar["name"].as_str().unwrap_or_default();
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
                platform_id: id,
                artist,
                title: song["name"].as_str().unwrap_or_default().to_string(),
                album: song
                    .pointer("/al/name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        debug!("网易云音乐搜索结果数量: {}", candidates.len());
        Ok(candidates)
    }

    async fn get_lyric(&self, song_id: &str) -> ProviderResult<String> {
        let url = "https://music.163.com/weapi/song/lyric";
        let data = json!({
            "id": song_id,
            "lv": -1,
            "kv": -1,
            "tv": -1,
            "os": "osx",
        });

        debug!("获取网易云音乐歌词, ID: {}", song_id);

        let json = self.post_weapi(url, data).await?;
        let lyric = json
            .pointer("/lrc/lyric")
            .and_then(Value::as_str)
            .ok_or(ProviderError::JsonNoSuchField("/lrc/lyric"))?;

        Ok(lyric.to_string())
    }
}

#[async_trait]
impl SearchBackend for NeteaseApi {
    fn name(&self) -> &'static str {
        "netease"
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
impl LyricFetchBackend for NeteaseApi {
    async fn fetch_lyric(&self, platform_id: &str) -> ProviderResult<String> {
        self.get_lyric(platform_id).await
    }
}
