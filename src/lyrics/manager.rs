use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::api::{LyricFetchBackend, SearchBackend};
use crate::lyrics::{CandidateTrack, SearchQuery, Source};

/// 临时 ID 的起始偏移，老客户端按这个区间回传 dl?Id
const EPHEMERAL_ID_OFFSET: u32 = 10000;

/// 最近一次搜索的缓存条目，键与结果列表永远一起替换
struct CacheEntry {
    key: String,
    results: Vec<CandidateTrack>,
}

/// 歌词管理器
///
/// 持有歌词源注册表和单槽位的最近搜索缓存。缓存的生命周期以下一次
/// 搜索为界：成功的搜索整体替换，空结果或失败整体清空，保证过期的
/// 临时 ID 不可能再被解析到。
pub struct LyricsManager {
    search_backends: HashMap<Source, Arc<dyn SearchBackend>>,
    lyric_backends: HashMap<Source, Arc<dyn LyricFetchBackend>>,
    last_search: Mutex<Option<CacheEntry>>,
}

impl LyricsManager {
    pub fn new() -> Self {
        Self {
            search_backends: HashMap::new(),
            lyric_backends: HashMap::new(),
            last_search: Mutex::new(None),
        }
    }

    /// 注册一个歌词源的搜索与取词实现
    pub fn register(
        &mut self,
        source: Source,
        search: Arc<dyn SearchBackend>,
        lyric: Arc<dyn LyricFetchBackend>,
    ) {
        self.search_backends.insert(source, search);
        self.lyric_backends.insert(source, lyric);
    }

    /// 执行一次搜索
    ///
    /// 与上一次完全相同的查询直接命中缓存，不再请求上游；
    /// 上游错误与零结果同等对待，客户端只会看到空的结果列表。
    pub async fn search(&self, query: SearchQuery) -> Vec<CandidateTrack> {
        // 空标题属于退化查询，不打扰上游也不动缓存
        if query.title.is_empty() {
            return Vec::new();
        }

        let cache_key = query.cache_key();

        {
            let last_search = self.last_search.lock().unwrap();
            if let Some(entry) = last_search.as_ref() {
                if entry.key == cache_key && !entry.results.is_empty() {
                    debug!("命中搜索缓存: {}", cache_key);
                    return entry.results.clone();
                }
            }
        }

        let Some(backend) = self.search_backends.get(&query.source) else {
            warn!("歌词源 {} 未注册", query.source);
            return Vec::new();
        };

        debug!(
            "开始{}搜索: {} - {}",
            backend.name(),
            query.title,
            query.artist
        );

        // 锁不跨越网络请求；并发搜索以后写者为准
        let results = match backend.search_tracks(&query.title, &query.artist).await {
            Ok(results) => results,
            Err(e) => {
                warn!("{} 搜索失败: {}", backend.name(), e);
                Vec::new()
            }
        };

        let mut last_search = self.last_search.lock().unwrap();
        if results.is_empty() {
            // 失败或零结果必须清空缓存，避免旧 ID 被继续解析
            info!("未找到歌曲: {} - {}", query.title, query.artist);
            *last_search = None;
            return Vec::new();
        }

        let list: Vec<CandidateTrack> = results
            .into_iter()
            .enumerate()
            .map(|(i, candidate)| CandidateTrack {
                id: EPHEMERAL_ID_OFFSET + i as u32,
                platform_id: candidate.platform_id,
                source: query.source,
                artist: candidate.artist,
                title: candidate.title,
                album: candidate.album,
            })
            .collect();

        info!(
            "搜索成功: {} - {}, 共{}个结果",
            query.title,
            query.artist,
            list.len()
        );

        *last_search = Some(CacheEntry {
            key: cache_key,
            results: list.clone(),
        });

        list
    }

    /// 把老客户端回传的临时 ID 解析回 (歌词源, 平台原生 ID)
    ///
    /// 只对当前缓存快照有效，非数字或越界一律视为未找到。
    pub fn resolve_by_id(&self, id_text: &str) -> Option<(Source, String)> {
        let id: u32 = id_text.parse().ok()?;
        let index = id.checked_sub(EPHEMERAL_ID_OFFSET)? as usize;

        let last_search = self.last_search.lock().unwrap();
        let entry = last_search.as_ref()?;
        let track = entry.results.get(index)?;
        Some((track.source, track.platform_id.clone()))
    }

    /// 按临时 ID 取歌词全文，任何环节失败都返回 None
    pub async fn fetch_lyric_by_id(&self, id_text: &str) -> Option<String> {
        let (source, platform_id) = self.resolve_by_id(id_text)?;

        let Some(backend) = self.lyric_backends.get(&source) else {
            warn!("歌词源 {} 未注册", source);
            return None;
        };

        match backend.fetch_lyric(&platform_id).await {
            Ok(lyric) => Some(lyric),
            Err(e) => {
                warn!("获取歌词失败: {} ({}): {}", platform_id, source, e);
                None
            }
        }
    }
}

impl Default for LyricsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::api::{ProviderError, ProviderResult, TrackCandidate};

    /// 可计数的假搜索源
    struct MockSearch {
        calls: AtomicUsize,
        results: Vec<TrackCandidate>,
        fail: bool,
    }

    impl MockSearch {
        fn returning(results: Vec<TrackCandidate>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                results,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                results: Vec::new(),
                fail: true,
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SearchBackend for MockSearch {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn search_tracks(
            &self,
            _title: &str,
            _artist: &str,
        ) -> ProviderResult<Vec<TrackCandidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::JsonNoSuchField("/result/songs"));
            }
            Ok(self.results.clone())
        }
    }

    struct MockLyric {
        lyric: Option<String>,
    }

    #[async_trait]
    impl LyricFetchBackend for MockLyric {
        async fn fetch_lyric(&self, _platform_id: &str) -> ProviderResult<String> {
            self.lyric
                .clone()
                .ok_or(ProviderError::JsonNoSuchField("/lyric"))
        }
    }

    fn candidate(platform_id: &str, title: &str) -> TrackCandidate {
        TrackCandidate {
            platform_id: platform_id.to_string(),
            artist: "John Lennon".to_string(),
            title: title.to_string(),
            album: "Imagine".to_string(),
        }
    }

    fn query(title: &str) -> SearchQuery {
        SearchQuery {
            source: Source::Netease,
            title: title.to_string(),
            artist: "John Lennon".to_string(),
        }
    }

    fn manager_with(search: Arc<MockSearch>, lyric: Option<String>) -> LyricsManager {
        let mut manager = LyricsManager::new();
        manager.register(Source::Netease, search, Arc::new(MockLyric { lyric }));
        manager
    }

    #[tokio::test]
    async fn ids_are_contiguous_from_offset() {
        let search = MockSearch::returning(vec![
            candidate("a", "Imagine"),
            candidate("b", "Imagine (Remastered)"),
            candidate("c", "Imagine (Live)"),
        ]);
        let manager = manager_with(search, None);

        let results = manager.search(query("Imagine")).await;
        let ids: Vec<u32> = results.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![10000, 10001, 10002]);
    }

    #[tokio::test]
    async fn repeated_query_hits_cache() {
        let search = MockSearch::returning(vec![candidate("a", "Imagine")]);
        let manager = manager_with(search.clone(), None);

        let first = manager.search(query("Imagine")).await;
        let second = manager.search(query("Imagine")).await;

        assert_eq!(search.call_count(), 1);
        assert_eq!(first.len(), second.len());
        assert_eq!(second[0].id, 10000);
    }

    #[tokio::test]
    async fn different_query_replaces_cache() {
        let search = MockSearch::returning(vec![candidate("a", "Imagine")]);
        let manager = manager_with(search.clone(), None);

        manager.search(query("Imagine")).await;
        manager.search(query("Jealous Guy")).await;

        assert_eq!(search.call_count(), 2);
        // 新一代缓存从 10000 重新编号
        assert_eq!(manager.resolve_by_id("10000").unwrap().1, "a");
        assert!(manager.resolve_by_id("10001").is_none());
    }

    #[tokio::test]
    async fn empty_title_skips_backend() {
        let search = MockSearch::returning(vec![candidate("a", "Imagine")]);
        let manager = manager_with(search.clone(), None);

        assert!(manager.search(query("")).await.is_empty());
        assert_eq!(search.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_result_clears_previous_cache() {
        let mut manager = LyricsManager::new();
        let good = MockSearch::returning(vec![candidate("a", "Imagine")]);
        manager.register(Source::Netease, good, Arc::new(MockLyric { lyric: None }));
        let empty = MockSearch::returning(Vec::new());
        manager.register(Source::QQMusic, empty, Arc::new(MockLyric { lyric: None }));

        manager.search(query("Imagine")).await;
        assert!(manager.resolve_by_id("10000").is_some());

        // 空结果的搜索必须让旧 ID 失效
        let results = manager
            .search(SearchQuery {
                source: Source::QQMusic,
                title: "nothing matches this".to_string(),
                artist: String::new(),
            })
            .await;
        assert!(results.is_empty());
        assert!(manager.resolve_by_id("10000").is_none());
    }

    #[tokio::test]
    async fn backend_failure_clears_cache_and_yields_empty() {
        let mut manager = LyricsManager::new();
        let good = MockSearch::returning(vec![candidate("a", "Imagine")]);
        manager.register(Source::Netease, good, Arc::new(MockLyric { lyric: None }));
        manager.register(
            Source::QQMusic,
            MockSearch::failing(),
            Arc::new(MockLyric { lyric: None }),
        );

        manager.search(query("Imagine")).await;
        let results = manager
            .search(SearchQuery {
                source: Source::QQMusic,
                title: "Imagine".to_string(),
                artist: String::new(),
            })
            .await;

        assert!(results.is_empty());
        assert!(manager.resolve_by_id("10000").is_none());
    }

    #[tokio::test]
    async fn resolve_rejects_bad_ids() {
        let search = MockSearch::returning(vec![candidate("a", "Imagine")]);
        let manager = manager_with(search, None);
        manager.search(query("Imagine")).await;

        assert!(manager.resolve_by_id("10000").is_some());
        assert!(manager.resolve_by_id("9999").is_none());
        assert!(manager.resolve_by_id("10001").is_none());
        assert!(manager.resolve_by_id("abc").is_none());
        assert!(manager.resolve_by_id("").is_none());
    }

    #[tokio::test]
    async fn fetch_lyric_by_id_roundtrip() {
        let search = MockSearch::returning(vec![candidate("a", "Imagine")]);
        let manager = manager_with(search, Some("Lyric body".to_string()));
        manager.search(query("Imagine")).await;

        assert_eq!(
            manager.fetch_lyric_by_id("10000").await.as_deref(),
            Some("Lyric body")
        );
        assert!(manager.fetch_lyric_by_id("9999").await.is_none());
    }

    #[tokio::test]
    async fn fetch_lyric_backend_failure_yields_none() {
        let search = MockSearch::returning(vec![candidate("a", "Imagine")]);
        let manager = manager_with(search, None);
        manager.search(query("Imagine")).await;

        assert!(manager.fetch_lyric_by_id("10000").await.is_none());
    }
}
