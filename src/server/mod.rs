//! 老歌词协议的 HTTP 接口
//!
//! 只有一条路由 `GET /lyric/:source`，同一路由按查询参数分两条路径：
//! 带非空 `dl?Id` 走按 ID 取词，否则走搜索。查询参数键名里的问号是
//! 老客户端协议的原样写法，不能改。

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::codec;
use crate::lyrics::{LyricsManager, SearchQuery, Source};

/// 传给各处理函数的共享上下文
#[derive(Clone)]
pub struct AppContext {
    pub manager: Arc<LyricsManager>,
}

/// 构建路由
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/lyric/:source", get(lyric_endpoint))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
}

async fn lyric_endpoint(
    Path(source): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(ctx): State<AppContext>,
) -> Response {
    // 未知歌词源是唯一对客户端可见的错误状态
    let Some(source) = Source::parse(&source) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let lrc_id = params.get("dl?Id").map(String::as_str).unwrap_or_default();

    if !lrc_id.is_empty() {
        // 取词路径：解析失败或上游无歌词都回空正文，状态码始终 200
        let lyric = ctx
            .manager
            .fetch_lyric_by_id(lrc_id)
            .await
            .unwrap_or_default();
        return (
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            lyric,
        )
            .into_response();
    }

    let artist = params
        .get("sh?artist")
        .map(|hex| codec::decode_query_field(hex))
        .unwrap_or_default();
    let title = params
        .get("title")
        .map(|hex| codec::decode_query_field(hex))
        .unwrap_or_default();
    // flags 是老协议的保留字段，接受但不解释
    let flags = params.get("flags").map(String::as_str).unwrap_or_default();

    debug!("搜索请求: {} - {} (flags: {})", title, artist, flags);

    let results = ctx
        .manager
        .search(SearchQuery {
            source,
            title,
            artist,
        })
        .await;

    (
        [(CONTENT_TYPE, "text/xml; charset=utf-8")],
        codec::encode_result_list(&results),
    )
        .into_response()
}
