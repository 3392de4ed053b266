// 应用核心库

// 模块导出
pub mod api;
pub mod codec;
pub mod config;
pub mod lyrics;
pub mod server;
