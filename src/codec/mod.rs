//! 千千静听歌词协议编解码
//!
//! 老播放器把搜索关键词编码为 UTF-16LE 字节流的十六进制串，
//! 搜索结果以 `<result>` XML 列表返回，歌词正文为纯文本。

use crate::lyrics::CandidateTrack;

/// 解码查询字段：十六进制字节对 → UTF-16LE 文本
///
/// 老客户端协议要求任何解码失败都静默降级为空字符串，
/// 不向调用方抛出错误。
pub fn decode_query_field(hex_text: &str) -> String {
    if hex_text.is_empty() {
        return String::new();
    }

    // 奇数长度或非十六进制字符在这里直接失败
    let bytes = match hex::decode(hex_text) {
        Ok(bytes) => bytes,
        Err(_) => return String::new(),
    };

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    // 残缺的代理对同样降级为空串
    String::from_utf16(&units).unwrap_or_default()
}

/// XML 属性值转义
fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// 把一次搜索的结果列表序列化为老协议的 `<result>` XML 文档
///
/// 每个条目对应一个 `<lrc>` 子元素，属性为 id / artist / title / album，
/// 空列表输出自闭合的 `<result/>`。
pub fn encode_result_list(results: &[CandidateTrack]) -> String {
    if results.is_empty() {
        return "<result/>".to_string();
    }

    let mut xml = String::from("<result>");
    for track in results {
        xml.push_str(&format!(
            "<lrc id=\"{}\" artist=\"{}\" title=\"{}\" album=\"{}\"/>",
            track.id,
            escape_attr(&track.artist),
            escape_attr(&track.title),
            escape_attr(&track.album),
        ));
    }
    xml.push_str("</result>");
    xml
}
