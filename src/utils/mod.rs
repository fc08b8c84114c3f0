pub mod fingerprint;
pub mod ip;

use std::borrow::Cow;

/// 解码单个路径段，解码失败或为空视为无效
pub fn decode_segment(segment: &str) -> Option<Cow<'_, str>> {
    if segment.is_empty() {
        return None;
    }
    urlencoding::decode(segment).ok().filter(|s| !s.is_empty())
}

/// 规范化主机名候选：去空白、去端口、转小写；空值返回 None
pub fn normalize_host_candidate(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    // `host:port` 形式去掉端口部分
    let host = trimmed.split(':').next().unwrap_or(trimmed).trim();
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_segment() {
        assert_eq!(decode_segment("launch").unwrap(), "launch");
        assert_eq!(decode_segment("caf%C3%A9").unwrap(), "café");
        // 无效的百分号编码视为无效段
        assert!(decode_segment("bad%zz").is_none());
        assert!(decode_segment("").is_none());
    }

    #[test]
    fn test_normalize_host_candidate() {
        assert_eq!(
            normalize_host_candidate("GO.Example.COM").as_deref(),
            Some("go.example.com")
        );
        assert_eq!(
            normalize_host_candidate("example.com:8080").as_deref(),
            Some("example.com")
        );
        assert_eq!(
            normalize_host_candidate("  spaced.example  ").as_deref(),
            Some("spaced.example")
        );
        assert!(normalize_host_candidate("   ").is_none());
        assert!(normalize_host_candidate(":8080").is_none());
    }
}
