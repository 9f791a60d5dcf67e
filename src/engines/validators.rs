// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

use crate::engines::traits::EngineError;

/// 验证页面地址
///
/// 只接受带主机名的 HTTP(S) 地址
pub fn validate_page_url(url_str: &str) -> Result<Url, EngineError> {
    let url = Url::parse(url_str.trim())
        .map_err(|e| EngineError::Other(format!("Invalid URL {}: {}", url_str, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(EngineError::Other(format!(
            "Unsupported scheme: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(EngineError::Other("Missing host".to_string()));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_page_url() {
        assert!(validate_page_url("https://www.xiaohongshu.com/user/profile/1").is_ok());
        assert!(validate_page_url("  http://127.0.0.1:8080/page ").is_ok());
        assert!(validate_page_url("file:///etc/passwd").is_err());
        assert!(validate_page_url("not a url").is_err());
        assert!(validate_page_url("blob:https://www.xiaohongshu.com/1").is_err());
    }
}
