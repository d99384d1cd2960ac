// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 报文处理中服务端与客户端共用的小工具。

use crate::{header::Headers, param::HEADER_TERMINATOR};

/// 在缓冲区中查找报文头结束位置（`\r\n\r\n` 的起始下标）。
pub fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

/// 解析 `Content-Length` 的值。只接受十进制数字，不允许符号与空白。
pub fn parse_content_length(value: &str) -> Option<usize> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// 将标头逐行输出为 `Name: value\n` 的可读文本。
pub fn dump_headers(headers: &Headers) -> String {
    let mut s = String::new();
    for (name, value) in headers.iter() {
        s.push_str(&format!("{}: {}\n", name, value));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_header_end() {
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\n\r\nbody"), Some(14));
        assert_eq!(find_header_end(b"\r\n\r\n"), Some(0));
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\nHost: x\r\n"), None);
        assert_eq!(find_header_end(b""), None);
    }

    #[test]
    fn test_parse_content_length() {
        assert_eq!(parse_content_length("0"), Some(0));
        assert_eq!(parse_content_length(" 42 "), Some(42));
        assert_eq!(parse_content_length("-1"), None);
        assert_eq!(parse_content_length("+5"), None);
        assert_eq!(parse_content_length("abc"), None);
        assert_eq!(parse_content_length(""), None);
        assert_eq!(parse_content_length("99999999999999999999999999"), None);
    }

    #[test]
    fn test_dump_headers() {
        let headers: Headers = [("Host", "localhost:8080"), ("Accept", "*/*")]
            .into_iter()
            .collect();

        assert_eq!(dump_headers(&headers), "Host: localhost:8080\nAccept: */*\n");
        assert_eq!(dump_headers(&Headers::new()), "");
    }
}
