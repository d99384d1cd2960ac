// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 该模块负责将 TCP 流中读取的原始字节解析为强类型的 `Request` 结构体，
//! 同时也负责客户端一侧请求报文的构建。它涵盖了：
//! 1. 请求行（Request-Line）的解析（方法、路径、查询参数、版本）。
//! 2. 标头（Headers）的解析，字段名大小写不敏感。
//! 3. 按 `Content-Length` 截取请求体。

use bytes::Bytes;
use log::error;
use url::form_urlencoded;

use crate::{
    exception::Exception,
    header::Headers,
    param::*,
    util::{find_header_end, parse_content_length},
};

/// 表示一个完整的 HTTP 请求。
///
/// 服务端解析完成后即不可变，处理器只能通过只读访问器读取。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法（GET, POST 等）
    method: HttpRequestMethod,
    /// 请求的资源路径（不含查询字符串），总是以 `/` 开头
    path: String,
    /// 原始查询字符串（`?` 之后的部分）
    query: Option<String>,
    /// 解码后的查询参数，按出现顺序排列
    params: Vec<(String, String)>,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 全部请求标头
    headers: Headers,
    /// 请求体，可能为空
    body: Bytes,
}

impl Request {
    /// 构建一个待发送的请求。`target` 可以带查询字符串。
    pub fn new(method: HttpRequestMethod, target: &str) -> Self {
        let (path, query) = split_target(target);
        let params = decode_query(query);
        Self {
            method,
            path: path.to_string(),
            query: query.map(|q| q.to_string()),
            params,
            version: HttpVersion::V1_1,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// 从完整的原始报文（请求头 + 请求体）构建 `Request` 实例。
    ///
    /// 报文中缺少空行分隔符时，整段数据都被视为请求头。
    /// 请求体的长度由 `Content-Length` 决定，数据不足时判定为格式错误。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let (head, rest) = match find_header_end(buffer) {
            Some(end) => (&buffer[..end], &buffer[end + HEADER_TERMINATOR.len()..]),
            None => (buffer, &buffer[buffer.len()..]),
        };

        let mut request = Self::parse_head(head, id)?;
        let content_length = request.content_length()?;
        if rest.len() < content_length {
            error!(
                "[ID{}]请求体长度不足：期望{}字节，实际{}字节",
                id,
                content_length,
                rest.len()
            );
            return Err(Exception::MalformedRequest(
                "body shorter than Content-Length".to_string(),
            ));
        }
        request.body = Bytes::copy_from_slice(&rest[..content_length]);
        Ok(request)
    }

    /// 只解析请求头部分（不含结尾的空行）。
    ///
    /// # 逻辑步骤
    /// 1. 验证编码：确保请求头是合法的 UTF-8 字符串。
    /// 2. 解析请求行：提取方法、路径、查询字符串和协议版本。
    /// 3. 迭代解析标头：格式错误的标头行会使整个请求被拒绝。
    pub fn parse_head(head: &[u8], id: u128) -> Result<Self, Exception> {
        // 1. 将字节流转换为字符串，失败则判定为非法的 HTTP 请求
        let head_string = match std::str::from_utf8(head) {
            Ok(s) => s,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let mut lines = head_string.split(CRLF);

        // 2. 解析请求行 (e.g., "GET /index.html HTTP/1.1")
        let request_line = lines.next().unwrap_or("");
        let parts: Vec<&str> = request_line.split(' ').collect();
        if parts.len() != 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_line);
            return Err(Exception::MalformedRequest(format!(
                "bad request line: {:?}",
                request_line
            )));
        }

        let method: HttpRequestMethod = parts[0].parse().map_err(|e| {
            error!("[ID{}]不支持的HTTP请求方法：{}", id, parts[0]);
            e
        })?;
        let version: HttpVersion = parts[2].parse().map_err(|e| {
            error!("[ID{}]不支持的HTTP协议版本：{}", id, parts[2]);
            e
        })?;

        let target = parts[1];
        if !target.starts_with('/') || target.chars().any(|c| c.is_control()) {
            error!("[ID{}]非法的请求路径：{:?}", id, target);
            return Err(Exception::MalformedRequest(format!(
                "bad request target: {:?}",
                target
            )));
        }
        let (path, query) = split_target(target);

        // 3. 迭代各行解析 Headers
        let mut headers = Headers::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            match Headers::parse_line(line) {
                // 多个取值不同的 Content-Length 无法确定请求体边界
                Some((name, value))
                    if name.eq_ignore_ascii_case("Content-Length")
                        && headers.conflicts(name, value) =>
                {
                    error!("[ID{}]存在冲突的Content-Length：{}", id, line);
                    return Err(Exception::MalformedRequest(
                        "conflicting Content-Length headers".to_string(),
                    ));
                }
                Some((name, value)) => headers.insert(name, value),
                None => {
                    error!("[ID{}]无法解析的请求头：{}", id, line);
                    return Err(Exception::MalformedRequest(format!(
                        "bad header line: {:?}",
                        line
                    )));
                }
            }
        }

        Ok(Self {
            method,
            path: path.to_string(),
            query: query.map(|q| q.to_string()),
            params: decode_query(query),
            version,
            headers,
            body: Bytes::new(),
        })
    }

    /// 由 `Content-Length` 标头给出的请求体长度，缺失时为 0。
    pub fn content_length(&self) -> Result<usize, Exception> {
        match self.headers.get("Content-Length") {
            Some(value) => parse_content_length(value).ok_or_else(|| {
                Exception::MalformedRequest(format!("bad Content-Length: {:?}", value))
            }),
            None => Ok(0),
        }
    }

    pub(crate) fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }

    /// 设置请求标头（客户端构建请求时使用）
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// 设置请求体，并同步 `Content-Length`
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.headers
            .insert("Content-Length", &body.len().to_string());
        self.body = body;
        self
    }

    /// 序列化为报文字节
    pub fn as_bytes(&self) -> Vec<u8> {
        let target = match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        };
        let head = format!(
            "{} {} {}{}{}{}",
            self.method,
            target,
            self.version,
            CRLF,
            self.headers.to_wire(),
            CRLF
        );
        [head.as_bytes(), &self.body[..]].concat()
    }
}

// --- Getter 访问器实现 ---

impl Request {
    /// 获取 HTTP 协议版本
    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// 获取请求路径（不含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 获取原始查询字符串
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// 获取请求方法
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// 获取用户代理字符串，缺失时为空串
    pub fn user_agent(&self) -> &str {
        self.headers.get("User-Agent").unwrap_or("")
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn has_param(&self, key: &str) -> bool {
        self.param(key).is_some()
    }

    /// 获取查询参数。重复出现的键取第一个值。
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

fn decode_query(query: Option<&str>) -> Vec<(String, String)> {
    match query {
        Some(q) => form_urlencoded::parse(q.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => Vec::new(),
    }
}
