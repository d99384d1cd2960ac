// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应模块
//!
//! 服务端由处理器通过 `&mut Response` 填写状态码、内容类型与响应体，
//! 监听器负责补齐 `Content-Length`、`Date`、`Server` 等标头后写回连接。
//! 客户端则用同一个类型承载从连接上解析出的响应。

use bytes::Bytes;
use chrono::prelude::*;
use log::{debug, error, warn};
use serde::Serialize;

use crate::{
    exception::Exception,
    header::Headers,
    param::*,
    util::{find_header_end, parse_content_length},
};

/// 由监听器统一生成、处理器不能覆盖的标头
const GENERATED_HEADERS: [&str; 5] = [
    "Content-Type",
    "Content-Length",
    "Date",
    "Server",
    "Connection",
];

#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    headers: Headers,
    date: DateTime<Utc>,
    server_name: String,
    content: Bytes,
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            headers: Headers::new(),
            date: Utc::now(),
            server_name: SERVER_NAME.to_string(),
            content: Bytes::new(),
        }
    }

    /// 生成只包含状态描述的纯文本响应，用于 400/404/500 等错误情形。
    pub fn from_status_code(code: u16) -> Self {
        let mut response = Self::new();
        response.set_status(code);
        let text = format!("{} {}", code, response.information);
        response.set_content(text, "text/plain");
        response
    }

    /// 将服务端可恢复的异常转化为响应。没有对应状态码的异常返回 `None`。
    pub fn from_exception(e: &Exception) -> Option<Self> {
        e.status_code().map(Self::from_status_code)
    }

    pub fn response_404() -> Self {
        Self::from_status_code(404)
    }

    pub fn response_500() -> Self {
        Self::from_status_code(500)
    }

    pub fn set_status(&mut self, code: u16) -> &mut Self {
        if !(100..=599).contains(&code) {
            warn!("状态码{}不在[100, 599]范围内", code);
        }
        self.status_code = code;
        self.information = reason_phrase(code).to_string();
        self
    }

    /// 设置响应体和内容类型
    pub fn set_content(&mut self, content: impl Into<Bytes>, content_type: &str) -> &mut Self {
        self.content = content.into();
        self.content_type = Some(content_type.to_string());
        self
    }

    /// 将值序列化为 JSON 作为响应体。序列化失败时改为 500。
    pub fn set_json<T: Serialize>(&mut self, value: &T) -> &mut Self {
        match serde_json::to_vec(value) {
            Ok(json) => self.set_content(json, "application/json"),
            Err(e) => {
                error!("无法将响应序列化为JSON：{}", e);
                *self = Self::response_500();
                self
            }
        }
    }

    /// 设置额外的响应标头。`Content-Type` 会转交给内容类型字段，
    /// 其余由监听器生成的标头会被忽略。
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        if name.eq_ignore_ascii_case("Content-Type") {
            self.content_type = Some(value.to_string());
        } else if is_generated(name) {
            warn!("标头{}由服务器生成，忽略处理器设置的值", name);
        } else {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn set_server_name(&mut self, name: &str) -> &mut Self {
        self.server_name = name.to_string();
        self
    }

    pub fn set_date(&mut self) -> &mut Self {
        self.date = Utc::now();
        self
    }

    /// 响应头部分（含结尾空行）。HEAD 请求只发送这一部分。
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "{} {} {}{}",
            self.version, self.status_code, self.information, CRLF
        );
        if let Some(t) = &self.content_type {
            head.push_str(&format!("Content-Type: {}{}", t, CRLF));
        }
        head.push_str(&format!("Content-Length: {}{}", self.content.len(), CRLF));
        head.push_str(&format!("Date: {}{}", format_date(&self.date), CRLF));
        head.push_str(&format!("Server: {}{}", self.server_name, CRLF));
        head.push_str(&format!("Connection: close{}", CRLF));
        for (name, value) in self.headers.iter() {
            if !is_generated(name) {
                head.push_str(&format!("{}: {}{}", name, value, CRLF));
            }
        }
        head.push_str(CRLF);
        head.into_bytes()
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        [self.head_bytes().as_slice(), &self.content[..]].concat()
    }

    /// 从完整的响应报文解析 `Response`（客户端使用）。
    ///
    /// 有 `Content-Length` 时按长度截取响应体，数据不足判定为传输错误；
    /// 没有时把剩余全部数据视为响应体。
    pub fn try_from(buffer: &[u8]) -> Result<Self, Exception> {
        let end = find_header_end(buffer).ok_or_else(|| {
            Exception::Transport("connection closed before response head completed".to_string())
        })?;
        let mut response = Self::parse_head(&buffer[..end])?;
        let rest = &buffer[end + HEADER_TERMINATOR.len()..];
        let body = match response.content_length()? {
            Some(len) if rest.len() < len => {
                return Err(Exception::Transport(format!(
                    "connection closed after {} of {} body bytes",
                    rest.len(),
                    len
                )))
            }
            Some(len) => &rest[..len],
            None => rest,
        };
        response.content = Bytes::copy_from_slice(body);
        Ok(response)
    }

    /// 解析状态行与响应标头（不含结尾空行），响应体为空。
    pub fn parse_head(head: &[u8]) -> Result<Self, Exception> {
        let head = std::str::from_utf8(head)
            .map_err(|_| Exception::MalformedResponse("head is not UTF-8".to_string()))?;
        let mut lines = head.split(CRLF);

        // 状态行 e.g. "HTTP/1.1 404 Not Found"，原因短语可以为空或包含空格
        let status_line = lines.next().unwrap_or("");
        let mut parts = status_line.splitn(3, ' ');
        let version: HttpVersion = parts
            .next()
            .unwrap_or("")
            .parse()
            .map_err(|_| bad_status_line(status_line))?;
        let status_code: u16 = parts
            .next()
            .and_then(|code| code.parse().ok())
            .ok_or_else(|| bad_status_line(status_line))?;
        let information = parts.next().unwrap_or("").to_string();

        let mut headers = Headers::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            match Headers::parse_line(line) {
                Some((name, value))
                    if name.eq_ignore_ascii_case("Content-Length")
                        && headers.conflicts(name, value) =>
                {
                    return Err(Exception::MalformedResponse(
                        "conflicting Content-Length headers".to_string(),
                    ))
                }
                Some((name, value)) => headers.insert(name, value),
                None => {
                    return Err(Exception::MalformedResponse(format!(
                        "bad header line: {:?}",
                        line
                    )))
                }
            }
        }

        let content_type = headers.get("Content-Type").map(|t| t.to_string());
        let server_name = headers.get("Server").unwrap_or("").to_string();
        let date = headers
            .get("Date")
            .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        debug!("解析响应头：{} {}", status_code, information);

        Ok(Self {
            version,
            status_code,
            information,
            content_type,
            headers,
            date,
            server_name,
            content: Bytes::new(),
        })
    }

    /// 响应头声明的响应体长度。未声明时为 `None`，表示读到连接关闭为止。
    pub fn content_length(&self) -> Result<Option<usize>, Exception> {
        match self.headers.get("Content-Length") {
            Some(value) => parse_content_length(value).map(Some).ok_or_else(|| {
                Exception::MalformedResponse(format!("bad Content-Length: {:?}", value))
            }),
            None => Ok(None),
        }
    }

    pub(crate) fn set_body(&mut self, body: Bytes) {
        self.content = body;
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn body(&self) -> &Bytes {
        &self.content
    }

    /// 响应体的文本形式，非 UTF-8 字节以替换字符表示
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).to_string()
    }
}

fn bad_status_line(line: &str) -> Exception {
    Exception::MalformedResponse(format!("bad status line: {:?}", line))
}

fn is_generated(name: &str) -> bool {
    GENERATED_HEADERS
        .iter()
        .any(|generated| generated.eq_ignore_ascii_case(name))
}

/// IMF-fixdate 格式，例如 `Sun, 06 Nov 1994 08:49:37 GMT`
fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
