// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了服务端与客户端在一次请求/响应交换中可能出现的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖启动期配置错误（绑定失败、重复注册）、协议解析错误以及客户端传输错误。
//! - **语义映射**：服务端可恢复的错误通过 [`Exception::status_code`] 转化为对应的 HTTP 响应状态码。
//! - **致命错误**：只有 `Bind`、`DuplicateRoute` 与 `InvalidRoute` 会导致启动失败，其余错误都只影响单个请求。

use std::{error::Error, fmt, io};

/// 请求处理过程中发生的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回，用于指示处理失败的具体原因。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 无法绑定监听地址（地址非法或端口已被占用）。
    Bind(String),
    /// 同一个 (方法, 路径) 被注册了两次。第一次注册保持有效。
    DuplicateRoute(String),
    /// 注册时给出的路径不合法（必须以 `/` 开头）。与 `DuplicateRoute` 一样属于启动期错误。
    InvalidRoute(String),
    /// 没有与 (方法, 路径) 精确匹配的注册项。在 Web 语义中对应 `404 Not Found`。
    NotFound,
    /// 客户端无法连接到对端。
    Connect(String),
    /// 在收到完整响应之前连接断开，或读写时发生 I/O 错误。
    Transport(String),
    /// 在调用方给定的期限内没有收到完整的响应。
    Timeout,
    /// 请求行或请求头格式不正确。对应 `400 Bad Request`。
    MalformedRequest(String),
    /// 客户端使用了服务器不认识的 HTTP 方法。
    UnsupportedRequestMethod,
    /// 客户端使用了服务器不支持的 HTTP 协议版本（仅支持 HTTP/1.0 与 HTTP/1.1）。
    UnsupportedHttpVersion,
    /// 请求头无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求头超过了配置的上限。对应 `431 Request Header Fields Too Large`。
    HeaderTooLarge,
    /// 请求体超过了配置的上限。对应 `413 Content Too Large`。
    BodyTooLarge,
    /// 客户端收到的响应报文无法解析。
    MalformedResponse(String),
}

use Exception::*;

impl Exception {
    /// 服务端在遇到该异常时应当返回的状态码。
    ///
    /// 纯客户端或启动期的异常没有对应的响应，返回 `None`。
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NotFound => Some(404),
            MalformedRequest(_)
            | UnsupportedRequestMethod
            | UnsupportedHttpVersion
            | RequestIsNotUtf8 => Some(400),
            HeaderTooLarge => Some(431),
            BodyTooLarge => Some(413),
            Timeout => Some(408),
            Bind(_)
            | DuplicateRoute(_)
            | InvalidRoute(_)
            | Connect(_)
            | Transport(_)
            | MalformedResponse(_) => None,
        }
    }
}

impl fmt::Display for Exception {
    /// 根据错误类型写入人类可读的描述文本。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bind(detail) => write!(f, "Couldn't bind listener: {}", detail),
            DuplicateRoute(route) => write!(f, "Route already registered: {}", route),
            InvalidRoute(path) => write!(f, "Route path must start with '/': {:?}", path),
            NotFound => write!(f, "No handler registered (404)"),
            Connect(detail) => write!(f, "Couldn't connect: {}", detail),
            Transport(detail) => write!(f, "Connection failed: {}", detail),
            Timeout => write!(f, "Timed out waiting for a response"),
            MalformedRequest(detail) => write!(f, "Malformed request (400): {}", detail),
            UnsupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            HeaderTooLarge => write!(f, "Request header too large (431)"),
            BodyTooLarge => write!(f, "Request body too large (413)"),
            MalformedResponse(detail) => write!(f, "Malformed response: {}", detail),
        }
    }
}

impl Error for Exception {}

impl From<io::Error> for Exception {
    /// 读写过程中的 I/O 错误统一视为传输错误；超时单独归类。
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Timeout,
            _ => Transport(e.to_string()),
        }
    }
}
