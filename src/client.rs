// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 客户端
//!
//! 与监听器配套的最小客户端。`Client` 只保存对端地址与期限，
//! 每次 `connect` 打开一条新的 `Connection`；由于服务端在一次交换后就关闭连接，
//! `get`/`post`/`send` 这些便捷方法每次都会重新建立连接。
//!
//! 错误类型：
//! - 对端不可达：`Exception::Connect`
//! - 收到完整响应前连接断开：`Exception::Transport`
//! - 超过期限仍未收到完整响应：`Exception::Timeout`

use std::time::Duration;

use bytes::Bytes;
use log::{debug, warn};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};

use crate::{
    exception::Exception,
    header::Headers,
    param::{HttpRequestMethod, DEFAULT_TIMEOUT_MS, HEADER_TERMINATOR, USER_AGENT},
    request::Request,
    response::Response,
    util::find_header_end,
};

#[derive(Debug, Clone)]
pub struct Client {
    host: String,
    port: u16,
    timeout: Duration,
}

impl Client {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// 设置连接与单次请求的期限
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 打开一条到对端的连接。连接被拒绝、地址无法解析或连接超时都视为 `Connect` 错误。
    pub async fn connect(&self) -> Result<Connection, Exception> {
        let address = format!("{}:{}", self.host, self.port);
        let stream = match timeout(self.timeout, TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                warn!("无法连接到{}：{}", address, e);
                return Err(Exception::Connect(format!("{}: {}", address, e)));
            }
            Err(_) => {
                warn!("连接{}超时", address);
                return Err(Exception::Connect(format!(
                    "{}: timed out after {}ms",
                    address,
                    self.timeout.as_millis()
                )));
            }
        };
        debug!("已连接到{}", address);
        Ok(Connection {
            stream,
            host: address,
            timeout: self.timeout,
        })
    }

    pub async fn get(&self, path: &str) -> Result<Response, Exception> {
        self.send(HttpRequestMethod::Get, path, None, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: impl Into<Bytes>,
        content_type: &str,
    ) -> Result<Response, Exception> {
        let headers: Headers = [("Content-Type", content_type)].into_iter().collect();
        self.send(HttpRequestMethod::Post, path, Some(&headers), Some(body.into()))
            .await
    }

    /// 建立新连接并完成一次请求/响应交换
    pub async fn send(
        &self,
        method: HttpRequestMethod,
        path: &str,
        headers: Option<&Headers>,
        body: Option<Bytes>,
    ) -> Result<Response, Exception> {
        let mut connection = self.connect().await?;
        connection.request(method, path, headers, body).await
    }
}

/// 一条已建立的连接。`request` 需要 `&mut self`，因此同一时刻只会有一个未完成的请求。
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    host: String,
    timeout: Duration,
}

impl Connection {
    /// 发送请求并等待完整响应。
    ///
    /// 整个交换（写请求 + 读响应）受期限约束，超时返回 `Exception::Timeout`。
    pub async fn request(
        &mut self,
        method: HttpRequestMethod,
        path: &str,
        headers: Option<&Headers>,
        body: Option<Bytes>,
    ) -> Result<Response, Exception> {
        check_outgoing(path, headers)?;
        let mut request = Request::new(method, path)
            .with_header("Host", &self.host)
            .with_header("User-Agent", USER_AGENT)
            .with_header("Connection", "close");
        if let Some(headers) = headers {
            for (name, value) in headers.iter() {
                request = request.with_header(name, value);
            }
        }
        if let Some(body) = body {
            request = request.with_body(body);
        }

        match timeout(self.timeout, self.exchange(&request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} {}在{}ms内未收到完整响应", method, path, self.timeout.as_millis());
                Err(Exception::Timeout)
            }
        }
    }

    async fn exchange(&mut self, request: &Request) -> Result<Response, Exception> {
        self.stream.write_all(&request.as_bytes()).await?;
        self.stream.flush().await?;
        debug!("请求已发送：{} {}", request.method(), request.path());

        let mut buffer = Vec::with_capacity(1024);
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            if let Some(end) = find_header_end(&buffer) {
                break end;
            }
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(Exception::Transport(
                    "connection closed before response head completed".to_string(),
                ));
            }
            buffer.extend_from_slice(&chunk[..n]);
        };

        let mut response = Response::parse_head(&buffer[..head_end])?;
        let mut body = buffer.split_off(head_end + HEADER_TERMINATOR.len());

        // HEAD 响应以及 204/304 不带响应体，即使声明了 Content-Length
        let bodiless = request.method() == HttpRequestMethod::Head
            || response.status_code() == 204
            || response.status_code() == 304;
        if bodiless {
            body.clear();
        } else {
            match response.content_length()? {
                Some(len) => {
                    // 不按声明的长度预分配，对端可能声明任意大的值
                    if body.len() < len {
                        let remaining = (len - body.len()) as u64;
                        let n = (&mut self.stream)
                            .take(remaining)
                            .read_to_end(&mut body)
                            .await?;
                        if (n as u64) < remaining {
                            return Err(Exception::Transport(format!(
                                "connection closed after {} of {} body bytes",
                                body.len(),
                                len
                            )));
                        }
                    }
                    body.truncate(len);
                }
                None => {
                    self.stream.read_to_end(&mut body).await?;
                }
            }
        }
        debug!(
            "收到响应：{} {}，响应体{}字节",
            response.status_code(),
            response.information(),
            body.len()
        );
        response.set_body(Bytes::from(body));
        Ok(response)
    }
}

/// 发送前检查请求目标与标头，避免调用方的输入改写请求行或注入额外的标头。
fn check_outgoing(path: &str, headers: Option<&Headers>) -> Result<(), Exception> {
    if !path.starts_with('/') || path.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Exception::MalformedRequest(format!(
            "bad request target: {:?}",
            path
        )));
    }
    for (name, value) in headers.into_iter().flat_map(|h| h.iter()) {
        let bad_name = name.is_empty()
            || name
                .chars()
                .any(|c| c == ':' || c.is_whitespace() || c.is_control());
        let bad_value = value.chars().any(|c| c == '\r' || c == '\n' || c == '\0');
        if bad_name || bad_value {
            return Err(Exception::MalformedRequest(format!(
                "bad header: {:?}: {:?}",
                name, value
            )));
        }
    }
    Ok(())
}
