// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 监听器
//!
//! 绑定地址后持续接收 TCP 连接，每个连接交给独立的 Tokio 任务处理：
//! 读取一个请求、在注册表中精确匹配处理器、写回响应、关闭连接。
//! 不支持 keep-alive，一个连接只承载一次请求/响应交换。
//!
//! 单个连接上的任何错误（报文格式错误、超时、处理器 panic）都只会转化为
//! 对应的错误响应或直接关闭该连接，监听循环本身不会因此退出。

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use bytes::Bytes;
use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::watch,
    time::timeout,
};

use crate::{
    config::Config,
    exception::Exception,
    param::{HttpRequestMethod, HEADER_TERMINATOR},
    registry::{Handler, Registry},
    request::Request,
    response::Response,
    util::find_header_end,
};

/// 通知监听循环停止接收新连接的句柄，可以被克隆到处理器或控制台任务中。
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }
}

pub struct Listener {
    listener: TcpListener,
    registry: Registry,
    config: Config,
    shutdown: Arc<watch::Sender<bool>>,
    active_connection: Arc<AtomicUsize>,
}

impl Listener {
    /// 在 `host:port` 上绑定监听，其余参数使用默认配置。
    pub async fn bind(host: &str, port: u16, registry: Registry) -> Result<Self, Exception> {
        Self::from_config(Config::new().with_address(host, port), registry).await
    }

    /// 按配置绑定监听地址。地址非法或端口已被占用时返回 `Exception::Bind`。
    pub async fn from_config(config: Config, registry: Registry) -> Result<Self, Exception> {
        let address = format!("{}:{}", config.host(), config.port());
        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("无法绑定地址：{}，错误：{}", address, e);
                return Err(Exception::Bind(format!("{}: {}", address, e)));
            }
        };
        info!("地址{}绑定完成", address);

        let (sender, _) = watch::channel(false);
        Ok(Self {
            listener,
            registry,
            config,
            shutdown: Arc::new(sender),
            active_connection: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// 向监听器持有的注册表添加一条注册。
    pub fn register<H: Handler>(
        &mut self,
        method: HttpRequestMethod,
        path: &str,
        handler: H,
    ) -> Result<(), Exception> {
        self.registry.register(method, path, handler)
    }

    /// 实际绑定的地址。以端口 0 绑定时由系统分配端口。
    pub fn local_addr(&self) -> Result<SocketAddr, Exception> {
        self.listener
            .local_addr()
            .map_err(|e| Exception::Bind(e.to_string()))
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            sender: Arc::clone(&self.shutdown),
        }
    }

    /// 当前正在处理的连接数，供管理控制台查询
    pub fn active_connections(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.active_connection)
    }

    /// 持续接收连接，直到通过 [`ShutdownHandle`] 发出停机信号。
    ///
    /// 调用后注册表被冻结，所有连接任务只读共享同一份注册表。
    /// 停机后不再接收新连接，并在读取超时时长内等待已接收的连接处理完毕。
    pub async fn serve(self) {
        let Listener {
            listener,
            registry,
            config,
            shutdown,
            active_connection,
        } = self;
        let registry = Arc::new(registry);
        let config = Arc::new(config);
        let mut shutdown_rx = shutdown.subscribe();

        for (method, path) in registry.routes() {
            info!("已注册路由：{} {}", method, path);
        }
        info!("服务端开始接收连接");

        let mut id: u128 = 0;

        // 主事件循环 (Accept Loop)
        while !*shutdown_rx.borrow() {
            let accepted = tokio::select! {
                _ = shutdown_rx.changed() => continue,
                accepted = listener.accept() => accepted,
            };
            let (mut stream, addr) = match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!("接收TCP连接时遇到错误：{}", e);
                    continue;
                }
            };
            debug!("[ID{}]TCP连接已建立：{}", id, addr);

            let registry = Arc::clone(&registry);
            let config = Arc::clone(&config);
            let active_connection = Arc::clone(&active_connection);
            active_connection.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                handle_connection(&mut stream, id, &registry, &config).await;
                active_connection.fetch_sub(1, Ordering::SeqCst);
            });
            id += 1;
        }

        info!("主循环接收到停机指令，正在退出...");
        drop(listener);
        let drain = async {
            while active_connection.load(Ordering::SeqCst) > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        let _ = timeout(config.read_timeout(), drain).await;
        info!(
            "服务端已停止，剩余活跃连接数：{}",
            active_connection.load(Ordering::SeqCst)
        );
    }
}

/// # 连接处理器
///
/// 负责单个 TCP 流的生命周期，包括读取解析请求、调用处理器、以及构建并发送响应。
async fn handle_connection(
    stream: &mut TcpStream,
    id: u128,
    registry: &Registry,
    config: &Config,
) {
    let start_time = Instant::now();

    // 1. 协议解析阶段：在读取期限内将字节流转换为结构化的 Request 对象
    let request = match timeout(config.read_timeout(), read_request(stream, id, config)).await {
        Ok(Ok(request)) => request,
        Ok(Err(e)) => {
            warn!("[ID{}]无法读取HTTP请求：{}", id, e);
            if let Some(mut response) = Response::from_exception(&e) {
                finish(&mut response, config);
                write_response(stream, id, &response, false).await;
            }
            return;
        }
        Err(_) => {
            warn!("[ID{}]读取HTTP请求超时，返回408", id);
            let mut response = Response::from_status_code(408);
            finish(&mut response, config);
            write_response(stream, id, &response, false).await;
            return;
        }
    };
    debug!("[ID{}]成功解析HTTP请求", id);

    // 2. 分发阶段：精确匹配 (方法, 路径)，未注册时得到 404
    let mut response = registry.dispatch(&request, id);
    finish(&mut response, config);

    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    // 3. 结构化日志记录
    info!(
        "[ID{}] {}, {}, {}, {}, {}, {}",
        id,
        request.version(),
        request.path(),
        request.method(),
        response.status_code(),
        response.information(),
        request.user_agent(),
    );

    // 4. 数据发送阶段：HEAD 请求只发送响应头
    let head_only = request.method() == HttpRequestMethod::Head;
    write_response(stream, id, &response, head_only).await;
}

/// 从连接中读取一个完整的请求：先读到空行为止的请求头，再按 `Content-Length` 读请求体。
async fn read_request(
    stream: &mut TcpStream,
    id: u128,
    config: &Config,
) -> Result<Request, Exception> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        if let Some(end) = find_header_end(&buffer) {
            break end;
        }
        if buffer.len() > config.max_header_size() {
            return Err(Exception::HeaderTooLarge);
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            if buffer.is_empty() {
                return Err(Exception::Transport(
                    "connection closed before any request bytes".to_string(),
                ));
            }
            // 对端半关闭：按已收到的数据尽力解析，格式错误时仍能得到 400
            debug!("[ID{}]请求头未以空行结束，对端已关闭写端", id);
            return Request::try_from(&buffer, id);
        }
        buffer.extend_from_slice(&chunk[..n]);
    };
    if head_end > config.max_header_size() {
        return Err(Exception::HeaderTooLarge);
    }
    debug!("[ID{}]HTTP请求头接收完毕，长度：{}", id, head_end);

    let mut request = Request::parse_head(&buffer[..head_end], id)?;
    let content_length = request.content_length()?;
    if content_length > config.max_body_size() {
        return Err(Exception::BodyTooLarge);
    }

    let mut body = buffer.split_off(head_end + HEADER_TERMINATOR.len());
    if body.len() < content_length {
        let received = body.len();
        body.resize(content_length, 0);
        stream.read_exact(&mut body[received..]).await?;
    }
    body.truncate(content_length);
    request.set_body(Bytes::from(body));
    Ok(request)
}

fn finish(response: &mut Response, config: &Config) {
    response.set_date().set_server_name(config.server_name());
}

async fn write_response(stream: &mut TcpStream, id: u128, response: &Response, head_only: bool) {
    let bytes = match head_only {
        true => response.head_bytes(),
        false => response.as_bytes(),
    };
    debug!("[ID{}]发送全量响应，长度: {}", id, bytes.len());
    if let Err(e) = stream.write_all(&bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
    let _ = stream.shutdown().await;
}
