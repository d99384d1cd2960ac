// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 单端点 HTTP 服务
//!
//! 基于 Tokio 运行时的演示服务端。核心功能包括：
//! - 精确匹配 (方法, 路径) 的处理器注册表
//! - 每个连接一个任务，一次请求/响应后关闭连接
//! - 后台管理控制台（CLI 指令交互）与 Ctrl-C 优雅停机
//!
//! 演示路由：
//! - `GET /hi`：返回问候语
//! - `GET /body-header-param`：有 `key` 查询参数时回显其值，否则回显请求体
//! - `GET /headers`：逐行列出请求标头
//! - `GET /stop`：停止服务端

use std::{process, sync::atomic::Ordering, time::Duration};

use log::{error, info};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    runtime::Builder,
};

use oneshot_http::{
    logger, util::dump_headers, Config, Exception, HttpRequestMethod, Listener, Registry,
    Request, Response,
};

/// # 程序入口点
///
/// 初始化日志、加载配置、按配置创建多线程运行时并启动监听。
fn main() {
    // 1. 初始化日志系统：通过外部 YAML 灵活配置级别与输出目的地
    if let Err(e) = logger::init("config/log4rs.yaml") {
        eprintln!("无法初始化日志系统：{}", e);
    }

    // 2. 环境配置加载：从 TOML 文件读取运行参数
    let config = Config::from_toml("config/development.toml");
    info!("配置文件已载入");

    // 3. 异步运行时定制：根据配置文件动态分配工作线程数
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建Tokio运行时：{}", e);
            process::exit(1);
        }
    };

    let result = runtime.block_on(run(config));
    // 控制台任务阻塞在 stdin 上，不等待它结束
    runtime.shutdown_timeout(Duration::from_millis(500));
    if let Err(e) = result {
        error!("服务端启动失败：{}", e);
        process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Exception> {
    let server_name = config.server_name().to_string();

    // 注册必须在开始监听之前完成
    let mut listener = Listener::from_config(config, Registry::new()).await?;
    let shutdown = listener.shutdown_handle();

    listener.register(
        HttpRequestMethod::Get,
        "/hi",
        move |_req: &Request, res: &mut Response| {
            let content = format!("Hello from {}", server_name);
            res.set_content(content, "text/plain");
        },
    )?;

    listener.register(
        HttpRequestMethod::Get,
        "/body-header-param",
        |req: &Request, res: &mut Response| {
            if let Some(len) = req.header("Content-Length") {
                log::debug!("请求体长度：{}", len);
            }
            match req.param("key") {
                Some(val) => res.set_content(val.to_string(), "text/plain"),
                None => res.set_content(req.body().clone(), "text/plain"),
            };
        },
    )?;

    listener.register(
        HttpRequestMethod::Get,
        "/headers",
        |req: &Request, res: &mut Response| {
            res.set_content(dump_headers(req.headers()), "text/plain");
        },
    )?;

    listener.register(HttpRequestMethod::Get, "/stop", {
        let shutdown = shutdown.clone();
        move |_req: &Request, res: &mut Response| {
            shutdown.shutdown();
            res.set_content("stopping", "text/plain");
        }
    })?;

    info!("服务端将在{}地址上监听Socket连接", listener.local_addr()?);

    // 启动交互式管理控制台任务，不阻塞监听循环
    tokio::spawn({
        let shutdown = shutdown.clone();
        let active_connection = listener.active_connections();
        async move {
            let stdin = tokio::io::stdin();
            let mut reader = BufReader::new(stdin);
            let mut input = String::new();
            loop {
                input.clear();
                match reader.read_line(&mut input).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                match input.trim() {
                    "stop" => {
                        shutdown.shutdown();
                        println!("停机指令已激活，服务器将停止接收新连接...");
                        break;
                    }
                    "help" => {
                        println!("== oneshot-http Help ==");
                        println!("stop   - 发出停机信号");
                        println!("status - 查看当前服务器运行状态");
                        println!("help   - 显示此帮助信息");
                        println!("=======================");
                    }
                    "status" => {
                        println!("== oneshot-http 状态 ==");
                        println!(
                            "当前活跃连接数: {}",
                            active_connection.load(Ordering::SeqCst)
                        );
                        println!("=======================");
                    }
                    "" => {}
                    cmd => println!("无效的命令：{}", cmd),
                }
            }
        }
    });

    // Ctrl-C 同样触发优雅停机
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("收到Ctrl-C，正在停机...");
                shutdown.shutdown();
            }
        }
    });

    println!("starting server ..");
    listener.serve().await;
    Ok(())
}
