// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 演示客户端：`client [host] [port] [path]`，默认请求 `localhost:8080/hi`。
//! 成功时打印状态码与响应体，失败时打印 `error: <原因>`。

use std::{env, process, time::Duration};

use oneshot_http::{logger, Client};

#[tokio::main]
async fn main() {
    if let Err(e) = logger::init("config/log4rs.yaml") {
        eprintln!("无法初始化日志系统：{}", e);
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let host = args.first().map(String::as_str).unwrap_or("localhost");
    let port = match args.get(1).map(|p| p.parse::<u16>()) {
        Some(Ok(port)) => port,
        Some(Err(e)) => {
            eprintln!("error: invalid port: {}", e);
            process::exit(2);
        }
        None => 8080,
    };
    let path = args.get(2).map(String::as_str).unwrap_or("/hi");

    let client = Client::new(host, port).with_timeout(Duration::from_secs(5));
    match client.get(path).await {
        Ok(res) => {
            println!("{}", res.status_code());
            println!("{}", res.text());
        }
        Err(e) => {
            println!("error: {}", e);
            process::exit(1);
        }
    }
}
