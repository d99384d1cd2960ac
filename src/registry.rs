// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 处理器注册表
//!
//! 将 (方法, 路径) 精确映射到处理器。注册只允许在服务启动前进行，
//! 开始监听后注册表被冻结在 `Arc` 中只读共享，查找无需加锁。
//!
//! ```ignore
//! let mut registry = Registry::new();
//! registry.register(HttpRequestMethod::Get, "/hi", |_req: &Request, res: &mut Response| {
//!     res.set_content("Hello world!", "text/plain");
//! })?;
//! ```

use std::{
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
};

use log::{debug, error};

#[cfg(test)]
use mockall::automock;

use crate::{
    exception::Exception, param::HttpRequestMethod, request::Request, response::Response,
};

/// 将请求转换为响应的处理逻辑。
///
/// 处理器拿到的 `Response` 默认是 `200 OK`、空响应体。
#[cfg_attr(test, automock)]
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Request, response: &mut Response);
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut Response) + Send + Sync + 'static,
{
    fn handle(&self, request: &Request, response: &mut Response) {
        self(request, response)
    }
}

#[derive(Default)]
pub struct Registry {
    routes: HashMap<(HttpRequestMethod, String), Box<dyn Handler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// 添加一条注册。(方法, 路径) 已存在时返回 `DuplicateRoute`，原有注册保持不变。
    pub fn register<H: Handler>(
        &mut self,
        method: HttpRequestMethod,
        path: &str,
        handler: H,
    ) -> Result<(), Exception> {
        if !path.starts_with('/') {
            error!("非法的路由路径：{:?}", path);
            return Err(Exception::InvalidRoute(path.to_string()));
        }
        let key = (method, path.to_string());
        if self.routes.contains_key(&key) {
            error!("重复注册的路由：{} {}", method, path);
            return Err(Exception::DuplicateRoute(format!("{} {}", method, path)));
        }
        debug!("注册路由：{} {}", method, path);
        self.routes.insert(key, Box::new(handler));
        Ok(())
    }

    /// 按 (方法, 路径) 精确查找处理器
    pub fn resolve(
        &self,
        method: HttpRequestMethod,
        path: &str,
    ) -> Result<&dyn Handler, Exception> {
        self.routes
            .get(&(method, path.to_string()))
            .map(|handler| handler.as_ref())
            .ok_or(Exception::NotFound)
    }

    /// 查找并调用处理器，得到最终响应。
    ///
    /// 未注册时返回 404 且不调用任何处理器；处理器 panic 时返回 500。
    pub fn dispatch(&self, request: &Request, id: u128) -> Response {
        let handler = match self.resolve(request.method(), request.path()) {
            Ok(handler) => handler,
            Err(_) => {
                debug!(
                    "[ID{}]没有与{} {}匹配的处理器",
                    id,
                    request.method(),
                    request.path()
                );
                return Response::response_404();
            }
        };

        let mut response = Response::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.handle(request, &mut response)
        }));
        match result {
            Ok(()) => response,
            Err(_) => {
                error!(
                    "[ID{}]处理器{} {}发生panic，返回500",
                    id,
                    request.method(),
                    request.path()
                );
                Response::response_500()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// 已注册的全部 (方法, 路径)，按路径排序，用于启动日志
    pub fn routes(&self) -> Vec<(HttpRequestMethod, &str)> {
        let mut routes: Vec<_> = self
            .routes
            .keys()
            .map(|(method, path)| (*method, path.as_str()))
            .collect();
        routes.sort_by(|a, b| {
            a.1.cmp(b.1)
                .then_with(|| a.0.to_string().cmp(&b.0.to_string()))
        });
        routes
    }
}
