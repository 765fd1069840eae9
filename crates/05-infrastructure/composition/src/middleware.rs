//! 请求作用域中间件
//!
//! 在内层服务处理请求前开始请求作用域，处理结束后结束请求作用域。
//! 内层服务返回错误、发生 panic 或响应 future 被提前丢弃时，
//! 请求作用域同样会被结束。

use di_abstractions::RequestContext;
use di_impl::ScopeLifecycleController;
use infrastructure_common::InfrastructureError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;

/// 能提供请求上下文的请求类型
pub trait HasRequestContext {
    /// 请求上下文
    fn request_context(&self) -> Arc<RequestContext>;
}

impl HasRequestContext for Arc<RequestContext> {
    fn request_context(&self) -> Arc<RequestContext> {
        Arc::clone(self)
    }
}

/// 请求作用域中间件层
#[derive(Debug, Clone)]
pub struct RequestScopeLayer {
    controller: Arc<ScopeLifecycleController>,
}

impl RequestScopeLayer {
    /// 创建中间件层
    pub fn new(controller: Arc<ScopeLifecycleController>) -> Self {
        Self { controller }
    }
}

impl<S> Layer<S> for RequestScopeLayer {
    type Service = RequestScopeService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestScopeService {
            inner,
            controller: self.controller.clone(),
        }
    }
}

/// 请求作用域中间件服务
#[derive(Debug, Clone)]
pub struct RequestScopeService<S> {
    inner: S,
    controller: Arc<ScopeLifecycleController>,
}

impl<S, Req> Service<Req> for RequestScopeService<S>
where
    S: Service<Req>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: From<InfrastructureError> + Send + 'static,
    Req: HasRequestContext,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let request = req.request_context();
        let span = tracing::debug_span!("request_scope", request_id = %request.id(), path = request.path());

        let guard = match self.controller.enter(request) {
            Ok(guard) => guard,
            Err(e) => return Box::pin(futures::future::ready(Err(S::Error::from(e)))),
        };

        let future = self.inner.call(req);
        Box::pin(
            async move {
                let result = future.await;
                guard.finish();
                result
            }
            .instrument(span),
        )
    }
}
