//! 请求作用域生命周期控制器
//!
//! 宿主在请求开始时调用 [`ScopeLifecycleController::begin_request`]，
//! 在请求结束时调用 [`ScopeLifecycleController::end_request`]。
//! 更推荐使用 [`ScopeLifecycleController::enter`] 返回的守卫，
//! 它在离开作用域时（包括错误和 panic 展开）保证结束请求。

use crate::handle::ScopeHandle;
use crate::registry::ScopeRegistry;
use di_abstractions::{RequestContext, ScopeFactory};
use infrastructure_common::{InfrastructureResult, LifecycleResult, RequestScopeState};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info_span};

/// 请求作用域生命周期控制器
pub struct ScopeLifecycleController {
    factory: Arc<dyn ScopeFactory>,
    registry: ScopeRegistry,
}

impl ScopeLifecycleController {
    /// 创建控制器
    pub fn new(factory: Arc<dyn ScopeFactory>, registry: ScopeRegistry) -> Self {
        Self { factory, registry }
    }

    /// 控制器使用的注册表
    pub fn registry(&self) -> &ScopeRegistry {
        &self.registry
    }

    /// 请求开始：创建作用域并绑定到请求
    pub fn begin_request(&self, request: &RequestContext) -> LifecycleResult<Arc<ScopeHandle>> {
        let _span = info_span!("begin_request", request_id = %request.id()).entered();
        let handle = ScopeHandle::create(self.factory.as_ref())?;
        debug!("请求 {} 开始，路径: {}", request.id(), request.path());
        self.registry.bind(request, handle)
    }

    /// 请求结束：释放并解除绑定
    ///
    /// 请求没有绑定作用域时不做任何处理。
    pub fn end_request(&self, request: &RequestContext) {
        let _span = info_span!("end_request", request_id = %request.id()).entered();
        let Some(handle) = self.registry.lookup(request) else {
            debug!("请求 {} 没有绑定作用域，跳过", request.id());
            return;
        };
        handle.release();
        self.registry.unbind(request);
        debug!(
            "请求 {} 结束，耗时 {}ms",
            request.id(),
            (chrono::Utc::now() - request.started_at()).num_milliseconds()
        );
    }

    /// 请求当前的作用域状态
    pub fn state(&self, request: &RequestContext) -> RequestScopeState {
        if self.registry.lookup(request).is_some() {
            RequestScopeState::Active
        } else {
            RequestScopeState::Idle
        }
    }

    /// 开始请求并返回守卫
    pub fn enter(
        self: &Arc<Self>,
        request: Arc<RequestContext>,
    ) -> InfrastructureResult<RequestScopeGuard> {
        let handle = self.begin_request(&request)?;
        Ok(RequestScopeGuard {
            controller: Arc::clone(self),
            request,
            handle,
            finished: false,
        })
    }
}

impl fmt::Debug for ScopeLifecycleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeLifecycleController")
            .field("registry", &self.registry)
            .finish()
    }
}

/// 请求作用域守卫
///
/// 丢弃时结束请求，结束至多执行一次。
pub struct RequestScopeGuard {
    controller: Arc<ScopeLifecycleController>,
    request: Arc<RequestContext>,
    handle: Arc<ScopeHandle>,
    finished: bool,
}

impl RequestScopeGuard {
    /// 守卫所属的请求
    pub fn request(&self) -> &Arc<RequestContext> {
        &self.request
    }

    /// 请求绑定的作用域句柄
    pub fn handle(&self) -> &Arc<ScopeHandle> {
        &self.handle
    }

    /// 显式结束请求
    pub fn finish(mut self) {
        self.end();
    }

    fn end(&mut self) {
        if !self.finished {
            self.finished = true;
            self.controller.end_request(&self.request);
        }
    }
}

impl Drop for RequestScopeGuard {
    fn drop(&mut self) {
        self.end();
    }
}

impl fmt::Debug for RequestScopeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScopeGuard")
            .field("request_id", &self.request.id())
            .field("scope_id", &self.handle.id())
            .field("finished", &self.finished)
            .finish()
    }
}
