//! 请求作用域注册表
//!
//! 把作用域句柄绑定到请求上下文的独占存储中，保证每个请求至多绑定一个作用域。

use crate::handle::ScopeHandle;
use di_abstractions::RequestContext;
use infrastructure_common::{LifecycleError, LifecycleResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// 存放在请求存储中的绑定条目
///
/// 条目从请求存储中移除或随请求上下文一起释放时，活跃计数减一。
#[derive(Clone)]
struct BoundScope(Arc<Binding>);

struct Binding {
    handle: Arc<ScopeHandle>,
    active: Arc<AtomicUsize>,
}

impl Binding {
    fn new(handle: Arc<ScopeHandle>, active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::AcqRel);
        Self { handle, active }
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// 请求作用域注册表
///
/// 克隆后共享同一个活跃计数。
#[derive(Debug, Clone, Default)]
pub struct ScopeRegistry {
    active: Arc<AtomicUsize>,
}

impl ScopeRegistry {
    /// 创建注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 绑定作用域句柄到请求
    ///
    /// 请求已绑定作用域时，新句柄会被立即释放并返回 [`LifecycleError::AlreadyBound`]，
    /// 原有绑定保持不变。
    pub fn bind(
        &self,
        request: &RequestContext,
        handle: ScopeHandle,
    ) -> LifecycleResult<Arc<ScopeHandle>> {
        let handle = Arc::new(handle);
        let binding = Binding::new(Arc::clone(&handle), Arc::clone(&self.active));
        match request.items().try_insert(BoundScope(Arc::new(binding))) {
            Ok(()) => {
                debug!("请求 {} 绑定作用域 {}", request.id(), handle.id());
                Ok(handle)
            }
            Err(rejected) => {
                drop(rejected);
                handle.release();
                let bound_scope = self
                    .lookup(request)
                    .map(|existing| existing.id().to_string())
                    .unwrap_or_default();
                error!("请求 {} 已绑定作用域 {}，拒绝重复绑定", request.id(), bound_scope);
                Err(LifecycleError::AlreadyBound {
                    request_id: request.id(),
                    bound_scope,
                })
            }
        }
    }

    /// 查找请求绑定的作用域句柄
    pub fn lookup(&self, request: &RequestContext) -> Option<Arc<ScopeHandle>> {
        request
            .items()
            .get::<BoundScope>()
            .map(|bound| Arc::clone(&bound.0.handle))
    }

    /// 解除请求的作用域绑定，返回被解除的句柄
    pub fn unbind(&self, request: &RequestContext) -> Option<Arc<ScopeHandle>> {
        let removed = request
            .items()
            .remove::<BoundScope>()
            .map(|bound| Arc::clone(&bound.0.handle));
        if removed.is_some() {
            debug!("请求 {} 解除作用域绑定", request.id());
        }
        removed
    }

    /// 当前绑定中的作用域数量
    ///
    /// 包括未经 [`unbind`](Self::unbind) 就随请求上下文释放的绑定。
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// 是否没有绑定中的作用域
    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }
}
