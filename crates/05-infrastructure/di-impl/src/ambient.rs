//! 环境解析器
//!
//! 依据显式传入的请求上下文选择解析器：请求已绑定作用域时使用作用域，
//! 否则（没有请求或请求尚未开始）回退到根容器。

use crate::container::ServiceProvider;
use crate::handle::ScopeHandle;
use crate::registry::ScopeRegistry;
use di_abstractions::{RequestContext, Resolver};
use infrastructure_common::{DependencyResult, ServiceInstance, TypeInfo};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// 环境解析器
#[derive(Clone)]
pub struct AmbientResolver {
    root: Arc<ServiceProvider>,
    registry: ScopeRegistry,
}

impl AmbientResolver {
    /// 创建环境解析器
    pub fn new(root: Arc<ServiceProvider>, registry: ScopeRegistry) -> Self {
        Self { root, registry }
    }

    /// 根容器
    pub fn root(&self) -> &Arc<ServiceProvider> {
        &self.root
    }

    /// 获取当前执行上下文对应的解析器
    pub fn current(&self, request: Option<&RequestContext>) -> ExecutionContext<'_> {
        match request.and_then(|request| self.registry.lookup(request)) {
            Some(handle) => ExecutionContext::Request(handle),
            None => {
                trace!("没有活跃的请求作用域，使用根容器");
                ExecutionContext::Root(&self.root)
            }
        }
    }

    /// 在当前执行上下文中解析服务
    pub fn resolve_in(
        &self,
        request: Option<&RequestContext>,
        type_info: &TypeInfo,
    ) -> DependencyResult<ServiceInstance> {
        self.current(request).resolve_by_type(type_info)
    }
}

impl fmt::Debug for AmbientResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmbientResolver")
            .field("root", &self.root)
            .field("registry", &self.registry)
            .finish()
    }
}

/// 执行上下文解析器
pub enum ExecutionContext<'a> {
    /// 请求绑定的作用域
    Request(Arc<ScopeHandle>),
    /// 根容器
    Root(&'a ServiceProvider),
}

impl ExecutionContext<'_> {
    /// 是否使用请求作用域
    pub fn is_request_scoped(&self) -> bool {
        matches!(self, ExecutionContext::Request(_))
    }
}

impl Resolver for ExecutionContext<'_> {
    fn resolve_by_type(&self, type_info: &TypeInfo) -> DependencyResult<ServiceInstance> {
        match self {
            ExecutionContext::Request(handle) => handle.resolve_by_type(type_info),
            ExecutionContext::Root(root) => root.resolve_by_type(type_info),
        }
    }

    fn can_resolve(&self, type_id: TypeId) -> bool {
        match self {
            ExecutionContext::Request(handle) => handle.can_resolve(type_id),
            ExecutionContext::Root(root) => root.can_resolve(type_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ServiceCollection;
    use crate::controller::ScopeLifecycleController;
    use di_abstractions::ResolverExt;
    use infrastructure_common::{DependencyError, ScopeOptions, ScopedFallback};

    #[derive(Debug)]
    struct Cart;

    fn setup(options: &ScopeOptions) -> (AmbientResolver, ScopeLifecycleController) {
        let mut services = ServiceCollection::new();
        services.add_scoped(|_| Ok(Cart));
        let provider = services.build(options);
        let registry = ScopeRegistry::new();
        let controller = ScopeLifecycleController::new(provider.clone(), registry.clone());
        (AmbientResolver::new(provider, registry), controller)
    }

    #[test]
    fn test_uses_request_scope_when_bound() {
        let (ambient, controller) = setup(&ScopeOptions::default());
        let request = RequestContext::new("/cart");
        let handle = controller.begin_request(&request).unwrap();

        let context = ambient.current(Some(&request));
        assert!(context.is_request_scoped());

        let from_context = context.resolve::<Cart>().unwrap();
        let from_handle = handle.resolve::<Cart>().unwrap();
        assert!(Arc::ptr_eq(&from_context, &from_handle));
    }

    #[test]
    fn test_falls_back_to_root_without_request() {
        let (ambient, _) = setup(&ScopeOptions::default());
        let context = ambient.current(None);
        assert!(!context.is_request_scoped());

        let first = context.resolve::<Cart>().unwrap();
        let second = ambient.current(None).resolve::<Cart>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_falls_back_to_root_after_request_ended() {
        let (ambient, controller) = setup(&ScopeOptions::default());
        let request = RequestContext::new("/cart");
        controller.begin_request(&request).unwrap();
        controller.end_request(&request);

        assert!(!ambient.current(Some(&request)).is_request_scoped());
    }

    #[test]
    fn test_fallback_rejected_when_configured() {
        let options = ScopeOptions {
            scoped_fallback: ScopedFallback::Reject,
            ..ScopeOptions::default()
        };
        let (ambient, _) = setup(&options);

        assert!(matches!(
            ambient.resolve_in(None, &TypeInfo::of::<Cart>()),
            Err(DependencyError::ScopeMismatch { .. })
        ));
    }
}
