//! 请求作用域运行时主入口

use crate::builder::ServiceProviderBuilder;
use crate::handler::AutowiringHandlerFactory;
use crate::middleware::RequestScopeLayer;
use di_abstractions::{HandlerFactory, RequestContext, ResolverExt};
use di_impl::{
    ActivationWalker, AmbientResolver, Autowirer, ScopeHandle, ScopeLifecycleController,
    ScopeRegistry, ServiceProvider, WalkReport,
};
use di_abstractions::Unit;
use infrastructure_common::{Activation, DependencyResult, LifecycleResult, ScopeOptions};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// 请求作用域运行时
///
/// 持有根容器、作用域注册表、生命周期控制器与环境解析器，
/// 为宿主提供请求钩子与激活入口。
#[derive(Clone)]
pub struct RequestScopeRuntime {
    provider: Arc<ServiceProvider>,
    registry: ScopeRegistry,
    controller: Arc<ScopeLifecycleController>,
    ambient: AmbientResolver,
    options: ScopeOptions,
    started_at: chrono::DateTime<chrono::Utc>,
}

impl RequestScopeRuntime {
    /// 创建运行时构建器
    pub fn builder() -> ServiceProviderBuilder {
        ServiceProviderBuilder::new()
    }

    /// 内部构造函数
    pub(crate) fn new(
        provider: Arc<ServiceProvider>,
        registry: ScopeRegistry,
        options: ScopeOptions,
    ) -> Self {
        let controller = Arc::new(ScopeLifecycleController::new(
            provider.clone(),
            registry.clone(),
        ));
        let ambient = AmbientResolver::new(provider.clone(), registry.clone());
        Self {
            provider,
            registry,
            controller,
            ambient,
            options,
            started_at: chrono::Utc::now(),
        }
    }

    /// 根容器
    pub fn provider(&self) -> &Arc<ServiceProvider> {
        &self.provider
    }

    /// 作用域注册表
    pub fn registry(&self) -> &ScopeRegistry {
        &self.registry
    }

    /// 生命周期控制器
    pub fn controller(&self) -> &Arc<ScopeLifecycleController> {
        &self.controller
    }

    /// 环境解析器
    pub fn ambient(&self) -> &AmbientResolver {
        &self.ambient
    }

    /// 运行时配置
    pub fn options(&self) -> &ScopeOptions {
        &self.options
    }

    /// 请求开始钩子
    pub fn begin_request(&self, request: &RequestContext) -> LifecycleResult<Arc<ScopeHandle>> {
        self.controller.begin_request(request)
    }

    /// 请求结束钩子
    pub fn end_request(&self, request: &RequestContext) {
        self.controller.end_request(request)
    }

    /// 在执行上下文中解析服务
    pub fn resolve<T: Send + Sync + 'static>(
        &self,
        request: Option<&RequestContext>,
    ) -> DependencyResult<Arc<T>> {
        self.ambient.current(request).resolve::<T>()
    }

    /// 在执行上下文中激活单元
    pub fn activate(
        &self,
        unit: &mut dyn Unit,
        request: Option<&RequestContext>,
    ) -> DependencyResult<Activation> {
        Autowirer::activate(unit, &self.ambient.current(request))
    }

    /// 在执行上下文中激活单元树
    pub fn walk_and_activate(
        &self,
        root: &mut dyn Unit,
        request: Option<&RequestContext>,
    ) -> DependencyResult<WalkReport> {
        ActivationWalker::walk_and_activate(root, &self.ambient.current(request))
    }

    /// 创建请求作用域中间件层
    pub fn layer(&self) -> RequestScopeLayer {
        RequestScopeLayer::new(self.controller.clone())
    }

    /// 包装宿主的处理器工厂
    pub fn handler_factory(&self, origin: Arc<dyn HandlerFactory>) -> AutowiringHandlerFactory {
        AutowiringHandlerFactory::new(
            origin,
            self.ambient.clone(),
            self.options.activate_descendants,
        )
    }

    /// 运行时统计信息
    pub fn metrics(&self) -> RuntimeMetrics {
        RuntimeMetrics {
            active_scopes: self.registry.active_count(),
            singletons_created: self.provider.active_singletons(),
            started_at: self.started_at,
            uptime_ms: (chrono::Utc::now() - self.started_at).num_milliseconds(),
        }
    }

    /// 停止运行时
    ///
    /// 仍有绑定中的作用域时返回 `false`。
    pub fn shutdown(&self) -> bool {
        let metrics = self.metrics();
        info!(
            "停止请求作用域运行时: 活跃作用域 {}, 已创建单例 {}",
            metrics.active_scopes, metrics.singletons_created
        );
        metrics.active_scopes == 0
    }
}

impl std::fmt::Debug for RequestScopeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScopeRuntime")
            .field("provider", &self.provider)
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish()
    }
}

/// 运行时统计信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeMetrics {
    /// 绑定中的作用域数量
    pub active_scopes: usize,
    /// 已创建的单例数量
    pub singletons_created: usize,
    /// 启动时间
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// 运行时长（毫秒）
    pub uptime_ms: i64,
}
