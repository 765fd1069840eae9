//! 服务配置器
//!
//! 配置器在构建根容器之前向 [`ServiceCollection`] 注册服务。

use di_impl::{ScopeRegistry, ServiceCollection};
use infrastructure_common::InfrastructureResult;
use std::sync::Arc;
use tracing::debug;

/// 服务配置器 trait
pub trait ServicesConfigurator: Send + Sync {
    /// 配置器名称，用于日志
    fn name(&self) -> &str;

    /// 向注册集合添加服务
    fn configure(&self, services: &mut ServiceCollection) -> InfrastructureResult<()>;
}

/// 用闭包实现的配置器
pub struct FnConfigurator<F> {
    name: String,
    configure: F,
}

impl<F> FnConfigurator<F>
where
    F: Fn(&mut ServiceCollection) -> InfrastructureResult<()> + Send + Sync,
{
    /// 创建闭包配置器
    pub fn new(name: impl Into<String>, configure: F) -> Self {
        Self {
            name: name.into(),
            configure,
        }
    }
}

impl<F> ServicesConfigurator for FnConfigurator<F>
where
    F: Fn(&mut ServiceCollection) -> InfrastructureResult<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&self, services: &mut ServiceCollection) -> InfrastructureResult<()> {
        (self.configure)(services)
    }
}

/// 作用域服务配置器
///
/// 注册共享的 [`ScopeRegistry`]；已有注册时保持原样。
#[derive(Debug, Default)]
pub struct ScopeServicesConfigurator {
    registry: ScopeRegistry,
}

impl ScopeServicesConfigurator {
    /// 使用新的注册表创建配置器
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定的注册表创建配置器
    pub fn with_registry(registry: ScopeRegistry) -> Self {
        Self { registry }
    }
}

impl ServicesConfigurator for ScopeServicesConfigurator {
    fn name(&self) -> &str {
        "scope"
    }

    fn configure(&self, services: &mut ServiceCollection) -> InfrastructureResult<()> {
        if services.try_add_instance(Arc::new(self.registry.clone())) {
            debug!("注册作用域注册表");
        }
        Ok(())
    }
}
