//! 服务注册与根容器
//!
//! [`ServiceCollection`] 在配置阶段收集注册，构建出进程级的 [`ServiceProvider`]。
//! 根容器本身就是根解析器，同时充当作用域工厂。

use crate::scope::ServiceScopeImpl;
use dashmap::DashMap;
use di_abstractions::{Resolver, ScopeFactory, ServiceScope};
use infrastructure_common::{
    BoxError, DependencyError, DependencyResult, Lifetime, LifecycleError, LifecycleResult,
    ScopeOptions, ScopedFallback, ServiceInstance, TypeInfo,
};
use once_cell::sync::OnceCell;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace};

/// 服务工厂函数类型
pub type ServiceFactoryFn =
    Arc<dyn Fn(&dyn Resolver) -> DependencyResult<ServiceInstance> + Send + Sync>;

/// 作用域释放时的清理函数类型
pub type CleanupFn = Arc<dyn Fn(&ServiceInstance) -> Result<(), BoxError> + Send + Sync>;

/// 延迟初始化的实例槽
pub(crate) type InstanceCell = Arc<OnceCell<ServiceInstance>>;

/// 服务描述符
#[derive(Clone)]
pub struct ServiceDescriptor {
    type_info: TypeInfo,
    lifetime: Lifetime,
    factory: ServiceFactoryFn,
    cleanup: Option<CleanupFn>,
}

impl ServiceDescriptor {
    /// 服务类型
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 服务生命周期
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub(crate) fn create(&self, resolver: &dyn Resolver) -> DependencyResult<ServiceInstance> {
        (self.factory)(resolver)
    }

    pub(crate) fn cleanup(&self) -> Option<&CleanupFn> {
        self.cleanup.as_ref()
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("type_info", &self.type_info)
            .field("lifetime", &self.lifetime)
            .field("factory", &"<function>")
            .field("cleanup", &self.cleanup.is_some())
            .finish()
    }
}

/// 服务注册集合
#[derive(Debug, Default)]
pub struct ServiceCollection {
    descriptors: HashMap<TypeId, ServiceDescriptor>,
}

impl ServiceCollection {
    /// 创建空的注册集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册单例服务
    pub fn add_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        self.add::<T, F>(Lifetime::Singleton, factory, None)
    }

    /// 注册作用域服务
    pub fn add_scoped<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        self.add::<T, F>(Lifetime::Scoped, factory, None)
    }

    /// 注册带清理函数的作用域服务
    ///
    /// 作用域释放时按创建的逆序调用清理函数。
    pub fn add_scoped_with_cleanup<T, F, C>(&mut self, factory: F, cleanup: C) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> DependencyResult<T> + Send + Sync + 'static,
        C: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let cleanup: CleanupFn = Arc::new(move |instance: &ServiceInstance| {
            match instance.downcast_ref::<T>() {
                Some(typed) => cleanup(typed),
                None => Ok(()),
            }
        });
        self.add::<T, F>(Lifetime::Scoped, factory, Some(cleanup))
    }

    /// 注册瞬时服务
    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        self.add::<T, F>(Lifetime::Transient, factory, None)
    }

    /// 注册已有实例（单例）
    pub fn add_instance<T: Send + Sync + 'static>(&mut self, instance: Arc<T>) -> &mut Self {
        let type_info = TypeInfo::of::<T>();
        let instance: ServiceInstance = instance;
        let descriptor = ServiceDescriptor {
            type_info,
            lifetime: Lifetime::Singleton,
            factory: Arc::new(move |_: &dyn Resolver| -> DependencyResult<ServiceInstance> {
                Ok(Arc::clone(&instance))
            }),
            cleanup: None,
        };
        self.insert(descriptor);
        self
    }

    /// 仅在未注册时注册已有实例，返回是否注册成功
    pub fn try_add_instance<T: Send + Sync + 'static>(&mut self, instance: Arc<T>) -> bool {
        if self.contains::<T>() {
            debug!("服务已注册，跳过: {}", std::any::type_name::<T>());
            return false;
        }
        self.add_instance(instance);
        true
    }

    /// 检查服务是否已注册
    pub fn contains<T: 'static>(&self) -> bool {
        self.descriptors.contains_key(&TypeId::of::<T>())
    }

    /// 获取服务描述符
    pub fn descriptor(&self, type_id: TypeId) -> Option<&ServiceDescriptor> {
        self.descriptors.get(&type_id)
    }

    /// 已注册服务数量
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// 是否没有任何注册
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// 构建根容器
    pub fn build(self, options: &ScopeOptions) -> Arc<ServiceProvider> {
        info!("构建根容器完成，注册了 {} 个服务", self.descriptors.len());

        Arc::new_cyclic(|this| ServiceProvider {
            this: this.clone(),
            descriptors: self.descriptors,
            singletons: DashMap::new(),
            root_scoped: DashMap::new(),
            scoped_fallback: options.scoped_fallback,
        })
    }

    fn add<T, F>(
        &mut self,
        lifetime: Lifetime,
        factory: F,
        cleanup: Option<CleanupFn>,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        let factory: ServiceFactoryFn = Arc::new(move |resolver: &dyn Resolver| {
            factory(resolver).map(|instance| Arc::new(instance) as ServiceInstance)
        });
        self.insert(ServiceDescriptor {
            type_info: TypeInfo::of::<T>(),
            lifetime,
            factory,
            cleanup,
        });
        self
    }

    fn insert(&mut self, descriptor: ServiceDescriptor) {
        debug!(
            "注册服务: {} ({})",
            descriptor.type_info,
            descriptor.lifetime.as_str()
        );
        if self
            .descriptors
            .insert(descriptor.type_info.id, descriptor)
            .is_some()
        {
            debug!("覆盖了已有的服务注册");
        }
    }
}

/// 根容器
///
/// 进程级单例，支持并发解析；每个单例至多创建一次。
pub struct ServiceProvider {
    this: Weak<ServiceProvider>,
    descriptors: HashMap<TypeId, ServiceDescriptor>,
    singletons: DashMap<TypeId, InstanceCell>,
    root_scoped: DashMap<TypeId, InstanceCell>,
    scoped_fallback: ScopedFallback,
}

impl ServiceProvider {
    /// 获取服务描述符
    pub fn descriptor(&self, type_info: &TypeInfo) -> DependencyResult<&ServiceDescriptor> {
        self.descriptors
            .get(&type_info.id)
            .ok_or_else(|| DependencyError::not_registered(type_info.type_name))
    }

    /// 作用域服务的根回退策略
    pub fn scoped_fallback(&self) -> ScopedFallback {
        self.scoped_fallback
    }

    /// 已创建的单例数量
    pub fn active_singletons(&self) -> usize {
        self.singletons
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    /// 解析单例，工厂始终在根上执行
    pub(crate) fn resolve_singleton(
        &self,
        descriptor: &ServiceDescriptor,
    ) -> DependencyResult<ServiceInstance> {
        let cell = self
            .singletons
            .entry(descriptor.type_info.id)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        cell.get_or_try_init(|| {
            debug!("创建单例: {}", descriptor.type_info);
            descriptor.create(self)
        })
        .map(Arc::clone)
    }

    fn resolve_scoped_at_root(
        &self,
        descriptor: &ServiceDescriptor,
    ) -> DependencyResult<ServiceInstance> {
        match self.scoped_fallback {
            ScopedFallback::RootSingleton => {
                trace!("请求外解析作用域服务，回退到根: {}", descriptor.type_info);
                let cell = self
                    .root_scoped
                    .entry(descriptor.type_info.id)
                    .or_insert_with(|| Arc::new(OnceCell::new()))
                    .clone();
                cell.get_or_try_init(|| descriptor.create(self))
                    .map(Arc::clone)
            }
            ScopedFallback::Reject => Err(DependencyError::ScopeMismatch {
                expected: "request scope".to_string(),
                actual: format!("root ({})", descriptor.type_info),
            }),
        }
    }
}

impl Resolver for ServiceProvider {
    fn resolve_by_type(&self, type_info: &TypeInfo) -> DependencyResult<ServiceInstance> {
        let descriptor = self.descriptor(type_info)?;
        match descriptor.lifetime {
            Lifetime::Singleton => self.resolve_singleton(descriptor),
            Lifetime::Scoped => self.resolve_scoped_at_root(descriptor),
            Lifetime::Transient => descriptor.create(self),
        }
    }

    fn can_resolve(&self, type_id: TypeId) -> bool {
        self.descriptors.contains_key(&type_id)
    }
}

impl ScopeFactory for ServiceProvider {
    fn create_scope(&self) -> LifecycleResult<Box<dyn ServiceScope>> {
        let root = self
            .this
            .upgrade()
            .ok_or_else(|| LifecycleError::ScopeCreationFailed {
                message: "根容器已释放".to_string(),
            })?;
        let scope = ServiceScopeImpl::new(root);
        debug!("创建作用域: {}", scope.id());
        Ok(Box::new(scope))
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registrations", &self.descriptors.len())
            .field("singletons", &self.singletons.len())
            .field("scoped_fallback", &self.scoped_fallback)
            .finish()
    }
}
