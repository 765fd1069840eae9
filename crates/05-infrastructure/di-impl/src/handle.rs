//! 作用域句柄

use di_abstractions::{Resolver, ScopeFactory, ServiceScope};
use infrastructure_common::{DependencyResult, LifecycleResult, ServiceInstance, TypeInfo};
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use uuid::Uuid;

/// 作用域句柄
///
/// 对一个作用域容器的独占所有权。句柄至多释放一次，之后再释放不产生效果；
/// 释放过程中的错误只记录日志，不向调用方传播。
pub struct ScopeHandle {
    scope: Box<dyn ServiceScope>,
    released: AtomicBool,
}

impl ScopeHandle {
    /// 通过作用域工厂创建新句柄
    pub fn create(factory: &dyn ScopeFactory) -> LifecycleResult<Self> {
        Ok(Self::from_scope(factory.create_scope()?))
    }

    /// 包装已有的作用域容器
    pub fn from_scope(scope: Box<dyn ServiceScope>) -> Self {
        Self {
            scope,
            released: AtomicBool::new(false),
        }
    }

    /// 作用域ID
    pub fn id(&self) -> Uuid {
        self.scope.id()
    }

    /// 作用域内的解析器
    pub fn resolver(&self) -> &dyn Resolver {
        self
    }

    /// 底层作用域容器
    pub fn scope(&self) -> &dyn ServiceScope {
        &*self.scope
    }

    /// 释放作用域
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        match self.scope.dispose() {
            Ok(()) => debug!("作用域句柄已释放: {}", self.id()),
            Err(e) => warn!("释放作用域时发生错误，已忽略: {}", e),
        }
    }

    /// 是否已释放
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Resolver for ScopeHandle {
    fn resolve_by_type(&self, type_info: &TypeInfo) -> DependencyResult<ServiceInstance> {
        self.scope.resolve_by_type(type_info)
    }

    fn can_resolve(&self, type_id: TypeId) -> bool {
        self.scope.can_resolve(type_id)
    }
}

impl Drop for ScopeHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ScopeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeHandle")
            .field("id", &self.id())
            .field("released", &self.is_released())
            .finish()
    }
}
