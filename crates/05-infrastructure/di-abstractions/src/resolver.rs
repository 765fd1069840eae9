//! 解析器抽象接口
//!
//! 提供按类型解析服务实例的能力

use infrastructure_common::{DependencyError, DependencyResult, ServiceInstance, TypeInfo};
use std::any::TypeId;
use std::sync::Arc;

/// 解析器 trait
///
/// 给定请求的类型，产出或定位一个满足该类型的实例。
pub trait Resolver: Send + Sync {
    /// 按类型信息解析服务实例
    fn resolve_by_type(&self, type_info: &TypeInfo) -> DependencyResult<ServiceInstance>;

    /// 检查指定类型是否已注册
    fn can_resolve(&self, type_id: TypeId) -> bool;
}

/// 解析器扩展方法
pub trait ResolverExt: Resolver {
    /// 解析指定类型的服务
    fn resolve<T: Send + Sync + 'static>(&self) -> DependencyResult<Arc<T>> {
        let type_info = TypeInfo::of::<T>();
        self.resolve_by_type(&type_info)?
            .downcast::<T>()
            .map_err(|_| DependencyError::TypeMismatch {
                type_name: type_info.type_name.to_string(),
            })
    }

    /// 尝试解析指定类型的服务，未注册时返回 `None`
    fn try_resolve<T: Send + Sync + 'static>(&self) -> DependencyResult<Option<Arc<T>>> {
        if !self.can_resolve(TypeId::of::<T>()) {
            return Ok(None);
        }
        self.resolve::<T>().map(Some)
    }

    /// 检查指定类型是否已注册
    fn is_registered<T: 'static>(&self) -> bool {
        self.can_resolve(TypeId::of::<T>())
    }
}

impl<R: Resolver + ?Sized> ResolverExt for R {}
