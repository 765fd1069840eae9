//! 可注入组件接口定义
//!
//! 参与依赖注入的类型实现 [`Injectable`]，声明一个或多个 [`InjectionPoint`]。
//! 宿主先分配出一个"裸"实例，运行时再选择参数最多的注入点、解析参数，
//! 并通过 [`Injectable::inject`] 把依赖写回同一个实例。

use crate::errors::{DependencyError, DependencyResult};
use crate::metadata::TypeInfo;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// 类型擦除后的服务实例
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// 注入点
///
/// 相当于一个"构造函数候选"：一组有序的参数类型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionPoint {
    name: &'static str,
    parameters: Vec<TypeInfo>,
}

impl InjectionPoint {
    /// 创建无参数的注入点
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            parameters: Vec::new(),
        }
    }

    /// 追加一个参数类型
    pub fn with_parameter<T: ?Sized + 'static>(mut self) -> Self {
        self.parameters.push(TypeInfo::of::<T>());
        self
    }

    /// 注入点名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 参数类型列表（按声明顺序）
    pub fn parameters(&self) -> &[TypeInfo] {
        &self.parameters
    }

    /// 参数数量
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// 已解析的依赖
///
/// 按注入点的参数顺序依次取出。
#[derive(Default)]
pub struct Dependencies {
    values: VecDeque<(TypeInfo, ServiceInstance)>,
}

impl Dependencies {
    /// 创建空的依赖集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个已解析的依赖
    pub fn push(&mut self, type_info: TypeInfo, instance: ServiceInstance) {
        self.values.push_back((type_info, instance));
    }

    /// 取出下一个依赖并转换为具体类型
    pub fn take<T: Send + Sync + 'static>(&mut self) -> DependencyResult<Arc<T>> {
        let expected = TypeInfo::of::<T>();
        let (type_info, instance) = self.values.pop_front().ok_or_else(|| {
            DependencyError::injection_failed(expected.type_name, "依赖数量不足")
        })?;

        instance
            .downcast::<T>()
            .map_err(|_| DependencyError::TypeMismatch {
                type_name: format!("期望 {}, 实际 {}", expected, type_info),
            })
    }

    /// 剩余依赖数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否已全部取出
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.values.iter().map(|(info, _)| info.type_name))
            .finish()
    }
}

/// 可注入组件 trait
///
/// 实现此 trait 即表示类型选择加入依赖注入。通常由 `#[derive(Injectable)]` 生成。
pub trait Injectable: Send {
    /// 声明的注入点集合
    fn injection_points(&self) -> Vec<InjectionPoint>;

    /// 将解析好的依赖注入到当前实例
    fn inject(&mut self, point: &InjectionPoint, dependencies: Dependencies)
        -> DependencyResult<()>;
}
