//! 作用域工厂抽象接口

use crate::resolver::Resolver;
use infrastructure_common::LifecycleResult;
use uuid::Uuid;

/// 作用域容器
///
/// 一个作用域内解析出的作用域服务在作用域释放时一并释放。
pub trait ServiceScope: Resolver {
    /// 作用域ID
    fn id(&self) -> Uuid;

    /// 释放作用域及其创建的作用域服务
    ///
    /// 重复调用不产生任何效果。
    fn dispose(&self) -> LifecycleResult<()>;

    /// 是否已释放
    fn is_disposed(&self) -> bool;
}

/// 作用域工厂 trait
pub trait ScopeFactory: Send + Sync {
    /// 创建新的作用域容器
    fn create_scope(&self) -> LifecycleResult<Box<dyn ServiceScope>>;
}
