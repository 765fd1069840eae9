//! 服务生命周期定义

use serde::{Deserialize, Serialize};

/// 服务生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// 单例模式 - 整个进程生命周期内只创建一个实例
    Singleton,
    /// 作用域模式 - 在同一作用域（请求）内共享实例
    Scoped,
    /// 瞬时模式 - 每次解析都创建新实例
    #[default]
    Transient,
}

impl Lifetime {
    /// 生命周期名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }
}

/// 请求作用域状态
///
/// 每个请求经历 `Idle → Active → Idle`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestScopeState {
    /// 未绑定作用域
    #[default]
    Idle,
    /// 已绑定作用域
    Active,
}

/// 单元激活结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// 单元不具备注入能力，未做任何处理
    Skipped,
    /// 已通过注入点完成注入
    Injected {
        /// 选中的注入点名称
        point: &'static str,
        /// 解析的依赖数量
        resolved: usize,
    },
}

impl Activation {
    /// 是否执行了注入
    pub fn is_injected(&self) -> bool {
        matches!(self, Activation::Injected { .. })
    }
}
