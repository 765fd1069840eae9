//! # Infrastructure Common
//!
//! 这个 crate 提供了请求作用域依赖注入运行时的公共类型。
//!
//! ## 核心内容
//!
//! - [`Injectable`] - 可注入组件 trait 与 [`InjectionPoint`]
//! - [`Lifetime`] - 服务生命周期
//! - [`TypeInfo`] - 类型元数据
//! - [`ScopeOptions`] - 作用域运行时配置
//! - 错误类型：[`DependencyError`]、[`LifecycleError`]、[`InfrastructureError`]
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 显式的注入能力声明，不依赖运行时反射
//! - 显式传递执行上下文，不依赖线程局部状态

pub mod component;
pub mod configuration;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
