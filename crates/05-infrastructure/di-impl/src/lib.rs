//! # 依赖注入具体实现
//!
//! 提供请求作用域依赖注入运行时的具体实现：
//!
//! - [`ServiceCollection`] / [`ServiceProvider`] - 服务注册与根容器
//! - [`ServiceScopeImpl`] / [`ScopeHandle`] - 作用域容器与其独占句柄
//! - [`ScopeRegistry`] - 请求到作用域的绑定
//! - [`ScopeLifecycleController`] - 请求开始/结束钩子
//! - [`AmbientResolver`] - 按执行上下文选择解析器
//! - [`Autowirer`] / [`ActivationWalker`] - 单元激活与单元树遍历

pub mod ambient;
pub mod autowire;
pub mod container;
pub mod controller;
pub mod handle;
pub mod registry;
pub mod scope;
pub mod walker;

pub use ambient::{AmbientResolver, ExecutionContext};
pub use autowire::{select_injection_point, Autowirer};
pub use container::{CleanupFn, ServiceCollection, ServiceDescriptor, ServiceFactoryFn, ServiceProvider};
pub use controller::{RequestScopeGuard, ScopeLifecycleController};
pub use handle::ScopeHandle;
pub use registry::ScopeRegistry;
pub use scope::ServiceScopeImpl;
pub use walker::{ActivationWalker, WalkReport};
