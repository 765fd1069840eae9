//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义请求作用域运行时与宿主、容器之间的接口。
//!
//! ## 核心接口
//!
//! - [`Resolver`] - 解析器接口
//! - [`ScopeFactory`] / [`ServiceScope`] - 作用域容器接口
//! - [`RequestContext`] - 宿主提供的请求上下文
//! - [`Unit`] / [`HandlerFactory`] - 宿主的可组合单元与对象创建管线

pub mod factory;
pub mod request;
pub mod resolver;
pub mod unit;

pub use factory::*;
pub use request::*;
pub use resolver::*;
pub use unit::*;
