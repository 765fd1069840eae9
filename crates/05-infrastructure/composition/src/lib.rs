//! # 基础设施组合层
//!
//! 将容器、作用域生命周期与单元激活组合成一个可供宿主使用的请求作用域运行时。
//!
//! ## 主要功能
//!
//! - **运行时构建器**: 按顺序执行服务配置器并构建根容器
//! - **请求钩子**: 请求开始/结束时绑定与释放作用域
//! - **自动注入**: 包装宿主的处理器工厂，分两轮激活单元
//! - **中间件**: 基于 tower 的请求作用域中间件
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use di_abstractions::RequestContext;
//! use infrastructure_composition::{LoggingConfig, RequestScopeRuntime};
//!
//! struct Greeter;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = RequestScopeRuntime::builder()
//!         .with_logging(LoggingConfig::development())
//!         .configure_services("app", |services| {
//!             services.add_scoped(|_| Ok(Greeter));
//!             Ok(())
//!         })
//!         .build()?;
//!
//!     let request = RequestContext::new("/index");
//!     runtime.begin_request(&request)?;
//!     let _greeter = runtime.resolve::<Greeter>(Some(&request))?;
//!     runtime.end_request(&request);
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod configurator;
pub mod handler;
pub mod middleware;
pub mod runtime;

#[cfg(test)]
mod tests;

// 重新导出主要类型
pub use builder::{init_logging, LoggingConfig, ServiceProviderBuilder};
pub use configurator::{FnConfigurator, ScopeServicesConfigurator, ServicesConfigurator};
pub use handler::AutowiringHandlerFactory;
pub use middleware::{HasRequestContext, RequestScopeLayer, RequestScopeService};
pub use runtime::{RequestScopeRuntime, RuntimeMetrics};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
