//! 运行时构建器

use crate::configurator::{FnConfigurator, ScopeServicesConfigurator, ServicesConfigurator};
use crate::runtime::RequestScopeRuntime;
use di_abstractions::ResolverExt;
use di_impl::{ScopeRegistry, ServiceCollection};
use infrastructure_common::{InfrastructureError, InfrastructureResult, ScopeOptions};
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 运行时构建器
///
/// 按添加顺序执行服务配置器，作用域服务配置器总是最后执行。
pub struct ServiceProviderBuilder {
    /// 服务配置器列表
    configurators: Vec<Box<dyn ServicesConfigurator>>,
    /// 作用域运行时配置
    options: ScopeOptions,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl ServiceProviderBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            configurators: Vec::new(),
            options: ScopeOptions::default(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 添加服务配置器
    pub fn add_configurator<C: ServicesConfigurator + 'static>(mut self, configurator: C) -> Self {
        self.configurators.push(Box::new(configurator));
        self
    }

    /// 用闭包添加服务配置
    pub fn configure_services<F>(self, name: impl Into<String>, configure: F) -> Self
    where
        F: Fn(&mut ServiceCollection) -> InfrastructureResult<()> + Send + Sync + 'static,
    {
        self.add_configurator(FnConfigurator::new(name, configure))
    }

    /// 设置作用域运行时配置
    pub fn with_options(mut self, options: ScopeOptions) -> Self {
        self.options = options;
        self
    }

    /// 从配置文件读取作用域运行时配置
    pub fn with_options_file<P: AsRef<Path>>(mut self, path: P) -> InfrastructureResult<Self> {
        self.options = ScopeOptions::from_file(path)?;
        Ok(self)
    }

    /// 从默认配置文件与环境变量读取作用域运行时配置
    pub fn with_default_options(mut self) -> InfrastructureResult<Self> {
        self.options = ScopeOptions::load()?;
        Ok(self)
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 构建运行时
    pub fn build(self) -> InfrastructureResult<RequestScopeRuntime> {
        if self.logging_enabled {
            init_logging(&self.logging_config)?;
        }
        info!("开始构建请求作用域运行时");

        let mut services = ServiceCollection::new();
        let mut configurators = self.configurators;
        configurators.push(Box::new(ScopeServicesConfigurator::new()));

        for configurator in &configurators {
            debug!("执行服务配置器: {}", configurator.name());
            configurator.configure(&mut services).map_err(|e| {
                InfrastructureError::BootstrapFailed {
                    message: format!("服务配置器 {} 执行失败: {}", configurator.name(), e),
                }
            })?;
        }

        let provider = services.build(&self.options);
        let registry = provider.resolve::<ScopeRegistry>()?;
        let runtime = RequestScopeRuntime::new(provider, (*registry).clone(), self.options);

        info!("请求作用域运行时构建完成");
        Ok(runtime)
    }
}

impl Default for ServiceProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 额外的过滤指令，例如 `di_impl=trace`
    pub directives: Option<String>,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            directives: None,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            directives: None,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            directives: None,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 添加过滤指令
    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    fn env_filter(&self) -> InfrastructureResult<EnvFilter> {
        let level = self.level.to_string().to_lowercase();
        let filter = match &self.directives {
            Some(directives) => format!("{},{}", level, directives),
            None => level,
        };
        EnvFilter::try_new(&filter).map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志过滤指令无效: {} ({})", filter, e),
        })
    }
}

/// 初始化日志系统
///
/// 全局订阅者只能初始化一次，重复初始化返回 [`InfrastructureError::BootstrapFailed`]。
pub fn init_logging(config: &LoggingConfig) -> InfrastructureResult<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number);

    if config.json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    }
    .map_err(|e| InfrastructureError::BootstrapFailed {
        message: format!("日志初始化失败: {}", e),
    })?;

    info!("日志系统初始化完成");
    Ok(())
}
