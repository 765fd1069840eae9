//! 作用域运行时配置

use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "DI_SCOPE";

/// 默认配置文件（不含扩展名）
pub const DEFAULT_CONFIG_FILE: &str = "config/scope";

/// 请求外解析作用域服务时的回退策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopedFallback {
    /// 在根解析器上缓存一份，效果等同于单例
    #[default]
    RootSingleton,
    /// 拒绝解析，返回作用域不匹配错误
    Reject,
}

/// 作用域运行时选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeOptions {
    /// 作用域服务的根回退策略
    pub scoped_fallback: ScopedFallback,
    /// 是否在预渲染阶段激活子单元
    pub activate_descendants: bool,
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self {
            scoped_fallback: ScopedFallback::RootSingleton,
            activate_descendants: true,
        }
    }
}

impl ScopeOptions {
    /// 从默认配置文件和环境变量加载
    ///
    /// 配置文件可选；环境变量形如 `DI_SCOPE_SCOPED_FALLBACK=reject`。
    pub fn load() -> ConfigResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );
        Self::from_builder(builder)
    }

    /// 从指定配置文件加载
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let builder = config::Config::builder().add_source(config::File::from(path));
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> ConfigResult<Self> {
        let settings = builder.build().map_err(|e| {
            error!("作用域配置构建失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

        let options: Self = settings.try_deserialize().map_err(|e| {
            error!("作用域配置绑定失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

        debug!("作用域配置加载完成: {:?}", options);
        Ok(options)
    }
}
