//! 错误类型定义

use thiserror::Error;

/// 装箱的底层错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 依赖解析错误类型
///
/// 解析失败总是向调用方传播：缺失的依赖意味着配置缺陷，必须尽早暴露。
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件未注册: {type_name}")]
    ComponentNotRegistered { type_name: String },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed { type_name: String, source: BoxError },

    #[error("组件类型不匹配: {type_name}")]
    TypeMismatch { type_name: String },

    #[error("作用域不匹配: 期望 {expected}, 实际 {actual}")]
    ScopeMismatch { expected: String, actual: String },

    #[error("作用域已释放: {scope_id}")]
    ScopeDisposed { scope_id: uuid::Uuid },

    #[error("组件没有可用的注入点: {type_name}")]
    NoInjectionPoint { type_name: String },

    #[error("依赖注入失败: {type_name}, 原因: {message}")]
    InjectionFailed { type_name: String, message: String },
}

impl DependencyError {
    /// 创建未注册错误
    pub fn not_registered(type_name: impl Into<String>) -> Self {
        Self::ComponentNotRegistered {
            type_name: type_name.into(),
        }
    }

    /// 创建组件创建失败错误
    pub fn creation_failed(
        type_name: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// 创建注入失败错误
    pub fn injection_failed(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InjectionFailed {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

/// 生命周期管理错误类型
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("作用域创建失败: {message}")]
    ScopeCreationFailed { message: String },

    #[error("作用域销毁失败: {scope_id}, 原因: {message}")]
    ScopeDestructionFailed { scope_id: String, message: String },

    #[error("请求 {request_id} 已绑定作用域 {bound_scope}")]
    AlreadyBound {
        request_id: uuid::Uuid,
        bound_scope: String,
    },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("生命周期错误: {source}")]
    LifecycleError {
        #[from]
        source: LifecycleError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type LifecycleResult<T> = Result<T, LifecycleError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
