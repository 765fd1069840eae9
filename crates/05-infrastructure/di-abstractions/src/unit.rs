//! 可组合单元抽象接口
//!
//! 宿主的对象创建管线产出的处理器（页面）以及它们组合出的子单元。

use crate::request::RequestContext;
use async_trait::async_trait;
use infrastructure_common::{DependencyResult, InfrastructureResult, Injectable};

/// 单元种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// 根页面（处理器）
    Page,
    /// 用户编写的可组合单元
    UserComposed,
    /// 框架内置的普通控件
    Control,
}

/// 预渲染钩子
///
/// 宿主在单元树组合完成后、渲染之前调用，传入页面自身和当前请求。
pub type PreRenderHook =
    Box<dyn FnOnce(&mut dyn Unit, &RequestContext) -> DependencyResult<()> + Send + Sync>;

/// 可组合单元 trait
pub trait Unit: Send {
    /// 单元名称，用于日志
    fn unit_name(&self) -> &'static str;

    /// 单元种类
    fn kind(&self) -> UnitKind {
        UnitKind::Control
    }

    /// 子单元；返回 `None` 表示该单元不能容纳子单元
    fn children_mut(&mut self) -> Option<&mut Vec<Box<dyn Unit>>> {
        None
    }

    /// 注入能力；返回 `None` 表示未选择加入依赖注入
    fn as_injectable(&mut self) -> Option<&mut dyn Injectable> {
        None
    }

    /// 注册预渲染钩子；不支持预渲染通知的单元原样退回钩子
    fn on_pre_render(&mut self, hook: PreRenderHook) -> Result<(), PreRenderHook> {
        Err(hook)
    }

    /// 处理请求
    ///
    /// 宿主在取得处理器后调用。单元在此组合子单元，并在渲染前依次执行已注册的预渲染钩子。
    fn process(&mut self, _request: &RequestContext) -> DependencyResult<()> {
        Ok(())
    }
}

/// 处理器工厂 trait
///
/// 宿主的对象创建管线。
#[async_trait]
pub trait HandlerFactory: Send + Sync {
    /// 为请求创建处理器
    async fn get_handler(
        &self,
        request: &RequestContext,
    ) -> InfrastructureResult<Option<Box<dyn Unit>>>;

    /// 归还处理器，允许工厂复用
    fn release_handler(&self, handler: Box<dyn Unit>);
}
