//! 单元激活器
//!
//! 对宿主已分配的单元执行依赖注入：选择参数最多的注入点，
//! 通过解析器逐个解析参数，然后调用该注入点。

use di_abstractions::{Resolver, Unit};
use infrastructure_common::{
    Activation, Dependencies, DependencyError, DependencyResult, Injectable, InjectionPoint,
};
use tracing::{debug, error};

/// 单元激活器
#[derive(Debug, Clone, Copy, Default)]
pub struct Autowirer;

impl Autowirer {
    /// 激活单元
    ///
    /// 单元不具备注入能力时返回 [`Activation::Skipped`]，不做任何处理。
    pub fn activate(unit: &mut dyn Unit, resolver: &dyn Resolver) -> DependencyResult<Activation> {
        let name = unit.unit_name();
        match unit.as_injectable() {
            Some(target) => Self::activate_injectable(name, target, resolver),
            None => {
                debug!("单元未选择加入依赖注入，跳过: {}", name);
                Ok(Activation::Skipped)
            }
        }
    }

    /// 对可注入对象执行注入
    ///
    /// 任一参数解析失败时立即返回错误，不会调用注入点。
    pub fn activate_injectable(
        name: &'static str,
        target: &mut dyn Injectable,
        resolver: &dyn Resolver,
    ) -> DependencyResult<Activation> {
        let points = target.injection_points();
        let point = select_injection_point(&points).ok_or_else(|| {
            error!("组件没有声明注入点: {}", name);
            DependencyError::NoInjectionPoint {
                type_name: name.to_string(),
            }
        })?;

        let mut dependencies = Dependencies::new();
        for parameter in point.parameters() {
            let instance = resolver.resolve_by_type(parameter).map_err(|e| {
                error!("解析 {} 的依赖 {} 失败: {}", name, parameter, e);
                e
            })?;
            dependencies.push(*parameter, instance);
        }

        let resolved = dependencies.len();
        target.inject(point, dependencies)?;
        debug!("已注入 {} (注入点: {}, 依赖数: {})", name, point.name(), resolved);

        Ok(Activation::Injected {
            point: point.name(),
            resolved,
        })
    }
}

/// 选择参数最多的注入点，参数数相同时取先声明的
pub fn select_injection_point(points: &[InjectionPoint]) -> Option<&InjectionPoint> {
    let mut selected: Option<&InjectionPoint> = None;
    for point in points {
        match selected {
            Some(current) if current.arity() >= point.arity() => {}
            _ => selected = Some(point),
        }
    }
    selected
}
