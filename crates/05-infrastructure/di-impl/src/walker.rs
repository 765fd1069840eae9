//! 单元树激活遍历

use crate::autowire::Autowirer;
use di_abstractions::{Resolver, Unit, UnitKind};
use infrastructure_common::DependencyResult;
use tracing::{debug, trace};

/// 遍历结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// 按遍历顺序记录的已注入单元
    pub activated: Vec<&'static str>,
    /// 访问过的后代单元数量
    pub visited: usize,
}

/// 单元树激活遍历器
///
/// 深度优先、先序遍历根单元的所有后代，激活其中的用户组合单元。
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivationWalker;

impl ActivationWalker {
    /// 激活根单元及其全部后代
    pub fn walk_and_activate(
        root: &mut dyn Unit,
        resolver: &dyn Resolver,
    ) -> DependencyResult<WalkReport> {
        let root_activated = Autowirer::activate(root, resolver)?.is_injected();
        let mut report = Self::activate_descendants(root, resolver)?;
        if root_activated {
            report.activated.insert(0, root.unit_name());
        }
        Ok(report)
    }

    /// 激活根单元的后代，根单元本身不激活
    ///
    /// 根单元在创建时已被激活，而后代在预渲染阶段才组合完成，此时调用本方法。
    /// 遇到第一个激活失败即停止并返回错误，之前已完成的注入保持不变。
    pub fn activate_descendants(
        root: &mut dyn Unit,
        resolver: &dyn Resolver,
    ) -> DependencyResult<WalkReport> {
        let mut report = WalkReport::default();
        if let Some(children) = root.children_mut() {
            Self::walk(children, resolver, &mut report)?;
        }
        debug!(
            "{} 的后代遍历完成: 访问 {} 个, 注入 {} 个",
            root.unit_name(),
            report.visited,
            report.activated.len()
        );
        Ok(report)
    }

    fn walk(
        children: &mut [Box<dyn Unit>],
        resolver: &dyn Resolver,
        report: &mut WalkReport,
    ) -> DependencyResult<()> {
        for child in children.iter_mut() {
            report.visited += 1;
            if child.kind() == UnitKind::UserComposed {
                if Autowirer::activate(&mut **child, resolver)?.is_injected() {
                    report.activated.push(child.unit_name());
                }
            } else {
                trace!("跳过非用户组合单元: {}", child.unit_name());
            }
            if let Some(grandchildren) = child.children_mut() {
                Self::walk(grandchildren, resolver, report)?;
            }
        }
        Ok(())
    }
}
