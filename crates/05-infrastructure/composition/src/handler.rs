//! 自动注入的处理器工厂
//!
//! 包装宿主原有的处理器工厂：处理器创建后立即激活，
//! 并注册预渲染钩子，在单元树组合完成后激活后代单元。

use async_trait::async_trait;
use di_abstractions::{HandlerFactory, PreRenderHook, RequestContext, Unit};
use di_impl::{ActivationWalker, AmbientResolver, Autowirer};
use infrastructure_common::{DependencyResult, InfrastructureResult};
use std::sync::Arc;
use tracing::{debug, error};

/// 自动注入的处理器工厂
pub struct AutowiringHandlerFactory {
    origin: Arc<dyn HandlerFactory>,
    ambient: AmbientResolver,
    activate_descendants: bool,
}

impl AutowiringHandlerFactory {
    /// 包装原有的处理器工厂
    pub fn new(
        origin: Arc<dyn HandlerFactory>,
        ambient: AmbientResolver,
        activate_descendants: bool,
    ) -> Self {
        Self {
            origin,
            ambient,
            activate_descendants,
        }
    }

    fn descendants_hook(&self) -> PreRenderHook {
        let ambient = self.ambient.clone();
        Box::new(move |page: &mut dyn Unit, request: &RequestContext| -> DependencyResult<()> {
            let resolver = ambient.current(Some(request));
            let report = ActivationWalker::activate_descendants(page, &resolver)?;
            debug!(
                "请求 {} 预渲染激活完成: {:?}",
                request.id(),
                report.activated
            );
            Ok(())
        })
    }
}

#[async_trait]
impl HandlerFactory for AutowiringHandlerFactory {
    async fn get_handler(
        &self,
        request: &RequestContext,
    ) -> InfrastructureResult<Option<Box<dyn Unit>>> {
        let Some(mut handler) = self.origin.get_handler(request).await? else {
            return Ok(None);
        };

        let activation = Autowirer::activate(&mut *handler, &self.ambient.current(Some(request)));
        if let Err(e) = activation {
            error!("处理器 {} 激活失败: {}", handler.unit_name(), e);
            self.origin.release_handler(handler);
            return Err(e.into());
        }

        if self.activate_descendants {
            if let Err(_hook) = handler.on_pre_render(self.descendants_hook()) {
                debug!("处理器不支持预渲染通知，跳过后代激活: {}", handler.unit_name());
            }
        }

        Ok(Some(handler))
    }

    fn release_handler(&self, handler: Box<dyn Unit>) {
        self.origin.release_handler(handler);
    }
}

impl std::fmt::Debug for AutowiringHandlerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutowiringHandlerFactory")
            .field("ambient", &self.ambient)
            .field("activate_descendants", &self.activate_descendants)
            .finish()
    }
}
