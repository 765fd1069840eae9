//! 作用域容器实现

use crate::container::{CleanupFn, InstanceCell, ServiceProvider};
use di_abstractions::{Resolver, ServiceScope};
use infrastructure_common::{
    DependencyError, DependencyResult, Lifetime, LifecycleError, LifecycleResult,
    ServiceInstance, TypeInfo,
};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// 作用域内创建的实例记录
struct CreatedInstance {
    type_info: TypeInfo,
    instance: ServiceInstance,
    cleanup: Option<CleanupFn>,
}

/// 作用域容器
///
/// 单例委托给根容器，作用域服务在本作用域内缓存，瞬时服务每次新建。
pub struct ServiceScopeImpl {
    id: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    root: Arc<ServiceProvider>,
    instances: Mutex<HashMap<TypeId, InstanceCell>>,
    created: Mutex<Vec<CreatedInstance>>,
    disposed: AtomicBool,
}

impl ServiceScopeImpl {
    /// 在根容器下创建作用域
    pub fn new(root: Arc<ServiceProvider>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            root,
            instances: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    /// 作用域创建时间
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    /// 本作用域已创建的作用域服务数量
    pub fn scoped_instances(&self) -> usize {
        self.created.lock().len()
    }

    fn ensure_active(&self) -> DependencyResult<()> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(DependencyError::ScopeDisposed { scope_id: self.id });
        }
        Ok(())
    }

    fn resolve_scoped(&self, type_info: &TypeInfo) -> DependencyResult<ServiceInstance> {
        let descriptor = self.root.descriptor(type_info)?;
        // 锁只保护槽位的查找，工厂在锁外执行以允许递归解析
        let cell = self
            .instances
            .lock()
            .entry(type_info.id)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        cell.get_or_try_init(|| -> DependencyResult<ServiceInstance> {
            debug!("作用域 {} 创建服务: {}", self.id, type_info);
            let instance = descriptor.create(self)?;
            let cleanup = descriptor.cleanup().cloned();

            // 释放标记与创建记录在同一把锁下读写，工厂执行期间作用域可能已被释放
            {
                let mut created = self.created.lock();
                if !self.disposed.load(Ordering::Acquire) {
                    created.push(CreatedInstance {
                        type_info: *type_info,
                        instance: Arc::clone(&instance),
                        cleanup,
                    });
                    return Ok(instance);
                }
            }

            debug!("作用域 {} 已在创建 {} 期间释放，立即清理", self.id, type_info);
            if let Some(cleanup) = cleanup {
                if let Err(e) = cleanup(&instance) {
                    warn!("作用域 {} 清理服务失败: {} - {}", self.id, type_info, e);
                }
            }
            Err(DependencyError::ScopeDisposed { scope_id: self.id })
        })
        .map(Arc::clone)
    }
}

impl Resolver for ServiceScopeImpl {
    fn resolve_by_type(&self, type_info: &TypeInfo) -> DependencyResult<ServiceInstance> {
        self.ensure_active()?;
        let descriptor = self.root.descriptor(type_info)?;
        match descriptor.lifetime() {
            Lifetime::Singleton => self.root.resolve_singleton(descriptor),
            Lifetime::Scoped => self.resolve_scoped(type_info),
            Lifetime::Transient => descriptor.create(self),
        }
    }

    fn can_resolve(&self, type_id: TypeId) -> bool {
        self.root.can_resolve(type_id)
    }
}

impl ServiceScope for ServiceScopeImpl {
    fn id(&self) -> Uuid {
        self.id
    }

    fn dispose(&self) -> LifecycleResult<()> {
        let created = {
            let mut created = self.created.lock();
            if self.disposed.swap(true, Ordering::AcqRel) {
                return Ok(());
            }
            std::mem::take(&mut *created)
        };
        self.instances.lock().clear();

        let mut failures = Vec::new();
        for record in created.into_iter().rev() {
            if let Some(cleanup) = &record.cleanup {
                if let Err(e) = cleanup(&record.instance) {
                    warn!("作用域 {} 清理服务失败: {} - {}", self.id, record.type_info, e);
                    failures.push(format!("{}: {}", record.type_info.short_name(), e));
                }
            }
        }

        debug!(
            "作用域 {} 已释放，存活 {}ms",
            self.id,
            (chrono::Utc::now() - self.created_at).num_milliseconds()
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::ScopeDestructionFailed {
                scope_id: self.id.to_string(),
                message: failures.join("; "),
            })
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ServiceScopeImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceScopeImpl")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("scoped_instances", &self.scoped_instances())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ServiceCollection;
    use di_abstractions::{ResolverExt, ScopeFactory};
    use infrastructure_common::ScopeOptions;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;

    #[derive(Debug)]
    struct Connection {
        serial: usize,
    }

    #[derive(Debug)]
    struct Config;

    fn provider_with_counter() -> (Arc<ServiceProvider>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let created_clone = created.clone();
        let closed_clone = closed.clone();

        let mut services = ServiceCollection::new();
        services.add_singleton(|_| Ok(Config));
        services.add_scoped_with_cleanup(
            move |_| {
                Ok(Connection {
                    serial: created_clone.fetch_add(1, Ordering::SeqCst),
                })
            },
            move |_: &Connection| {
                closed_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );
        (services.build(&ScopeOptions::default()), created, closed)
    }

    #[test]
    fn test_scoped_shared_within_scope() {
        let (provider, created, _) = provider_with_counter();
        let scope = provider.create_scope().unwrap();

        let first = scope.resolve::<Connection>().unwrap();
        let second = scope.resolve::<Connection>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scopes_are_isolated() {
        let (provider, _, _) = provider_with_counter();
        let first_scope = provider.create_scope().unwrap();
        let second_scope = provider.create_scope().unwrap();

        let first = first_scope.resolve::<Connection>().unwrap();
        let second = second_scope.resolve::<Connection>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_ne!(first.serial, second.serial);
        assert_ne!(first_scope.id(), second_scope.id());

        // 单例跨作用域共享
        let config_a = first_scope.resolve::<Config>().unwrap();
        let config_b = second_scope.resolve::<Config>().unwrap();
        assert!(Arc::ptr_eq(&config_a, &config_b));
    }

    #[test]
    fn test_dispose_runs_cleanup_once() {
        let (provider, _, closed) = provider_with_counter();
        let scope = provider.create_scope().unwrap();
        scope.resolve::<Connection>().unwrap();

        scope.dispose().unwrap();
        scope.dispose().unwrap();
        assert!(scope.is_disposed());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolve_after_dispose_fails() {
        let (provider, _, _) = provider_with_counter();
        let scope = provider.create_scope().unwrap();
        scope.dispose().unwrap();

        assert!(matches!(
            scope.resolve::<Connection>(),
            Err(DependencyError::ScopeDisposed { .. })
        ));
    }

    #[test]
    fn test_dispose_during_scoped_creation_cleans_instance() {
        let gate = Arc::new(Barrier::new(2));
        let closed = Arc::new(AtomicUsize::new(0));
        let factory_gate = gate.clone();
        let closed_clone = closed.clone();

        let mut services = ServiceCollection::new();
        services.add_scoped_with_cleanup(
            move |_| {
                // 通知已进入工厂，等待作用域释放后再返回
                factory_gate.wait();
                factory_gate.wait();
                Ok(Connection { serial: 7 })
            },
            move |_: &Connection| {
                closed_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );
        let provider = services.build(&ScopeOptions::default());
        let scope = provider.create_scope().unwrap();

        let result = std::thread::scope(|s| {
            let worker = s.spawn(|| scope.resolve::<Connection>());
            gate.wait();
            scope.dispose().unwrap();
            gate.wait();
            worker.join().unwrap()
        });

        assert!(matches!(result, Err(DependencyError::ScopeDisposed { .. })));
        assert!(scope.is_disposed());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cleanup_failure_reported() {
        let mut services = ServiceCollection::new();
        services.add_scoped_with_cleanup(
            |_| Ok(Connection { serial: 0 }),
            |_: &Connection| Err("连接已断开".into()),
        );
        let provider = services.build(&ScopeOptions::default());
        let scope = provider.create_scope().unwrap();
        scope.resolve::<Connection>().unwrap();

        assert!(matches!(
            scope.dispose(),
            Err(LifecycleError::ScopeDestructionFailed { .. })
        ));
        assert!(scope.is_disposed());
    }
}
