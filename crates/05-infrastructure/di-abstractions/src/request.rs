//! 请求上下文
//!
//! 宿主为每个入站请求提供一个 [`RequestContext`]，其中的 [`RequestItems`]
//! 是该请求独占的键值存储。

use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// 请求独占的键值存储，以值的类型为键
#[derive(Default)]
pub struct RequestItems {
    entries: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl RequestItems {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入值，返回被替换的旧值
    pub fn insert<T: Send + Sync + 'static>(&self, value: T) -> Option<T> {
        self.entries
            .lock()
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// 仅在不存在时插入，已存在时原样返回待插入的值
    pub fn try_insert<T: Send + Sync + 'static>(&self, value: T) -> Result<(), T> {
        match self.entries.lock().entry(TypeId::of::<T>()) {
            Entry::Occupied(_) => Err(value),
            Entry::Vacant(slot) => {
                slot.insert(Box::new(value));
                Ok(())
            }
        }
    }

    /// 获取值的克隆
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.entries
            .lock()
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    /// 移除并返回值
    pub fn remove<T: Send + Sync + 'static>(&self) -> Option<T> {
        self.entries
            .lock()
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    /// 是否存在指定类型的值
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.lock().contains_key(&TypeId::of::<T>())
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl fmt::Debug for RequestItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestItems")
            .field("len", &self.len())
            .finish()
    }
}

/// 请求上下文
#[derive(Debug)]
pub struct RequestContext {
    id: Uuid,
    path: String,
    started_at: chrono::DateTime<chrono::Utc>,
    items: RequestItems,
}

impl RequestContext {
    /// 创建新的请求上下文
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            started_at: chrono::Utc::now(),
            items: RequestItems::new(),
        }
    }

    /// 请求ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 请求路径
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 请求开始时间
    pub fn started_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.started_at
    }

    /// 请求独占存储
    pub fn items(&self) -> &RequestItems {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Marker(u32);

    #[test]
    fn test_try_insert_rejects_duplicate() {
        let items = RequestItems::new();
        assert!(items.try_insert(Marker(1)).is_ok());
        assert_eq!(items.try_insert(Marker(2)), Err(Marker(2)));
        assert_eq!(items.get::<Marker>(), Some(Marker(1)));
    }

    #[test]
    fn test_insert_get_remove() {
        let items = RequestItems::new();
        assert!(items.is_empty());
        assert_eq!(items.insert(Marker(1)), None);
        assert_eq!(items.insert(Marker(2)), Some(Marker(1)));
        assert!(items.contains::<Marker>());
        assert_eq!(items.remove::<Marker>(), Some(Marker(2)));
        assert_eq!(items.remove::<Marker>(), None);
        assert_eq!(items.len(), 0);
    }

    #[test]
    fn test_contexts_do_not_share_items() {
        let first = RequestContext::new("/a");
        let second = RequestContext::new("/b");
        first.items().insert(Arc::new(Marker(7)));

        assert!(first.items().contains::<Arc<Marker>>());
        assert!(!second.items().contains::<Arc<Marker>>());
        assert_ne!(first.id(), second.id());
        assert_eq!(second.path(), "/b");
    }
}
