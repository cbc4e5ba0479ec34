//! Dynamic context: the per-invocation side channel between tree nodes.
//!
//! Values are addressed by typed [`ContextKey`]s, so a node reading a key
//! gets back exactly the type that was stored under it. A context is
//! created fresh for every assembly or execution run and dropped with it.
//! Nodes receive it as `&mut`, so only the executing node can write.

use crate::error::{Error, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use tracing::trace;

/// A typed slot name in a [`DynamicContext`].
pub struct ContextKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> std::fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContextKey({})", self.name)
    }
}

type Slot = (&'static str, TypeId);

/// Mutable mapping from typed keys to values, scoped to one invocation.
#[derive(Default)]
pub struct DynamicContext {
    values: HashMap<Slot, Box<dyn Any + Send + Sync>>,
}

impl DynamicContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot<T: 'static>(key: ContextKey<T>) -> Slot {
        (key.name, TypeId::of::<T>())
    }

    pub fn set<T: Send + Sync + 'static>(&mut self, key: ContextKey<T>, value: T) {
        trace!(key = key.name, "Context value set");
        self.values.insert(Self::slot(key), Box::new(value));
    }

    pub fn get<T: 'static>(&self, key: ContextKey<T>) -> Option<&T> {
        self.values.get(&Self::slot(key))?.downcast_ref::<T>()
    }

    pub fn get_mut<T: 'static>(&mut self, key: ContextKey<T>) -> Option<&mut T> {
        self.values.get_mut(&Self::slot(key))?.downcast_mut::<T>()
    }

    pub fn contains<T: 'static>(&self, key: ContextKey<T>) -> bool {
        self.values.contains_key(&Self::slot(key))
    }

    /// Return the value under `key`, running `load` and storing its output
    /// first if the key is absent. `load` is never called for a present key.
    pub async fn get_or_try_load<T, F, Fut>(&mut self, key: ContextKey<T>, load: F) -> Result<&T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.contains(key) {
            let value = load().await?;
            self.set(key, value);
        }
        self.get(key).ok_or_else(|| {
            Error::Internal(format!("context slot '{}' holds an unexpected type", key.name))
        })
    }

    /// Like [`get`](Self::get) but inserts `T::default()` when absent.
    pub fn entry_or_default<T: Default + Send + Sync + 'static>(
        &mut self,
        key: ContextKey<T>,
    ) -> &mut T {
        let value = self
            .values
            .entry(Self::slot(key))
            .or_insert_with(|| Box::new(T::default()));
        match value.downcast_mut::<T>() {
            Some(v) => v,
            None => unreachable!("slot is keyed by TypeId"),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for DynamicContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(|(name, _)| *name).collect();
        keys.sort_unstable();
        f.debug_struct("DynamicContext").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const IDS: ContextKey<Vec<String>> = ContextKey::new("ids");
    const COUNT: ContextKey<u32> = ContextKey::new("count");

    #[test]
    fn set_then_get() {
        let mut ctx = DynamicContext::new();
        assert!(ctx.get(IDS).is_none());

        ctx.set(IDS, vec!["3001".to_string()]);
        assert_eq!(ctx.get(IDS).unwrap(), &vec!["3001".to_string()]);
        assert!(ctx.contains(IDS));
        assert!(!ctx.contains(COUNT));
    }

    #[test]
    fn same_name_different_type_are_distinct() {
        let mut ctx = DynamicContext::new();
        ctx.set(ContextKey::<u32>::new("x"), 1);
        ctx.set(ContextKey::<String>::new("x"), "one".to_string());
        assert_eq!(ctx.get(ContextKey::<u32>::new("x")), Some(&1));
        assert_eq!(
            ctx.get(ContextKey::<String>::new("x")).map(String::as_str),
            Some("one")
        );
        assert_eq!(ctx.len(), 2);
    }

    #[tokio::test]
    async fn loader_runs_once() {
        let calls = AtomicUsize::new(0);
        let mut ctx = DynamicContext::new();

        for _ in 0..3 {
            let value = ctx
                .get_or_try_load(COUNT, || async {
                    Ok(calls.fetch_add(1, Ordering::SeqCst) as u32 + 10)
                })
                .await
                .unwrap();
            assert_eq!(*value, 10);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_leaves_key_absent() {
        let mut ctx = DynamicContext::new();
        let err = ctx
            .get_or_try_load(COUNT, || async { Err(Error::not_found("ai_client", "9")) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConfigurationNotFound { .. }));
        assert!(!ctx.contains(COUNT));
    }

    #[test]
    fn entry_or_default_accumulates() {
        let mut ctx = DynamicContext::new();
        ctx.entry_or_default(IDS).push("a".into());
        ctx.entry_or_default(IDS).push("b".into());
        assert_eq!(ctx.get(IDS).unwrap().len(), 2);
    }
}
