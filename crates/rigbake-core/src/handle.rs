//! Typed resource handles and name-keyed resource tables
//!
//! A `Handle<T>` is a stable reference to a resource held in a `ResourceTable<T>`.
//! Handles stay valid for the lifetime of the table (resources are never removed),
//! so renderers can key GPU-side caches on them across frames.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Opaque, typed index into a `ResourceTable<T>`
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: usize) -> Self {
        Self {
            index: index as u32,
            _marker: PhantomData,
        }
    }

    /// Get the raw slot index (for GPU cache keys and diagnostics)
    pub fn raw(&self) -> u32 {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_name = std::any::type_name::<T>();
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        write!(f, "Handle<{}>({})", short, self.index)
    }
}

/// Append-only store of named resources addressed by `Handle<T>`
pub struct ResourceTable<T> {
    items: Vec<T>,
    names: Vec<String>,
    by_name: HashMap<String, Handle<T>>,
}

impl<T> Default for ResourceTable<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            names: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T> ResourceTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a resource and return its handle.
    ///
    /// Re-using a name keeps the earlier resource alive under its old handle;
    /// name lookups resolve to the most recent insert.
    pub fn insert(&mut self, name: impl Into<String>, item: T) -> Handle<T> {
        let name = name.into();
        let handle = Handle::new(self.items.len());
        self.items.push(item);
        self.names.push(name.clone());
        self.by_name.insert(name, handle);
        handle
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index as usize)
    }

    /// Look up a resource handle by name
    pub fn find(&self, name: &str) -> Option<Handle<T>> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, handle: Handle<T>) -> Option<&str> {
        self.names.get(handle.index as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate resources in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &str, &T)> {
        self.items
            .iter()
            .zip(self.names.iter())
            .enumerate()
            .map(|(i, (item, name))| (Handle::new(i), name.as_str(), item))
    }
}
