//! Per-image annotation and per-project schema caches.
//!
//! Both caches are shared by concurrently handled events. Fetches run
//! outside the lock; only the map insert is serialized. Two racing misses
//! may fetch twice, which is harmless because entries are rebuilt from the
//! services and replaced wholesale.

mod annotations;
mod metas;

pub use annotations::AnnotationCache;
pub use metas::MetaCache;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a cache map. A panic in another handler cannot leave a half-written
/// entry behind, so a poisoned lock is still safe to use.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
