//! Lock helpers for the cache table, handle state and listener list
//!
//! Lookups, binds and clears have no error path, so there is nowhere to
//! report a poisoned lock. A lock left poisoned by a panic is taken over
//! as-is with a warning, and the guard is returned directly.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// `Mutex` locking that never fails
pub(crate) trait MutexExt<T> {
    /// Lock, taking over the data if a previous holder panicked
    fn lock_recovered(&self) -> MutexGuard<'_, T>;
}

/// `RwLock` locking that never fails
pub(crate) trait RwLockExt<T> {
    /// Shared access, taking over the data if a writer panicked
    fn read_recovered(&self) -> RwLockReadGuard<'_, T>;

    /// Exclusive access, taking over the data if a writer panicked
    fn write_recovered(&self) -> RwLockWriteGuard<'_, T>;
}

impl<T> MutexExt<T> for Mutex<T> {
    fn lock_recovered(&self) -> MutexGuard<'_, T> {
        match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("A panic left cache state locked; continuing with it");
                poisoned.into_inner()
            }
        }
    }
}

impl<T> RwLockExt<T> for RwLock<T> {
    fn read_recovered(&self) -> RwLockReadGuard<'_, T> {
        match self.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("A panic left listeners locked; reading them anyway");
                poisoned.into_inner()
            }
        }
    }

    fn write_recovered(&self) -> RwLockWriteGuard<'_, T> {
        match self.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("A panic left listeners locked; updating them anyway");
                poisoned.into_inner()
            }
        }
    }
}
