use std::cell::{Cell, UnsafeCell};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

use thread_local::ThreadLocal;

/// A blocking, non-reentrant mutual-exclusion lock.
///
/// Acquisition spins (yielding to the scheduler between attempts) until the
/// lock is free. There is no try-lock and no timeout: a caller that needs to
/// bound its wait has to do so above this type.
///
/// Unlike `std::sync::Mutex` there is no poisoning. A panic while the lock is
/// held simply releases it when the guard unwinds.
// following along with https://www.youtube.com/watch?v=rMGWeSjctlY
pub struct Mutex<T> {
    locked: AtomicBool,
    /// Whether the current thread is the one holding `locked`.
    held_here: ThreadLocal<Cell<bool>>,
    v: UnsafeCell<T>,
}

// SAFETY: the lock hands out `&mut T` to one thread at a time, which is the same
//         as sending the `T` back and forth between threads, so `T: Send` suffices.
unsafe impl<T> Sync for Mutex<T> where T: Send {}

impl<T> Mutex<T> {
    pub fn new(t: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            held_here: ThreadLocal::new(),
            v: UnsafeCell::new(t),
        }
    }

    pub fn into_inner(self) -> T {
        self.v.into_inner()
    }
}

impl<T> Mutex<T> {
    /// Blocks until the lock is acquired.
    ///
    /// # Panics
    ///
    /// Panics if the calling thread already holds this lock, since waiting for
    /// it would never finish.
    // https://matklad.github.io/2020/01/02/spinlocks-considered-harmful.html
    pub fn lock(&self) -> MutexGuard<'_, T> {
        let held_here = self.held_here.get_or(|| Cell::new(false));
        if held_here.get() {
            error!("Re-entrant lock attempt on a non-reentrant mutex");
        }
        assert!(!held_here.get(), "this thread already holds the lock; re-entrant locking would deadlock");

        while self.locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
            std::thread::yield_now();

            // spin on a plain load so waiters don't keep stealing the cache line
            while self.locked.load(Ordering::Relaxed) {
                std::hint::spin_loop();
                std::thread::yield_now();
            }
        }

        held_here.set(true);
        MutexGuard { inner: self, _not_send: PhantomData }
    }

    pub fn with_lock<F, R>(&self, f: F) -> R where F: FnOnce(&mut T) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Whether any thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Given an exclusive reference to the `Mutex`, you can trivially have an exclusive reference to the inner value.
    pub fn get_mut(&mut self) -> &mut T {
        self.v.get_mut()
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Mutex::new(T::default())
    }
}


/// An RAII structure used to manage exclusive access to a [`Mutex`].
pub struct MutexGuard<'m, T> {
    // NOTE: the critical invariant of this type is that no other `MutexGuard`s with a reference to `inner` exist at the same time.
    inner: &'m Mutex<T>,
    // the guard must be dropped on the thread that took it, or `held_here` goes stale
    _not_send: PhantomData<*const ()>,
}

// SAFETY: sharing the guard only shares `&T`.
unsafe impl<T: Sync> Sync for MutexGuard<'_, T> {}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        // SAFETY: the existence of this type means we have exclusive access to the inner value.
        unsafe { &*self.inner.v.get() }
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: the existence of this type means we have exclusive access to the inner value.
        unsafe { &mut *self.inner.v.get() }
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(held_here) = self.inner.held_here.get() {
            held_here.set(false);
        }

        // store(Release) → everything that happens earlier on this thread is seen by any load(Acquire+)
        let was_locked = self.inner.locked.swap(false, Ordering::Release);
        debug_assert!(was_locked, "Dropped MutexGuard without the lock having been held");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // mfw im on (strongly ordered) x86

    #[test]
    fn mutex_usize() {
        use std::thread;
        const T: usize = 100;
        const R: usize = 1000;

        let m = Mutex::new(0);

        thread::scope(|s| {
            for _ in 0..T {
                s.spawn(|| {
                    for _ in 0..R {
                        m.with_lock(|v| *v += 1)
                    }
                });
            }
        });

        assert_eq!(m.with_lock(|v| *v), T*R);
    }

    #[test]
    fn mutex_vec_push() {
        use std::thread;
        const T: usize = 100;
        const R: usize = 1000;

        let m = Mutex::new(vec![]);

        thread::scope(|s| {
            for _ in 0..T {
                s.spawn(|| {
                    for _ in 0..R {
                        let mut v = m.lock();
                        let len = v.len();
                        v.push(len);
                    }
                });
            }
        });

        let v = m.into_inner();
        assert_eq!(v.len(), T*R);
        assert!(v.iter().enumerate().all(|(i, &x)| i == x));
    }

    #[test]
    fn guard_releases_on_drop() {
        let m = Mutex::new(5);
        {
            let mut g = m.lock();
            assert!(m.is_locked());
            *g += 1;
        }
        assert!(!m.is_locked());
        assert_eq!(*m.lock(), 6);
    }

    #[test]
    fn lock_released_after_panic() {
        let m = Mutex::new(0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            m.with_lock(|_| panic!("boom"));
        }));
        assert!(result.is_err());
        assert!(!m.is_locked());
        m.with_lock(|v| *v = 1);
    }

    #[test]
    #[should_panic(expected = "re-entrant")]
    fn reentrant_lock_panics() {
        let m = Mutex::new(());
        let _outer = m.lock();
        let _inner = m.lock();
    }

    #[test]
    fn other_thread_can_lock_after_release() {
        let m = Mutex::new(0);
        let g = m.lock();
        std::thread::scope(|s| {
            let h = s.spawn(|| m.with_lock(|v| *v + 1));
            std::thread::sleep(std::time::Duration::from_millis(20));
            drop(g);
            assert_eq!(h.join().unwrap(), 1);
        });
    }
}
