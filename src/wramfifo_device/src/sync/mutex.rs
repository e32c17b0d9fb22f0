/*
Copyright 2026 The wramfifo Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use alloc::boxed::Box;
use alloc::vec::Vec;

use spin::{Mutex, MutexGuard};

use crate::error::{DeviceError, Result};

/// Number of physical mutexes a device provides, one per atomic bit.
pub const NR_HW_MUTEXES: usize = 256;

/// Index of a mutex in a [`HwMutexes`] bank.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MutexId(pub usize);

fn bank(len: usize) -> Result<Box<[Mutex<()>]>> {
    crate::ensure!(
        (1..=NR_HW_MUTEXES).contains(&len),
        DeviceError::MutexOutOfRange {
            id: len,
            len: NR_HW_MUTEXES
        }
    );
    let locks: Vec<Mutex<()>> = (0..len).map(|_| Mutex::new(())).collect();
    Ok(locks.into_boxed_slice())
}

/// A bank of physical mutexes.
#[derive(Debug)]
pub struct HwMutexes {
    locks: Box<[Mutex<()>]>,
}

impl HwMutexes {
    pub fn new(len: usize) -> Result<Self> {
        Ok(Self { locks: bank(len)? })
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn get(&self, id: MutexId) -> Result<&Mutex<()>> {
        self.locks.get(id.0).ok_or(DeviceError::MutexOutOfRange {
            id: id.0,
            len: self.locks.len(),
        })
    }

    /// Spin until mutex `id` is acquired.
    pub fn lock(&self, id: MutexId) -> Result<MutexGuard<'_, ()>> {
        Ok(self.get(id)?.lock())
    }

    pub fn try_lock(&self, id: MutexId) -> Result<Option<MutexGuard<'_, ()>>> {
        Ok(self.get(id)?.try_lock())
    }
}

/// Logical locks mapped onto a range of a [`HwMutexes`] bank.
///
/// Logical id `l` uses physical mutex `first + l % size`. Distinct logical
/// ids that share a physical mutex exclude each other even though their data
/// does not overlap; that false contention is the price of a bounded pool.
/// Mutexes of the bank outside the range stay free for other users.
#[derive(Debug, Clone, Copy)]
pub struct MutexPool<'m> {
    bank: &'m HwMutexes,
    first: usize,
    size: usize,
}

impl<'m> MutexPool<'m> {
    /// Pool over the `size` mutexes of `bank` starting at `first`.
    pub fn new(bank: &'m HwMutexes, first: MutexId, size: usize) -> Result<Self> {
        let end = first.0.checked_add(size).unwrap_or(usize::MAX);
        crate::ensure!(
            size > 0 && end <= bank.len(),
            DeviceError::MutexOutOfRange {
                id: end.saturating_sub(1).max(first.0),
                len: bank.len()
            }
        );
        Ok(Self {
            bank,
            first: first.0,
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Physical mutex backing logical id `logical`.
    #[inline]
    pub fn physical(&self, logical: usize) -> MutexId {
        MutexId(self.first + logical % self.size)
    }

    pub fn lock(&self, logical: usize) -> MutexGuard<'m, ()> {
        self.bank.locks[self.physical(logical).0].lock()
    }

    pub fn try_lock(&self, logical: usize) -> Option<MutexGuard<'m, ()>> {
        self.bank.locks[self.physical(logical).0].try_lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_bounds() {
        assert!(HwMutexes::new(0).is_err());
        assert!(HwMutexes::new(NR_HW_MUTEXES + 1).is_err());
        let bank = HwMutexes::new(4).unwrap();
        assert_eq!(
            bank.lock(MutexId(4)).unwrap_err(),
            DeviceError::MutexOutOfRange { id: 4, len: 4 }
        );
    }

    #[test]
    fn test_bank_excludes() {
        let bank = HwMutexes::new(2).unwrap();
        let held = bank.lock(MutexId(0)).unwrap();
        assert!(bank.try_lock(MutexId(0)).unwrap().is_none());
        assert!(bank.try_lock(MutexId(1)).unwrap().is_some());
        drop(held);
        assert!(bank.try_lock(MutexId(0)).unwrap().is_some());
    }

    #[test]
    fn test_pool_bounds() {
        let bank = HwMutexes::new(4).unwrap();
        assert!(MutexPool::new(&bank, MutexId(0), 4).is_ok());
        assert!(MutexPool::new(&bank, MutexId(0), 0).is_err());
        assert_eq!(
            MutexPool::new(&bank, MutexId(2), 3).unwrap_err(),
            DeviceError::MutexOutOfRange { id: 4, len: 4 }
        );
        assert!(MutexPool::new(&bank, MutexId(usize::MAX), 2).is_err());
    }

    #[test]
    fn test_pool_collisions() {
        let bank = HwMutexes::new(10).unwrap();
        let pool = MutexPool::new(&bank, MutexId(2), 8).unwrap();
        assert_eq!(pool.physical(3), MutexId(5));
        assert_eq!(pool.physical(3), pool.physical(11));
        assert_ne!(pool.physical(3), pool.physical(4));

        let held = pool.lock(3);
        // same physical mutex: contended even though the ids differ
        assert!(pool.try_lock(11).is_none());
        assert!(pool.try_lock(4).is_some());
        drop(held);
        assert!(pool.try_lock(11).is_some());
    }

    #[test]
    fn test_pool_shares_bank() {
        let bank = HwMutexes::new(3).unwrap();
        let pool = MutexPool::new(&bank, MutexId(1), 2).unwrap();

        let held = pool.lock(2);
        // logical 2 is physical mutex 1 of the bank
        assert!(bank.try_lock(MutexId(1)).unwrap().is_none());
        assert!(bank.try_lock(MutexId(0)).unwrap().is_some());
        drop(held);

        let direct = bank.lock(MutexId(2)).unwrap();
        assert!(pool.try_lock(1).is_none());
        assert!(pool.try_lock(0).is_some());
        drop(direct);
    }

    #[test]
    fn test_pool_counters() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 200;
        let bank = HwMutexes::new(4).unwrap();
        let pool = MutexPool::new(&bank, MutexId(0), 4).unwrap();
        let counters: Vec<core::cell::UnsafeCell<u64>> =
            (0..16).map(|_| core::cell::UnsafeCell::new(0)).collect();

        struct Shared<'a>(&'a [core::cell::UnsafeCell<u64>]);
        // SAFETY: every access goes through the pool lock of its index
        unsafe impl Sync for Shared<'_> {}
        let shared = Shared(&counters);

        std::thread::scope(|s| {
            for t in 0..THREADS {
                let (pool, shared) = (&pool, &shared);
                s.spawn(move || {
                    for r in 0..ROUNDS {
                        let bucket = (t * 7 + r) % shared.0.len();
                        let _guard = pool.lock(bucket);
                        // SAFETY: exclusive under the pool lock for `bucket`
                        unsafe { *shared.0[bucket].get() += 1 };
                    }
                });
            }
        });

        let total: u64 = counters.into_iter().map(|c| c.into_inner()).sum();
        assert_eq!(total, (THREADS * ROUNDS) as u64);
    }
}
