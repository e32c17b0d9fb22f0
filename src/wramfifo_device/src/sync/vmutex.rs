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
use core::sync::atomic::{AtomicU64, Ordering};

use spin::Mutex;

use crate::error::{DeviceError, Result};
use crate::fifo::Backoff;
use crate::sync::NR_HW_MUTEXES;

/// A large set of logical locks built from lock bits.
///
/// Each logical id owns one bit. Taking or releasing a bit happens under
/// the physical mutex `id % nr_hw`, but the physical mutex is released again
/// before the caller's critical section runs. Two distinct logical ids
/// therefore never exclude each other for longer than a bit update, unlike
/// a [`MutexPool`](crate::sync::MutexPool).
#[derive(Debug)]
pub struct VirtualMutex {
    hw: Box<[Mutex<()>]>,
    bits: Box<[AtomicU64]>,
    nr_virtual: usize,
}

impl VirtualMutex {
    pub fn new(nr_virtual: usize, nr_hw: usize) -> Result<Self> {
        crate::ensure!(
            (1..=NR_HW_MUTEXES).contains(&nr_hw),
            DeviceError::MutexOutOfRange {
                id: nr_hw,
                len: NR_HW_MUTEXES
            }
        );
        crate::ensure!(
            nr_virtual > 0,
            DeviceError::MutexOutOfRange { id: 0, len: 0 }
        );
        let hw: Vec<Mutex<()>> = (0..nr_hw).map(|_| Mutex::new(())).collect();
        let bits: Vec<AtomicU64> = (0..nr_virtual.div_ceil(64))
            .map(|_| AtomicU64::new(0))
            .collect();
        Ok(Self {
            hw: hw.into_boxed_slice(),
            bits: bits.into_boxed_slice(),
            nr_virtual,
        })
    }

    pub fn len(&self) -> usize {
        self.nr_virtual
    }

    pub fn is_empty(&self) -> bool {
        self.nr_virtual == 0
    }

    fn check(&self, id: usize) -> Result<()> {
        crate::ensure!(
            id < self.nr_virtual,
            DeviceError::MutexOutOfRange {
                id,
                len: self.nr_virtual
            }
        );
        Ok(())
    }

    /// Set the bit for `id` if it is clear.
    fn take_bit(&self, id: usize) -> bool {
        let _hw = self.hw[id % self.hw.len()].lock();
        let word = &self.bits[id / 64];
        let mask = 1u64 << (id % 64);
        let cur = word.load(Ordering::Relaxed);
        if cur & mask != 0 {
            return false;
        }
        word.store(cur | mask, Ordering::Relaxed);
        true
    }

    fn release_bit(&self, id: usize) {
        let _hw = self.hw[id % self.hw.len()].lock();
        let word = &self.bits[id / 64];
        let mask = 1u64 << (id % 64);
        word.store(word.load(Ordering::Relaxed) & !mask, Ordering::Relaxed);
    }

    /// Spin until logical lock `id` is held.
    pub fn lock(&self, id: usize) -> Result<VirtualMutexGuard<'_>> {
        self.check(id)?;
        let mut backoff = Backoff::new();
        while !self.take_bit(id) {
            backoff.snooze();
        }
        Ok(VirtualMutexGuard { mutex: self, id })
    }

    pub fn try_lock(&self, id: usize) -> Result<Option<VirtualMutexGuard<'_>>> {
        self.check(id)?;
        Ok(self
            .take_bit(id)
            .then(|| VirtualMutexGuard { mutex: self, id }))
    }
}

/// Holds one logical lock of a [`VirtualMutex`] until dropped.
#[derive(Debug)]
pub struct VirtualMutexGuard<'a> {
    mutex: &'a VirtualMutex,
    id: usize,
}

impl VirtualMutexGuard<'_> {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for VirtualMutexGuard<'_> {
    fn drop(&mut self) {
        self.mutex.release_bit(self.id);
    }
}
