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
use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;
use core::sync::atomic::{AtomicBool, Ordering};

use spin::{Mutex, RwLock};
use wramfifo_common::{MemOps, RingError};

use super::{DrainStats, DrainStrategy};
use crate::error::{DeviceError, Result};
use crate::fifo::{Backoff, InputFifo, OutputFifo};
use crate::flag::ActiveFlag;
use crate::sync::TaskletBarrier;
use crate::tasklet::TaskletId;

/// Work split across all tasklets for every single input element.
pub trait CollectiveKernel: Sync {
    /// Result of one tasklet's share of an element.
    type Partial: Send;

    /// Process this tasklet's share of `element`, typically
    /// `element[tasklet_range(tasklet, nr_tasklets, element.len())]`.
    fn process(&self, tasklet: TaskletId, nr_tasklets: usize, element: &[u8]) -> Self::Partial;

    /// Fold the partials, in tasklet id order, into the output element.
    /// `output` is zeroed beforehand.
    fn reduce(&self, element: &[u8], partials: &[Self::Partial], output: &mut [u8]);
}

/// Byte range of an element of `len` bytes handled by `tasklet`.
///
/// Ranges are contiguous, disjoint and cover the element; trailing tasklets
/// get an empty range when there are more tasklets than chunks.
pub fn tasklet_range(tasklet: TaskletId, nr_tasklets: usize, len: usize) -> Range<usize> {
    let chunk = len.div_ceil(nr_tasklets.max(1));
    let start = (tasklet.index() * chunk).min(len);
    start..(start + chunk).min(len)
}

/// All tasklets cooperate on one element at a time.
///
/// Each round:
///
/// 1. tasklet 0 waits for an element, copies it to a shared staging buffer
///    and decides whether the round runs at all;
/// 2. barrier, every tasklet processes its share into its own partial slot;
/// 3. barrier, tasklet 0 reduces the partials, pushes the result and pops
///    the input element.
///
/// Only tasklet 0 ever moves a FIFO pointer. The opening barrier of the next
/// round keeps the others from reading the staging buffer while tasklet 0
/// refills it.
pub struct Collective<K: CollectiveKernel> {
    kernel: K,
    barrier: TaskletBarrier,
    running: AtomicBool,
    staging: RwLock<Vec<u8>>,
    partials: Box<[Mutex<Option<K::Partial>>]>,
}

impl<K: CollectiveKernel> Collective<K> {
    /// `barrier` must have exactly `nr_tasklets` participants, and every one
    /// of those tasklets must call [`drain`](DrainStrategy::drain).
    pub fn new(kernel: K, barrier: TaskletBarrier, nr_tasklets: usize) -> Result<Self> {
        crate::ensure!(
            barrier.participants() == nr_tasklets,
            DeviceError::BarrierMismatch {
                barrier: barrier.participants(),
                tasklets: nr_tasklets
            }
        );
        let partials: Vec<_> = (0..nr_tasklets).map(|_| Mutex::new(None)).collect();
        Ok(Self {
            kernel,
            barrier,
            running: AtomicBool::new(false),
            staging: RwLock::new(Vec::new()),
            partials: partials.into_boxed_slice(),
        })
    }

    pub fn nr_tasklets(&self) -> usize {
        self.partials.len()
    }

    /// Stage the next element. Returns `false` once the flag is clear and
    /// the input is empty.
    fn next_element<M, F>(&self, input: &InputFifo<M>, active: &F) -> Result<bool>
    where
        M: MemOps<Error = RingError>,
        F: ActiveFlag + ?Sized,
    {
        let mut staging = self.staging.write();
        staging.resize(input.geometry().data_size() as usize, 0);
        let mut backoff = Backoff::new();
        loop {
            let active = active.is_active();
            if input.peek_into(&mut staging[..])? {
                return Ok(true);
            }
            if !active {
                return Ok(false);
            }
            backoff.snooze();
        }
    }

    fn finish_element<M>(
        &self,
        input: &InputFifo<M>,
        output: &OutputFifo<M>,
        partials: &mut Vec<K::Partial>,
        result: &mut [u8],
    ) -> Result<()>
    where
        M: MemOps<Error = RingError>,
    {
        partials.clear();
        partials.extend(self.partials.iter().filter_map(|slot| slot.lock().take()));
        debug_assert_eq!(partials.len(), self.partials.len());

        result.fill(0);
        self.kernel.reduce(&self.staging.read(), partials, result);
        output.push(result)?;
        input.pop()
    }
}

impl<K: CollectiveKernel> DrainStrategy for Collective<K> {
    fn drain<M, F>(
        &self,
        tasklet: TaskletId,
        input: &InputFifo<M>,
        output: &OutputFifo<M>,
        active: &F,
    ) -> Result<DrainStats>
    where
        M: MemOps<Error = RingError>,
        F: ActiveFlag + ?Sized,
    {
        let nr_tasklets = self.nr_tasklets();
        crate::ensure!(
            tasklet.index() < nr_tasklets,
            DeviceError::TooManyTasklets(tasklet.index() + 1)
        );

        let leader = tasklet.is_leader();
        let mut stats = DrainStats::default();
        let mut failure = None;
        let mut partials = Vec::new();
        let mut result = if leader {
            vec![0u8; output.geometry().data_size() as usize]
        } else {
            Vec::new()
        };

        loop {
            if leader {
                // A failed round still has to release the others from the
                // barrier, so failures stop the loop instead of returning.
                let go = failure.is_none()
                    && self.next_element(input, active).unwrap_or_else(|e| {
                        failure = Some(e);
                        false
                    });
                self.running.store(go, Ordering::Release);
            }

            self.barrier.wait();
            if !self.running.load(Ordering::Acquire) {
                break;
            }

            let partial = self
                .kernel
                .process(tasklet, nr_tasklets, &self.staging.read());
            *self.partials[tasklet.index()].lock() = Some(partial);
            stats.processed += 1;

            self.barrier.wait();
            if leader {
                if let Err(e) = self.finish_element(input, output, &mut partials, &mut result) {
                    failure = Some(e);
                }
            }
        }

        match failure {
            Some(e) => {
                log::error!("{} stopped collective drain: {}", tasklet, e);
                Err(e)
            }
            None => Ok(stats),
        }
    }
}
