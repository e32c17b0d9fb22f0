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

use alloc::vec;

use wramfifo_common::{MemOps, RingError};

use super::{DrainStats, DrainStrategy};
use crate::error::Result;
use crate::fifo::{Backoff, InputFifo, OutputFifo};
use crate::flag::ActiveFlag;
use crate::sync::{HwMutexes, MutexId};
use crate::tasklet::TaskletId;

/// Work done by a single tasklet on a whole input element.
pub trait TaskletKernel: Sync {
    /// Turn `input` into `output`. `output` is zeroed beforehand.
    fn process(&self, tasklet: TaskletId, input: &[u8], output: &mut [u8]);
}

impl<F> TaskletKernel for F
where
    F: Fn(TaskletId, &[u8], &mut [u8]) + Sync,
{
    fn process(&self, tasklet: TaskletId, input: &[u8], output: &mut [u8]) {
        self(tasklet, input, output)
    }
}

/// Every tasklet takes whole elements for itself.
///
/// Popping from the input FIFO happens under `input_lock` and pushing to the
/// output FIFO under `output_lock`; the kernel itself runs unlocked. Output
/// order follows the order in which tasklets finish, not input order.
#[derive(Debug)]
pub struct Exclusive<'m, K> {
    kernel: K,
    mutexes: &'m HwMutexes,
    input_lock: MutexId,
    output_lock: MutexId,
}

impl<'m, K: TaskletKernel> Exclusive<'m, K> {
    /// The two locks may be the same mutex.
    pub fn new(
        kernel: K,
        mutexes: &'m HwMutexes,
        input_lock: MutexId,
        output_lock: MutexId,
    ) -> Result<Self> {
        // fail now rather than in the middle of a drain
        drop(mutexes.try_lock(input_lock)?);
        drop(mutexes.try_lock(output_lock)?);
        Ok(Self {
            kernel,
            mutexes,
            input_lock,
            output_lock,
        })
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn into_kernel(self) -> K {
        self.kernel
    }
}

impl<K: TaskletKernel> DrainStrategy for Exclusive<'_, K> {
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
        let mut element = vec![0u8; input.geometry().data_size() as usize];
        let mut result = vec![0u8; output.geometry().data_size() as usize];
        let mut stats = DrainStats::default();
        let mut backoff = Backoff::new();

        loop {
            let active = active.is_active();
            let taken = {
                let _guard = self.mutexes.lock(self.input_lock)?;
                input.pop_into(&mut element)?
            };
            if !taken {
                if !active {
                    break;
                }
                backoff.snooze();
                continue;
            }
            backoff.reset();

            result.fill(0);
            self.kernel.process(tasklet, &element, &mut result);
            {
                let _guard = self.mutexes.lock(self.output_lock)?;
                output.push(&result)?;
            }
            stats.processed += 1;
        }

        log::trace!("{} drained {} elements", tasklet, stats.processed);
        Ok(stats)
    }
}
