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

use wramfifo_common::{MemOps, RingError};

use crate::error::Result;
use crate::fifo::{InputFifo, OutputFifo};
use crate::flag::ActiveFlag;
use crate::tasklet::TaskletId;

mod collective;
mod exclusive;

pub use collective::{Collective, CollectiveKernel, tasklet_range};
pub use exclusive::{Exclusive, TaskletKernel};

/// What one tasklet did during a drain.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DrainStats {
    /// Input elements this tasklet took part in processing.
    pub processed: u64,
}

/// A way of moving every input element through a kernel into the output
/// FIFO, run by all tasklets of a device at once.
///
/// Every participating tasklet calls [`drain`](Self::drain) with its own id
/// and returns once the active flag is clear and the input is empty.
pub trait DrainStrategy: Sync {
    fn drain<M, F>(
        &self,
        tasklet: TaskletId,
        input: &InputFifo<M>,
        output: &OutputFifo<M>,
        active: &F,
    ) -> Result<DrainStats>
    where
        M: MemOps<Error = RingError>,
        F: ActiveFlag + ?Sized;
}

/// A drain strategy picked at run time.
#[derive(Debug)]
pub enum DrainMode<C, E> {
    Collective(C),
    Exclusive(E),
}

impl<C, E> DrainStrategy for DrainMode<C, E>
where
    C: DrainStrategy,
    E: DrainStrategy,
{
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
        match self {
            DrainMode::Collective(c) => c.drain(tasklet, input, output, active),
            DrainMode::Exclusive(e) => e.drain(tasklet, input, output, active),
        }
    }
}

/// Device images with one input and one output FIFO, and a stand-in for
/// the host side of both.
#[cfg(test)]
pub(crate) mod harness {
    use alloc::vec::Vec;
    use core::sync::atomic::{AtomicBool, Ordering};

    use wramfifo_common::{FifoLayout, MemOps, Ring, Wram};

    use super::{DrainStats, DrainStrategy};
    use crate::image::{DeviceImage, ImageBuilder};
    use crate::tasklet::TaskletId;

    pub(crate) struct Harness {
        pub(crate) image: DeviceImage,
        pub(crate) active: AtomicBool,
    }

    impl Harness {
        pub(crate) fn new(in_ptr_size: u32, out_ptr_size: u32, data_size: u32) -> Self {
            let image = ImageBuilder::new(Wram::DEFAULT_SIZE)
                .input_fifo("in", in_ptr_size, data_size)
                .unwrap()
                .output_fifo("out", out_ptr_size, data_size)
                .unwrap()
                .build()
                .unwrap();
            Self {
                image,
                active: AtomicBool::new(true),
            }
        }

        fn ring(&self, name: &str) -> (FifoLayout, Ring) {
            let (_, layout) = self.image.symbols().get(name).unwrap().fifo_layout().unwrap();
            let wram = self.image.wram();
            let ring = Ring::from_parts(
                layout.geometry().ptr_size(),
                wram.load_acquire(layout.read_ptr_addr()).unwrap(),
                wram.load_acquire(layout.write_ptr_addr()).unwrap(),
            )
            .unwrap();
            (layout, ring)
        }

        /// Push one element into the input FIFO unless it is full.
        pub(crate) fn try_host_push(&self, element: &[u8]) -> bool {
            let (layout, ring) = self.ring("in");
            if ring.is_full() {
                return false;
            }
            let wram = self.image.wram();
            wram.write(layout.slot_addr(ring.write_ptr()), element)
                .unwrap();
            wram.store_release(layout.write_ptr_addr(), ring.write_ptr() + 1)
                .unwrap();
            true
        }

        pub(crate) fn host_push(&self, element: &[u8]) {
            while !self.try_host_push(element) {
                std::thread::yield_now();
            }
        }

        /// Take everything currently in the output FIFO.
        pub(crate) fn host_pull(&self) -> Vec<Vec<u8>> {
            let (layout, ring) = self.ring("out");
            let wram = self.image.wram();
            let data_size = layout.geometry().data_size() as usize;
            let elements = (ring.read_ptr()..ring.write_ptr())
                .map(|ptr| {
                    let mut element = vec![0u8; data_size];
                    wram.read(layout.slot_addr(ptr), &mut element).unwrap();
                    element
                })
                .collect();
            wram.store_release(layout.read_ptr_addr(), ring.write_ptr())
                .unwrap();
            elements
        }

        pub(crate) fn input_len(&self) -> u64 {
            self.ring("in").1.len()
        }

        /// Run `nr_tasklets` tasklets through `strategy` while `host` runs on
        /// the calling thread, then clear the active flag and wait for them.
        pub(crate) fn run_while<S, H>(&self, strategy: &S, nr_tasklets: usize, host: H) -> Vec<DrainStats>
        where
            S: DrainStrategy,
            H: FnOnce(&Self),
        {
            let input = self.image.input_fifo("in").unwrap();
            let output = self.image.output_fifo("out").unwrap();
            std::thread::scope(|s| {
                let handles: Vec<_> = TaskletId::all(nr_tasklets)
                    .unwrap()
                    .map(|id| {
                        let (input, output, active) = (&input, &output, &self.active);
                        s.spawn(move || strategy.drain(id, input, output, active).unwrap())
                    })
                    .collect();
                host(self);
                self.active.store(false, Ordering::Release);
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            })
        }
    }
}
