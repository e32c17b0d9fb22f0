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

use crate::error::{DeviceError, Result};
use crate::tasklet::MAX_TASKLETS;

/// Barrier with a participant count fixed at construction.
pub struct TaskletBarrier {
    inner: spin::Barrier,
    participants: usize,
}

impl TaskletBarrier {
    pub fn new(participants: usize) -> Result<Self> {
        crate::ensure!(
            (1..=MAX_TASKLETS).contains(&participants),
            DeviceError::TooManyTasklets(participants)
        );
        Ok(Self {
            inner: spin::Barrier::new(participants),
            participants,
        })
    }

    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Block until all participants have called `wait`.
    ///
    /// Exactly one participant per generation gets `true` back.
    pub fn wait(&self) -> bool {
        self.inner.wait().is_leader()
    }
}

impl core::fmt::Debug for TaskletBarrier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TaskletBarrier")
            .field("participants", &self.participants)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_rejects_bad_counts() {
        assert!(TaskletBarrier::new(0).is_err());
        assert!(TaskletBarrier::new(25).is_err());
        assert_eq!(TaskletBarrier::new(24).unwrap().participants(), 24);
    }

    #[test]
    fn test_nobody_passes_early() {
        const N: usize = 6;
        let barrier = TaskletBarrier::new(N).unwrap();
        let arrived = AtomicUsize::new(0);
        let leaders = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..N {
                s.spawn(|| {
                    for round in 1..=3 {
                        arrived.fetch_add(1, Ordering::SeqCst);
                        if barrier.wait() {
                            leaders.fetch_add(1, Ordering::SeqCst);
                        }
                        assert!(arrived.load(Ordering::SeqCst) >= round * N);
                        barrier.wait();
                    }
                });
            }
        });

        assert_eq!(leaders.load(Ordering::SeqCst), 3);
    }
}
