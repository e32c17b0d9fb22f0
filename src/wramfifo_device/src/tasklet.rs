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

use core::fmt;

use crate::error::{DeviceError, Result};

/// Number of hardware threads of one device.
pub const MAX_TASKLETS: usize = 24;

/// Identity of a tasklet, `0..MAX_TASKLETS`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskletId(u8);

impl TaskletId {
    /// Tasklet 0 decides, reduces and moves pointers in collective draining.
    pub const LEADER: TaskletId = TaskletId(0);

    pub fn new(id: usize) -> Result<Self> {
        crate::ensure!(id < MAX_TASKLETS, DeviceError::TooManyTasklets(id + 1));
        Ok(Self(id as u8))
    }

    /// Ids of the first `nr_tasklets` tasklets.
    pub fn all(nr_tasklets: usize) -> Result<impl Iterator<Item = TaskletId>> {
        crate::ensure!(
            nr_tasklets <= MAX_TASKLETS,
            DeviceError::TooManyTasklets(nr_tasklets)
        );
        Ok((0..nr_tasklets as u8).map(TaskletId))
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_leader(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TaskletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tasklet {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasklet_ids() {
        assert!(TaskletId::new(0).unwrap().is_leader());
        assert_eq!(TaskletId::new(23).unwrap().index(), 23);
        assert_eq!(
            TaskletId::new(24),
            Err(DeviceError::TooManyTasklets(25))
        );
        assert_eq!(TaskletId::all(4).unwrap().count(), 4);
        assert!(TaskletId::all(25).is_err());
    }
}
