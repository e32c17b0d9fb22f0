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

use crate::error::FifoError;

/// Outcome of pushing one element to every device.
///
/// A device that stayed full through every retry does not fail the whole
/// push; it is listed in [`failed`](Self::failed) and its element was not
/// delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    pub(crate) pushed: Vec<usize>,
    pub(crate) failed: Vec<(usize, FifoError)>,
    pub(crate) retries: u32,
}

impl PushReport {
    /// Devices that received their element, in ascending order.
    pub fn pushed(&self) -> &[usize] {
        &self.pushed
    }

    /// Devices that did not, each with a
    /// [`FifoError::PushExhaustedRetries`].
    pub fn failed(&self) -> &[(usize, FifoError)] {
        &self.failed
    }

    /// Whether every device received its element.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Retry rounds that were needed.
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

/// Elements pulled from every device, in FIFO order per device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullResult {
    pub(crate) data_size: usize,
    pub(crate) devices: Vec<Vec<u8>>,
}

impl PullResult {
    pub fn nr_devices(&self) -> usize {
        self.devices.len()
    }

    /// Number of elements pulled from `device`.
    pub fn len(&self, device: usize) -> usize {
        self.devices
            .get(device)
            .map_or(0, |bytes| bytes.len() / self.data_size)
    }

    /// Elements pulled from all devices together.
    pub fn total(&self) -> usize {
        self.devices.iter().map(|b| b.len() / self.data_size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.iter().all(Vec::is_empty)
    }

    /// The `index`-th element pulled from `device`.
    pub fn element(&self, device: usize, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.data_size)?;
        self.devices
            .get(device)?
            .get(start..start.checked_add(self.data_size)?)
    }

    /// All elements pulled from `device`, oldest first.
    pub fn elements(&self, device: usize) -> impl Iterator<Item = &[u8]> {
        self.devices
            .get(device)
            .map(|b| b.as_slice())
            .unwrap_or_default()
            .chunks_exact(self.data_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_result_access() {
        let result = PullResult {
            data_size: 8,
            devices: vec![(0u8..16).collect(), vec![], vec![9; 8]],
        };
        assert_eq!(result.nr_devices(), 3);
        assert_eq!(result.len(0), 2);
        assert_eq!(result.len(1), 0);
        assert_eq!(result.len(7), 0);
        assert_eq!(result.total(), 3);
        assert!(!result.is_empty());
        assert_eq!(result.element(0, 1), Some(&[8u8, 9, 10, 11, 12, 13, 14, 15][..]));
        assert_eq!(result.element(0, 2), None);
        assert_eq!(result.element(2, 0), Some(&[9u8; 8][..]));
        assert_eq!(result.elements(1).count(), 0);
        assert_eq!(result.elements(0).count(), 2);
        assert_eq!(result.elements(5).count(), 0);
    }

    #[test]
    fn test_push_report() {
        let report = PushReport {
            pushed: vec![0, 2],
            failed: vec![(
                1,
                FifoError::PushExhaustedRetries {
                    device: 1,
                    retries: 3,
                },
            )],
            retries: 3,
        };
        assert!(!report.is_complete());
        assert_eq!(report.pushed(), [0, 2]);
        assert_eq!(report.failed()[0].0, 1);
    }
}
