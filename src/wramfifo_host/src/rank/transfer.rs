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

/// One block of a transfer: `buf` goes to, or comes from, `offset` in the
/// memory of `device`.
#[derive(Debug)]
pub struct TransferEntry<B> {
    pub device: usize,
    pub offset: u64,
    pub buf: B,
}

/// A set of blocks moved in one direction by a single transfer call.
///
/// Matrices borrow their buffers and are rebuilt for every operation.
#[derive(Debug)]
pub struct TransferMatrix<B> {
    entries: Vec<TransferEntry<B>>,
}

impl<B> TransferMatrix<B> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, device: usize, offset: u64, buf: B) {
        self.entries.push(TransferEntry {
            device,
            offset,
            buf,
        });
    }

    pub fn entries(&self) -> &[TransferEntry<B>] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [TransferEntry<B>] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<B: AsRef<[u8]>> TransferMatrix<B> {
    /// Bytes moved by the whole matrix.
    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.buf.as_ref().len()).sum()
    }
}

impl<B> Default for TransferMatrix<B> {
    fn default() -> Self {
        Self::new()
    }
}
