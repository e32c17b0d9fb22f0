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

use alloc::string::String;

use thiserror::Error;
use wramfifo_common::{FifoKind, RingError};

pub type Result<T> = core::result::Result<T, DeviceError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error(transparent)]
    Ring(#[from] RingError),

    #[error("Symbol {0} does not exist in the device image")]
    NoSuchSymbol(String),

    #[error("Expected an {expected} FIFO, found an {found} FIFO")]
    WrongKind { expected: FifoKind, found: FifoKind },

    #[error("Symbol {0} is not a FIFO")]
    NotAFifo(String),

    #[error("Symbol {0} is not a host variable of at least one word")]
    NotAVariable(String),

    #[error("Element buffer is {got} bytes, FIFO elements are {expected} bytes")]
    ElementSize { expected: usize, got: usize },

    #[error("Barrier has {barrier} participants but {tasklets} tasklets drain through it")]
    BarrierMismatch { barrier: usize, tasklets: usize },

    #[error("{0} tasklets requested, a device runs at most 24")]
    TooManyTasklets(usize),

    #[error("Mutex {id} is out of range for a bank of {len}")]
    MutexOutOfRange { id: usize, len: usize },

    #[error("Image needs {requested} bytes at {offset:#x} but device memory holds {available}")]
    ImageFull {
        offset: u64,
        requested: usize,
        available: usize,
    },

    #[error("Symbol {0} is defined twice")]
    DuplicateSymbol(String),
}

/// Return early with a [`DeviceError`] when a condition does not hold.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return ::core::result::Result::Err($err.into());
        }
    };
}
