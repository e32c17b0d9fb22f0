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

use wramfifo_common::{FifoKind, MemOps, RingError};
use wramfifo_host::{FifoConfig, FifoError, FifoLink, LocalRank, Rank};

mod common;
use common::program;

#[test]
fn test_link_resolves_symbol() {
    let rank = LocalRank::new(&program(3, 4, 16), 4).unwrap();
    let link = FifoLink::link_input(&rank, "in", FifoConfig::default()).unwrap();
    assert_eq!(link.name(), "in");
    assert_eq!(link.kind(), FifoKind::Input);
    assert_eq!(link.nr_devices(), 4);
    assert_eq!(link.ring_size(3).unwrap(), 8);
    assert_eq!(link.max_ring_size(), 8);
    assert_eq!(link.available_elements(0).unwrap(), 0);
    assert!(!link.is_stale());
    assert_eq!(link.ring_size(4), Err(FifoError::NoSuchDevice(4)));
    link.free();

    let link = FifoLink::link_output(&rank, "out", FifoConfig::default()).unwrap();
    assert_eq!(link.max_ring_size(), 16);
    assert_eq!(link.geometry().data_size(), 16);
}

#[test]
fn test_missing_symbol() {
    let rank = LocalRank::new(&program(3, 3, 8), 1).unwrap();
    assert_eq!(
        FifoLink::link_input(&rank, "nope", FifoConfig::default()).unwrap_err(),
        FifoError::SymbolNotFound("nope".into())
    );
}

#[test]
fn test_wrong_direction() {
    let rank = LocalRank::new(&program(3, 3, 8), 1).unwrap();
    assert_eq!(
        FifoLink::link_input(&rank, "out", FifoConfig::default()).unwrap_err(),
        FifoError::WrongDirection {
            name: "out".into(),
            requested: FifoKind::Input,
            found: FifoKind::Output,
        }
    );
    assert!(matches!(
        FifoLink::link_output(&rank, "in", FifoConfig::default()),
        Err(FifoError::WrongDirection { .. })
    ));
}

#[test]
fn test_variable_is_not_a_fifo() {
    let rank = LocalRank::new(&program(3, 3, 8), 1).unwrap();
    assert_eq!(
        FifoLink::link_input(&rank, "active", FifoConfig::default()).unwrap_err(),
        FifoError::NotAFifo("active".into())
    );
}

#[test]
fn test_element_size_mismatch() {
    let rank = LocalRank::new(&program(3, 3, 8), 2).unwrap();
    let mut config = FifoConfig::default();
    config.set_data_size(16).unwrap();
    assert_eq!(
        FifoLink::link_input(&rank, "in", config).unwrap_err(),
        FifoError::SizeMismatch {
            name: "in".into(),
            declared: 8,
            configured: 16,
        }
    );

    config.set_data_size(8).unwrap();
    assert!(FifoLink::link_input(&rank, "in", config).is_ok());
}

#[test]
fn test_invalid_element_size_rejected_by_config() {
    let rank = LocalRank::new(&program(3, 3, 8), 1).unwrap();
    let mut config = FifoConfig::default();
    assert_eq!(
        config.set_data_size(12).unwrap_err(),
        FifoError::InvalidConfiguration(RingError::InvalidDataSize(12))
    );
    // the rejected size never reaches the link
    assert_eq!(config.data_size(), None);
    assert!(FifoLink::link_input(&rank, "in", config).is_ok());
}

#[test]
fn test_corrupt_header_on_one_device() {
    let rank = LocalRank::new(&program(3, 3, 8), 3).unwrap();
    let base = rank.symbols().get("in").unwrap().address;
    // ptr_size/data_size word of device 2 no longer matches the symbol
    rank.device(2)
        .unwrap()
        .wram()
        .store_release(base + 16, (8u64 << 32) | 5)
        .unwrap();

    assert!(matches!(
        FifoLink::link_input(&rank, "in", FifoConfig::default()),
        Err(FifoError::Error(_))
    ));
}

#[test]
fn test_links_leave_device_memory_alone() {
    let rank = LocalRank::new(&program(2, 2, 8), 1).unwrap();
    let wram = rank.device(0).unwrap().wram();
    let base = rank.symbols().get("in").unwrap().address;
    wram.store_release(base + 8, 3).unwrap();

    let link = FifoLink::link_input(&rank, "in", FifoConfig::default()).unwrap();
    assert_eq!(link.write_ptr(0).unwrap(), 3);
    assert_eq!(link.available_elements(0).unwrap(), 3);
    link.free();
    assert_eq!(wram.load_acquire(base + 8).unwrap(), 3);
}
