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

//! Random host/device traffic on both FIFO directions, checked byte for
//! byte against one reference queue per device and direction.

use std::collections::VecDeque;

use quickcheck::{Arbitrary, Gen, QuickCheck};
use wramfifo_host::{FifoConfig, FifoLink, LocalRank, PullResult};

mod common;
use common::program;

const NR_DEVICES: usize = 2;
const DATA_SIZE: usize = 16;

type Element = [u8; DATA_SIZE];

fn make_element((lo, hi): (u64, u64)) -> Element {
    let mut e = [0u8; DATA_SIZE];
    e[..8].copy_from_slice(&lo.to_le_bytes());
    e[8..].copy_from_slice(&hi.to_le_bytes());
    e
}

#[derive(Clone, Debug)]
enum Op {
    /// host pushes one element per device into `in`
    HostPush([(u64, u64); NR_DEVICES]),
    /// a tasklet of the device pops up to N elements from `in`
    DevicePop(usize, u8),
    /// a tasklet of the device pushes elements into `out`, stopping at full
    DevicePush(usize, Vec<(u64, u64)>),
    /// host pulls everything from `out`
    HostPull,
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Self {
        let device = usize::arbitrary(g) % NR_DEVICES;
        match u8::arbitrary(g) % 4 {
            0 => Op::HostPush([<(u64, u64)>::arbitrary(g), <(u64, u64)>::arbitrary(g)]),
            1 => Op::DevicePop(device, u8::arbitrary(g) % 8 + 1),
            2 => {
                let n = usize::arbitrary(g) % 8 + 1;
                Op::DevicePush(device, (0..n).map(|_| <(u64, u64)>::arbitrary(g)).collect())
            }
            _ => Op::HostPull,
        }
    }
}

#[derive(Clone, Debug)]
struct Scenario {
    in_ptr_size: u32,
    out_ptr_size: u32,
    ops: Vec<Op>,
}

impl Arbitrary for Scenario {
    fn arbitrary(g: &mut Gen) -> Self {
        let num_ops = usize::arbitrary(g) % 48 + 1;
        Scenario {
            in_ptr_size: u32::arbitrary(g) % 4,
            out_ptr_size: u32::arbitrary(g) % 4,
            ops: (0..num_ops).map(|_| Op::arbitrary(g)).collect(),
        }
    }
}

fn run_scenario(s: Scenario) -> bool {
    let data_size = DATA_SIZE as u32;
    let rank = LocalRank::new(&program(s.in_ptr_size, s.out_ptr_size, data_size), NR_DEVICES)
        .unwrap();
    let mut config = FifoConfig::default();
    // a full device fails right away instead of waiting for a pop that
    // only this thread could perform
    config.set_max_retries(0);
    let mut input = FifoLink::link_input(&rank, "in", config).unwrap();
    let mut output = FifoLink::link_output(&rank, "out", config).unwrap();
    let in_capacity = 1usize << s.in_ptr_size;

    let mut to_device: Vec<VecDeque<Element>> = vec![VecDeque::new(); NR_DEVICES];
    let mut to_host: Vec<VecDeque<Element>> = vec![VecDeque::new(); NR_DEVICES];

    for op in s.ops {
        match op {
            Op::HostPush(values) => {
                let elements = values.map(make_element);
                let report = input.push(&elements).unwrap();
                for d in 0..NR_DEVICES {
                    let expect_pushed = to_device[d].len() < in_capacity;
                    if report.pushed().contains(&d) != expect_pushed {
                        return false;
                    }
                    if expect_pushed {
                        to_device[d].push_back(elements[d]);
                    }
                }
                if report.failed().len() + report.pushed().len() != NR_DEVICES {
                    return false;
                }
            }
            Op::DevicePop(d, n) => {
                let fifo = rank.device(d).unwrap().input_fifo("in").unwrap();
                let mut buf = [0u8; DATA_SIZE];
                for _ in 0..n {
                    if !fifo.pop_into(&mut buf).unwrap() {
                        if !to_device[d].is_empty() {
                            return false;
                        }
                        break;
                    }
                    if to_device[d].pop_front() != Some(buf) {
                        return false;
                    }
                }
            }
            Op::DevicePush(d, values) => {
                let fifo = rank.device(d).unwrap().output_fifo("out").unwrap();
                for v in values {
                    if fifo.is_full().unwrap() {
                        break;
                    }
                    let e = make_element(v);
                    fifo.try_push(&e).unwrap();
                    to_host[d].push_back(e);
                }
            }
            Op::HostPull => {
                let pulled = output.pull().unwrap();
                if !pulled_matches(&pulled, &mut to_host) {
                    return false;
                }
            }
        }
    }

    // whatever is still queued arrives intact
    let pulled = output.pull().unwrap();
    pulled_matches(&pulled, &mut to_host)
}

fn pulled_matches(pulled: &PullResult, to_host: &mut [VecDeque<Element>]) -> bool {
    to_host.iter_mut().enumerate().all(|(d, expected)| {
        let got: Vec<&[u8]> = pulled.elements(d).collect();
        let want: Vec<Element> = expected.drain(..).collect();
        got.len() == want.len() && got.iter().zip(&want).all(|(g, w)| *g == &w[..])
    })
}

#[test]
fn prop_traffic_matches_model() {
    #[cfg(miri)]
    let tests = 1;
    #[cfg(not(miri))]
    let tests = 100;

    QuickCheck::new()
        .tests(tests)
        .quickcheck(run_scenario as fn(Scenario) -> bool);
}
