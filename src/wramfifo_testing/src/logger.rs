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

use std::sync::{Mutex, MutexGuard, Once};
use std::thread::{ThreadId, current};

use log::{Level, Log, Metadata, Record, set_logger, set_max_level};

/// Records from targets outside this prefix are ignored.
const TARGET_PREFIX: &str = "wramfifo";

static LOGGER: CapturingLogger = CapturingLogger {};
static INITLOGGER: Once = Once::new();
static LOGCALLS: Mutex<Vec<LogCall>> = Mutex::new(Vec::new());
/// Threads whose records are captured.
static CAPTURING: Mutex<Vec<ThreadId>> = Mutex::new(Vec::new());

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogCall {
    pub level: Level,
    pub args: String,
    pub target: String,
    pub module_path: Option<String>,
    pub thread: ThreadId,
}

pub struct CapturingLogger {}

fn log_calls() -> MutexGuard<'static, Vec<LogCall>> {
    // a test that panicked while holding the lock leaves the records usable
    LOGCALLS.lock().unwrap_or_else(|e| e.into_inner())
}

fn capturing() -> MutexGuard<'static, Vec<ThreadId>> {
    CAPTURING.lock().unwrap_or_else(|e| e.into_inner())
}

impl CapturingLogger {
    /// Install the logger once per process, start capturing the records of
    /// the current thread, and return the logger.
    ///
    /// Records of threads that never called this, such as tasklet threads
    /// or tests that do not look at logs, are dropped.
    pub fn initialize_test_logger() -> &'static CapturingLogger {
        INITLOGGER.call_once(|| {
            set_logger(&LOGGER).unwrap();
            set_max_level(log::LevelFilter::Trace);
        });
        let me = current().id();
        let mut threads = capturing();
        if !threads.contains(&me) {
            threads.push(me);
        }
        &LOGGER
    }

    /// Stop capturing the current thread and drop its records.
    pub fn stop_capturing(&self) {
        let me = current().id();
        capturing().retain(|t| *t != me);
        log_calls().retain(|c| c.thread != me);
    }

    pub fn num_log_calls(&self) -> usize {
        log_calls().len()
    }

    pub fn get_log_call(&self, idx: usize) -> Option<LogCall> {
        log_calls().get(idx).cloned()
    }

    pub fn clear_log_calls(&self) {
        log_calls().clear();
    }

    /// Hand the records logged by the current thread to `f`, then forget
    /// them. Records of other capturing threads are kept, so tests running
    /// in parallel do not see each other's records.
    pub fn test_log_records<F: FnOnce(&[LogCall])>(&self, f: F) {
        let me = current().id();
        let mine: Vec<LogCall> = {
            let mut calls = log_calls();
            let (mine, others): (Vec<LogCall>, Vec<LogCall>) = calls.drain(..).partition(|c| c.thread == me);
            *calls = others;
            mine
        };
        f(&mine);
    }
}

impl Log for CapturingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with(TARGET_PREFIX) && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let me = current().id();
        if !capturing().contains(&me) {
            return;
        }

        log_calls().push(LogCall {
            level: record.level(),
            args: format!("{}", record.args()),
            target: record.target().to_string(),
            module_path: record
                .module_path()
                .map(|module_path| module_path.to_string()),
            thread: me,
        });
    }

    fn flush(&self) {}
}
