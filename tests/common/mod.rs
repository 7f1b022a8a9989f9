#![allow(dead_code)]

use chat_throttle::{Governor, GovernorConfig, ManualClock, MemorySink};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// 2024-03-10T00:00:00Z
pub const DAY_START: u64 = 1_710_028_800_000;
pub const DAY_MILLIS: u64 = 24 * 60 * 60 * 1000;

/// A governor on a manual clock (one second into `DAY_START`) reporting to a memory sink.
pub fn governor(config: GovernorConfig) -> (Governor<MemorySink>, ManualClock, MemorySink) {
    let clock = ManualClock::starting_at(DAY_START + 1_000);
    let sink = MemorySink::new();
    let governor = Governor::new(config).with_clock(clock.clone()).with_sink(sink.clone());
    (governor, clock, sink)
}

#[derive(Clone, Default)]
pub struct SharedWriter(pub Arc<Mutex<Vec<u8>>>);

impl SharedWriter {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = SharedGuard;
    fn make_writer(&'a self) -> Self::Writer {
        SharedGuard(self.0.clone())
    }
}

pub struct SharedGuard(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for SharedGuard {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
