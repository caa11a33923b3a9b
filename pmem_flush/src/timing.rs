use crate::platform::Platform;

pub const DEFAULT_CPU_SPEED_MHZ: u64 = 2200;
pub const DEFAULT_WRITE_LATENCY_NS: i64 = 500;

/// Timing parameters of the emulated persistence domain.
///
/// Captured by a backend at construction, which makes reconfiguration
/// under in-flight flushes impossible instead of undefined. Values are not
/// validated, a zero clock speed divides by zero downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Assumed cpu clock frequency used to convert cycles to wall time.
    pub cpu_speed_mhz: u64,
    /// Extra latency charged per flushed line, relative to dram.
    pub write_latency_ns: i64,
}

impl Timing {
    pub fn new(cpu_speed_mhz: u64, write_latency_ns: i64) -> Self {
        Self {
            cpu_speed_mhz,
            write_latency_ns,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new(DEFAULT_CPU_SPEED_MHZ, DEFAULT_WRITE_LATENCY_NS)
    }
}

// The pair below truncates toward zero and is not an exact round trip,
// the rounding loss is bounded by the division granularity.

pub fn cycles_to_ns(cpu_speed_mhz: u64, cycles: u64) -> u64 {
    cycles * 1000 / cpu_speed_mhz
}

pub fn ns_to_cycles(cpu_speed_mhz: u64, ns: u64) -> u64 {
    ns * cpu_speed_mhz / 1000
}

/// Burn cpu until at least `ns` nanoseconds worth of clock cycles passed.
///
/// Negative and zero durations return immediately. There is no sleep and
/// no way out before the budget is spent, sub microsecond precision is
/// paid for with a spinning core. Counter wraparound is left
/// to the wrapping subtraction, a 64 bit counter does not wrap on
/// realistic uptimes.
pub fn emulate_latency<P: Platform>(platform: &P, cpu_speed_mhz: u64, ns: i64) {
    if ns <= 0 {
        return;
    }

    let start = platform.read_clock();
    let cycles = ns_to_cycles(cpu_speed_mhz, ns as u64);
    while platform.read_clock().wrapping_sub(start) < cycles {}
}
