#[cfg(target_arch = "x86_64")]
use core::arch::x86_64 as arch;

/// The three architecture specific operations everything else builds on.
///
/// The emulation and range/copy logic are written against this seam,
/// porting to another architecture means implementing it with that
/// architecture's cache flush and fine grained timer instructions.
pub trait Platform {
    /// Flushes the cache line containing `p` out of the cache hierarchy.
    ///
    /// Flushing a clean line is a harmless no-op at the hardware level.
    ///
    /// # Safety
    /// `p` must point into valid mapped memory.
    unsafe fn flush_line(&self, p: *const u8);

    /// Full store/load ordering barrier.
    fn fence(&self);

    /// Fine grained monotonic hardware clock, in cycles.
    fn read_clock(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HostPlatform;

#[cfg(target_arch = "x86_64")]
impl Platform for HostPlatform {
    unsafe fn flush_line(&self, p: *const u8) {
        // TODO prefer clflushopt/clwb when cpuid reports them
        arch::_mm_clflush(p)
    }

    fn fence(&self) {
        // SAFETY: mfence takes no operands and cannot fault
        unsafe { arch::_mm_mfence() }
    }

    fn read_clock(&self) -> u64 {
        // SAFETY: rdtsc is unprivileged and always readable
        unsafe { arch::_rdtsc() }
    }
}

// Stand-in for non x86 hosts, good enough to run the emulation logic.
// There is no persistence domain to flush to here, so flush_line is a
// no-op and the clock counts nanoseconds, i e behaves as 1000 MHz.
#[cfg(not(target_arch = "x86_64"))]
impl Platform for HostPlatform {
    unsafe fn flush_line(&self, _p: *const u8) {}

    fn fence(&self) {
        std::sync::atomic::fence(std::sync::atomic::Ordering::SeqCst)
    }

    fn read_clock(&self) -> u64 {
        use std::{sync::OnceLock, time::Instant};

        static BASE: OnceLock<Instant> = OnceLock::new();
        BASE.get_or_init(Instant::now).elapsed().as_nanos() as u64
    }
}
