use std::ptr;

use instrument_pmem::{Event, Instrument, Noop};

use crate::{
    platform::{HostPlatform, Platform},
    timing::{emulate_latency, Timing},
    CACHE_LINE_SIZE,
};

/// Durability strategy, selected once at construction time.
///
/// Both variants live behind this trait so the same call sites can run
/// either: [`Emulated`] over plain volatile memory, or the libpmem backed
/// `Native` when the `pmemio` feature is enabled.
pub trait PersistBackend {
    /// Bare ordering barrier, for callers that need one without a flush.
    fn fence(&self);

    /// Makes `size` bytes starting at `ptr` durable.
    ///
    /// Flushing advances by whole cache lines, so up to
    /// `CACHE_LINE_SIZE - 1` bytes past the range may be flushed too,
    /// never less than the range. `size == 0` is a legal no-op, the two
    /// bracketing fences are still issued.
    ///
    /// # Safety
    /// The whole byte range must be valid mapped memory.
    unsafe fn persist_range(&self, ptr: *const u8, size: usize);

    /// Copies `size` bytes from `src` to `dst`, then makes the
    /// destination durable.
    ///
    /// # Safety
    /// Same as [`persist_range`](Self::persist_range) for both ranges,
    /// and the ranges must not overlap.
    unsafe fn copy_and_persist(&self, dst: *mut u8, src: *const u8, size: usize);
}

/// Flushes through the platform primitives and charges the configured
/// write latency per line with a busy-wait.
pub struct Emulated<P: Platform, I: Instrument + Clone> {
    platform: P,
    instrument: I,
    timing: Timing,
}

impl Emulated<HostPlatform, Noop> {
    pub fn new(timing: Timing) -> Self {
        Self::with_instrument(HostPlatform, Noop, timing)
    }
}

impl<P: Platform, I: Instrument + Clone> Emulated<P, I> {
    pub fn with_instrument(platform: P, instrument: I, timing: Timing) -> Self {
        Self {
            platform,
            instrument,
            timing,
        }
    }

    // One line out of the cache, then the media latency. A clean line is
    // charged exactly like a dirty one, there is no short circuit.
    unsafe fn flush_line(&self, p: *const u8) {
        self.instrument.apply_event(Event::Flush(p as usize)).unwrap();
        self.platform.flush_line(p);

        self.instrument
            .apply_event(Event::Wait(self.timing.write_latency_ns))
            .unwrap();
        emulate_latency(
            &self.platform,
            self.timing.cpu_speed_mhz,
            self.timing.write_latency_ns,
        );
    }
}

impl<P: Platform, I: Instrument + Clone> PersistBackend for Emulated<P, I> {
    fn fence(&self) {
        self.instrument.apply_event(Event::Fence).unwrap();
        self.platform.fence();
    }

    unsafe fn persist_range(&self, ptr: *const u8, size: usize) {
        self.fence();
        if size > 0 {
            // start at the line covering ptr, stride whole lines until the
            // range end is passed
            let mut line = ptr as usize & !(CACHE_LINE_SIZE - 1);
            let end = ptr as usize + size;
            while line < end {
                self.flush_line(line as *const u8);
                line += CACHE_LINE_SIZE;
            }
        }
        self.fence();
    }

    unsafe fn copy_and_persist(&self, dst: *mut u8, src: *const u8, size: usize) {
        // the copy has to land in full before the first flush, a flush
        // only captures whatever the destination lines hold at that moment
        ptr::copy_nonoverlapping(src, dst, size);
        self.persist_range(dst as *const u8, size);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use instrument_pmem::{Collect, Event};

    use crate::{platform::Platform, timing::Timing};

    use super::{Emulated, PersistBackend};

    // no hardware behind it, and the clock jumps far enough per read that
    // every busy-wait finishes on its first check
    struct FakePlatform {
        clock: Cell<u64>,
    }

    impl FakePlatform {
        fn new() -> Self {
            Self {
                clock: Cell::new(0),
            }
        }
    }

    impl Platform for FakePlatform {
        unsafe fn flush_line(&self, _p: *const u8) {}

        fn fence(&self) {}

        fn read_clock(&self) -> u64 {
            let now = self.clock.get();
            self.clock.set(now + 1_000_000);
            now
        }
    }

    fn emulated(write_latency_ns: i64) -> (Emulated<FakePlatform, Collect>, Collect) {
        let collect = Collect::default();
        let backend = Emulated::with_instrument(
            FakePlatform::new(),
            collect.clone(),
            Timing::new(2200, write_latency_ns),
        );
        (backend, collect)
    }

    #[repr(align(64))]
    struct Aligned([u8; 512]);

    #[test]
    fn zero_size_issues_fences_but_no_flushes() {
        let (backend, collect) = emulated(500);
        let buf = Aligned([0u8; 512]);

        unsafe { backend.persist_range(buf.0.as_ptr(), 0) };

        assert_eq!(collect.fences(), 2);
        assert_eq!(collect.flushes(), 0);
    }

    #[test]
    fn aligned_range_flushes_one_per_line() {
        let (backend, collect) = emulated(0);
        let buf = Aligned([0u8; 512]);

        unsafe { backend.persist_range(buf.0.as_ptr(), 128) };

        assert_eq!(collect.flushes(), 2);
        assert_eq!(collect.fences(), 2);
    }

    #[test]
    fn unaligned_start_pulls_in_the_covering_line() {
        let (backend, collect) = emulated(0);
        let buf = Aligned([0u8; 512]);

        // [1, 129) touches the lines at 0, 64 and 128
        unsafe { backend.persist_range(buf.0.as_ptr().add(1), 128) };

        assert_eq!(collect.flushes(), 3);
    }

    #[test]
    fn flushed_addresses_are_aligned_strides() {
        let (backend, collect) = emulated(0);
        let buf = Aligned([0u8; 512]);
        let base = buf.0.as_ptr() as usize;

        // [70, 130) lives in the lines at 64 and 128
        unsafe { backend.persist_range(buf.0.as_ptr().add(70), 60) };

        let flushed: Vec<usize> = collect
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::Flush(addr) => Some(*addr),
                _ => None,
            })
            .collect();
        assert_eq!(flushed, vec![base + 64, base + 128]);
    }

    #[test]
    fn two_line_persist_charges_a_microsecond() {
        let (backend, collect) = emulated(500);
        let buf = Aligned([0u8; 512]);

        unsafe { backend.persist_range(buf.0.as_ptr(), 128) };

        assert_eq!(collect.flushes(), 2);
        assert_eq!(collect.fences(), 2);
        assert_eq!(collect.waited_ns(), 1000);
    }

    #[test]
    fn copy_and_persist_copies_bytes_and_charges_every_line() {
        let (backend, collect) = emulated(500);
        let mut dst = Aligned([0u8; 512]);
        let src: Vec<u8> = (0..200u32).map(|i| i as u8).collect();

        unsafe { backend.copy_and_persist(dst.0.as_mut_ptr(), src.as_ptr(), src.len()) };

        assert_eq!(&dst.0[..src.len()], &src[..]);
        // ceil(200 / 64) lines
        assert_eq!(collect.flushes(), 4);
        assert_eq!(collect.waited_ns(), 2000);
        assert_eq!(collect.fences(), 2);
    }

    #[test]
    fn repeated_persist_charges_the_same_cost() {
        let (backend, collect) = emulated(500);
        let buf = Aligned([0u8; 512]);

        unsafe { backend.persist_range(buf.0.as_ptr(), 256) };
        let first_flushes = collect.flushes();
        let first_waited = collect.waited_ns();

        // the range is clean now, the second pass must cost the same
        unsafe { backend.persist_range(buf.0.as_ptr(), 256) };

        assert_eq!(collect.flushes(), first_flushes * 2);
        assert_eq!(collect.waited_ns(), first_waited * 2);
    }

    #[test]
    fn bare_fence_emits_a_single_event() {
        let (backend, collect) = emulated(500);

        backend.fence();

        assert_eq!(*collect.events(), vec![Event::Fence]);
    }
}
