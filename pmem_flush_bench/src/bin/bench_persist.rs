use std::{error::Error, time::Instant};

use crc32fast::Hasher;
use histogram::Histogram;
use instrument_pmem::Collect;
use pmem_flush::{Emulated, HostPlatform, MappedArena, PersistBackend, Timing, CACHE_LINE_SIZE};
use pmem_flush_bench::display_histogram;
use rand::RngCore;
use test_utils::arena_file;

// TODO measure persist_range separately from the copy

struct Args {
    record_size_bytes: usize,
    num_records: usize,
    cpu_speed_mhz: u64,
    write_latency_ns: i64,
}

impl Args {
    fn parse() -> Result<Self, pico_args::Error> {
        let mut pargs = pico_args::Arguments::from_env();

        let mut args = Args::default();
        if let Some(v) = pargs.opt_value_from_str("--record-size-bytes")? {
            args.record_size_bytes = v;
        }

        if let Some(v) = pargs.opt_value_from_str("--num-records")? {
            args.num_records = v;
        }

        if let Some(v) = pargs.opt_value_from_str("--cpu-speed-mhz")? {
            args.cpu_speed_mhz = v;
        }

        if let Some(v) = pargs.opt_value_from_str("--write-latency-ns")? {
            args.write_latency_ns = v;
        }

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            eprintln!("Error: unknown arguments: {:?}.", remaining);
            std::process::exit(1)
        }
        Ok(args)
    }
}

impl Default for Args {
    fn default() -> Self {
        Self {
            record_size_bytes: 256,
            num_records: 100_000,
            cpu_speed_mhz: 2200,
            write_latency_ns: 500,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse()?;

    let timing = Timing::new(args.cpu_speed_mhz, args.write_latency_ns);
    let arena_size = args.record_size_bytes * args.num_records;
    let lines_per_record =
        (args.record_size_bytes + CACHE_LINE_SIZE - 1) / CACHE_LINE_SIZE;

    eprintln!("arena size {} bytes", arena_size);
    eprintln!(
        "about to persist {} records of {} bytes, {} lines each",
        args.num_records, args.record_size_bytes, lines_per_record
    );
    eprintln!(
        "expected emulated charge per record {} ns",
        lines_per_record as i64 * args.write_latency_ns
    );

    let path = arena_file("bench_persist");
    let mut arena = MappedArena::create(&path, arena_size)?;
    let backend = Emulated::new(timing);

    let mut source = vec![0u8; arena_size];
    rand::thread_rng().fill_bytes(&mut source);

    let mut source_hasher = Hasher::new();
    source_hasher.update(&source);
    let source_checksum = source_hasher.finalize();

    let mut histo = Histogram::new();
    let t0 = Instant::now();
    for record_no in 0..args.num_records {
        let offset = record_no * args.record_size_bytes;
        let record_t0 = Instant::now();
        unsafe {
            backend.copy_and_persist(
                arena.as_mut_ptr().add(offset),
                source.as_ptr().add(offset),
                args.record_size_bytes,
            )
        };
        histo
            .increment(record_t0.elapsed().as_nanos() as u64)
            .unwrap();
    }
    let elapsed = t0.elapsed();

    eprintln!("elapsed = {:?}", elapsed);
    eprintln!("elapsed / num_records = {:?}", elapsed / args.num_records as u32);
    eprintln!(
        "throughput = {} bytes/s",
        (arena_size as f64 / elapsed.as_secs_f64()) as u64
    );

    eprintln!("Persist duration histo:");
    display_histogram("copy_and_persist", &histo);

    // one instrumented pass over a single record to report what a persist
    // actually issues
    let collect = Collect::default();
    let instrumented =
        Emulated::with_instrument(HostPlatform, collect.clone(), timing);
    unsafe { instrumented.persist_range(arena.as_ptr(), args.record_size_bytes) };
    eprintln!(
        "per record: {} flushes, {} fences, {} ns charged",
        collect.flushes(),
        collect.fences(),
        collect.waited_ns()
    );

    eprintln!("Validating...");
    let mut arena_hasher = Hasher::new();
    arena_hasher.update(arena.as_slice());
    assert_eq!(arena_hasher.finalize(), source_checksum);
    eprintln!("Ok");
    Ok(())
}
