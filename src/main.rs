use log::LevelFilter;
use pmem_flush::{Emulated, MappedArena, PersistBackend, Timing};
use std::{env, error::Error, time::Instant};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().filter_level(LevelFilter::Info).init();
    log::info!("Starting flush demo");

    let timing = Timing::default();
    let backend = Emulated::new(timing);

    let path = env::temp_dir().join("pflush_demo.arena");
    let mut arena = MappedArena::create(&path, 1 << 20)?;
    log::info!("mapped {} bytes at {}", arena.len(), path.display());

    let record = vec![0x42u8; 4096];
    let t0 = Instant::now();
    let mut offset = 0;
    while offset + record.len() <= arena.len() {
        unsafe {
            backend.copy_and_persist(arena.as_mut_ptr().add(offset), record.as_ptr(), record.len())
        };
        offset += record.len();
    }

    log::info!(
        "persisted {} bytes in {:?}, emulated write latency {} ns per line",
        offset,
        t0.elapsed(),
        timing.write_latency_ns
    );
    Ok(())
}
