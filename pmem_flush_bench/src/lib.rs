// Benches live in a separate crate so the library does not inherit their
// dependency set, and because latency measurement over emulated flushes
// does not fit the standard benchmarking harness well.
use histogram::Histogram;

pub fn display_histogram(name: &str, h: &Histogram) {
    println!("{name}.min:ns={}", h.minimum().unwrap());
    println!("{name}.max:ns={}", h.maximum().unwrap());
    println!("{name}.mean:ns={}", h.mean().unwrap());
    println!("{name}.stddev:ns={}", h.stddev().unwrap());
    for percentile in [50.0, 90.0, 95.0, 99.0, 99.9] {
        println!("{name}.p{percentile}:ns={}", h.percentile(percentile).unwrap());
    }
}
