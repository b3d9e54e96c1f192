//! Scoped-thread parallelism for independent batch instances.
//!
//! Uses `std::thread::scope`: no runtime, no pool, threads are joined before
//! the call returns so borrowed buffers never outlive it.

/// Execute `f(chunk_start, chunk_end)` over `[0, count)` split across cores.
///
/// Chunks hold at least `min_per_thread` items; when the work does not
/// exceed one chunk it runs inline on the calling thread.
#[inline]
pub fn parallel_for_chunks<F>(count: usize, min_per_thread: usize, f: F)
where
    F: Fn(usize, usize) + Sync + Send + Copy,
{
    if count == 0 {
        return;
    }
    let num_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let chunk_size = count.div_ceil(num_threads).max(min_per_thread.max(1));

    if count <= chunk_size || num_threads <= 1 {
        f(0, count);
        return;
    }

    std::thread::scope(|s| {
        for chunk_start in (0..count).step_by(chunk_size) {
            let chunk_end = (chunk_start + chunk_size).min(count);
            s.spawn(move || {
                f(chunk_start, chunk_end);
            });
        }
    });
}
