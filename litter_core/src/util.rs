//! Small numeric helpers shared by the window and the visit accumulator.
//!
//! Accumulation is done in f64 even though readings are f32 grams, so long
//! windows of ~5 kg values do not lose the sub-gram spread we threshold on.

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Arithmetic mean, or `None` for an empty input.
#[inline]
pub fn mean<I: IntoIterator<Item = f32>>(values: I) -> Option<f64> {
    let (n, sum) = values
        .into_iter()
        .fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + f64::from(v)));
    (n > 0).then(|| sum / n as f64)
}

/// Sample standard deviation (n - 1 denominator), or `None` below two values.
///
/// Single pass with Welford's online update; no intermediate allocation.
pub fn sample_std_dev<I: IntoIterator<Item = f32>>(values: I) -> Option<f64> {
    let mut n = 0usize;
    let mut mean = 0.0f64;
    let mut m2 = 0.0f64;
    for v in values {
        let x = f64::from(v);
        n += 1;
        let dx = x - mean;
        mean += dx / n as f64;
        m2 += dx * (x - mean);
    }
    if n < 2 {
        return None;
    }
    Some((m2 / (n - 1) as f64).max(0.0).sqrt())
}

/// Median of `buf`, reordering it in place. Even lengths average the two middles.
pub fn median_in_place(buf: &mut [f32]) -> Option<f32> {
    if buf.is_empty() {
        return None;
    }
    buf.sort_unstable_by(f32::total_cmp);
    let mid = buf.len() / 2;
    if buf.len() % 2 == 1 {
        Some(buf[mid])
    } else {
        Some(((f64::from(buf[mid - 1]) + f64::from(buf[mid])) / 2.0) as f32)
    }
}

/// Whole seconds for log fields; readings carry milliseconds.
#[inline]
pub fn ms_to_secs(ms: u64) -> f64 {
    ms as f64 / MILLIS_PER_SEC as f64
}
