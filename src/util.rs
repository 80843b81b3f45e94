use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

pub fn format_millis(duration: Duration) -> String {
    let millis = duration.as_secs_f64() * 1000.0;
    if millis < 1.0 {
        format!("{:.0} µs", duration.as_secs_f64() * 1_000_000.0)
    } else {
        format!("{millis:.2} ms")
    }
}

pub fn short_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_owned();
    }
    let mut shortened = name.chars().take(max_chars.saturating_sub(1)).collect::<String>();
    shortened.push('…');
    shortened
}

/// Deterministic pair in `-1.0..=1.0` derived from `value`.
pub fn stable_pair(value: impl Hash) -> (f32, f32) {
    let hash = stable_hash(value);

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

pub fn stable_hash(value: impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
