//! Process-wide cache of zero vectors, used to materialize the "logically
//! all-zero" imaginary view of a real frame without allocating one per
//! frame.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// Sizes at or below this are cached for the life of the process; larger
/// requests are allocated (and intentionally leaked) individually rather
/// than growing the shared cache without bound.
const CACHE_THRESHOLD: usize = 1 << 16;

fn cache() -> &'static Mutex<HashMap<usize, &'static [f32]>> {
    static CACHE: OnceLock<Mutex<HashMap<usize, &'static [f32]>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns a shared zero-filled slice of the requested length.
pub fn zeros(len: usize) -> &'static [f32] {
    if len > CACHE_THRESHOLD {
        return Box::leak(vec![0.0f32; len].into_boxed_slice());
    }
    let mut guard = cache().lock().expect("zero cache poisoned");
    *guard
        .entry(len)
        .or_insert_with(|| Box::leak(vec![0.0f32; len].into_boxed_slice()))
}
