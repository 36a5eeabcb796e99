//! Shared collection aliases and numeric helpers.
//!
//! Collections are keyed with FxHasher everywhere; numeric operations go
//! through `libm` so results do not depend on the platform's libc.

pub use rustc_hash::{FxHashMap, FxHashSet};

// ═══════════════════════════════════════════════════════════════════════════════
// IndexMap/IndexSet - insertion ordered, FxHasher
// ═══════════════════════════════════════════════════════════════════════════════

pub type IndexMap<K, V> =
    indexmap::IndexMap<K, V, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

pub type IndexSet<T> =
    indexmap::IndexSet<T, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

/// Create an empty IndexMap
#[inline]
pub fn index_map_new<K, V>() -> IndexMap<K, V>
where
    K: core::hash::Hash + Eq,
{
    indexmap::IndexMap::with_hasher(Default::default())
}

/// Create an empty IndexSet
#[inline]
pub fn index_set_new<T>() -> IndexSet<T>
where
    T: core::hash::Hash + Eq,
{
    indexmap::IndexSet::with_hasher(Default::default())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Math functions
// ═══════════════════════════════════════════════════════════════════════════════

/// Numeric operations with ECMAScript edge cases
pub mod math {
    /// `%` operator: remainder takes the sign of the dividend
    #[inline]
    pub fn remainder(x: f64, y: f64) -> f64 {
        libm::fmod(x, y)
    }

    /// `**` operator
    #[inline]
    pub fn pow(base: f64, exponent: f64) -> f64 {
        // libm follows C: pow(1, NaN) == 1 and pow(-1, ±Infinity) == 1
        if exponent.is_nan() {
            return f64::NAN;
        }
        if base.abs() == 1.0 && exponent.is_infinite() {
            return f64::NAN;
        }
        libm::pow(base, exponent)
    }

    #[inline]
    pub fn trunc(x: f64) -> f64 {
        libm::trunc(x)
    }

    /// ToInt32
    pub fn to_int32(n: f64) -> i32 {
        to_uint32(n) as i32
    }

    /// ToUint32
    pub fn to_uint32(n: f64) -> u32 {
        if !n.is_finite() || n == 0.0 {
            return 0;
        }
        let int = trunc(n);
        let modulo = libm::fmod(int, 4_294_967_296.0);
        let positive = if modulo < 0.0 {
            modulo + 4_294_967_296.0
        } else {
            modulo
        };
        positive as u32
    }
}
