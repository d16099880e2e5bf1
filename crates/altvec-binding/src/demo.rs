//! Example call sites: an owned value handed to the host, and a borrowed
//! value reduced by the host while the native buffer is still in scope.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use altvec_host::{Runtime, Value};

use crate::error::Result;
use crate::wrap::{wrap_slice, wrap_vec};

/// Owned value over `[-2, -1, 0, 1, 2]`. Freed when the host collects it.
pub fn doubles(rt: &Runtime) -> Result<Value> {
    wrap_vec(rt, vec![-2.0, -1.0, 0.0, 1.0, 2.0])
}

/// `n` uniform values in `[0, 1)`. Deterministic when `seed` is given.
pub fn randoms(n: usize, seed: Option<u64>) -> Vec<f64> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    (0..n).map(|_| rng.gen::<f64>()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DemoSum {
    pub len: usize,
    /// Sum computed by the host's reduction over the borrowed value.
    pub host: f64,
    /// Sum computed by iterating the native buffer directly.
    pub native: f64,
}

impl DemoSum {
    pub fn bit_identical(&self) -> bool {
        self.host.to_bits() == self.native.to_bits()
    }
}

/// Wrap a local buffer without giving up ownership, and sum it through the host.
pub fn doubles_example(rt: &Runtime, n: usize, seed: Option<u64>) -> Result<DemoSum> {
    let data = randoms(n, seed);

    // SAFETY: `data` outlives every use of `value`, which never leaves this
    // function; nothing writes to `data` while the host reads it.
    let value = unsafe { wrap_slice(rt, &data)? };
    let root = rt.protect(value)?;
    let host = rt.sum(root.value())?;
    drop(root);

    let mut native = 0.0;
    for x in &data {
        native += *x;
    }

    Ok(DemoSum {
        len: data.len(),
        host,
        native,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::init;

    #[test]
    fn seeded_randoms_are_reproducible() {
        let a = randoms(16, Some(42));
        let b = randoms(16, Some(42));
        assert_eq!(a, b);
        assert!(a.iter().all(|x| (0.0..1.0).contains(x)));
    }

    #[test]
    fn borrowed_sum_matches_native() {
        init().unwrap();
        let rt = Runtime::default();
        let s = doubles_example(&rt, 10, Some(7)).unwrap();
        assert_eq!(s.len, 10);
        assert!(s.bit_identical());
    }
}
