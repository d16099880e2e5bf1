//! Host reductions over any real vector.
//!
//! Class-backed vectors are read region by region into a fixed buffer of
//! `region_chunk` elements, so no full managed copy is ever made.

use crate::error::Result;
use crate::object::{Object, Value};
use crate::runtime::{object_region, Runtime};

impl Runtime {
    /// Sum of all elements, accumulated left to right from `0.0`.
    ///
    /// The order matches a plain sequential loop over the source buffer, so
    /// results are bit-identical to summing the native data directly.
    pub fn sum(&self, value: Value) -> Result<f64> {
        let chunk = self.config().region_chunk.max(1);
        self.with_object(value, |obj| {
            let mut acc = 0.0;
            for_each_region(obj, chunk, |xs| {
                for x in xs {
                    acc += *x;
                }
            })?;
            Ok(acc)
        })
    }

    /// Arithmetic mean; `NaN` for an empty vector.
    pub fn mean(&self, value: Value) -> Result<f64> {
        let n = self.length(value)?;
        if n == 0 {
            return Ok(f64::NAN);
        }
        Ok(self.sum(value)? / n as f64)
    }
}

/// Feed `obj`'s elements to `f` in order, at most `chunk` at a time.
fn for_each_region(obj: &Object, chunk: usize, mut f: impl FnMut(&[f64])) -> Result<()> {
    if let Object::Real(v) = obj {
        v.chunks(chunk).for_each(f);
        return Ok(());
    }

    let mut buf = vec![0.0; chunk];
    let mut start = 0;
    loop {
        let got = object_region(obj, start, &mut buf)?;
        if got == 0 {
            break;
        }
        f(&buf[..got]);
        start += got;
    }
    Ok(())
}
