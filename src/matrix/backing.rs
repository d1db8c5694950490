//! Pluggable storage backings for matrix cells, trading precision for
//! memory. `f32` is full precision; the others quantize into a fixed
//! integer range scaled against a configured maximum magnitude, which is
//! the trade self-similarity matrices over long sequences need to stay
//! within memory budget.

/// A fixed-size array of scalar cells convertible to and from `f32`.
pub trait Backing: Clone + std::fmt::Debug {
    /// Allocate `len` cells, all holding `value`. `scale` is the maximum
    /// magnitude the backing needs to represent; it is ignored by
    /// full-precision backings.
    fn filled(value: f32, len: usize, scale: f32) -> Self;
    fn get(&self, idx: usize) -> f32;
    fn set(&mut self, idx: usize, value: f32);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug)]
pub struct F32Backing {
    data: Vec<f32>,
}

impl Backing for F32Backing {
    fn filled(value: f32, len: usize, _scale: f32) -> Self {
        F32Backing {
            data: vec![value; len],
        }
    }
    fn get(&self, idx: usize) -> f32 {
        self.data[idx]
    }
    fn set(&mut self, idx: usize, value: f32) {
        self.data[idx] = value;
    }
    fn len(&self) -> usize {
        self.data.len()
    }
}

#[derive(Clone, Debug)]
pub struct I32Backing {
    data: Vec<i32>,
    scale: f32,
}

impl Backing for I32Backing {
    fn filled(value: f32, len: usize, scale: f32) -> Self {
        let scale = if scale <= 0.0 { 1.0 } else { scale };
        let mut b = I32Backing {
            data: vec![0; len],
            scale,
        };
        for i in 0..len {
            b.set(i, value);
        }
        b
    }
    fn get(&self, idx: usize) -> f32 {
        (self.data[idx] as f64 / i32::MAX as f64 * self.scale as f64) as f32
    }
    fn set(&mut self, idx: usize, value: f32) {
        let normalized = (value / self.scale).clamp(-1.0, 1.0);
        self.data[idx] = (normalized as f64 * i32::MAX as f64) as i32;
    }
    fn len(&self) -> usize {
        self.data.len()
    }
}

#[derive(Clone, Debug)]
pub struct I8Backing {
    data: Vec<i8>,
    scale: f32,
}

impl Backing for I8Backing {
    fn filled(value: f32, len: usize, scale: f32) -> Self {
        let scale = if scale <= 0.0 { 1.0 } else { scale };
        let mut b = I8Backing {
            data: vec![0; len],
            scale,
        };
        for i in 0..len {
            b.set(i, value);
        }
        b
    }
    fn get(&self, idx: usize) -> f32 {
        self.data[idx] as f32 / i8::MAX as f32 * self.scale
    }
    fn set(&mut self, idx: usize, value: f32) {
        let normalized = (value / self.scale).clamp(-1.0, 1.0);
        self.data[idx] = (normalized * i8::MAX as f32).round() as i8;
    }
    fn len(&self) -> usize {
        self.data.len()
    }
}

/// Unsigned-byte-normalized backing, for non-negative quantities such as
/// self-similarity distances.
#[derive(Clone, Debug)]
pub struct U8Backing {
    data: Vec<u8>,
    scale: f32,
}

impl Backing for U8Backing {
    fn filled(value: f32, len: usize, scale: f32) -> Self {
        let scale = if scale <= 0.0 { 1.0 } else { scale };
        let mut b = U8Backing {
            data: vec![0; len],
            scale,
        };
        for i in 0..len {
            b.set(i, value);
        }
        b
    }
    fn get(&self, idx: usize) -> f32 {
        self.data[idx] as f32 / u8::MAX as f32 * self.scale
    }
    fn set(&mut self, idx: usize, value: f32) {
        let normalized = (value / self.scale).clamp(0.0, 1.0);
        self.data[idx] = (normalized * u8::MAX as f32).round() as u8;
    }
    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u8_backing_round_trips_within_quantization_step() {
        let mut b = U8Backing::filled(0.0, 4, 10.0);
        b.set(2, 5.0);
        assert!((b.get(2) - 5.0).abs() < 10.0 / 255.0);
    }

    #[test]
    fn f32_backing_is_exact() {
        let mut b = F32Backing::filled(0.0, 2, 1.0);
        b.set(0, 1.234_567);
        assert_eq!(b.get(0), 1.234_567);
    }
}
