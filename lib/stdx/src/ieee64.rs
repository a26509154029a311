use std::fmt;

/// An IEEE 754 double precision number that implements `Eq` and `Hash` by
/// comparing bit patterns.
///
/// Useful for interning float constants in tables that require `Eq`. Note that
/// under bit equality `NaN == NaN` holds and `-0.0 != 0.0`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Ieee64(u64);

impl Ieee64 {
    pub fn from_bits(bits: u64) -> Ieee64 {
        Ieee64(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }
}

impl From<f64> for Ieee64 {
    fn from(val: f64) -> Ieee64 {
        Ieee64(val.to_bits())
    }
}

impl From<Ieee64> for f64 {
    fn from(val: Ieee64) -> f64 {
        f64::from_bits(val.0)
    }
}

impl fmt::Display for Ieee64 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", f64::from(*self))
    }
}

impl fmt::Debug for Ieee64 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", f64::from(*self))
    }
}
