use crate::Average;
use num_traits::AsPrimitive;
use num_traits::NumAssign;
use std::fmt;

/// Numeric types that can be used as point coordinates.
///
/// Coordinates keep their native arithmetic: integer coordinates get integer
/// (truncating) centroids, which makes the exact-equality convergence test of
/// [`KMeans`][crate::KMeans] well-defined.
///
/// Sums and differences of coordinates are computed in [`Coordinate::Wide`],
/// which holds them without overflow.
pub trait Coordinate
where
    Self: nalgebra::Scalar + Copy + PartialOrd + fmt::Display,
    Self: NumAssign + AsPrimitive<f64> + Average,
{
    /// `i128` for integers, `f64` for floats.
    type Wide: Copy + PartialOrd + fmt::Debug + NumAssign;

    fn widen(self) -> Self::Wide;

    /// Convert back from the wide type, saturating at the bounds of `Self`.
    fn narrow(wide: Self::Wide) -> Self;

    /// Convert an observation count into a divisor.
    fn wide_count(count: usize) -> Self::Wide;
}

macro_rules! int_coordinate {
    ( $($t:ty,)* ) => { $(
        impl Coordinate for $t {
            type Wide = i128;

            fn widen(self) -> i128 {
                self as i128
            }

            fn narrow(wide: i128) -> Self {
                wide.clamp(<$t>::MIN as i128, <$t>::MAX as i128) as $t
            }

            fn wide_count(count: usize) -> i128 {
                count as i128
            }
        }
    )*};
}

macro_rules! float_coordinate {
    ( $($t:ty,)* ) => { $(
        impl Coordinate for $t {
            type Wide = f64;

            fn widen(self) -> f64 {
                self as f64
            }

            fn narrow(wide: f64) -> Self {
                wide as $t
            }

            fn wide_count(count: usize) -> f64 {
                count as f64
            }
        }
    )*};
}

int_coordinate! {
    i16, i32, i64, isize,
}

float_coordinate! {
    f32, f64,
}
