/// Compute the average of two values without overflow.
pub trait Average {
    fn avg(a: Self, b: Self) -> Self;
}

macro_rules! impl_float {
    ( $t:ty ) => {
        impl Average for $t {
            fn avg(a: Self, b: Self) -> Self {
                a / 2.0 + b / 2.0
            }
        }
    };
}

macro_rules! impl_int {
    ( $t:ty ) => {
        impl Average for $t {
            /// Ref: <http://aggregate.org/MAGIC/#Average%20of%20Integers>
            fn avg(a: Self, b: Self) -> Self {
                (a & b) + ((a ^ b) >> 1)
            }
        }
    };
}

impl_float!(f32);
impl_float!(f64);
impl_int!(i16);
impl_int!(i32);
impl_int!(i64);
impl_int!(isize);
