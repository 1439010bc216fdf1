use half::f16;

/// Element that can be stored in a device buffer.
pub trait CubeElement: bytemuck::Pod + Send + Sync + core::fmt::Debug + 'static {
    /// The name of the element type, used in kernel names.
    fn type_name() -> &'static str {
        core::any::type_name::<Self>()
    }

    /// View a slice of elements as bytes.
    fn as_bytes(slice: &[Self]) -> &[u8] {
        bytemuck::cast_slice(slice)
    }

    /// Decode elements from bytes that may not be aligned.
    fn from_bytes(bytes: &[u8]) -> Vec<Self> {
        bytemuck::pod_collect_to_vec(bytes)
    }
}

impl<T: bytemuck::Pod + Send + Sync + core::fmt::Debug + 'static> CubeElement for T {}

/// Type that encompasses both (unsigned or signed) integers and floats.
///
/// Integer arithmetic wraps, so that scans over large inputs stay associative instead of
/// overflowing.
pub trait Numeric: CubeElement + PartialOrd {
    /// Additive identity.
    fn zero() -> Self;
    /// Multiplicative identity.
    fn one() -> Self;
    /// The smallest value of the type, the identity of `max`.
    fn lowest() -> Self;
    /// The largest value of the type, the identity of `min`.
    fn highest() -> Self;
    /// Addition, wrapping for integers.
    fn add(self, rhs: Self) -> Self;
    /// Multiplication, wrapping for integers.
    fn mul(self, rhs: Self) -> Self;
    /// Lossy conversion from a `u32`.
    fn from_u32(value: u32) -> Self;
}

macro_rules! impl_numeric_int {
    ($($ty:ty),*) => {
        $(
            impl Numeric for $ty {
                fn zero() -> Self {
                    <$ty as num_traits::Zero>::zero()
                }
                fn one() -> Self {
                    <$ty as num_traits::One>::one()
                }
                fn lowest() -> Self {
                    <$ty as num_traits::Bounded>::min_value()
                }
                fn highest() -> Self {
                    <$ty as num_traits::Bounded>::max_value()
                }
                fn add(self, rhs: Self) -> Self {
                    num_traits::WrappingAdd::wrapping_add(&self, &rhs)
                }
                fn mul(self, rhs: Self) -> Self {
                    num_traits::WrappingMul::wrapping_mul(&self, &rhs)
                }
                fn from_u32(value: u32) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

macro_rules! impl_numeric_float {
    ($($ty:ty),*) => {
        $(
            impl Numeric for $ty {
                fn zero() -> Self {
                    0.0
                }
                fn one() -> Self {
                    1.0
                }
                fn lowest() -> Self {
                    <$ty>::NEG_INFINITY
                }
                fn highest() -> Self {
                    <$ty>::INFINITY
                }
                fn add(self, rhs: Self) -> Self {
                    self + rhs
                }
                fn mul(self, rhs: Self) -> Self {
                    self * rhs
                }
                fn from_u32(value: u32) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_numeric_int!(u8, u16, u32, u64, i8, i16, i32, i64);
impl_numeric_float!(f32, f64);

impl Numeric for f16 {
    fn zero() -> Self {
        f16::ZERO
    }
    fn one() -> Self {
        f16::ONE
    }
    fn lowest() -> Self {
        f16::NEG_INFINITY
    }
    fn highest() -> Self {
        f16::INFINITY
    }
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }
    fn from_u32(value: u32) -> Self {
        f16::from_f32(value as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_add_wraps() {
        assert_eq!(Numeric::add(u8::MAX, 2u8), 1);
        assert_eq!(Numeric::add(i32::MAX, 1i32), i32::MIN);
    }

    #[test]
    fn float_bounds_are_infinite() {
        assert_eq!(<f32 as Numeric>::lowest(), f32::NEG_INFINITY);
        assert_eq!(<f16 as Numeric>::highest(), f16::INFINITY);
    }

    #[test]
    fn from_bytes_handles_unaligned_input() {
        let values = [1u32, 2, 3];
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(u32::as_bytes(&values));

        assert_eq!(u32::from_bytes(&bytes[1..]), values.to_vec());
    }
}
