use crate::{RADIX, RADIX_BITS, SortOrder};
use cubedpl_runtime::element::CubeElement;
use half::f16;

mod sealed {
    pub trait Sealed {}
}

/// A key sortable by the radix sort.
///
/// Keys are mapped to unsigned integers whose order matches the order of the keys: signed
/// integers flip their sign bit, floats flip their sign bit when positive and every bit when
/// negative. Floats are therefore ordered as by `total_cmp`: `-0.0` before `0.0`, negative NaNs
/// first and positive NaNs last.
pub trait RadixKey: CubeElement + PartialOrd + sealed::Sealed {
    /// Number of bits of the key.
    const BITS: u32;

    /// Unsigned image of the key, preserving order.
    fn to_radix_bits(self) -> u64;

    /// Number of digits of the key.
    fn digits() -> u32 {
        Self::BITS.div_ceil(RADIX_BITS)
    }
}

/// Bucket of a key for a digit, complemented for descending order.
pub fn radix_bucket<K: RadixKey>(key: K, digit: u32, order: SortOrder) -> u32 {
    let bucket = ((key.to_radix_bits() >> (digit * RADIX_BITS)) & (RADIX as u64 - 1)) as u32;

    match order {
        SortOrder::Ascending => bucket,
        SortOrder::Descending => RADIX - 1 - bucket,
    }
}

macro_rules! radix_unsigned {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl RadixKey for $ty {
                const BITS: u32 = <$ty>::BITS;

                fn to_radix_bits(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

macro_rules! radix_signed {
    ($($ty:ty => $unsigned:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl RadixKey for $ty {
                const BITS: u32 = <$ty>::BITS;

                fn to_radix_bits(self) -> u64 {
                    ((self as $unsigned) ^ (1 << (<$ty>::BITS - 1))) as u64
                }
            }
        )*
    };
}

macro_rules! radix_float {
    ($($ty:ty => $bits:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl RadixKey for $ty {
                const BITS: u32 = <$bits>::BITS;

                fn to_radix_bits(self) -> u64 {
                    let bits = self.to_bits();
                    let sign: $bits = 1 << (<$bits>::BITS - 1);

                    match bits & sign {
                        0 => (bits | sign) as u64,
                        _ => (!bits) as u64,
                    }
                }
            }
        )*
    };
}

radix_unsigned!(u8, u16, u32, u64);
radix_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64);
radix_float!(f32 => u32, f64 => u64, f16 => u16);

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ordered<K: RadixKey + core::fmt::Debug>(keys: &[K]) {
        for pair in keys.windows(2) {
            assert!(
                pair[0].to_radix_bits() < pair[1].to_radix_bits(),
                "{:?} should be before {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn signed_keys_keep_order() {
        assert_ordered(&[i8::MIN, -1, 0, 1, i8::MAX]);
        assert_ordered(&[i64::MIN, -5, 0, 7, i64::MAX]);
    }

    #[test]
    fn float_keys_keep_order() {
        assert_ordered(&[
            f32::NEG_INFINITY,
            -2.5,
            -f32::MIN_POSITIVE,
            -0.0,
            0.0,
            1.0e-30,
            3.0,
            f32::INFINITY,
            f32::NAN,
        ]);
        assert_ordered(&[f64::MIN, -1.0, 0.0, f64::MAX]);
        assert_ordered(&[f16::from_f32(-1.5), f16::ZERO, f16::from_f32(2.0)]);
    }

    #[test]
    fn digits_cover_the_key() {
        assert_eq!(u8::digits(), 1);
        assert_eq!(f16::digits(), 2);
        assert_eq!(i32::digits(), 4);
        assert_eq!(f64::digits(), 8);
    }

    #[test]
    fn descending_complements_the_bucket() {
        assert_eq!(radix_bucket(0x1234u16, 0, SortOrder::Ascending), 0x34);
        assert_eq!(radix_bucket(0x1234u16, 1, SortOrder::Ascending), 0x12);
        assert_eq!(radix_bucket(0x1234u16, 1, SortOrder::Descending), 0xff - 0x12);
    }
}
