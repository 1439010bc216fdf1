use cubedpl_runtime::element::{CubeElement, Numeric};
use num_traits::PrimInt;
use std::sync::Arc;

/// An associative binary operator with its identity.
///
/// The operator doesn't need to be commutative: every scan and reduction combines elements in
/// index order, the left operand always covering the lower indices.
pub trait ScanInstruction<N: CubeElement>: Clone + Send + Sync + 'static {
    /// The identity of the operator.
    fn identity(&self) -> N;

    /// Combine two partial results, `lhs` covering the elements before `rhs`.
    fn combine(&self, lhs: N, rhs: N) -> N;
}

/// Sum, wrapping on overflow for integers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Add;

/// Product, wrapping on overflow for integers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mul;

/// Maximum.
#[derive(Debug, Default, Clone, Copy)]
pub struct Max;

/// Minimum.
#[derive(Debug, Default, Clone, Copy)]
pub struct Min;

/// Bitwise or.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitOr;

/// Bitwise and.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitAnd;

/// Bitwise xor.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitXor;

impl<N: Numeric> ScanInstruction<N> for Add {
    fn identity(&self) -> N {
        N::zero()
    }

    fn combine(&self, lhs: N, rhs: N) -> N {
        Numeric::add(lhs, rhs)
    }
}

impl<N: Numeric> ScanInstruction<N> for Mul {
    fn identity(&self) -> N {
        N::one()
    }

    fn combine(&self, lhs: N, rhs: N) -> N {
        Numeric::mul(lhs, rhs)
    }
}

impl<N: Numeric> ScanInstruction<N> for Max {
    fn identity(&self) -> N {
        N::lowest()
    }

    fn combine(&self, lhs: N, rhs: N) -> N {
        if rhs > lhs { rhs } else { lhs }
    }
}

impl<N: Numeric> ScanInstruction<N> for Min {
    fn identity(&self) -> N {
        N::highest()
    }

    fn combine(&self, lhs: N, rhs: N) -> N {
        if rhs < lhs { rhs } else { lhs }
    }
}

impl<N: CubeElement + PrimInt> ScanInstruction<N> for BitOr {
    fn identity(&self) -> N {
        N::zero()
    }

    fn combine(&self, lhs: N, rhs: N) -> N {
        lhs | rhs
    }
}

impl<N: CubeElement + PrimInt> ScanInstruction<N> for BitAnd {
    fn identity(&self) -> N {
        !N::zero()
    }

    fn combine(&self, lhs: N, rhs: N) -> N {
        lhs & rhs
    }
}

impl<N: CubeElement + PrimInt> ScanInstruction<N> for BitXor {
    fn identity(&self) -> N {
        N::zero()
    }

    fn combine(&self, lhs: N, rhs: N) -> N {
        lhs ^ rhs
    }
}

/// A user defined operator.
///
/// `f` must be associative and `identity` must be its identity, otherwise the result depends on
/// how the input is split in tiles.
pub struct ScanFn<N, F> {
    identity: N,
    f: Arc<F>,
}

impl<N: Copy, F> Clone for ScanFn<N, F> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity,
            f: self.f.clone(),
        }
    }
}

impl<N: core::fmt::Debug, F> core::fmt::Debug for ScanFn<N, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScanFn")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl<N, F> ScanFn<N, F>
where
    N: CubeElement,
    F: Fn(N, N) -> N + Send + Sync + 'static,
{
    /// Create an operator from a closure and its identity.
    pub fn new(identity: N, f: F) -> Self {
        Self {
            identity,
            f: Arc::new(f),
        }
    }
}

impl<N, F> ScanInstruction<N> for ScanFn<N, F>
where
    N: CubeElement,
    F: Fn(N, N) -> N + Send + Sync + 'static,
{
    fn identity(&self) -> N {
        self.identity
    }

    fn combine(&self, lhs: N, rhs: N) -> N {
        (self.f)(lhs, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities() {
        assert_eq!(ScanInstruction::<u8>::identity(&Add), 0);
        assert_eq!(ScanInstruction::<i32>::identity(&Mul), 1);
        assert_eq!(ScanInstruction::<i16>::identity(&Max), i16::MIN);
        assert_eq!(ScanInstruction::<f32>::identity(&Min), f32::INFINITY);
        assert_eq!(ScanInstruction::<u16>::identity(&BitAnd), u16::MAX);
        assert_eq!(ScanInstruction::<u64>::identity(&BitXor), 0);
    }

    #[test]
    fn add_wraps() {
        assert_eq!(Add.combine(u8::MAX, 2u8), 1);
        assert_eq!(Add.combine(i8::MAX, 1i8), i8::MIN);
    }

    #[test]
    fn closure_keeps_operand_order() {
        let first = ScanFn::new(u32::MAX, |a: u32, b: u32| if a == u32::MAX { b } else { a });

        assert_eq!(first.combine(1, 2), 1);
        assert_eq!(first.combine(2, 1), 2);
        assert_eq!(first.combine(first.identity(), 7), 7);
    }
}
