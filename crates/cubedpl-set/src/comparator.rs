use std::sync::Arc;

/// A strict weak ordering of the elements.
pub trait Comparator<T>: Clone + Send + Sync + 'static {
    /// Whether `a` is ordered before `b`.
    fn less(&self, a: &T, b: &T) -> bool;
}

/// Ascending order of [PartialOrd].
#[derive(Debug, Default, Clone, Copy)]
pub struct LessThan;

/// Descending order of [PartialOrd].
#[derive(Debug, Default, Clone, Copy)]
pub struct GreaterThan;

impl<T: PartialOrd> Comparator<T> for LessThan {
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

impl<T: PartialOrd> Comparator<T> for GreaterThan {
    fn less(&self, a: &T, b: &T) -> bool {
        a > b
    }
}

/// A user defined ordering.
pub struct CompareFn<F> {
    f: Arc<F>,
}

impl<F> CompareFn<F> {
    /// Create an ordering from a closure returning whether its first argument comes first.
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }
}

impl<F> Clone for CompareFn<F> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<F> core::fmt::Debug for CompareFn<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("CompareFn")
    }
}

impl<T, F> Comparator<T> for CompareFn<F>
where
    F: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    fn less(&self, a: &T, b: &T) -> bool {
        (self.f)(a, b)
    }
}
