use crate::{Backend, Selection, Submission, Waitable};

/// Resource type of the backend of a policy.
pub type ResourceOf<P> = <<P as Policy>::Backend as Backend>::Resource;

/// A policy distributing work over the resources of a backend.
pub trait Policy: Send + Sync {
    /// The backend running the work.
    type Backend: Backend;

    /// The backend of the policy.
    fn backend(&self) -> &Self::Backend;

    /// The resources the policy selects from.
    fn get_resources(&self) -> Vec<ResourceOf<Self>>;
}

/// A policy always able to select a resource.
pub trait Select: Policy {
    /// Select the resource of the next submission.
    fn select(&self) -> Selection<ResourceOf<Self>>;
}

/// A policy that may fail to select a resource.
pub trait TrySelect: Policy {
    /// Select the resource of the next submission, if any is available.
    fn try_select(&self) -> Option<Selection<ResourceOf<Self>>>;
}

impl<P: Select> TrySelect for P {
    fn try_select(&self) -> Option<Selection<ResourceOf<Self>>> {
        Some(self.select())
    }
}

/// The function of a submission attempt that couldn't select a resource.
#[derive(Debug)]
pub struct Rejected<F>(pub F);

impl<F> Rejected<F> {
    /// The function that wasn't submitted.
    pub fn into_inner(self) -> F {
        self.0
    }
}

/// A policy able to attempt a submission.
pub trait TrySubmit: Policy {
    /// Submit `f` on a selected resource, giving the function back when no resource could be
    /// selected.
    fn try_submit<W, F>(&self, f: F) -> Result<Submission<W>, Rejected<F>>
    where
        F: FnOnce(&ResourceOf<Self>) -> W;
}

impl<P: TrySelect> TrySubmit for P {
    fn try_submit<W, F>(&self, f: F) -> Result<Submission<W>, Rejected<F>>
    where
        F: FnOnce(&ResourceOf<Self>) -> W,
    {
        match self.try_select() {
            Some(selection) => Ok(selection.submit(self.backend(), f)),
            None => Err(Rejected(f)),
        }
    }
}

/// A policy able to submit work.
///
/// Submitting never fails: a policy built on [TrySubmit] retries until a resource is selected.
/// Only the following capabilities are available to a policy implementing [Submit] directly:
///
/// ```compile_fail
/// use cubedpl_select::{Backend, Policy, Submit, Submission, TrySubmit};
///
/// struct Pool;
///
/// impl Backend for Pool {
///     type Resource = u32;
///
///     fn get_resources(&self) -> Vec<u32> {
///         vec![0]
///     }
/// }
///
/// struct OnlySubmit(Pool);
///
/// impl Policy for OnlySubmit {
///     type Backend = Pool;
///
///     fn backend(&self) -> &Pool {
///         &self.0
///     }
///
///     fn get_resources(&self) -> Vec<u32> {
///         self.0.get_resources()
///     }
/// }
///
/// impl Submit for OnlySubmit {
///     fn submit<W, F: FnOnce(&u32) -> W>(&self, f: F) -> Submission<W> {
///         cubedpl_select::Selection::new(0, 0).submit(&self.0, f)
///     }
/// }
///
/// let _ = OnlySubmit(Pool).try_submit(|_| ());
/// ```
pub trait Submit: Policy {
    /// Submit `f` on a selected resource.
    fn submit<W, F>(&self, f: F) -> Submission<W>
    where
        F: FnOnce(&ResourceOf<Self>) -> W;
}

impl<P: TrySubmit> Submit for P {
    fn submit<W, F>(&self, f: F) -> Submission<W>
    where
        F: FnOnce(&ResourceOf<Self>) -> W,
    {
        let mut f = f;
        let mut attempts = 0usize;

        loop {
            match self.try_submit(f) {
                Ok(submission) => return submission,
                Err(Rejected(rejected)) => f = rejected,
            }

            attempts += 1;
            if attempts % 1024 == 0 {
                log::debug!("No resource selected after {attempts} attempts");
            }
            std::thread::yield_now();
        }
    }
}

/// A policy able to submit work and wait for its completion.
///
/// A policy implementing [SubmitAndWait] directly can't submit without waiting, and only work
/// returning a [Waitable] value can be waited on:
///
/// ```compile_fail
/// use cubedpl_select::{Backend, RoundRobinPolicy, SubmitAndWait};
///
/// struct Pool;
///
/// impl Backend for Pool {
///     type Resource = u32;
///
///     fn get_resources(&self) -> Vec<u32> {
///         vec![0, 1]
///     }
/// }
///
/// let policy = RoundRobinPolicy::new(Pool).unwrap();
/// policy.submit_and_wait(|resource| *resource + 1);
/// ```
///
/// ```compile_fail
/// use cubedpl_select::{Backend, Policy, Submit, SubmitAndWait, Waitable};
///
/// struct Pool;
///
/// impl Backend for Pool {
///     type Resource = u32;
///
///     fn get_resources(&self) -> Vec<u32> {
///         vec![0]
///     }
/// }
///
/// struct OnlySubmitAndWait(Pool);
///
/// impl Policy for OnlySubmitAndWait {
///     type Backend = Pool;
///
///     fn backend(&self) -> &Pool {
///         &self.0
///     }
///
///     fn get_resources(&self) -> Vec<u32> {
///         self.0.get_resources()
///     }
/// }
///
/// impl SubmitAndWait for OnlySubmitAndWait {
///     fn submit_and_wait<W: Waitable, F: FnOnce(&u32) -> W>(&self, f: F) -> W::Output {
///         f(&0).wait()
///     }
/// }
///
/// let _ = OnlySubmitAndWait(Pool).submit(|_| ());
/// ```
pub trait SubmitAndWait: Policy {
    /// Submit `f` on a selected resource and wait for the work it returns.
    fn submit_and_wait<W, F>(&self, f: F) -> W::Output
    where
        W: Waitable,
        F: FnOnce(&ResourceOf<Self>) -> W;
}

impl<P: Submit> SubmitAndWait for P {
    fn submit_and_wait<W, F>(&self, f: F) -> W::Output
    where
        W: Waitable,
        F: FnOnce(&ResourceOf<Self>) -> W,
    {
        self.submit(f).wait()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Resources identified by their index, recording the work they ran.
    #[derive(Debug, Default)]
    pub(crate) struct Pool {
        pub(crate) size: usize,
        pub(crate) calls: Mutex<Vec<usize>>,
    }

    impl Pool {
        pub(crate) fn new(size: usize) -> Self {
            Self {
                size,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn run(&self, resource: usize) -> Done<usize> {
            self.calls.lock().unwrap().push(resource);
            Done(resource)
        }

        pub(crate) fn calls(&self) -> Vec<usize> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Backend for Pool {
        type Resource = usize;

        fn get_resources(&self) -> Vec<usize> {
            (0..self.size).collect()
        }
    }

    /// Work already completed.
    #[derive(Debug, PartialEq)]
    pub(crate) struct Done<T>(pub(crate) T);

    impl<T> Waitable for Done<T> {
        type Output = T;

        fn wait(self) -> T {
            self.0
        }
    }

    macro_rules! pool_policy {
        ($name:ident) => {
            struct $name(Pool);

            impl Policy for $name {
                type Backend = Pool;

                fn backend(&self) -> &Pool {
                    &self.0
                }

                fn get_resources(&self) -> Vec<usize> {
                    self.0.get_resources()
                }
            }
        };
    }

    pool_policy!(OnlySelect);
    pool_policy!(OnlyTrySelect);
    pool_policy!(OnlySubmit);
    pool_policy!(OnlySubmitAndWait);

    impl Select for OnlySelect {
        fn select(&self) -> Selection<usize> {
            Selection::new(1, 1)
        }
    }

    impl TrySelect for OnlyTrySelect {
        fn try_select(&self) -> Option<Selection<usize>> {
            Some(Selection::new(2, 2))
        }
    }

    impl Submit for OnlySubmit {
        fn submit<W, F: FnOnce(&usize) -> W>(&self, f: F) -> Submission<W> {
            Selection::new(3, 3).submit(&self.0, f)
        }
    }

    impl SubmitAndWait for OnlySubmitAndWait {
        fn submit_and_wait<W: Waitable, F: FnOnce(&usize) -> W>(&self, f: F) -> W::Output {
            f(&4).wait()
        }
    }

    #[test]
    fn select_provides_every_submission() {
        let policy = OnlySelect(Pool::new(2));

        assert_eq!(policy.try_select().map(|s| s.index()), Some(1));
        assert!(policy.try_submit(|r| policy.0.run(*r)).is_ok());
        policy.submit(|r| policy.0.run(*r));
        assert_eq!(policy.submit_and_wait(|r| policy.0.run(*r)), 1);
        assert_eq!(policy.0.calls(), vec![1, 1, 1]);
    }

    #[test]
    fn try_select_provides_every_submission() {
        let policy = OnlyTrySelect(Pool::new(3));

        assert!(policy.try_submit(|r| policy.0.run(*r)).is_ok());
        policy.submit(|r| policy.0.run(*r));
        assert_eq!(policy.submit_and_wait(|r| policy.0.run(*r)), 2);
        assert_eq!(policy.0.calls(), vec![2, 2, 2]);
    }

    #[test]
    fn submit_provides_submit_and_wait() {
        let policy = OnlySubmit(Pool::new(4));

        policy.submit(|r| policy.0.run(*r));
        assert_eq!(policy.submit_and_wait(|r| policy.0.run(*r)), 3);
        assert_eq!(policy.0.calls(), vec![3, 3]);
    }

    #[test]
    fn submit_and_wait_alone() {
        let policy = OnlySubmitAndWait(Pool::new(5));

        assert_eq!(policy.submit_and_wait(|r| policy.0.run(*r)), 4);
        assert_eq!(policy.0.calls(), vec![4]);
    }

    /// Fails to select on every even attempt.
    struct Flaky {
        pool: Pool,
        attempts: AtomicUsize,
    }

    impl Policy for Flaky {
        type Backend = Pool;

        fn backend(&self) -> &Pool {
            &self.pool
        }

        fn get_resources(&self) -> Vec<usize> {
            self.pool.get_resources()
        }
    }

    impl TrySelect for Flaky {
        fn try_select(&self) -> Option<Selection<usize>> {
            match self.attempts.fetch_add(1, Ordering::Relaxed) % 2 {
                0 => None,
                _ => Some(Selection::new(0, 0)),
            }
        }
    }

    #[test]
    fn submit_retries_failed_selections() {
        let policy = Flaky {
            pool: Pool::new(1),
            attempts: AtomicUsize::new(0),
        };

        policy.submit(|r| policy.pool.run(*r));
        assert_eq!(policy.attempts.load(Ordering::Relaxed), 2);
        assert_eq!(policy.pool.calls(), vec![0]);

        let rejected = policy.try_submit(|r| policy.pool.run(*r));
        assert!(rejected.is_err());
        assert_eq!(policy.attempts.load(Ordering::Relaxed), 3);
        assert!(policy.try_submit(|r| policy.pool.run(*r)).is_ok());
        assert_eq!(policy.pool.calls(), vec![0, 0]);
    }

    #[test]
    fn rejected_submissions_give_the_function_back() {
        let policy = Flaky {
            pool: Pool::new(1),
            attempts: AtomicUsize::new(0),
        };

        let f = |r: &usize| *r + 10;
        let Err(rejected) = policy.try_submit(f) else {
            panic!("The first attempt must fail");
        };
        let Ok(submission) = policy.try_submit(rejected.into_inner()) else {
            panic!("The second attempt must succeed");
        };

        assert_eq!(*submission.work(), 10);
    }
}
