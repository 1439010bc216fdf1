use std::sync::Arc;

/// Declares an opaque identifier drawn from a process-wide counter.
#[macro_export]
macro_rules! counter_id {
    ($(#[$meta:meta])* $vis:vis $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
        $vis struct $name(usize);

        impl $name {
            /// Draw the next identifier.
            pub fn new() -> Self {
                static NEXT: core::sync::atomic::AtomicUsize =
                    core::sync::atomic::AtomicUsize::new(0);
                Self(NEXT.fetch_add(1, core::sync::atomic::Ordering::Relaxed))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// Shared ownership of an identifier, counting the users of the memory it names.
///
/// Two counts are kept. `owners` counts the handles, `users` additionally counts the bindings
/// captured by launches in flight. The pool holds one of each.
#[derive(Clone, Debug)]
pub(crate) struct Tracked<Id> {
    owners: Arc<Id>,
    users: Arc<()>,
}

/// An identifier pinned by a launch, keeps the memory reserved while alive.
#[derive(Clone, Debug)]
pub(crate) struct Pinned<Id> {
    id: Id,
    _user: Arc<()>,
}

impl<Id: Clone> Tracked<Id> {
    pub(crate) fn new(id: Id) -> Self {
        Self {
            owners: Arc::new(id),
            users: Arc::new(()),
        }
    }

    pub(crate) fn id(&self) -> &Id {
        &self.owners
    }

    pub(crate) fn pin(self) -> Pinned<Id> {
        Pinned {
            id: Id::clone(&self.owners),
            _user: self.users,
        }
    }

    /// A single handle besides the pool, writes can't be observed by anyone else.
    pub(crate) fn is_exclusive(&self) -> bool {
        Arc::strong_count(&self.owners) <= 2
    }

    /// Only the pool is left, the memory can be handed out again.
    pub(crate) fn is_released(&self) -> bool {
        Arc::strong_count(&self.users) == 1
    }
}

impl<Id> Pinned<Id> {
    pub(crate) fn id(&self) -> &Id {
        &self.id
    }
}
