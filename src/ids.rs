//! Opaque identifiers for outputs, spaces and surfaces.
//!
//! The data model has cyclic relations (output ↔ space, output ↔ surface)
//! that are not ownership edges. Rather than model them with `Rc`/`Weak`
//! cycles, every cross-reference in this crate is a plain id resolved
//! through the owning table (see `Compositor`).

use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            fn next(counter: &AtomicU64) -> Self {
                Self(counter.fetch_add(1, Ordering::Relaxed))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

id_type!(OutputId);
id_type!(SpaceId);
id_type!(SurfaceId);
id_type!(ViewId);
id_type!(BufferId);

static OUTPUT_IDS: AtomicU64 = AtomicU64::new(1);
static SPACE_IDS: AtomicU64 = AtomicU64::new(1);
static SURFACE_IDS: AtomicU64 = AtomicU64::new(1);
static VIEW_IDS: AtomicU64 = AtomicU64::new(1);
static BUFFER_IDS: AtomicU64 = AtomicU64::new(1);

impl OutputId {
    pub fn alloc() -> Self {
        Self::next(&OUTPUT_IDS)
    }
}

impl SpaceId {
    pub fn alloc() -> Self {
        Self::next(&SPACE_IDS)
    }
}

impl SurfaceId {
    pub fn alloc() -> Self {
        Self::next(&SURFACE_IDS)
    }
}

impl ViewId {
    pub fn alloc() -> Self {
        Self::next(&VIEW_IDS)
    }
}

impl BufferId {
    pub fn alloc() -> Self {
        Self::next(&BUFFER_IDS)
    }
}
