use std::fmt;

use rustc_hash::FxHashMap;

/// Opaque handle to a texture owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u64);

/// Opaque handle to a clipping mask owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskHandle(pub(crate) u64);

macro_rules! impl_raw_id {
    ($handle:ident) => {
        impl $handle {
            /// Numeric id, for hosts that keep handles outside Rust.
            #[must_use]
            pub const fn to_raw(self) -> u64 {
                self.0
            }

            /// Rebuilds a handle from [`to_raw`](Self::to_raw). An id the
            /// renderer never issued is reported as an invalid handle.
            #[must_use]
            pub const fn from_raw(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

impl_raw_id!(TextureHandle);
impl_raw_id!(MaskHandle);

impl fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture #{}", self.0)
    }
}

impl fmt::Display for MaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clipping mask #{}", self.0)
    }
}

/// Resources keyed by ids that start at 1 and are never reused, so a stale
/// handle cannot alias a newer resource.
#[derive(Debug)]
pub(crate) struct Registry<T> {
    entries: FxHashMap<u64, T>,
    next_id: u64,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { entries: FxHashMap::default(), next_id: 1 }
    }
}

impl<T> Registry<T> {
    pub(crate) fn insert(&mut self, value: T) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, value);
        id
    }

    pub(crate) fn get(&self, id: u64) -> Option<&T> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: u64) -> Option<T> {
        self.entries.remove(&id)
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.entries.drain().map(|(_, value)| value)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
