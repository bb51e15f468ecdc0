//! Typed handles into a host scene graph

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! scene_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Create a handle from a raw index (for hosts and tests)
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Get the raw index
            pub fn raw(&self) -> u32 {
                self.0
            }

            /// Get the raw index as a `usize` for slice access
            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

scene_handle!(
    /// A placed object (mesh instance, empty, light or collection instance)
    ObjectId
);
scene_handle!(
    /// Mesh data that any number of objects can reference
    MeshId
);
scene_handle!(
    /// A built material
    MaterialId
);
scene_handle!(
    /// A named group of objects that can itself be instanced
    CollectionId
);
