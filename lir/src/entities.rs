//! IR entity references.
//!
//! Instructions reference other entities in the function: basic blocks, values,
//! external functions. These references are not Rust references, both because
//! the ownership rules make intrusive graphs painful and because 64-bit
//! pointers take up a lot of space. Instead, an entity reference is a struct
//! wrapping a `u32` index into a table in the `Function` main data structure,
//! with a separate index type per entity so we don't lose type safety.
//!
//! The all-ones bit pattern is reserved so that compact data structures can
//! store an optional reference in 32 bits (see `stdx::packed_option`).

use std::fmt;

use stdx::impl_idx_from;
use stdx::packed_option::ReservedValue;

macro_rules! entity_ref {
    ($(#[$attr:meta])* $name:ident, $display:literal) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);
        impl_idx_from!($name(u32));

        impl $name {
            /// Create a new reference from its number.
            /// This corresponds to the `{prefix}NN` representation.
            pub fn with_number(n: u32) -> Option<Self> {
                if n < u32::MAX {
                    Some(Self(n))
                } else {
                    None
                }
            }
        }

        impl ReservedValue for $name {
            fn reserved_value() -> Self {
                $name(u32::MAX)
            }

            fn is_reserved_value(&self) -> bool {
                self.0 == u32::MAX
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, concat!($display, "{}"), self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }
    };
}

entity_ref! {
    /// An opaque reference to a [basic block](https://en.wikipedia.org/wiki/Basic_block)
    /// in a [`Function`](crate::Function).
    ///
    /// While the order is stable, it is arbitrary and does not necessarily
    /// resemble the layout order.
    Block, "block"
}

entity_ref! {
    /// An opaque reference to an instruction in a [`Function`](crate::Function).
    Inst, "inst"
}

entity_ref! {
    /// An opaque reference to an SSA value: an instruction result, a function
    /// parameter or an interned constant.
    Value, "v"
}

entity_ref! {
    /// An opaque reference to an operand position that reads a [`Value`].
    ///
    /// Uses form a doubly linked list per value, so a value knows every
    /// instruction operand that currently references it.
    Use, "use"
}

entity_ref! {
    /// An opaque reference to an external function declared in the function
    /// preamble, used by call instructions.
    FuncRef, "fn"
}

entity_ref! {
    /// An opaque reference to a function parameter.
    Param, "param"
}
