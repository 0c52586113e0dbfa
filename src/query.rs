//! Query translation: domain filters and sorts in, wire filters and sorts out.
//! Callers use logical property names; the translators rewrite them against the
//! schema registry and expand status-group conditions the wire cannot express.

pub mod filter;
pub mod sort;
pub mod status_group;

pub use filter::{
    translate_filter, FilterNode, PropertyCondition, TimestampKind, WireFilter,
    UNSATISFIABLE_OPTION,
};
pub use sort::{translate_sorts, SortDirection, SortSpec};
pub use status_group::StatusGroupCondition;
