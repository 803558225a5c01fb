//! SCL document model: parsed element arena, identity strings and the child
//! ordering the schema prescribes.

pub mod dom;
pub mod identity;
pub mod schema;

pub use dom::{ElemId, SclDoc};
pub use identity::{find, identity, update_element_reference};
