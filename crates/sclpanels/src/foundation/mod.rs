//! Form building blocks: tri-state values, base inputs, the nullable
//! decorator and attribute field groups.

pub mod form;
pub mod inputs;
pub mod nullable;
pub mod value;

pub use form::{FieldGroup, FormField, GroupTarget};
pub use inputs::{BaseInput, CheckboxInput, Pattern, SelectInput, TextInput, Validity};
pub use nullable::{AttributeInput, Nullable};
pub use value::Value;
