//! Tri-state decorator around a [`BaseInput`].
//!
//! A nullable input is either present with the wrapped input's value or absent.
//! While absent it shows `default_value`, is disabled, and keeps the value it
//! had before so switching back restores it.

use super::inputs::{BaseInput, Validity};
use super::value::Value;

#[derive(Debug, Clone)]
pub struct Nullable<I> {
    input: I,
    nullable: bool,
    null: bool,
    default_value: String,
    nulled: Option<String>,
}

impl<I: BaseInput> Nullable<I> {
    /// A non-nullable input starting at `default_value`.
    pub fn new(mut input: I, default_value: &str) -> Self {
        input.set_value(default_value);
        Nullable {
            input,
            nullable: false,
            null: false,
            default_value: default_value.to_string(),
            nulled: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn base(&self) -> &I {
        &self.input
    }

    pub fn base_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_null(&self) -> bool {
        self.null
    }

    pub fn value(&self) -> String {
        self.input.value()
    }

    /// Sets a present value, leaving the absent state if needed.
    pub fn set_value(&mut self, value: &str) {
        if self.null {
            self.null = false;
            self.nulled = None;
            self.input.set_disabled(false);
        }
        self.input.set_value(value);
    }

    pub fn maybe_value(&self) -> Value<String> {
        if self.null {
            Value::Absent
        } else {
            Value::Present(self.input.value())
        }
    }

    /// Absent on a non-nullable input falls back to the default value.
    pub fn set_maybe_value(&mut self, value: Value<String>) {
        match value {
            Value::Present(v) => self.set_value(&v),
            Value::Absent if self.nullable => {
                self.set_null(true);
            }
            Value::Absent => self.input.set_value(&self.default_value),
        }
    }

    pub fn set_null(&mut self, null: bool) {
        if null == self.null || (null && !self.nullable) {
            return;
        }
        if null {
            self.nulled = Some(self.input.value());
            self.input.set_value(&self.default_value);
            self.input.set_disabled(true);
        } else {
            let restored = self.nulled.take().unwrap_or_else(|| self.default_value.clone());
            self.input.set_value(&restored);
            self.input.set_disabled(false);
        }
        self.null = null;
    }

    pub fn check_validity(&self) -> Validity {
        if self.null {
            Validity::Valid
        } else {
            self.input.check_validity()
        }
    }
}

/// Object-safe view of a [`Nullable`] input, so one form can hold text,
/// select and checkbox fields side by side.
pub trait AttributeInput {
    fn maybe_value(&self) -> Value<String>;
    fn set_maybe_value(&mut self, value: Value<String>);
    /// A user edit of the visible value.
    fn input(&mut self, raw: &str);
    fn set_null(&mut self, null: bool);
    fn is_null(&self) -> bool;
    fn is_nullable(&self) -> bool;
    fn is_disabled(&self) -> bool;
    fn check_validity(&self) -> Validity;
    fn set_reserved_values(&mut self, reserved: Vec<String>);
    fn set_custom_validity(&mut self, message: Option<String>);
}

impl<I: BaseInput> AttributeInput for Nullable<I> {
    fn maybe_value(&self) -> Value<String> {
        Nullable::maybe_value(self)
    }

    fn set_maybe_value(&mut self, value: Value<String>) {
        Nullable::set_maybe_value(self, value)
    }

    fn input(&mut self, raw: &str) {
        self.set_value(raw)
    }

    fn set_null(&mut self, null: bool) {
        Nullable::set_null(self, null)
    }

    fn is_null(&self) -> bool {
        Nullable::is_null(self)
    }

    fn is_nullable(&self) -> bool {
        Nullable::is_nullable(self)
    }

    fn is_disabled(&self) -> bool {
        self.input.is_disabled()
    }

    fn check_validity(&self) -> Validity {
        Nullable::check_validity(self)
    }

    fn set_reserved_values(&mut self, reserved: Vec<String>) {
        self.input.set_reserved_values(reserved)
    }

    fn set_custom_validity(&mut self, message: Option<String>) {
        self.input.set_custom_validity(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::inputs::{CheckboxInput, Pattern, TextInput};

    #[test]
    fn going_absent_stashes_and_restores() {
        let mut desc = Nullable::new(TextInput::new(), "").nullable();
        desc.set_maybe_value(Value::Present("feeder".to_string()));
        desc.set_null(true);
        assert_eq!(desc.maybe_value(), Value::Absent);
        assert_eq!(desc.value(), "");
        assert!(desc.base().is_disabled());
        desc.set_null(false);
        assert_eq!(desc.maybe_value(), Value::Present("feeder".to_string()));
        assert!(!desc.base().is_disabled());
    }

    #[test]
    fn non_nullable_never_goes_absent() {
        let mut name = Nullable::new(TextInput::new().required(), "gcb");
        name.set_null(true);
        assert!(!name.is_null());
        name.set_maybe_value(Value::Absent);
        assert_eq!(name.maybe_value(), Value::Present("gcb".to_string()));
    }

    #[test]
    fn absent_is_always_valid() {
        let mut name = Nullable::new(TextInput::new().pattern(Pattern::AsciName), "").nullable();
        name.set_value("9bad");
        assert!(!name.check_validity().is_valid());
        name.set_null(true);
        assert!(name.check_validity().is_valid());
    }

    #[test]
    fn boxed_inputs_share_one_interface() {
        let mut fields: Vec<Box<dyn AttributeInput>> = vec![
            Box::new(Nullable::new(TextInput::new(), "").nullable()),
            Box::new(Nullable::new(CheckboxInput::new(), "false").nullable()),
        ];
        for field in fields.iter_mut() {
            field.set_maybe_value(Value::Absent);
        }
        fields[1].input("true");
        assert_eq!(fields[0].maybe_value(), Value::Absent);
        assert_eq!(fields[1].maybe_value(), Value::Present("true".to_string()));
    }
}
