//! Plain (never absent) inputs. Every value is kept as the attribute string.

use crate::utils::{check_eq_2str_incaseinse, chk_asci_name_legal};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Validity {
    Valid,
    Invalid(String),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}

pub trait BaseInput {
    fn value(&self) -> String;
    fn set_value(&mut self, value: &str);
    fn check_validity(&self) -> Validity;
    fn is_disabled(&self) -> bool;
    fn set_disabled(&mut self, disabled: bool);
    /// Values the input must not take, e.g. sibling names. Ignored by default.
    fn set_reserved_values(&mut self, _reserved: Vec<String>) {}
    /// Extra error reported ahead of the built-in checks, `None` clears it.
    fn set_custom_validity(&mut self, _message: Option<String>) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// `tAsciName`
    AsciName,
    /// Non-negative integer.
    Unsigned,
    /// Any non-empty text without surrounding blanks.
    NormalizedString,
}

impl Pattern {
    fn matches(self, value: &str) -> bool {
        match self {
            Pattern::AsciName => chk_asci_name_legal(value),
            Pattern::Unsigned => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
            Pattern::NormalizedString => value.trim() == value,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    disabled: bool,
    required: bool,
    pattern: Option<Pattern>,
    max_length: Option<usize>,
    number: bool,
    min: Option<i64>,
    reserved_values: Vec<String>,
    custom_validity: Option<String>,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Integer input, optionally bounded below.
    pub fn number(mut self, min: Option<i64>) -> Self {
        self.number = true;
        self.min = min;
        self
    }

}

impl BaseInput for TextInput {
    fn value(&self) -> String {
        self.value.clone()
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    fn check_validity(&self) -> Validity {
        if let Some(message) = &self.custom_validity {
            return Validity::Invalid(message.clone());
        }
        if self.value.is_empty() {
            return if self.required {
                Validity::Invalid("value required".to_string())
            } else {
                Validity::Valid
            };
        }
        if self.reserved_values.iter().any(|r| *r == self.value) {
            return Validity::Invalid(format!("{} is already in use", self.value));
        }
        if let Some(max) = self.max_length {
            if self.value.chars().count() > max {
                return Validity::Invalid(format!("at most {} characters", max));
            }
        }
        if let Some(pattern) = self.pattern {
            if !pattern.matches(&self.value) {
                return Validity::Invalid(format!("{} does not match {:?}", self.value, pattern));
            }
        }
        if self.number {
            match self.value.parse::<i64>() {
                Err(_) => return Validity::Invalid(format!("{} is not a number", self.value)),
                Ok(n) => {
                    if let Some(min) = self.min {
                        if n < min {
                            return Validity::Invalid(format!("must be at least {}", min));
                        }
                    }
                }
            }
        }
        Validity::Valid
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    fn set_reserved_values(&mut self, reserved: Vec<String>) {
        self.reserved_values = reserved;
    }

    fn set_custom_validity(&mut self, message: Option<String>) {
        self.custom_validity = message;
    }
}

#[derive(Debug, Clone)]
pub struct SelectInput {
    value: String,
    options: Vec<String>,
    disabled: bool,
}

impl SelectInput {
    pub fn new(options: &[&str]) -> Self {
        SelectInput {
            value: options.first().map(|o| o.to_string()).unwrap_or_default(),
            options: options.iter().map(|o| o.to_string()).collect(),
            disabled: false,
        }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }
}

impl BaseInput for SelectInput {
    fn value(&self) -> String {
        self.value.clone()
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    fn check_validity(&self) -> Validity {
        if self.options.iter().any(|o| *o == self.value) {
            Validity::Valid
        } else {
            Validity::Invalid(format!("{} is not one of {:?}", self.value, self.options))
        }
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}

/// xs:boolean input; anything but "true" (any case) or "1" reads as unchecked.
#[derive(Debug, Clone, Default)]
pub struct CheckboxInput {
    checked: bool,
    disabled: bool,
}

impl CheckboxInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checked(&self) -> bool {
        self.checked
    }
}

impl BaseInput for CheckboxInput {
    fn value(&self) -> String {
        self.checked.to_string()
    }

    fn set_value(&mut self, value: &str) {
        self.checked = check_eq_2str_incaseinse(value, "true") || value == "1";
    }

    fn check_validity(&self) -> Validity {
        Validity::Valid
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_input_checks() {
        let mut name = TextInput::new().required().pattern(Pattern::AsciName).max_length(8);
        assert!(!name.check_validity().is_valid());
        name.set_value("gcb01");
        assert!(name.check_validity().is_valid());
        name.set_value("1gcb");
        assert!(!name.check_validity().is_valid());
        name.set_value("gcb01234567");
        assert!(!name.check_validity().is_valid());
        name.set_reserved_values(vec!["other".to_string()]);
        name.set_value("other");
        assert!(!name.check_validity().is_valid());
    }

    #[test]
    fn number_with_min() {
        let mut max = TextInput::new().number(Some(0));
        max.set_value("-1");
        assert!(!max.check_validity().is_valid());
        max.set_value("abc");
        assert!(!max.check_validity().is_valid());
        max.set_value("4");
        assert!(max.check_validity().is_valid());
        max.set_custom_validity(Some("too few".to_string()));
        assert_eq!(max.check_validity(), Validity::Invalid("too few".to_string()));
    }

    #[test]
    fn select_and_checkbox() {
        let mut kind = SelectInput::new(&["GOOSE", "GSSE"]);
        assert_eq!(kind.value(), "GOOSE");
        kind.set_value("SV");
        assert!(!kind.check_validity().is_valid());

        let mut flag = CheckboxInput::new();
        assert_eq!(flag.value(), "false");
        flag.set_value("true");
        assert!(flag.checked());
        assert_eq!(flag.value(), "true");
    }
}
