use serde::Serialize;

/// An optional SCL attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value<T> {
    Present(T),
    Absent,
}

impl<T> Value<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Value::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        !self.is_present()
    }

    pub fn as_ref(&self) -> Value<&T> {
        match self {
            Value::Present(v) => Value::Present(v),
            Value::Absent => Value::Absent,
        }
    }

    pub fn into_option(self) -> Option<T> {
        self.into()
    }
}

impl Value<String> {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Value::Present(v) => Some(v.as_str()),
            Value::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Value::Present(v),
            None => Value::Absent,
        }
    }
}

impl<T> From<Value<T>> for Option<T> {
    fn from(value: Value<T>) -> Self {
        match value {
            Value::Present(v) => Some(v),
            Value::Absent => None,
        }
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Absent
    }
}
