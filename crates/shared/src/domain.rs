use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! name_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

name_newtype!(ElementId);
name_newtype!(FieldName);

/// Field kept as text when payload values are coerced to numbers.
pub const NAME_FIELD: &str = "name";
pub const AGE_FIELD: &str = "age";
pub const YEAR1_MARKS_FIELD: &str = "year1_marks";
pub const YEAR2_MARKS_FIELD: &str = "year2_marks";
pub const STUDY_TIME_FIELD: &str = "study_time";
pub const FAILURES_FIELD: &str = "failures";

/// Fields the prediction endpoint reads, in form order.
pub const STUDENT_FIELDS: [&str; 6] = [
    NAME_FIELD,
    AGE_FIELD,
    YEAR1_MARKS_FIELD,
    YEAR2_MARKS_FIELD,
    STUDY_TIME_FIELD,
    FAILURES_FIELD,
];

pub const DEFAULT_FORM_ID: &str = "prediction-form";
pub const DEFAULT_RESULT_ID: &str = "prediction-result";
pub const DEFAULT_CONTAINER_ID: &str = "result";
pub const DEFAULT_ERROR_ID: &str = "error-result";
pub const DEFAULT_LOADING_CLASS: &str = "loading";

/// Current values of a form's inputs, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormData {
    fields: Vec<(FieldName, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut form = Self::new();
        for (name, value) in pairs {
            form.push(name, value);
        }
        form
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((FieldName(name.into()), value.into()));
    }

    /// Replaces the first field with this name, appending when absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = FieldName(name.into());
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value.into(),
            None => self.fields.push((name, value.into())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.as_str() == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_first_match_and_keeps_order() {
        let mut form = FormData::from_pairs([("name", "Alice"), ("age", "17")]);
        form.set("name", "Bob");
        form.set("failures", "0");

        let fields: Vec<_> = form.iter().collect();
        assert_eq!(
            fields,
            vec![("name", "Bob"), ("age", "17"), ("failures", "0")]
        );
    }

    #[test]
    fn get_returns_first_duplicate() {
        let form = FormData::from_pairs([("age", "17"), ("age", "18")]);
        assert_eq!(form.get("age"), Some("17"));
        assert_eq!(form.get("missing"), None);
    }
}
