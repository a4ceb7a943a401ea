//! Form payload construction for the `/predict` endpoint.

use reqwest::multipart::Form;
use serde_json::{Map, Number, Value};
use shared::{
    domain::{FormData, NAME_FIELD},
    protocol::PayloadEncoding,
};

/// Body of one prediction request, built at submit time.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPayload {
    Multipart(Vec<(String, String)>),
    Json(Map<String, Value>),
}

impl FormPayload {
    pub fn build(form: &FormData, encoding: PayloadEncoding) -> Self {
        match encoding {
            PayloadEncoding::Multipart => Self::Multipart(
                form.iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            ),
            PayloadEncoding::Json => Self::Json(coerce_fields(form)),
        }
    }

    pub fn encoding(&self) -> PayloadEncoding {
        match self {
            Self::Multipart(_) => PayloadEncoding::Multipart,
            Self::Json(_) => PayloadEncoding::Json,
        }
    }

    pub fn field_count(&self) -> usize {
        match self {
            Self::Multipart(fields) => fields.len(),
            Self::Json(map) => map.len(),
        }
    }

    pub(crate) fn into_multipart(fields: Vec<(String, String)>) -> Form {
        fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
    }
}

fn coerce_fields(form: &FormData) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, raw) in form.iter() {
        let value = if name == NAME_FIELD {
            Value::String(raw.to_string())
        } else {
            Value::Number(coerce_number(raw))
        };
        // Later duplicates overwrite earlier ones, as object assignment does.
        map.insert(name.to_string(), value);
    }
    map
}

/// Longest leading decimal literal, so `"17 years"` reads as 17. Anything
/// without one, or not finite, becomes 0.
fn coerce_number(raw: &str) -> Number {
    numeric_prefix(raw.trim_start())
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .unwrap_or_else(|| Number::from(0))
}

fn numeric_prefix(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    let digits_from = |start: usize| {
        bytes
            .get(start..)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits_from(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    &raw[..end]
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn student_form() -> FormData {
        FormData::from_pairs([
            ("name", "Alice"),
            ("age", "17"),
            ("year1_marks", " 72.5 "),
            ("year2_marks", "eighty"),
            ("study_time", ""),
            ("failures", "NaN"),
        ])
    }

    #[test]
    fn json_encoding_keeps_name_and_coerces_the_rest() {
        let payload = FormPayload::build(&student_form(), PayloadEncoding::Json);
        let FormPayload::Json(map) = payload else {
            panic!("expected json payload");
        };

        assert_eq!(
            Value::Object(map),
            json!({
                "name": "Alice",
                "age": 17.0,
                "year1_marks": 72.5,
                "year2_marks": 0,
                "study_time": 0,
                "failures": 0,
            })
        );
    }

    #[test]
    fn numbers_read_from_leading_prefix() {
        let cases = [
            ("17 years", json!(17.0)),
            ("  3.5h", json!(3.5)),
            ("-.5", json!(-0.5)),
            ("+2.", json!(2.0)),
            ("1e2x", json!(100.0)),
            ("4e", json!(4.0)),
            ("12.5.3", json!(12.5)),
            (".", json!(0)),
            ("-", json!(0)),
            ("x12", json!(0)),
            ("1e999", json!(0)),
        ];
        for (raw, expected) in cases {
            assert_eq!(Value::Number(coerce_number(raw)), expected, "input {raw:?}");
        }
    }

    #[test]
    fn numeric_looking_name_stays_text() {
        let form = FormData::from_pairs([("name", "42")]);
        let FormPayload::Json(map) = FormPayload::build(&form, PayloadEncoding::Json) else {
            panic!("expected json payload");
        };
        assert_eq!(map.get("name"), Some(&json!("42")));
    }

    #[test]
    fn multipart_encoding_passes_values_through_unchanged() {
        let payload = FormPayload::build(&student_form(), PayloadEncoding::Multipart);
        assert_eq!(payload.encoding(), PayloadEncoding::Multipart);
        let FormPayload::Multipart(fields) = payload else {
            panic!("expected multipart payload");
        };
        assert_eq!(fields[2], ("year1_marks".to_string(), " 72.5 ".to_string()));
        assert_eq!(fields[5], ("failures".to_string(), "NaN".to_string()));
        assert_eq!(fields.len(), 6);
    }
}
