//! Field name sanitization for MongoDB compatibility.
//!
//! MongoDB reserves dots and dollar signs in field names for query syntax, so keys are
//! escaped on the way in and restored on the way out. String *values* are stored
//! verbatim: a skill called `Node.js` must match the same string in a filter.

use bson::Bson;


/// Escapes and restores document keys that MongoDB would reject or misread.
///
/// MongoDB does not allow field names (document keys) to contain:
/// - Dots (`.`) - used for nested field access in queries
/// - Dollar signs (`$`) - used for operators in queries
/// - Null bytes (`\0`) - field name terminators
pub(crate) struct KeySanitizer;

impl KeySanitizer {
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    /// Recursively escapes every key of every (nested) document in `value`.
    pub(crate) fn sanitize_value(value: &Bson) -> Bson {
        Self::map_keys(value, &Self::sanitize_key)
    }

    /// Inverse of [`KeySanitizer::sanitize_value`].
    pub(crate) fn restore_value(value: &Bson) -> Bson {
        Self::map_keys(value, &Self::restore_key)
    }

    pub(crate) fn sanitize_key(input: &str) -> String {
        let mut sanitized = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter() {
            sanitized = sanitized.replace(*target, *replacement);
        }
        sanitized
    }

    pub(crate) fn restore_key(input: &str) -> String {
        let mut restored = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter().rev() {
            restored = restored.replace(*replacement, *target);
        }
        restored
    }

    fn map_keys(value: &Bson, rename: &dyn Fn(&str) -> String) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(|item| Self::map_keys(item, rename))
                    .collect(),
            ),
            Bson::Document(doc) => Bson::Document(
                doc.iter()
                    .map(|(k, v)| (rename(k), Self::map_keys(v, rename)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn escapes_keys_but_not_values() {
        let original = Bson::Document(doc! {
            "skills": ["Node.js", "$money"],
            "meta": { "v1.2": "a.b" },
        });

        let sanitized = KeySanitizer::sanitize_value(&original);

        assert_eq!(sanitized, Bson::Document(doc! {
            "skills": ["Node.js", "$money"],
            "meta": { "v1__dot__2": "a.b" },
        }));
        assert_eq!(KeySanitizer::restore_value(&sanitized), original);
    }

    #[test]
    fn plain_keys_are_untouched() {
        assert_eq!(KeySanitizer::sanitize_key("employee_id"), "employee_id");
        assert_eq!(KeySanitizer::restore_key("$a.b"), "$a.b");
        assert_eq!(KeySanitizer::sanitize_key("$a.b"), "__dollar__a__dot__b");
    }
}
