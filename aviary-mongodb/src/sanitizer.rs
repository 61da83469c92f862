//! Field name sanitization for MongoDB compatibility.
//!
//! MongoDB gives dots and dollar signs in field names a meaning of their own (nested
//! paths and operators), so a client-supplied key such as `"$where"` or `"a.b"` must
//! never reach an update document verbatim. Keys are escaped on the way in and
//! restored on the way out; values are stored untouched.

use bson::{Bson, Document};

/// Escapes and restores document keys that MongoDB would otherwise interpret.
///
/// Escaping is percent-style, so it is reversible for every key, including keys
/// that already look escaped:
/// - `%` becomes `%25` (the escape character itself)
/// - `.` becomes `%2E` (nested field access)
/// - `$` becomes `%24` (operators)
/// - NUL becomes `%00` (field name terminator)
pub(crate) struct KeySanitizer;

impl KeySanitizer {
    const ESCAPES: [(char, &'static str); 4] = [
        ('%', "%25"),
        ('.', "%2E"),
        ('$', "%24"),
        ('\0', "%00"),
    ];

    /// Recursively escapes the keys of a document, including nested documents and
    /// documents inside arrays.
    pub(crate) fn sanitize_document(document: Document) -> Document {
        document
            .into_iter()
            .map(|(key, value)| (Self::sanitize_key(&key), Self::map_value(value, Self::sanitize_document)))
            .collect()
    }

    /// Inverse of [`KeySanitizer::sanitize_document`].
    pub(crate) fn restore_document(document: Document) -> Document {
        document
            .into_iter()
            .map(|(key, value)| (Self::restore_key(&key), Self::map_value(value, Self::restore_document)))
            .collect()
    }

    fn map_value(value: Bson, on_document: fn(Document) -> Document) -> Bson {
        match value {
            Bson::Document(document) => Bson::Document(on_document(document)),
            Bson::Array(items) => Bson::Array(
                items
                    .into_iter()
                    .map(|item| Self::map_value(item, on_document))
                    .collect(),
            ),
            other => other,
        }
    }

    fn sanitize_key(input: &str) -> String {
        let mut sanitized = String::with_capacity(input.len());
        for ch in input.chars() {
            match Self::ESCAPES.iter().find(|(raw, _)| *raw == ch) {
                Some((_, escaped)) => sanitized.push_str(escaped),
                None => sanitized.push(ch),
            }
        }
        sanitized
    }

    /// Decodes in a single left-to-right pass. A `%` that starts no known escape is
    /// kept as it is.
    fn restore_key(input: &str) -> String {
        let mut restored = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(at) = rest.find('%') {
            restored.push_str(&rest[..at]);
            let tail = &rest[at..];
            match Self::ESCAPES.iter().find(|(_, escaped)| tail.starts_with(*escaped)) {
                Some((raw, escaped)) => {
                    restored.push(*raw);
                    rest = &tail[escaped.len()..];
                }
                None => {
                    restored.push('%');
                    rest = &tail[1..];
                }
            }
        }
        restored.push_str(rest);
        restored
    }
}
