//! Diagnostic text rendering of decoded messages.
//!
//! Output is advisory: formatting never fails, whatever the decoded tree
//! looks like.
//!
//! ```text
//! Method: ExecuteStatement
//! Type: CALL
//! Sequence: 12345
//! Bytes: 148/148
//! Protocol: HiveServer2
//! Field Names: Resolved via TExecuteStatementReq (5 mappings)
//! Fields (5):
//!   confOverlay [id=3] (MAP): {"spark.sql.adaptive.enabled": "true"}
//!   ...
//! ```

use std::fmt::Write as _;

use crate::{
    error::DecodeError,
    value::{DecodedMessage, FieldNames, FieldValue, GenericReason},
};

/// Formatter settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatConfig {
    /// Longest value text shown before truncating with `...`
    pub max_value_width: usize,
    /// Spaces prepended to every line
    pub indent: usize,
    /// List fields by key instead of wire order
    pub sort_fields: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self { max_value_width: 200, indent: 0, sort_fields: true }
    }
}

/// Render a decode result, successful or not.
#[must_use]
pub fn format_message(result: &Result<DecodedMessage, DecodeError>, config: &FormatConfig) -> String {
    match result {
        Ok(message) => format_decoded(message, config),
        Err(err) => format!("{:indent$}<decode error: {err}>\n", "", indent = config.indent),
    }
}

/// Render a decoded message.
#[must_use]
pub fn format_decoded(message: &DecodedMessage, config: &FormatConfig) -> String {
    let mut out = Lines { buf: String::new(), indent: config.indent };

    out.line(format_args!("Method: {}", message.method));
    out.line(format_args!("Type: {}", message.kind));
    out.line(format_args!("Sequence: {}", message.sequence_id));
    out.line(format_args!("Bytes: {}/{}", message.bytes_consumed, message.total_bytes));
    if let Some(protocol) = message.protocol {
        out.line(format_args!("Protocol: {protocol}"));
    }
    out.line(format_args!("Field Names: {}", describe_names(&message.field_names)));

    let mut fields: Vec<_> = message.fields.iter().collect();
    if config.sort_fields {
        fields.sort_by(|(a, _), (b, _)| a.cmp(b));
    }

    out.line(format_args!("Fields ({}):", fields.len()));
    for (key, field) in fields {
        let value = truncate(&field_text(field), config.max_value_width);
        out.line(format_args!(
            "  {key} [id={}] ({}): {value}",
            field.field_id,
            field.type_name()
        ));
    }
    if let Some(reason) = message.fields.incomplete() {
        out.line(format_args!("  <incomplete: {}>", truncate(reason, config.max_value_width)));
    }

    out.buf
}

struct Lines {
    buf: String,
    indent: usize,
}

impl Lines {
    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        // Writing into a String cannot fail.
        let _ = writeln!(self.buf, "{:indent$}{args}", "", indent = self.indent);
    }
}

fn describe_names(names: &FieldNames) -> String {
    match names {
        FieldNames::Resolved { struct_name, mappings } => {
            format!("Resolved via {struct_name} ({mappings} mappings)")
        },
        FieldNames::Generic(GenericReason::NoRegistry) => {
            "Generic (no schema registry attached)".to_owned()
        },
        FieldNames::Generic(GenericReason::NoMapping) => {
            "Generic (no mapping for this method)".to_owned()
        },
    }
}

fn field_text(field: &FieldValue) -> String {
    match (&field.value, &field.error) {
        (Some(value), _) => value.to_string(),
        (None, Some(error)) => format!("<error: {error}>"),
        (None, None) => "<no value>".to_owned(),
    }
}

/// Cut `text` to `width` characters, appending `...` if anything was cut.
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    match text.char_indices().nth(width) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use rpcscope_proto::{Framing, MessageKind};

    use super::*;
    use crate::value::{Fields, Value};

    fn message(fields: Fields) -> DecodedMessage {
        DecodedMessage {
            method: "GetTables".into(),
            kind: MessageKind::Reply,
            sequence_id: 3,
            framing: Framing::Strict,
            fields,
            bytes_consumed: 40,
            total_bytes: 40,
            protocol: Some("HiveServer2"),
            field_names: FieldNames::Generic(GenericReason::NoRegistry),
        }
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
        assert_eq!(truncate("ééé", 2), "éé...");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn fields_are_sorted_by_key() {
        let fields: Fields = [
            ("field_2".to_string(), FieldValue::decoded(8, 2, Value::I32(2))),
            ("field_1".to_string(), FieldValue::decoded(11, 1, Value::Text("x".into()))),
        ]
        .into_iter()
        .collect();

        let text = format_decoded(&message(fields), &FormatConfig::default());
        let field_lines: Vec<_> = text.lines().skip_while(|l| !l.starts_with("Fields")).collect();
        assert_eq!(
            field_lines,
            ["Fields (2):", "  field_1 [id=1] (STRING): x", "  field_2 [id=2] (I32): 2"]
        );
    }

    #[test]
    fn wire_order_when_unsorted() {
        let fields: Fields = [
            ("b".to_string(), FieldValue::decoded(8, 2, Value::I32(2))),
            ("a".to_string(), FieldValue::decoded(8, 1, Value::I32(1))),
        ]
        .into_iter()
        .collect();

        let config = FormatConfig { sort_fields: false, ..FormatConfig::default() };
        let text = format_decoded(&message(fields), &config);
        assert!(text.find("  b [id=2]") < text.find("  a [id=1]"));
    }

    #[test]
    fn long_values_are_truncated() {
        let fields: Fields =
            [("field_1".to_string(), FieldValue::decoded(11, 1, Value::Text("y".repeat(500))))]
                .into_iter()
                .collect();

        let text = format_decoded(&message(fields), &FormatConfig::default());
        let expected = format!("  field_1 [id=1] (STRING): {}...", "y".repeat(200));
        assert!(text.lines().any(|l| l == expected));
    }

    #[test]
    fn failed_fields_and_incomplete_structs() {
        let mut fields = Fields::new();
        fields.insert("field_4".into(), FieldValue::failed(11, 4, "unexpected end"));
        fields.mark_incomplete("abandoned after field 4");

        let text = format_decoded(&message(fields), &FormatConfig::default());
        assert!(text.contains("  field_4 [id=4] (STRING): <error: unexpected end>\n"));
        assert!(text.ends_with("  <incomplete: abandoned after field 4>\n"));
    }

    #[test]
    fn indent_applies_to_every_line() {
        let config = FormatConfig { indent: 4, ..FormatConfig::default() };
        let text = format_decoded(&message(Fields::new()), &config);
        assert!(text.lines().all(|l| l.starts_with("    ")));
        assert!(text.contains("    Protocol: HiveServer2\n"));
        assert!(text.contains("    Field Names: Generic (no schema registry attached)\n"));
    }

    #[test]
    fn errors_render_inline() {
        let result = Err(DecodeError::TooShort { len: 2 });
        assert_eq!(
            format_message(&result, &FormatConfig::default()),
            "<decode error: message too short: 2 bytes>\n"
        );
    }
}
