//! Schema compiler seam
//!
//! The loader never reads IDL source itself; a `SchemaCompiler` turns the
//! text of one schema file into a [`CompiledSchema`]. The bundled
//! implementation reads the JSON artifact emitted by an offline IDL
//! compiler.

use super::ast::CompiledSchema;
use super::errors::{LoadError, LoadResult, SourceLocation};

/// Turns the text of one schema source into its compiled form.
///
/// Failures must be reported as `LoadError::Parse` with the best location
/// the compiler knows.
pub trait SchemaCompiler: Send + Sync {
    fn compile(&self, origin: &str, text: &str) -> LoadResult<CompiledSchema>;
}

/// Reads compiled schemas serialized as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaCompiler;

impl SchemaCompiler for JsonSchemaCompiler {
    fn compile(&self, origin: &str, text: &str) -> LoadResult<CompiledSchema> {
        serde_json::from_str(text).map_err(|e| {
            let location = SourceLocation::new(origin, e.line(), e.column());
            LoadError::parse(location, strip_position(&e.to_string()))
        })
    }
}

/// serde_json appends " at line N column M" to its messages; the location
/// is carried separately.
fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(idx) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiles_valid_schema() {
        let text = r#"{ "modules": [ { "name": "Demo", "definitions": [
            { "kind": "struct", "name": "Point", "members": [ { "name": "x", "type": "int" } ] }
        ] } ] }"#;

        let schema = JsonSchemaCompiler.compile("demo.json", text).unwrap();
        assert_eq!(schema.declared_names(), vec!["::Demo::Point"]);
    }

    #[test]
    fn test_syntax_error_carries_location() {
        let text = "{\n  \"modules\": [\n    { \"name\": \"Demo\" \n  ]\n}";

        let err = JsonSchemaCompiler.compile("broken.json", text).unwrap_err();
        match err {
            LoadError::Parse { location, message } => {
                assert_eq!(location.source, "broken.json");
                assert_eq!(location.line, 4);
                assert!(!message.contains(" at line "));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_type_expression_is_parse_error() {
        let text = r#"{ "modules": [ { "name": "Demo", "definitions": [
            { "kind": "sequence", "name": "Bad", "element": "sequence<int" }
        ] } ] }"#;

        let err = JsonSchemaCompiler.compile("bad.json", text).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_PARSE_ERROR");
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let text = r#"{ "modules": [ { "name": "Demo", "definitions": [
            { "kind": "union", "name": "U" }
        ] } ] }"#;

        let err = JsonSchemaCompiler.compile("u.json", text).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_misspelled_member_list_is_parse_error() {
        let text = r#"{ "modules": [ { "name": "Demo", "definitions": [
            { "kind": "struct", "name": "Point", "memebrs": [ { "name": "x", "type": "int" } ] }
        ] } ] }"#;

        let err = JsonSchemaCompiler.compile("point.json", text).unwrap_err();
        match err {
            LoadError::Parse { location, message } => {
                assert_eq!(location.source, "point.json");
                assert!(message.contains("memebrs"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_misspelled_top_level_key_is_parse_error() {
        let text = r#"{ "modulez": [ { "name": "Demo", "definitions": [] } ] }"#;

        let err = JsonSchemaCompiler.compile("top.json", text).unwrap_err();
        match err {
            LoadError::Parse { location, message } => {
                assert_eq!(location.source, "top.json");
                assert!(message.contains("modulez"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
