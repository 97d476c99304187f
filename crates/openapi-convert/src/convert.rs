use crate::error::{ConvertError, Result};
use serde::Serialize as _;
use serde_json::Value;
use std::path::Path;

/// Parse a YAML document into its JSON equivalent.
///
/// `location` is only used for error messages (usually the file path).
/// Merge keys (`<<: *anchor`) are resolved before conversion.
pub fn yaml_to_json(yaml: &str, location: &str) -> Result<Value> {
    let yaml_error = |source| ConvertError::Yaml {
        location: location.to_string(),
        source,
    };
    let mut doc: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(yaml_error)?;
    doc.apply_merge().map_err(yaml_error)?;
    yaml_value_to_json(doc)
}

/// Convert an already parsed YAML value.
///
/// JSON object keys must be strings, so scalar YAML keys (`200:`, `true:`) are rendered as
/// their textual form. Tags are dropped and the tagged value is kept.
pub fn yaml_value_to_json(value: serde_yaml::Value) -> Result<Value> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => yaml_number_to_json(&n)?,
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_value_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut out = serde_json::Map::with_capacity(mapping.len());
            for (k, v) in mapping {
                out.insert(mapping_key(k)?, yaml_value_to_json(v)?);
            }
            Value::Object(out)
        }
        Yaml::Tagged(tagged) => yaml_value_to_json(tagged.value)?,
    })
}

fn yaml_number_to_json(n: &serde_yaml::Number) -> Result<Value> {
    if let Some(u) = n.as_u64() {
        return Ok(Value::from(u));
    }
    if let Some(i) = n.as_i64() {
        return Ok(Value::from(i));
    }
    n.as_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ConvertError::Unsupported(format!("non-finite number '{n}'")))
}

fn mapping_key(key: serde_yaml::Value) -> Result<String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => mapping_key(tagged.value),
        Yaml::Sequence(_) | Yaml::Mapping(_) => Err(ConvertError::Unsupported(
            "mapping keys must be scalars".to_string(),
        )),
    }
}

/// Render JSON with four-space indentation.
pub fn json_to_pretty_string(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| ConvertError::Unsupported(e.to_string()))
}

/// Read `input` (YAML), write `output` (JSON) and return the converted document.
pub fn convert_file(input: &Path, output: &Path) -> Result<Value> {
    let yaml = std::fs::read_to_string(input).map_err(|source| ConvertError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let json = yaml_to_json(&yaml, &input.display().to_string())?;
    let rendered = json_to_pretty_string(&json)?;
    std::fs::write(output, rendered).map_err(|source| ConvertError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    tracing::debug!(input = %input.display(), output = %output.display(), "converted API description");
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_response_codes_become_string_keys() {
        let yaml = r#"
paths:
  /forecast:
    get:
      responses:
        200:
          description: ok
        "404":
          description: missing
"#;
        let v = yaml_to_json(yaml, "inline").expect("convert");
        let responses = &v["paths"]["/forecast"]["get"]["responses"];
        assert_eq!(responses["200"]["description"], json!("ok"));
        assert_eq!(responses["404"]["description"], json!("missing"));
    }

    #[test]
    fn merge_keys_are_resolved() {
        let yaml = r#"
defs:
  base: &base
    type: string
    maxLength: 8
schema:
  <<: *base
  description: id
  maxLength: 16
"#;
        let v = yaml_to_json(yaml, "inline").expect("convert");
        assert_eq!(
            v["schema"],
            json!({"type": "string", "maxLength": 16, "description": "id"})
        );
    }

    #[test]
    fn bad_merge_value_is_a_yaml_error() {
        let err = yaml_to_json("a:\n  <<: 3\n", "inline").expect_err("must fail");
        assert!(matches!(err, ConvertError::Yaml { .. }), "{err}");
    }

    #[test]
    fn scalars_keep_their_types() {
        let yaml = "a: 1\nb: -2\nc: 1.5\nd: true\ne: ~\nf: text\n";
        let v = yaml_to_json(yaml, "inline").expect("convert");
        assert_eq!(
            v,
            json!({"a": 1, "b": -2, "c": 1.5, "d": true, "e": null, "f": "text"})
        );
    }

    #[test]
    fn tags_are_unwrapped() {
        let v = yaml_to_json("value: !custom {a: 1}\n", "inline").expect("convert");
        assert_eq!(v, json!({"value": {"a": 1}}));
    }

    #[test]
    fn malformed_yaml_names_the_location() {
        let err = yaml_to_json("a: [1, 2\n", "openapi.yaml").expect_err("must fail");
        match err {
            ConvertError::Yaml { location, .. } => assert_eq!(location, "openapi.yaml"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pretty_output_uses_four_space_indent() {
        let s = json_to_pretty_string(&json!({"a": {"b": 1}})).expect("render");
        assert!(s.contains("\n    \"a\": {\n        \"b\": 1"), "{s}");
    }
}
