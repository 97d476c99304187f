use agentcore_openapi_convert::{ConvertError, convert_file};
use serde_json::{Value, json};
use tempfile::tempdir;

const WEATHER_API: &str = r#"openapi: 3.0.0
info:
  title: Weather API
  version: "1.0"
servers:
  - url: https://api.example.com/v1
paths:
  /current.json:
    get:
      operationId: getCurrentWeather
      summary: Current weather for a location
      parameters:
        - name: q
          in: query
          required: true
          schema:
            type: string
      responses:
        200:
          description: Current conditions
          content:
            application/json:
              schema:
                type: object
                properties:
                  temp_c: { type: number }
                  is_day: { type: integer }
"#;

#[test]
fn converted_json_matches_the_yaml_document() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("openapi.yaml");
    let output = dir.path().join("openapi.json");
    std::fs::write(&input, WEATHER_API).expect("write yaml");

    let converted = convert_file(&input, &output).expect("convert");

    let reparsed: Value =
        serde_json::from_slice(&std::fs::read(&output).expect("read json")).expect("parse json");
    assert_eq!(reparsed, converted);
    assert_eq!(
        reparsed,
        json!({
            "openapi": "3.0.0",
            "info": { "title": "Weather API", "version": "1.0" },
            "servers": [{ "url": "https://api.example.com/v1" }],
            "paths": {
                "/current.json": {
                    "get": {
                        "operationId": "getCurrentWeather",
                        "summary": "Current weather for a location",
                        "parameters": [{
                            "name": "q",
                            "in": "query",
                            "required": true,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Current conditions",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "temp_c": { "type": "number" },
                                                "is_day": { "type": "integer" }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        })
    );
}

const SHARED_PARAMETERS: &str = r#"openapi: 3.0.0
info: { title: Ids, version: "1" }
components:
  schemas:
    Id: &id
      type: string
      maxLength: 8
    UserId:
      <<: *id
      description: user id
paths: {}
"#;

#[test]
fn anchors_and_merge_keys_are_expanded() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("openapi.yaml");
    let output = dir.path().join("openapi.json");
    std::fs::write(&input, SHARED_PARAMETERS).expect("write yaml");

    let converted = convert_file(&input, &output).expect("convert");

    assert_eq!(
        converted["components"]["schemas"],
        json!({
            "Id": { "type": "string", "maxLength": 8 },
            "UserId": { "type": "string", "maxLength": 8, "description": "user id" }
        })
    );
    let written = std::fs::read_to_string(&output).expect("read json");
    assert!(!written.contains("<<"), "{written}");
}

#[test]
fn missing_input_is_a_read_error() {
    let dir = tempdir().expect("tempdir");
    let err = convert_file(&dir.path().join("nope.yaml"), &dir.path().join("out.json"))
        .expect_err("must fail");
    assert!(matches!(err, ConvertError::Read { .. }), "{err}");
    assert!(!dir.path().join("out.json").exists());
}
