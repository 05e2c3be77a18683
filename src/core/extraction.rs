//! Maps a JSON response object onto named output columns.
//!
//! A schema is a list of field rules plus the columns that carry failure
//! text. Every rule is applied to every completed (row, endpoint) task, so
//! each declared column receives exactly one write per task.

use crate::domain::model::{Endpoint, Outcome, OutputTable, TaskResult};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFormat {
    /// Scalars as text, nested values as compact JSON.
    #[default]
    Text,
    /// List items joined by the rule's separator; anything else is empty.
    Joined,
    /// List as a JSON array; missing or empty is `[]`.
    JsonList,
    /// List as `{a, b}`; missing or empty is empty.
    BraceList,
}

fn default_separator() -> String {
    ", ".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub column: String,
    /// Dot-separated key path, e.g. `price.selling`.
    pub path: String,
    #[serde(default)]
    pub format: FieldFormat,
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl FieldRule {
    pub fn text(column: &str, path: &str) -> Self {
        Self {
            column: column.to_string(),
            path: path.to_string(),
            format: FieldFormat::Text,
            separator: default_separator(),
        }
    }

    pub fn with_format(mut self, format: FieldFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    pub fn extract(&self, object: &Map<String, Value>) -> String {
        let value = lookup(object, &self.path);
        match &self.format {
            FieldFormat::Text => value.map(render_text).unwrap_or_default(),
            FieldFormat::Joined => match value {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(render_text)
                    .collect::<Vec<_>>()
                    .join(&self.separator),
                _ => String::new(),
            },
            FieldFormat::JsonList => match value {
                Some(list @ Value::Array(items)) if !items.is_empty() => list.to_string(),
                _ => "[]".to_string(),
            },
            FieldFormat::BraceList => match value {
                Some(Value::Array(items)) if !items.is_empty() => {
                    let inner = items.iter().map(render_text).collect::<Vec<_>>().join(", ");
                    format!("{{{}}}", inner)
                }
                _ => String::new(),
            },
        }
    }
}

fn lookup<'a>(object: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = object.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn render_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    #[serde(default)]
    pub fields: Vec<FieldRule>,
    #[serde(default = "default_error_column")]
    pub error_column: String,
    /// Receives the whole response object, or `Error: ...` on failure.
    #[serde(default)]
    pub raw_response_column: Option<String>,
}

fn default_error_column() -> String {
    "error".to_string()
}

impl Default for ExtractionSchema {
    fn default() -> Self {
        Self::product()
    }
}

impl ExtractionSchema {
    /// The product listing schema returned by the `ParseUrl` endpoints.
    pub fn product() -> Self {
        Self {
            fields: vec![
                FieldRule::text("name", "name"),
                FieldRule::text("image", "images").with_format(FieldFormat::JsonList),
                FieldRule::text("brand", "brand"),
                FieldRule::text("categories", "categories").with_format(FieldFormat::Joined),
                FieldRule::text("price", "price.selling"),
                FieldRule::text("affiliateUrl", "affiliateUrl"),
                FieldRule::text("description", "description"),
            ],
            error_column: default_error_column(),
            raw_response_column: None,
        }
    }

    /// Base column names, before any endpoint suffix.
    pub fn base_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.fields.iter().map(|f| f.column.as_str()).collect();
        columns.push(&self.error_column);
        if let Some(raw) = &self.raw_response_column {
            columns.push(raw);
        }
        columns
    }

    pub fn output_columns(&self, endpoint: &Endpoint) -> Vec<String> {
        self.base_columns()
            .into_iter()
            .map(|column| endpoint.column(column))
            .collect()
    }

    /// Writes one task result into its row's columns for `endpoint`.
    pub fn apply(
        &self,
        table: &mut OutputTable,
        endpoint: &Endpoint,
        result: &TaskResult,
    ) -> Result<()> {
        let row = result.row_index;
        match &result.outcome {
            Outcome::Success(object) => {
                for field in &self.fields {
                    table.set(row, &endpoint.column(&field.column), field.extract(object))?;
                }
                table.set(row, &endpoint.column(&self.error_column), "")?;
                if let Some(raw) = &self.raw_response_column {
                    let body = serde_json::to_string(object)?;
                    table.set(row, &endpoint.column(raw), body)?;
                }
            }
            Outcome::Failure(err) => {
                for field in &self.fields {
                    table.set(row, &endpoint.column(&field.column), "")?;
                }
                table.set(row, &endpoint.column(&self.error_column), err.to_string())?;
                if let Some(raw) = &self.raw_response_column {
                    table.set(row, &endpoint.column(raw), format!("Error: {}", err))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Table;
    use crate::utils::error::TaskError;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn output_for(schema: &ExtractionSchema, endpoint: &Endpoint, rows: usize) -> OutputTable {
        let table = Table::new(
            vec!["API_URL".to_string()],
            vec![vec!["https://shop.example/item".to_string()]; rows],
        );
        OutputTable::new(table, &schema.output_columns(endpoint))
    }

    #[test]
    fn test_product_fields_mapped_directly() {
        let response = object(json!({
            "name": "Shoe",
            "brand": "Acme",
            "price": {"selling": 49.99},
            "categories": ["a", "b"]
        }));
        let schema = ExtractionSchema::product();
        let extracted: Vec<(String, String)> = schema
            .fields
            .iter()
            .map(|f| (f.column.clone(), f.extract(&response)))
            .collect();

        let get = |col: &str| {
            extracted
                .iter()
                .find(|(c, _)| c == col)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };
        assert_eq!(get("name"), "Shoe");
        assert_eq!(get("brand"), "Acme");
        assert_eq!(get("price"), "49.99");
        assert_eq!(get("categories"), "a, b");
        assert_eq!(get("image"), "[]");
        assert_eq!(get("description"), "");
    }

    #[test]
    fn test_missing_and_mistyped_paths_are_empty() {
        let response = object(json!({"price": 12, "categories": "shoes"}));
        assert_eq!(FieldRule::text("price", "price.selling").extract(&response), "");
        assert_eq!(FieldRule::text("brand", "brand").extract(&response), "");
        let joined = FieldRule::text("categories", "categories").with_format(FieldFormat::Joined);
        assert_eq!(joined.extract(&response), "");
    }

    #[test]
    fn test_list_formats() {
        let response = object(json!({
            "images": ["https://img/1.jpg", "https://img/2.jpg"],
            "categories": ["Men", null, 7]
        }));
        let json_list = FieldRule::text("image", "images").with_format(FieldFormat::JsonList);
        assert_eq!(
            json_list.extract(&response),
            r#"["https://img/1.jpg","https://img/2.jpg"]"#
        );

        let brace = FieldRule::text("image", "images").with_format(FieldFormat::BraceList);
        assert_eq!(brace.extract(&response), "{https://img/1.jpg, https://img/2.jpg}");
        assert_eq!(brace.extract(&object(json!({"images": []}))), "");

        let joined = FieldRule::text("categories", "categories")
            .with_format(FieldFormat::Joined)
            .with_separator(" | ");
        assert_eq!(joined.extract(&response), "Men | 7");
    }

    #[test]
    fn test_nested_values_render_as_json() {
        let response = object(json!({"price": {"selling": 10, "list": 12}, "inStock": true}));
        assert_eq!(
            FieldRule::text("price", "price").extract(&response),
            r#"{"list":12,"selling":10}"#
        );
        assert_eq!(FieldRule::text("stock", "inStock").extract(&response), "true");
    }

    #[test]
    fn test_apply_success_clears_error_column() {
        let schema = ExtractionSchema::product();
        let endpoint = Endpoint::new("ParseUrl", "https://api.example/parse").with_suffix("_api1");
        let mut table = output_for(&schema, &endpoint, 1);

        let result = TaskResult {
            row_index: 0,
            endpoint_name: endpoint.name.clone(),
            outcome: Outcome::Success(object(json!({"name": "Shoe", "brand": "Acme"}))),
        };
        schema.apply(&mut table, &endpoint, &result).unwrap();

        assert_eq!(table.get(0, "name_api1"), Some("Shoe"));
        assert_eq!(table.get(0, "brand_api1"), Some("Acme"));
        assert_eq!(table.get(0, "error_api1"), Some(""));
        assert_eq!(table.writes(), schema.base_columns().len());
    }

    #[test]
    fn test_apply_failure_writes_marker_and_raw_column() {
        let schema = ExtractionSchema {
            raw_response_column: Some("Response".to_string()),
            ..ExtractionSchema::product()
        };
        let endpoint = Endpoint::new("ParseUrl", "https://api.example/parse");
        let mut table = output_for(&schema, &endpoint, 1);

        let result = TaskResult {
            row_index: 0,
            endpoint_name: endpoint.name.clone(),
            outcome: Outcome::Failure(TaskError::HttpStatus {
                status: 404,
                body: "not found".to_string(),
            }),
        };
        schema.apply(&mut table, &endpoint, &result).unwrap();

        assert_eq!(table.get(0, "error"), Some("HTTP 404: not found"));
        assert_eq!(table.get(0, "Response"), Some("Error: HTTP 404: not found"));
        assert_eq!(table.get(0, "name"), Some(""));
        assert_eq!(table.get(0, "price"), Some(""));
    }

    #[test]
    fn test_schema_from_toml() {
        let schema: ExtractionSchema = toml::from_str(
            r#"
error_column = "status"

[[fields]]
column = "title"
path = "name"

[[fields]]
column = "tags"
path = "categories"
format = "joined"
separator = "; "

[[fields]]
column = "image"
path = "images"
format = "brace_list"
"#,
        )
        .unwrap();

        assert_eq!(schema.error_column, "status");
        assert_eq!(schema.fields[0].format, FieldFormat::Text);
        assert_eq!(schema.fields[1].format, FieldFormat::Joined);
        assert_eq!(schema.fields[1].separator, "; ");
        assert_eq!(schema.fields[0].separator, ", ");
        assert_eq!(schema.fields[2].format, FieldFormat::BraceList);
        assert_eq!(schema.raw_response_column, None);
    }
}
