//! Query execution and response validation
//!
//! AMI answers with an `AMIMessage` envelope holding rowsets of rows of
//! named fields, either directly or wrapped in `Result` nodes. The JSON
//! converter emits a bare object where there is one
//! child and an array where there are several, so every level is read as
//! "object or array of objects". Anything without the envelope is rejected
//! as a validation error; there is no partial result.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::client::{AmiClient, TransportError};
use crate::error::AmiError;
use crate::query::{hashtag_search, AmiCommand};
use crate::scope::ScopeDescriptor;

/// One result row: column name -> value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, String>);

impl Row {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    /// A column every row of this query must have
    pub fn require(&self, column: &str) -> Result<&str, AmiError> {
        self.get(column)
            .ok_or_else(|| AmiError::Validation(format!("row is missing column {}", column)))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Rows in the order the service returned them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryResult {
    rows: Vec<Row>,
}

impl QueryResult {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for QueryResult {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Search the scope's hashtags for `hashtag`
pub fn execute<C>(
    client: &C,
    descriptor: &ScopeDescriptor,
    hashtag: &str,
) -> Result<QueryResult, AmiError>
where
    C: AmiClient + ?Sized,
{
    if hashtag.trim().is_empty() {
        return Err(AmiError::InvalidInput("hashtag must not be empty".to_string()));
    }

    execute_command(client, &hashtag_search(descriptor, hashtag))
}

/// Submit a rendered command and validate the response
pub fn execute_command<C>(client: &C, command: &AmiCommand) -> Result<QueryResult, AmiError>
where
    C: AmiClient + ?Sized,
{
    let rendered = command.to_string();
    debug!("AMI command: {}", rendered);

    let response = client.execute(&rendered)?;
    let result = extract_rows(&response)?;

    info!("AMI returned {} rows from {}", result.len(), command.entity);
    Ok(result)
}

/// Validate the envelope and pull out every row of every rowset
pub fn extract_rows(response: &Value) -> Result<QueryResult, AmiError> {
    let envelope = match response {
        Value::Null => return Err(AmiError::Validation("empty response".to_string())),
        Value::Object(map) => map
            .get("AMIMessage")
            .ok_or_else(|| AmiError::Validation("missing AMIMessage envelope".to_string()))?,
        other => {
            return Err(AmiError::Validation(format!(
                "expected a structured object, got {}",
                kind(other)
            )))
        }
    };

    let messages = objects(Some(envelope), "AMIMessage")?;
    if messages.is_empty() {
        return Err(AmiError::Validation("empty AMIMessage envelope".to_string()));
    }

    let mut nodes = Vec::new();
    for message in messages {
        nodes.push(message);
        nodes.extend(objects(message.get("Result"), "Result")?);
    }

    let errors: Vec<String> = nodes
        .iter()
        .flat_map(|n| list(n.get("error")))
        .map(text)
        .collect();
    if !errors.is_empty() {
        return Err(TransportError::Service(errors.join("; ")).into());
    }

    let mut rows = Vec::new();
    for node in &nodes {
        for rowset in objects(node.get("rowset"), "rowset")? {
            for row in objects(rowset.get("row"), "row")? {
                rows.push(parse_row(row)?);
            }
        }
    }

    Ok(QueryResult { rows })
}

fn parse_row(row: &Map<String, Value>) -> Result<Row, AmiError> {
    let mut columns = BTreeMap::new();

    for field in objects(row.get("field"), "field")? {
        let name = field
            .get("@name")
            .and_then(Value::as_str)
            .ok_or_else(|| AmiError::Validation("field without @name".to_string()))?;
        let value = field.get("$").map(text).unwrap_or_default();
        columns.insert(name.to_string(), value);
    }

    Ok(Row(columns))
}

/// A missing or null node is an empty list, a single node a list of one
fn list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    }
}

fn objects<'a>(
    value: Option<&'a Value>,
    what: &str,
) -> Result<Vec<&'a Map<String, Value>>, AmiError> {
    list(value)
        .into_iter()
        .map(|v| {
            v.as_object().ok_or_else(|| {
                AmiError::Validation(format!("{} should be an object, got {}", what, kind(v)))
            })
        })
        .collect()
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Object(map) => map.get("$").map(text).unwrap_or_default(),
        other => other.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use serde_json::json;
    use std::cell::RefCell;

    fn hashtag_response(rows: &[(&str, &str)]) -> Value {
        let rows: Vec<Value> = rows
            .iter()
            .map(|(name, scope)| {
                json!({"field": [
                    {"@name": "NAME", "$": name},
                    {"@name": "SCOPE", "$": scope},
                ]})
            })
            .collect();
        json!({"AMIMessage": {"rowset": [{"@type": "Element_Info", "row": rows}]}})
    }

    #[test]
    fn test_rows_returned_in_order() {
        let response = hashtag_response(&[("tag1", "PMGL1"), ("tag2", "PMGL3"), ("tag0", "PMGL1")]);
        let client = |_: &str| -> Result<Value, TransportError> { Ok(response.clone()) };

        let result = execute(&client, Scope::Mc20.descriptor(), "tag").unwrap();
        let names: Vec<&str> = result.rows().iter().map(|r| r.get("NAME").unwrap()).collect();
        assert_eq!(names, vec!["tag1", "tag2", "tag0"]);
        assert_eq!(result.rows()[1].get("SCOPE"), Some("PMGL3"));
    }

    #[test]
    fn test_submits_rendered_command() {
        let seen = RefCell::new(Vec::new());
        let client = |command: &str| -> Result<Value, TransportError> {
            seen.borrow_mut().push(command.to_string());
            Ok(hashtag_response(&[]))
        };

        let d = Scope::Mc23.descriptor();
        let result = execute(&client, d, "Fork").unwrap();
        assert!(result.is_empty());

        let seen = seen.into_inner();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], hashtag_search(d, "Fork").to_string());
    }

    #[test]
    fn test_null_response_is_validation_error() {
        let client = |_: &str| -> Result<Value, TransportError> { Ok(Value::Null) };
        let err = execute(&client, Scope::Mc20.descriptor(), "tag").unwrap_err();
        assert!(matches!(err, AmiError::Validation(_)));
    }

    #[test]
    fn test_unstructured_responses_rejected() {
        for response in [json!("<html/>"), json!([1, 2]), json!({}), json!({"AMIMessage": null})] {
            let err = extract_rows(&response).unwrap_err();
            assert!(matches!(err, AmiError::Validation(_)), "{response}");
        }
    }

    #[test]
    fn test_transport_error_propagates() {
        let client = |_: &str| -> Result<Value, TransportError> {
            Err(TransportError::Status {
                status: 503,
                body: "down for maintenance".to_string(),
            })
        };

        let err = execute(&client, Scope::Mc20.descriptor(), "tag").unwrap_err();
        match err {
            AmiError::Transport(TransportError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "down for maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_hashtag_makes_no_call() {
        let calls = RefCell::new(0);
        let client = |_: &str| -> Result<Value, TransportError> {
            *calls.borrow_mut() += 1;
            Ok(hashtag_response(&[]))
        };

        let err = execute(&client, Scope::Mc20.descriptor(), "  ").unwrap_err();
        assert!(matches!(err, AmiError::InvalidInput(_)));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_idempotent() {
        let response = hashtag_response(&[("a", "PMGL1"), ("b", "PMGL2")]);
        let client = |_: &str| -> Result<Value, TransportError> { Ok(response.clone()) };
        let d = Scope::Mc16.descriptor();

        let first = execute(&client, d, "x").unwrap();
        let second = execute(&client, d, "x").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_objects_instead_of_arrays() {
        let response = json!({"AMIMessage": [
            {"rowset": {"row": {"field": {"@name": "NAME", "$": "only"}}}}
        ]});
        let result = extract_rows(&response).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows()[0].get("NAME"), Some("only"));
    }

    #[test]
    fn test_rows_across_rowsets() {
        let response = json!({"AMIMessage": {"rowset": [
            {"row": [{"field": [{"@name": "NAME", "$": "first"}]}]},
            {"row": [{"field": [{"@name": "NAME", "$": "second"}]}]},
        ]}});
        let result = extract_rows(&response).unwrap();
        let names: Vec<&str> = result.rows().iter().filter_map(|r| r.get("NAME")).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_rows_inside_result_nodes() {
        let response = json!({"AMIMessage": [{
            "command": [{"$": "SearchQuery"}],
            "Result": [{"rowset": [{"@type": "HASHTAGS", "row": [{"field": [
                {"@name": "NAME", "$": "ttbar"},
                {"@name": "SCOPE", "$": "PMGL2"},
            ]}]}]}],
        }]});
        let result = extract_rows(&response).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows()[0].get("NAME"), Some("ttbar"));
        assert_eq!(result.rows()[0].get("SCOPE"), Some("PMGL2"));
    }

    #[test]
    fn test_service_error_inside_result() {
        let response = json!({"AMIMessage": {"Result": {"error": {"$": "catalog not found"}}}});
        let err = extract_rows(&response).unwrap_err();
        assert!(matches!(
            err,
            AmiError::Transport(TransportError::Service(ref m)) if m == "catalog not found"
        ));
    }

    #[test]
    fn test_missing_value_is_empty_string() {
        let response = json!({"AMIMessage": {"rowset": {"row": {"field": [{"@name": "NAME"}]}}}});
        let result = extract_rows(&response).unwrap();
        assert_eq!(result.rows()[0].get("NAME"), Some(""));
    }

    #[test]
    fn test_service_error_in_envelope() {
        let response = json!({"AMIMessage": {"error": [{"$": "Invalid MQL"}]}});
        let err = extract_rows(&response).unwrap_err();
        assert!(matches!(
            err,
            AmiError::Transport(TransportError::Service(ref m)) if m == "Invalid MQL"
        ));
    }

    #[test]
    fn test_field_without_name() {
        let response = json!({"AMIMessage": {"rowset": {"row": {"field": [{"$": "orphan"}]}}}});
        assert!(matches!(extract_rows(&response), Err(AmiError::Validation(_))));
    }

    #[test]
    fn test_row_require() {
        let row: Row = [("NAME", "Top")].into_iter().collect();
        assert_eq!(row.require("NAME").unwrap(), "Top");
        assert!(matches!(row.require("SCOPE"), Err(AmiError::Validation(_))));
    }
}
