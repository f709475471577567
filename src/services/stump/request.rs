//! GraphQL envelope and mutation inputs

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StumpError};

#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<Value>>,
    #[serde(default)]
    pub extensions: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

impl GraphQlResponse {
    /// Errors win over data; a missing or null `data` is an empty response.
    pub fn into_data(self) -> Result<Value> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            return Err(StumpError::graphql(
                errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        match self.data {
            None | Some(Value::Null) => Err(StumpError::EmptyResponse),
            Some(data) => Ok(data),
        }
    }
}

/// Decode a raw GraphQL response body into `T`.
pub fn decode_envelope<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T> {
    let envelope: GraphQlResponse = serde_json::from_slice(body)?;
    let data = envelope.into_data()?;
    Ok(serde_json::from_value(data)?)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StumpSeriesMetadataInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booktype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comicid: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StumpMediaMetadataInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pencillers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inkers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorists: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letterers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_artists: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_isbn: Option<String>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct ScanSeries {
        #[serde(rename = "scanSeries")]
        scan_series: bool,
    }

    #[test]
    fn test_errors_take_precedence_over_data() {
        let body = json!({
            "data": { "scanSeries": true },
            "errors": [{ "message": "a" }, { "message": "b", "path": ["scanSeries"] }]
        });
        let err = decode_envelope::<ScanSeries>(body.to_string().as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: a, b");
    }

    #[test]
    fn test_empty_errors_list_is_ignored() {
        let body = json!({ "data": { "scanSeries": true }, "errors": [] });
        let decoded = decode_envelope::<ScanSeries>(body.to_string().as_bytes()).unwrap();
        assert!(decoded.scan_series);
    }

    #[test]
    fn test_null_data_is_empty_response() {
        let body = json!({ "data": null });
        let err = decode_envelope::<ScanSeries>(body.to_string().as_bytes()).unwrap_err();
        assert_matches!(err, StumpError::EmptyResponse);

        let err = decode_envelope::<ScanSeries>(b"{}").unwrap_err();
        assert_matches!(err, StumpError::EmptyResponse);
    }

    #[test]
    fn test_inputs_skip_absent_fields() {
        let input = StumpSeriesMetadataInput {
            title: Some("Saga".into()),
            status: Some("cancelled".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({ "title": "Saga", "status": "cancelled" })
        );

        let input = StumpMediaMetadataInput {
            identifier_isbn: Some("978".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({ "identifierIsbn": "978" })
        );
    }
}
