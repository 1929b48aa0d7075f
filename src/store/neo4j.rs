//! Neo4j accessor over the HTTP transactional API
//!
//! Every statement is one `POST {base}/db/{database}/tx/commit` request:
//! the session opens and closes with the request, whatever the outcome.

use super::{GraphAccessor, Statement, StoreError, StoreResult};
use crate::config::StoreConfig;
use crate::evidence::Row;
use crate::intent::Params;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct HttpAccessor {
    client: Client,
    endpoint: String,
    username: String,
    password: Option<String>,
    timeout: Duration,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    statements: [StatementRequest<'a>; 1],
}

#[derive(Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(rename = "resultDataContents")]
    result_data_contents: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<ServerError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    row: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    code: String,
    message: String,
}

/// HTTP base URL for a configured server address.
///
/// Driver-style addresses are mapped onto the HTTP connector: `neo4j+s://`
/// and `bolt+s://` become `https://`, `neo4j://` and `bolt://` become
/// `http://` with the default Bolt port swapped for 7474.
pub fn http_base_url(uri: &str) -> String {
    let uri = uri.trim().trim_end_matches('/');
    let (scheme, rest) = uri.split_once("://").unwrap_or(("http", uri));
    match scheme {
        "neo4j+s" | "neo4j+ssc" | "bolt+s" | "bolt+ssc" | "https" => format!("https://{}", rest),
        "neo4j" | "bolt" => format!("http://{}", rest.replace(":7687", ":7474")),
        _ => format!("http://{}", rest),
    }
}

impl HttpAccessor {
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/db/{}/tx/commit", http_base_url(&config.uri), config.database),
            username: config.username.clone(),
            password: config.password.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn send_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else {
            StoreError::Connection(e.to_string())
        }
    }
}

/// Rebuild rows from a commit response, in column order
pub(crate) fn decode_response(response: CommitResponse) -> StoreResult<Vec<Row>> {
    if let Some(error) = response.errors.into_iter().next() {
        let detail = format!("{}: {}", error.code, error.message);
        return Err(if error.code.contains("ParameterMissing") || error.code.contains("TypeError") {
            StoreError::Parameter(detail)
        } else {
            StoreError::Query(detail)
        });
    }

    let result = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::Protocol("response has no result set".to_string()))?;

    result
        .data
        .into_iter()
        .map(|data| {
            if data.row.len() != result.columns.len() {
                return Err(StoreError::Protocol(format!(
                    "row has {} values for {} columns",
                    data.row.len(),
                    result.columns.len()
                )));
            }
            Ok(result.columns.iter().cloned().zip(data.row).collect())
        })
        .collect()
}

#[async_trait]
impl GraphAccessor for HttpAccessor {
    fn name(&self) -> &str {
        "neo4j"
    }

    async fn run(&self, statement: &Statement, params: &Params) -> StoreResult<Vec<Row>> {
        let cypher = statement.cypher();
        let request = CommitRequest {
            statements: [StatementRequest {
                statement: &cypher,
                parameters: params.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
                result_data_contents: ["row"],
            }],
        };

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json;charset=UTF-8")
            .json(&request);
        if let Some(password) = &self.password {
            builder = builder.basic_auth(&self.username, Some(password));
        }

        let resp = builder.send().await.map_err(|e| self.send_error(e))?;
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(StoreError::Connection(format!(
                    "authentication failed for {}",
                    self.username
                )))
            }
            status if !status.is_success() => {
                let text = resp.text().await.unwrap_or_default();
                return Err(StoreError::Protocol(format!("HTTP {}: {}", status, text)));
            }
            _ => {}
        }

        let response: CommitResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Protocol(e.to_string()))?;
        let rows = decode_response(response)?;
        tracing::debug!("{} returned {} rows from {}", statement, rows.len(), self.endpoint);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(body: serde_json::Value) -> StoreResult<Vec<Row>> {
        decode_response(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn test_base_url_mapping() {
        assert_eq!(http_base_url("neo4j+s://abc.databases.neo4j.io"), "https://abc.databases.neo4j.io");
        assert_eq!(http_base_url("bolt://localhost:7687"), "http://localhost:7474");
        assert_eq!(http_base_url("http://db:7474/"), "http://db:7474");
        assert_eq!(http_base_url("localhost:7474"), "http://localhost:7474");
    }

    #[test]
    fn test_endpoint() {
        let accessor = HttpAccessor::new(&StoreConfig {
            uri: "neo4j://graph:7687".to_string(),
            database: "airline".to_string(),
            ..StoreConfig::default()
        })
        .unwrap();
        assert_eq!(accessor.endpoint(), "http://graph:7474/db/airline/tx/commit");
    }

    #[test]
    fn test_decode_rows_in_column_order() {
        let rows = decode(json!({
            "results": [{
                "columns": ["airport", "journey_count", "examples"],
                "data": [
                    {"row": ["LAX", 12, []], "meta": [null, null, null]},
                    {"row": ["ORD", 9, [{"id": "F1"}]], "meta": [null, null, null]}
                ]
            }],
            "errors": []
        }))
        .unwrap();
        assert_eq!(rows.len(), 2);
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["airport", "journey_count", "examples"]);
        assert_eq!(rows[1]["examples"][0]["id"], json!("F1"));
    }

    #[test]
    fn test_decode_server_errors() {
        let err = decode(json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Statement.ParameterMissing", "message": "Expected parameter(s): origin"}]
        }))
        .unwrap_err();
        assert!(matches!(err, StoreError::Parameter(_)));

        let err = decode(json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "bad"}]
        }))
        .unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));

        assert!(matches!(decode(json!({"results": []})), Err(StoreError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let accessor = HttpAccessor::new(&StoreConfig {
            uri: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..StoreConfig::default()
        })
        .unwrap();
        let err = accessor
            .run(&Statement::Intent(crate::intent::Intent::PopularAirports), &Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Connection(_) | StoreError::Timeout(_)));
    }
}
