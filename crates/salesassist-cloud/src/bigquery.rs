//! BigQuery REST client.
//!
//! Only the three calls the sales tools need: list tables in a dataset, fetch a
//! table's schema, and run a standard-SQL query to completion.

use crate::auth::Credentials;
use crate::error::{CloudError, Result};
use crate::http;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Default BigQuery API base URL.
pub const DEFAULT_BIGQUERY_BASE: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Server-side wait per query/poll request, in milliseconds.
const QUERY_WAIT_MS: u64 = 10_000;

/// One result row: column name to decoded value, in schema order.
pub type Row = Map<String, Value>;

/// Project and location a client is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientScope {
    /// Project used for jobs and for ids without an explicit project.
    pub project_id: String,

    /// Location where query jobs run.
    pub location: String,
}

impl ClientScope {
    /// Create a new scope.
    pub fn new(project_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
        }
    }
}

/// A table schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A column in a table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    /// BigQuery type name, e.g. `STRING`, `INTEGER`, `RECORD`.
    #[serde(rename = "type")]
    pub field_type: String,

    /// `NULLABLE`, `REQUIRED` or `REPEATED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Sub-fields of a `RECORD`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

impl Field {
    /// Create a nullable scalar field.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            mode: None,
            fields: Vec::new(),
        }
    }

    fn is_repeated(&self) -> bool {
        self.mode.as_deref() == Some("REPEATED")
    }
}

/// Warehouse operations used by the data tools.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Table ids in a dataset, in backend order.
    async fn list_tables(&self, dataset_id: &str) -> Result<Vec<String>>;

    /// Schema of a table.
    async fn get_table(&self, table_id: &str) -> Result<TableSchema>;

    /// Run a query and materialize every row.
    async fn query(&self, sql: &str) -> Result<Vec<Row>>;
}

/// Builds warehouse clients for one credential source at a time.
#[async_trait]
pub trait WarehouseConnector: Send + Sync {
    /// A client that presents exactly `token`.
    async fn with_token(&self, token: &str, scope: ClientScope) -> Result<Arc<dyn WarehouseClient>>;

    /// A client using application default credentials.
    async fn with_default_credentials(&self, scope: ClientScope)
        -> Result<Arc<dyn WarehouseClient>>;
}

/// Connector producing [`BigQueryClient`]s.
#[derive(Debug, Clone)]
pub struct BigQueryConnector {
    http: Client,
    base_url: String,
}

impl BigQueryConnector {
    /// Create a connector sharing `http`.
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: DEFAULT_BIGQUERY_BASE.to_string(),
        }
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn client(&self, credentials: Credentials, scope: ClientScope) -> Arc<dyn WarehouseClient> {
        Arc::new(
            BigQueryClient::new(self.http.clone(), credentials, scope)
                .with_base_url(self.base_url.clone()),
        )
    }
}

#[async_trait]
impl WarehouseConnector for BigQueryConnector {
    async fn with_token(&self, token: &str, scope: ClientScope) -> Result<Arc<dyn WarehouseClient>> {
        let credentials = Credentials::from_token(token)?;
        Ok(self.client(credentials, scope))
    }

    async fn with_default_credentials(
        &self,
        scope: ClientScope,
    ) -> Result<Arc<dyn WarehouseClient>> {
        let credentials = Credentials::application_default(&self.http).await?;
        Ok(self.client(credentials, scope))
    }
}

/// BigQuery REST client bound to one credential and one scope.
#[derive(Debug, Clone)]
pub struct BigQueryClient {
    http: Client,
    credentials: Credentials,
    scope: ClientScope,
    base_url: String,
}

impl BigQueryClient {
    /// Create a new client.
    pub fn new(http: Client, credentials: Credentials, scope: ClientScope) -> Self {
        Self {
            http,
            credentials,
            scope,
            base_url: DEFAULT_BIGQUERY_BASE.to_string(),
        }
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// The scope this client is bound to.
    pub fn scope(&self) -> &ClientScope {
        &self.scope
    }

    /// The credentials this client presents.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Split `project.dataset` or `dataset`.
    fn dataset_ref<'a>(&'a self, dataset_id: &'a str) -> Result<(&'a str, &'a str)> {
        match dataset_id.rsplit_once('.') {
            Some((project, dataset)) if !project.is_empty() && !dataset.is_empty() => {
                Ok((project, dataset))
            }
            None if !dataset_id.is_empty() => Ok((&self.scope.project_id, dataset_id)),
            _ => Err(CloudError::invalid_identifier(format!(
                "Invalid dataset id '{}': expected project.dataset or dataset",
                dataset_id
            ))),
        }
    }

    /// Split `project.dataset.table` or `dataset.table`.
    fn table_ref<'a>(&'a self, table_id: &'a str) -> Result<(&'a str, &'a str, &'a str)> {
        let invalid = || {
            CloudError::invalid_identifier(format!(
                "Invalid table id '{}': expected project.dataset.table or dataset.table",
                table_id
            ))
        };

        let (rest, table) = table_id.rsplit_once('.').ok_or_else(invalid)?;
        let (project, dataset) = match rest.rsplit_once('.') {
            Some((project, dataset)) => (project, dataset),
            None => (self.scope.project_id.as_str(), rest),
        };

        if project.is_empty() || dataset.is_empty() || table.is_empty() {
            return Err(invalid());
        }
        Ok((project, dataset, table))
    }

    async fn poll_query(&self, job: &JobReference, page_token: Option<&str>) -> Result<QueryResponse> {
        let project = job.project_id.as_deref().unwrap_or(&self.scope.project_id);
        let location = job.location.as_deref().unwrap_or(&self.scope.location);

        let mut query = vec![
            ("location", location.to_string()),
            ("timeoutMs", QUERY_WAIT_MS.to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let request = self
            .http
            .get(format!(
                "{}/projects/{}/queries/{}",
                self.base_url, project, job.job_id
            ))
            .query(&query);
        http::send_json(request, &self.credentials).await
    }
}

#[async_trait]
impl WarehouseClient for BigQueryClient {
    async fn list_tables(&self, dataset_id: &str) -> Result<Vec<String>> {
        let (project, dataset) = self.dataset_ref(dataset_id)?;
        let mut tables = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(format!(
                "{}/projects/{}/datasets/{}/tables",
                self.base_url, project, dataset
            ));
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: TableList = http::send_json(request, &self.credentials).await?;
            tables.extend(page.tables.into_iter().map(|t| t.table_reference.table_id));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Listed {} tables in {}", tables.len(), dataset_id);
        Ok(tables)
    }

    async fn get_table(&self, table_id: &str) -> Result<TableSchema> {
        let (project, dataset, table) = self.table_ref(table_id)?;
        let request = self.http.get(format!(
            "{}/projects/{}/datasets/{}/tables/{}",
            self.base_url, project, dataset, table
        ));

        let table: TableResource = http::send_json(request, &self.credentials).await?;
        Ok(table.schema.unwrap_or_default())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let body = QueryRequest {
            query: sql,
            use_legacy_sql: false,
            location: &self.scope.location,
            timeout_ms: QUERY_WAIT_MS,
        };

        let request = self
            .http
            .post(format!(
                "{}/projects/{}/queries",
                self.base_url, self.scope.project_id
            ))
            .json(&body);
        let mut response: QueryResponse = http::send_json(request, &self.credentials).await?;

        while !response.job_complete {
            let job = response
                .job_reference
                .take()
                .ok_or_else(|| CloudError::api(200, "Incomplete query job without a job reference"))?;
            debug!("Waiting for query job {}", job.job_id);
            response = self.poll_query(&job, None).await?;
            if response.job_reference.is_none() {
                response.job_reference = Some(job);
            }
        }

        let schema = response.schema.take().unwrap_or_default();
        let mut rows = Vec::new();
        decode_rows(&schema.fields, &response.rows, &mut rows);

        while let Some(token) = response.page_token.take().filter(|t| !t.is_empty()) {
            let job = response
                .job_reference
                .take()
                .ok_or_else(|| CloudError::api(200, "Paged query result without a job reference"))?;
            response = self.poll_query(&job, Some(&token)).await?;
            if response.job_reference.is_none() {
                response.job_reference = Some(job);
            }
            decode_rows(&schema.fields, &response.rows, &mut rows);
        }

        debug!("Query returned {} rows", rows.len());
        Ok(rows)
    }
}

fn decode_rows(fields: &[Field], raw: &[RawRow], out: &mut Vec<Row>) {
    out.extend(raw.iter().map(|row| decode_record(fields, &row.f)));
}

fn decode_record(fields: &[Field], cells: &[RawCell]) -> Row {
    fields
        .iter()
        .zip(cells)
        .map(|(field, cell)| (field.name.clone(), decode_field(field, &cell.v)))
        .collect()
}

fn decode_field(field: &Field, value: &Value) -> Value {
    if field.is_repeated() {
        return match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| decode_scalar(field, item.get("v").unwrap_or(&Value::Null)))
                    .collect(),
            ),
            _ => Value::Array(Vec::new()),
        };
    }
    decode_scalar(field, value)
}

/// Decode one non-repeated cell according to its schema type.
fn decode_scalar(field: &Field, value: &Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }

    if matches!(field.field_type.as_str(), "RECORD" | "STRUCT") {
        let cells: Vec<RawCell> = value
            .get("f")
            .and_then(|f| serde_json::from_value(f.clone()).ok())
            .unwrap_or_default();
        return Value::Object(decode_record(&field.fields, &cells));
    }

    let Some(text) = value.as_str() else {
        return value.clone();
    };

    match field.field_type.as_str() {
        "INTEGER" | "INT64" => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        // exact decimals, kept as text so no digit is lost
        "NUMERIC" | "BIGNUMERIC" | "DECIMAL" | "BIGDECIMAL" => Value::String(text.to_string()),
        "FLOAT" | "FLOAT64" => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        "BOOLEAN" | "BOOL" => match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        "TIMESTAMP" => text
            .parse::<f64>()
            .ok()
            .and_then(|secs| {
                let micros = (secs * 1_000_000.0).round() as i64;
                Utc.timestamp_micros(micros).single()
            })
            .map(|ts| Value::String(ts.to_rfc3339()))
            .unwrap_or_else(|| Value::String(text.to_string())),
        _ => Value::String(text.to_string()),
    }
}

// Internal types for the BigQuery API

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    location: &'a str,
    timeout_ms: u64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    #[serde(default)]
    job_reference: Option<JobReference>,
    #[serde(default)]
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<RawRow>,
    #[serde(default)]
    page_token: Option<String>,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    #[serde(default)]
    project_id: Option<String>,
    job_id: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Deserialize)]
struct RawRow {
    #[serde(default)]
    f: Vec<RawCell>,
}

#[derive(Deserialize, Default)]
struct RawCell {
    #[serde(default)]
    v: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableList {
    #[serde(default)]
    tables: Vec<TableListEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableListEntry {
    table_reference: TableReference,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableReference {
    table_id: String,
}

#[derive(Deserialize)]
struct TableResource {
    #[serde(default)]
    schema: Option<TableSchema>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> BigQueryClient {
        BigQueryClient::new(
            Client::new(),
            Credentials::from_token("ya29.test").unwrap(),
            ClientScope::new("acme-sales", "US"),
        )
        .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_list_tables_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/acme-sales/datasets/sales/tables"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tables": [{"tableReference": {"projectId": "acme-sales", "datasetId": "sales", "tableId": "customers"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/projects/acme-sales/datasets/sales/tables"))
            .and(header("authorization", "Bearer ya29.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tables": [{"tableReference": {"projectId": "acme-sales", "datasetId": "sales", "tableId": "transactions"}}],
                "nextPageToken": "p2"
            })))
            .mount(&server)
            .await;

        let tables = client(&server).await.list_tables("acme-sales.sales").await.unwrap();
        assert_eq!(tables, vec!["transactions", "customers"]);
    }

    #[tokio::test]
    async fn test_list_tables_empty_dataset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/acme-sales/datasets/empty/tables"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "bigquery#tableList"})))
            .mount(&server)
            .await;

        let tables = client(&server).await.list_tables("empty").await.unwrap();
        assert!(tables.is_empty());
    }

    #[tokio::test]
    async fn test_get_table_schema() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/acme-sales/datasets/sales/tables/transactions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "schema": {"fields": [
                    {"name": "customer_id", "type": "STRING", "mode": "REQUIRED"},
                    {"name": "amount", "type": "FLOAT"},
                    {"name": "items", "type": "RECORD", "mode": "REPEATED", "fields": [
                        {"name": "sku", "type": "STRING"}
                    ]}
                ]}
            })))
            .mount(&server)
            .await;

        let schema = client(&server)
            .await
            .get_table("acme-sales.sales.transactions")
            .await
            .unwrap();
        let names: Vec<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["customer_id", "amount", "items"]);
        assert_eq!(schema.fields[1].field_type, "FLOAT");
        assert_eq!(schema.fields[2].fields[0].name, "sku");
    }

    #[tokio::test]
    async fn test_get_table_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "Not found: Table acme-sales:sales.nope", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.get_table("sales.nope").await.unwrap_err();
        assert!(err.to_string().contains("Table acme-sales:sales.nope"));
    }

    #[tokio::test]
    async fn test_query_polls_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/acme-sales/queries"))
            .and(body_partial_json(json!({"useLegacySql": false, "location": "US"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobComplete": false,
                "jobReference": {"projectId": "acme-sales", "jobId": "job_1", "location": "US"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/projects/acme-sales/queries/job_1"))
            .and(query_param("location", "US"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobComplete": true,
                "jobReference": {"projectId": "acme-sales", "jobId": "job_1", "location": "US"},
                "schema": {"fields": [
                    {"name": "customer", "type": "STRING"},
                    {"name": "revenue", "type": "FLOAT"},
                    {"name": "orders", "type": "INTEGER"},
                    {"name": "active", "type": "BOOLEAN"},
                    {"name": "note", "type": "STRING"}
                ]},
                "rows": [
                    {"f": [{"v": "Globex"}, {"v": "1250.5"}, {"v": "3"}, {"v": "true"}, {"v": null}]}
                ]
            })))
            .mount(&server)
            .await;

        let rows = client(&server)
            .await
            .query("SELECT customer, SUM(amount) AS revenue FROM sales.transactions GROUP BY 1")
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({"customer": "Globex", "revenue": 1250.5, "orders": 3, "active": true, "note": null})
        );
        let keys: Vec<_> = rows[0].keys().cloned().collect();
        assert_eq!(keys, vec!["customer", "revenue", "orders", "active", "note"]);
    }

    #[tokio::test]
    async fn test_query_error_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "Syntax error: Unexpected keyword FROM at [1:8]", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.query("SELECT FROM").await.unwrap_err();
        assert!(matches!(err, CloudError::InvalidRequest(_)));
        assert!(err.to_string().contains("Unexpected keyword FROM"));
    }

    #[test]
    fn test_identifier_parsing() {
        let c = BigQueryClient::new(
            Client::new(),
            Credentials::from_token("t").unwrap(),
            ClientScope::new("acme-sales", "US"),
        );

        assert_eq!(c.dataset_ref("other.sales").unwrap(), ("other", "sales"));
        assert_eq!(c.dataset_ref("sales").unwrap(), ("acme-sales", "sales"));
        assert!(c.dataset_ref("").is_err());
        assert!(c.dataset_ref("acme.").is_err());

        assert_eq!(c.table_ref("p.d.t").unwrap(), ("p", "d", "t"));
        assert_eq!(c.table_ref("d.t").unwrap(), ("acme-sales", "d", "t"));
        assert_eq!(
            c.table_ref("example.com:proj.d.t").unwrap(),
            ("example.com:proj", "d", "t")
        );
        assert!(c.table_ref("transactions").is_err());
    }

    #[test]
    fn test_decode_nested_and_repeated() {
        let mut tags = Field::new("tags", "STRING");
        tags.mode = Some("REPEATED".to_string());
        let mut address = Field::new("address", "RECORD");
        address.fields = vec![Field::new("city", "STRING"), Field::new("zip", "INTEGER")];
        let fields = vec![tags, address, Field::new("ts", "TIMESTAMP")];

        let raw: RawRow = serde_json::from_value(json!({"f": [
            {"v": [{"v": "vip"}, {"v": "emea"}]},
            {"v": {"f": [{"v": "Berlin"}, {"v": "10115"}]}},
            {"v": "1.7E9"}
        ]}))
        .unwrap();

        let row = decode_record(&fields, &raw.f);
        assert_eq!(row["tags"], json!(["vip", "emea"]));
        assert_eq!(row["address"], json!({"city": "Berlin", "zip": 10115}));
        assert_eq!(row["ts"], json!("2023-11-14T22:13:20+00:00"));
    }

    #[test]
    fn test_decode_numeric_keeps_every_digit() {
        let fields = vec![
            Field::new("customer_name", "STRING"),
            Field::new("revenue", "NUMERIC"),
            Field::new("lifetime_value", "BIGNUMERIC"),
            Field::new("discount", "FLOAT"),
        ];

        let raw: RawRow = serde_json::from_value(json!({"f": [
            {"v": "Acme Corp"},
            {"v": "12345678901234567.89"},
            {"v": "98765432109876543210.123456789"},
            {"v": "0.25"}
        ]}))
        .unwrap();

        let row = decode_record(&fields, &raw.f);
        assert_eq!(row["revenue"], json!("12345678901234567.89"));
        assert_eq!(row["lifetime_value"], json!("98765432109876543210.123456789"));
        assert_eq!(row["discount"], json!(0.25));

        let rendered = Value::Object(row).to_string();
        assert!(rendered.contains("12345678901234567.89"));
    }
}
