//! # salesassist-cloud
//!
//! Google Cloud collaborators for SalesAssist.
//!
//! - **Credentials**: delegated bearer tokens and application default credentials
//! - **BigQuery**: table listing, schema lookup, and query execution
//! - **Vertex AI**: authorized REST access and long-running operations

pub mod auth;
pub mod bigquery;
pub mod error;
mod http;
pub mod vertex;

pub use auth::{CredentialKind, Credentials};
pub use bigquery::{
    BigQueryClient, BigQueryConnector, ClientScope, Field, Row, TableSchema, WarehouseClient,
    WarehouseConnector,
};
pub use error::{CloudError, Result};
pub use vertex::{Operation, VertexClient};
