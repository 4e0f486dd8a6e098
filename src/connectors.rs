//! Datadis resources
//!
//! - `Supplies` - every supply point visible to the account
//! - `Consumption` - consumption readings, one fetch cycle per supply
//!
//! `DatadisConnector` wires both to an authenticator and per-stream clients
//! from a `ConnectorConfig`.

use crate::auth::{AuthProvider, Authenticator};
use crate::config::ConnectorConfig;
use crate::error::Result;
use crate::http::{HttpClient, ResponseClassifier, ResponseEnvelope};
use crate::stream::{
    copy_parent_fields, json_records, parent_param, require_slice, DependentStream, HttpStream,
    PageRecords, Requester, StreamReader,
};
use crate::types::{RequestContext, StringMap};
use std::sync::Arc;
use tracing::debug;

/// Parent fields copied into every consumption record
const INHERITED_FIELDS: [&str; 2] = ["distributorCode", "pointType"];

fn base_params(authorized_nif: Option<&str>) -> StringMap {
    let mut params = StringMap::new();
    if let Some(nif) = authorized_nif {
        params.insert("authorizedNif".to_string(), nif.to_string());
    }
    params
}

// ============================================================================
// Supplies
// ============================================================================

/// `GET get-supplies`: a JSON array of supply points
#[derive(Debug, Clone, Default)]
pub struct Supplies {
    authorized_nif: Option<String>,
}

impl Supplies {
    pub fn new(authorized_nif: Option<String>) -> Self {
        Self { authorized_nif }
    }
}

impl ResponseClassifier for Supplies {}

impl HttpStream for Supplies {
    fn name(&self) -> &str {
        "supplies"
    }

    fn path(&self, _ctx: RequestContext<'_>) -> String {
        "get-supplies".to_string()
    }

    fn request_params(&self, _ctx: RequestContext<'_>) -> Result<StringMap> {
        Ok(base_params(self.authorized_nif.as_deref()))
    }

    fn parse_response(
        &self,
        response: &ResponseEnvelope,
        _ctx: RequestContext<'_>,
    ) -> Result<PageRecords> {
        json_records(response.json()?)
    }
}

// ============================================================================
// Consumption
// ============================================================================

/// `GET get-consumption-data` for the supply in the current slice
#[derive(Debug, Clone)]
pub struct Consumption {
    authorized_nif: Option<String>,
    start_date: String,
    end_date: String,
    measurement_type: u8,
}

impl Consumption {
    pub fn new(
        authorized_nif: Option<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        measurement_type: u8,
    ) -> Self {
        Self {
            authorized_nif,
            start_date: start_date.into(),
            end_date: end_date.into(),
            measurement_type,
        }
    }
}

impl ResponseClassifier for Consumption {}

impl HttpStream for Consumption {
    fn name(&self) -> &str {
        "consumption"
    }

    fn path(&self, _ctx: RequestContext<'_>) -> String {
        "get-consumption-data".to_string()
    }

    fn request_params(&self, ctx: RequestContext<'_>) -> Result<StringMap> {
        let slice = require_slice(self.name(), ctx)?;
        let mut params = base_params(self.authorized_nif.as_deref());
        for field in ["cups", "distributorCode", "pointType"] {
            params.insert(field.to_string(), parent_param(self.name(), slice, field)?);
        }
        params.insert("startDate".to_string(), self.start_date.clone());
        params.insert("endDate".to_string(), self.end_date.clone());
        params.insert(
            "measurementType".to_string(),
            self.measurement_type.to_string(),
        );
        Ok(params)
    }

    fn parse_response(
        &self,
        response: &ResponseEnvelope,
        ctx: RequestContext<'_>,
    ) -> Result<PageRecords> {
        let slice = require_slice(self.name(), ctx)?;
        let records = json_records(response.json()?)?;
        Ok(records
            .into_iter()
            .map(|record| {
                let mut record = record?;
                copy_parent_fields(self.name(), slice, &INHERITED_FIELDS, &mut record)?;
                Ok(record)
            })
            .collect())
    }
}

/// Consumption fanned out over supplies
pub type ConsumptionStream = DependentStream<StreamReader<Supplies>, Consumption>;

// ============================================================================
// Connector
// ============================================================================

/// Builds Datadis streams that share one authenticator
#[derive(Clone)]
pub struct DatadisConnector {
    config: ConnectorConfig,
    authenticator: Arc<dyn AuthProvider>,
}

impl DatadisConnector {
    /// Validate the config and log in with its credentials
    pub fn new(config: ConnectorConfig) -> Result<Self> {
        config.validate()?;
        let authenticator = Authenticator::new(config.auth_config()?);
        Ok(Self::with_auth(config, Arc::new(authenticator)))
    }

    /// Use a caller-supplied auth provider
    pub fn with_auth(config: ConnectorConfig, authenticator: Arc<dyn AuthProvider>) -> Self {
        Self {
            config,
            authenticator,
        }
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Obtain auth headers once to confirm the credentials work
    pub async fn check(&self) -> Result<()> {
        let headers = self.authenticator.auth_header().await?;
        debug!(headers = headers.len(), "Connection check passed");
        Ok(())
    }

    /// Each stream gets its own client and connection pool
    fn requester(&self) -> Result<Requester> {
        let client = HttpClient::with_config(self.config.http_client_config()?)?;
        Ok(Requester::new(client, self.authenticator.clone()))
    }

    pub fn supplies(&self) -> Result<StreamReader<Supplies>> {
        Ok(StreamReader::new(
            Supplies::new(self.config.authorized_nif.clone()),
            self.requester()?,
        ))
    }

    /// Consumption for every supply, over the configured date window
    pub fn consumption(&self) -> Result<ConsumptionStream> {
        let (start_date, end_date) = self.config.consumption_window()?;
        let consumption = Consumption::new(
            self.config.authorized_nif.clone(),
            start_date,
            end_date,
            self.config.consumption.measurement_type,
        );
        Ok(DependentStream::new(
            self.supplies()?,
            StreamReader::new(consumption, self.requester()?),
        ))
    }
}

impl std::fmt::Debug for DatadisConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatadisConnector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
