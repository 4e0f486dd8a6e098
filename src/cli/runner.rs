//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ConnectorConfig;
use crate::connectors::DatadisConnector;
use crate::error::Result;
use crate::stream::RecordSource;
use futures::{StreamExt, TryStreamExt};
use serde_json::{json, Value};
use std::io::Write;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, printing to stdout
    pub async fn run(&self) -> Result<()> {
        let mut stdout = std::io::stdout();
        self.run_with_output(&mut stdout).await
    }

    /// Run the CLI command, printing to `out`
    pub async fn run_with_output<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut config = self.load_config()?;
        match &self.cli.command {
            Commands::Check => self.check(config, out).await,
            Commands::Supplies { max_records } => {
                let connector = DatadisConnector::new(config)?;
                let supplies = connector.supplies()?;
                self.emit(&supplies, *max_records, out).await
            }
            Commands::Consumption {
                start_date,
                end_date,
                max_records,
            } => {
                if start_date.is_some() {
                    config.consumption.start_date.clone_from(start_date);
                    config.consumption.end_date = None;
                }
                if end_date.is_some() {
                    config.consumption.end_date.clone_from(end_date);
                }
                let connector = DatadisConnector::new(config)?;
                let consumption = connector.consumption()?;
                self.emit(&consumption, *max_records, out).await
            }
        }
    }

    /// Load the config file, or defaults plus environment
    fn load_config(&self) -> Result<ConnectorConfig> {
        match &self.cli.config {
            Some(path) => ConnectorConfig::load(path),
            None => Ok(ConnectorConfig::from_env()),
        }
    }

    /// Check connection
    async fn check<W: Write>(&self, config: ConnectorConfig, out: &mut W) -> Result<()> {
        let connector = DatadisConnector::new(config)?;

        let message = match connector.check().await {
            Ok(()) => json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": {
                    "status": "SUCCEEDED",
                    "message": "Connection successful"
                }
            }),
            Err(e) => json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": {
                    "status": "FAILED",
                    "message": format!("Connection failed: {e}")
                }
            }),
        };
        self.output_message(out, &message)
    }

    /// Print every record of a source, stopping at the first error
    async fn emit<S, W>(&self, source: &S, max_records: Option<usize>, out: &mut W) -> Result<()>
    where
        S: RecordSource,
        W: Write,
    {
        let mut records = source.read_records(None);
        if let Some(max) = max_records {
            records = records.take(max).boxed();
        }

        let mut count = 0usize;
        while let Some(record) = records.try_next().await? {
            self.output_message(out, &Value::Object(record))?;
            count += 1;
        }

        info!(stream = source.name(), records = count, "Stream complete");
        Ok(())
    }

    /// Output a message
    fn output_message<W: Write>(&self, out: &mut W, msg: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        writeln!(out, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_file(server: &MockServer) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
base_url: "{uri}/api/"
authorized_nif: "12345678Z"
auth:
  login_url: "{uri}/login"
  username: "user"
  password: "secret"
  token_ttl_seconds: 3600
http:
  backoff_factor_seconds: 0.01
consumption:
  start_date: "2023/10"
"#,
            uri = server.uri()
        )
        .unwrap();
        file
    }

    async fn mount_login(server: &MockServer, status: u16) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(status).set_body_string("tok"))
            .mount(server)
            .await;
    }

    async fn run(args: &[&str]) -> (Result<()>, Vec<Value>) {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        let result = Runner::new(cli).run_with_output(&mut out).await;
        let lines = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (result, lines)
    }

    #[test]
    fn test_parse_consumption_args() {
        let cli = Cli::try_parse_from([
            "datadis-cdk",
            "--verbose",
            "consumption",
            "--start-date",
            "2024/01",
            "--end-date",
            "2024/02",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Consumption {
                start_date,
                end_date,
                max_records,
            } => {
                assert_eq!(start_date.as_deref(), Some("2024/01"));
                assert_eq!(end_date.as_deref(), Some("2024/02"));
                assert_eq!(max_records, None);
            }
            other => panic!("Expected Consumption, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["datadis-cdk", "discover"]).is_err());
    }

    #[tokio::test]
    async fn test_check_succeeds() {
        let server = MockServer::start().await;
        mount_login(&server, 200).await;
        let file = config_file(&server);

        let (result, lines) = run(&["datadis-cdk", "-c", file.path().to_str().unwrap(), "check"]).await;

        assert!(result.is_ok());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["connectionStatus"]["status"], "SUCCEEDED");
    }

    #[tokio::test]
    async fn test_check_reports_failed_login() {
        let server = MockServer::start().await;
        mount_login(&server, 403).await;
        let file = config_file(&server);

        let (result, lines) = run(&["datadis-cdk", "-c", file.path().to_str().unwrap(), "check"]).await;

        assert!(result.is_ok());
        assert_eq!(lines[0]["connectionStatus"]["status"], "FAILED");
    }

    #[tokio::test]
    async fn test_supplies_prints_json_lines() {
        let server = MockServer::start().await;
        mount_login(&server, 200).await;
        Mock::given(method("GET"))
            .and(path("/api/get-supplies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"cups": "ES001"},
                {"cups": "ES002"},
                {"cups": "ES003"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        let file = config_file(&server);

        let (result, lines) = run(&[
            "datadis-cdk",
            "-c",
            file.path().to_str().unwrap(),
            "supplies",
            "--max-records",
            "2",
        ])
        .await;

        assert!(result.is_ok());
        assert_eq!(lines, vec![json!({"cups": "ES001"}), json!({"cups": "ES002"})]);
    }

    #[tokio::test]
    async fn test_consumption_uses_cli_dates() {
        let server = MockServer::start().await;
        mount_login(&server, 200).await;
        Mock::given(method("GET"))
            .and(path("/api/get-supplies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"cups": "ES001", "distributorCode": "2", "pointType": 5}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/get-consumption-data"))
            .and(query_param("startDate", "2024/01"))
            .and(query_param("endDate", "2024/01"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"consumptionKWh": 1.5}])),
            )
            .expect(1)
            .mount(&server)
            .await;
        let file = config_file(&server);

        let (result, lines) = run(&[
            "datadis-cdk",
            "-c",
            file.path().to_str().unwrap(),
            "consumption",
            "--start-date",
            "2024/01",
        ])
        .await;

        assert!(result.is_ok());
        assert_eq!(
            lines,
            vec![json!({"consumptionKWh": 1.5, "distributorCode": "2", "pointType": 5})]
        );
    }

    #[tokio::test]
    async fn test_http_error_is_returned() {
        let server = MockServer::start().await;
        mount_login(&server, 200).await;
        Mock::given(method("GET"))
            .and(path("/api/get-supplies"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "nif not authorized"})),
            )
            .mount(&server)
            .await;
        let file = config_file(&server);

        let (result, lines) =
            run(&["datadis-cdk", "-c", file.path().to_str().unwrap(), "supplies"]).await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 400, .. }));
        assert!(err.to_string().contains("nif not authorized"));
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_missing_config_file() {
        let (result, _) = run(&["datadis-cdk", "-c", "/nonexistent/datadis.yaml", "check"]).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
