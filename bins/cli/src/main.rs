//! bucketgate CLI
//!
//! Uploads files, issues and resolves object URLs, fetches Google access
//! tokens and sends mail, using the layered application configuration.

mod cli;

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bucketgate_core::storage::{ObjectGateway, UploadRequest, resolve_key};
use bucketgate_shared::{AppConfig, EmailService, GoogleTokenLoader};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bucketgate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    let output = run(cli.command, &config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

async fn run(command: Command, config: &AppConfig) -> anyhow::Result<serde_json::Value> {
    match command {
        Command::Upload {
            file,
            collection,
            content_type,
        } => {
            let gateway = gateway(config)?;
            let request = upload_request(&file, content_type, collection).await?;
            let result = gateway.upload(request).await?;
            info!(key = %result.key, size_kb = result.size_kb, "Upload complete");
            Ok(serde_json::to_value(result)?)
        }
        Command::Url {
            key,
            presigned: false,
            ..
        } => {
            let gateway = gateway(config)?;
            Ok(json!({ "url": gateway.public_url(&key)? }))
        }
        Command::Url {
            key,
            presigned: true,
            ttl,
        } => {
            let gateway = gateway(config)?;
            let ttl = ttl.map_or(gateway.presign_ttl(), Duration::from_secs);
            let presigned = gateway.presigned_url_with_ttl(&key, ttl).await?;
            Ok(serde_json::to_value(presigned)?)
        }
        Command::Resolve { url } => Ok(json!({ "key": resolve_key(&url)? })),
        Command::Token { credentials } => {
            let path = credentials
                .or_else(|| config.google.credentials_path.clone())
                .context("no credentials file given and google.credentials_path is not set")?;
            let token = GoogleTokenLoader::new()?.load_access_token(&path).await?;
            Ok(json!({ "access_token": token }))
        }
        Command::SendMail {
            to,
            subject,
            text,
            html,
        } => {
            let service = EmailService::new(config.email.clone());
            info!(
                smtp_host = %config.email.smtp_host,
                smtp_port = %config.email.smtp_port,
                "Sending email"
            );
            service
                .send(&to, &subject, &text, html.as_deref().unwrap_or_default())
                .await?;
            Ok(json!({ "sent": true, "to": to }))
        }
    }
}

/// Gateway over the configured bucket.
fn gateway(config: &AppConfig) -> anyhow::Result<ObjectGateway> {
    let settings = config
        .storage()
        .context("storage commands need storage.endpoint and storage.bucket")?;
    Ok(ObjectGateway::from_settings(settings))
}

/// Read `path` into an upload request named after its final component.
async fn upload_request(
    path: &Path,
    content_type: String,
    collection: String,
) -> anyhow::Result<UploadRequest> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    Ok(UploadRequest::new(content, filename, content_type, collection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketgate_shared::{EmailConfig, GoogleConfig, StorageSettings};

    fn config_with(storage: Option<StorageSettings>) -> AppConfig {
        AppConfig {
            storage,
            email: EmailConfig::default(),
            google: GoogleConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_resolve_needs_no_storage_section() {
        let output = run(
            Command::Resolve {
                url: "https://host/bucket/myfile_1700000000.png?X-Sig=abc".to_string(),
            },
            &config_with(None),
        )
        .await
        .expect("resolve");

        assert_eq!(output, json!({ "key": "myfile_1700000000.png" }));
    }

    #[tokio::test]
    async fn test_url_without_storage_section_fails() {
        let err = run(
            Command::Url {
                key: "a.png".to_string(),
                presigned: false,
                ttl: None,
            },
            &config_with(None),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("storage"), "{err}");
    }

    #[tokio::test]
    async fn test_url_with_storage_section() {
        let settings = StorageSettings {
            endpoint: "s3.example.com".to_string(),
            bucket: "uploads".to_string(),
            access_key: "ak".to_string(),
            secret_key: "sk".to_string(),
            region: "us-east-1".to_string(),
            secure: true,
            presign_ttl_secs: 3600,
        };

        let output = run(
            Command::Url {
                key: "a.png".to_string(),
                presigned: false,
                ttl: None,
            },
            &config_with(Some(settings)),
        )
        .await
        .expect("url");

        assert_eq!(output, json!({ "url": "https://s3.example.com/uploads/a.png" }));
    }

    #[tokio::test]
    async fn test_token_without_credentials_path_fails() {
        let err = run(Command::Token { credentials: None }, &config_with(None))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("google.credentials_path"), "{err}");
    }

    #[tokio::test]
    async fn test_upload_request_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.7 test").expect("write");

        let request = upload_request(&path, "application/pdf".into(), "reports".into())
            .await
            .expect("request");

        assert_eq!(request.filename, "report.pdf");
        assert_eq!(request.size, 13);
        assert_eq!(request.content.as_ref(), b"%PDF-1.7 test");
        assert_eq!(request.content_type, "application/pdf");
        assert_eq!(request.collection, "reports");
    }

    #[tokio::test]
    async fn test_upload_request_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");

        let err = upload_request(&dir.path().join("absent.bin"), "a/b".into(), "c".into())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("failed to read"));
    }
}
