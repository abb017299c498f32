//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Content type used when `--content-type` is not given.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Upload files to an S3-compatible bucket and hand out URLs for them.
#[derive(Debug, Parser)]
#[command(name = "bucketgate", version, about)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands. Every command prints a JSON document on success.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a local file under a generated key.
    Upload {
        /// File to upload.
        file: PathBuf,
        /// Collection label for the upload.
        #[arg(long, short)]
        collection: String,
        /// MIME type stored with the object.
        #[arg(long, default_value = DEFAULT_CONTENT_TYPE)]
        content_type: String,
    },
    /// Print the URL of a stored object.
    Url {
        /// Object key.
        key: String,
        /// Issue a time-limited signed URL instead of the public one.
        #[arg(long)]
        presigned: bool,
        /// Lifetime of the signed URL in seconds.
        #[arg(long, requires = "presigned")]
        ttl: Option<u64>,
    },
    /// Recover the object key from an issued URL.
    Resolve {
        /// Public or presigned URL.
        url: String,
    },
    /// Fetch an OAuth2 access token for a Google service account.
    Token {
        /// Service account key file. Defaults to `google.credentials_path`.
        #[arg(long)]
        credentials: Option<PathBuf>,
    },
    /// Send an email through the configured SMTP relay.
    SendMail {
        /// Recipient address.
        #[arg(long)]
        to: String,
        /// Subject line.
        #[arg(long)]
        subject: String,
        /// Plain text body.
        #[arg(long)]
        text: String,
        /// Optional HTML body.
        #[arg(long)]
        html: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_upload_defaults_content_type() {
        let cli = Cli::try_parse_from(["bucketgate", "upload", "a.png", "--collection", "avatars"])
            .expect("parse");

        match cli.command {
            Command::Upload {
                file,
                collection,
                content_type,
            } => {
                assert_eq!(file, PathBuf::from("a.png"));
                assert_eq!(collection, "avatars");
                assert_eq!(content_type, DEFAULT_CONTENT_TYPE);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_upload_requires_collection() {
        assert!(Cli::try_parse_from(["bucketgate", "upload", "a.png"]).is_err());
    }

    #[test]
    fn test_ttl_requires_presigned() {
        assert!(Cli::try_parse_from(["bucketgate", "url", "k", "--ttl", "60"]).is_err());

        let cli = Cli::try_parse_from(["bucketgate", "url", "k", "--presigned", "--ttl", "60"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Command::Url {
                presigned: true,
                ttl: Some(60),
                ..
            }
        ));
    }

    #[test]
    fn test_send_mail_html_is_optional() {
        let cli = Cli::try_parse_from([
            "bucketgate",
            "send-mail",
            "--to",
            "user@example.com",
            "--subject",
            "Hi",
            "--text",
            "Hello",
        ])
        .expect("parse");

        assert!(matches!(cli.command, Command::SendMail { html: None, .. }));
    }
}
