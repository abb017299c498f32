//! Shared configuration and collaborator services for bucketgate.
//!
//! This crate provides the pieces that sit next to the storage gateway:
//! - Configuration management
//! - Transactional email over SMTP
//! - Google service-account access tokens

pub mod config;
pub mod email;
pub mod google;

pub use config::{AppConfig, EmailConfig, GoogleConfig, StorageSettings};
pub use email::{EmailError, EmailService};
pub use google::{GoogleAuthError, GoogleTokenLoader, ServiceAccountKey};
