//! paperdesk - a terminal client for a document question-answering service
//!
//! This crate provides:
//! - Ingestion of local PDF files, read and base64-encoded with progress
//! - A session controller tracking documents, chat history and notifications
//! - A typed HTTP client for the retrieval/generation backend
//! - Answer rendering for terminals and HTML

pub mod backend;
pub mod chat;
pub mod commands;
pub mod config;
pub mod error;
pub mod health;
pub mod ingest;
pub mod models;
pub mod notify;
pub mod progress;
pub mod session;
pub mod source;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
