//! Blob storage client and artifact uploader for VodForge.
//!
//! This crate provides:
//! - The [`BlobStore`] boundary: `put_file(key, path, content_type) -> url`
//! - An S3-compatible production client ([`BlobClient`])
//! - [`upload_tree`]: recursive, bounded-concurrency upload of a local
//!   HLS work directory

pub mod client;
pub mod error;
pub mod uploader;

pub use client::{BlobClient, BlobConfig, BlobStore};
pub use error::{StorageError, StorageResult};
pub use uploader::{content_type_for, upload_tree};
