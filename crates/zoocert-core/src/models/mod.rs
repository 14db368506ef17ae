//! Data models for certificates, scans and configuration.

pub mod certificate;
pub mod config;
pub mod scan;
