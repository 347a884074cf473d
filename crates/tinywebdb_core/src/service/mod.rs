//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate entry store calls into store/get/import/export use-cases.
//! - Keep transport and rendering layers decoupled from storage details.

pub mod bulk;
pub mod store_service;
pub mod tag_index;
pub mod views;
