//! # Rapor Core
//!
//! Core types shared by every Rapor crate.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//!
//! # Example
//!
//! ```ignore
//! use rapor_core::AppError;
//!
//! let error = AppError::not_found(anyhow::anyhow!("Class not found"));
//! ```

pub mod errors;

pub use errors::AppError;
