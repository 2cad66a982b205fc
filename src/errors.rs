//! Copyright © 2025-2026 The Moyun Team. All Rights Reserved.
//!
//! This file is part of Dao.
//! The Dao project belongs to the Moyun Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Dao Error Module
//!
//! This module defines the error types and utilities used throughout the Dao
//! framework for consistent error handling and reporting.
//!
//! ## Error Categories
//!
//! - **Config**: invalid or missing configuration (absent mandatory filter,
//!   bad regex, unusable batch size for a source). Non-retryable, raised at
//!   construction or on the first iteration.
//! - **Shape**: size/shape mismatches between inputs and labels, or between
//!   a batch and its permutation.
//! - **NotFound**: vocabulary lookups for unknown words or indices.
//! - **Io**: filesystem failures, raised lazily at the point a path is first
//!   accessed.
//! - **Csv**: malformed rows or dialect failures from the CSV parser.
//! - **Serde**: tokenizer blob encode/decode failures.
//! - **Internal**: unexpected situations (poisoned locks and the like).
//!
//! None of these are retried internally; consumers should treat any raised
//! error as epoch-aborting.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Dao.
pub type Result<T> = std::result::Result<T, DaoError>;

/// Canonical error enumeration for Dao.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum DaoError {
    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Invalid configuration detected at construction or first iteration.
    #[error("config error: {message}")]
    Config { message: String },

    /// Shape or size mismatches between collaborating tensors.
    #[error("shape error: {message}")]
    Shape { message: String },

    /// Failed vocabulary or registry lookups.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Errors raised by the CSV parser.
    #[error("csv error: {0}")]
    Csv(String),

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for DaoError {
    fn from(err: io::Error) -> Self {
        DaoError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DaoError {
    fn from(err: serde_json::Error) -> Self {
        DaoError::Serde(err.to_string())
    }
}

#[cfg(feature = "csv")]
impl From<csv::Error> for DaoError {
    fn from(err: csv::Error) -> Self {
        DaoError::Csv(err.to_string())
    }
}

impl DaoError {
    /// Helper to construct configuration errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        DaoError::Config {
            message: message.into(),
        }
    }

    /// Helper to construct shape errors.
    pub fn shape<T: Into<String>>(message: T) -> Self {
        DaoError::Shape {
            message: message.into(),
        }
    }

    /// Helper to construct lookup errors.
    pub fn not_found<T: Into<String>>(message: T) -> Self {
        DaoError::NotFound {
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        DaoError::Internal(message.into())
    }
}
