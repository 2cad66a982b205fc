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

//! # Dao Sequence Preprocessor
//!
//! Pads or truncates a collection of variable-length sequences into one
//! fixed-width `[N, W]` tensor. The width is the longest observed sequence,
//! clipped to `maxlen` when that is smaller. Rows shorter than the width are
//! padded with the fill value on the configured side; rows longer than the
//! width drop leading elements (`Pre`) or trailing elements (`Post`).
//!
//! The element type parameter takes the place of a dtype option: token ids
//! pad as integers, numeric features as floats.

use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::errors::{DaoError, Result};

/// Side on which padding is inserted or truncation applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaoPadPosition {
    #[default]
    Pre,
    Post,
}

impl FromStr for DaoPadPosition {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pre" => Ok(DaoPadPosition::Pre),
            "post" => Ok(DaoPadPosition::Post),
            other => Err(DaoError::config(format!(
                "padding/truncating must be 'pre' or 'post', got '{other}'"
            ))),
        }
    }
}

/// Padding options.
///
/// - `maxlen` (None): clip the output width when smaller than the longest
///   observed sequence.
/// - `padding` (`Pre`): side receiving the fill value for short rows.
/// - `truncating` (`Pre`): side dropped for long rows.
/// - `value` (`T::default()`): the fill value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaoPadOptions<T> {
    pub maxlen: Option<usize>,
    pub padding: DaoPadPosition,
    pub truncating: DaoPadPosition,
    pub value: T,
}

impl<T: Default> Default for DaoPadOptions<T> {
    fn default() -> Self {
        Self {
            maxlen: None,
            padding: DaoPadPosition::Pre,
            truncating: DaoPadPosition::Pre,
            value: T::default(),
        }
    }
}

/// Pads/truncates `sequences` into an `[N, W]` tensor.
///
/// `W = min(max(len(s) for s in sequences), maxlen or ∞)`; cells outside a
/// row's copied range hold `options.value`.
pub fn pad_sequences<T: Copy>(sequences: &[Vec<T>], options: &DaoPadOptions<T>) -> Array2<T> {
    let observed = sequences.iter().map(Vec::len).max().unwrap_or(0);
    let width = match options.maxlen {
        Some(maxlen) if maxlen < observed => maxlen,
        _ => observed,
    };

    let mut out = Array2::from_elem((sequences.len(), width), options.value);
    for (row, sequence) in sequences.iter().enumerate() {
        let len = sequence.len();
        let kept: &[T] = if len > width {
            match options.truncating {
                DaoPadPosition::Pre => &sequence[len - width..],
                DaoPadPosition::Post => &sequence[..width],
            }
        } else {
            sequence
        };
        let offset = if options.padding == DaoPadPosition::Pre {
            width - kept.len()
        } else {
            0
        };
        for (col, value) in kept.iter().enumerate() {
            out[[row, offset + col]] = *value;
        }
    }
    out
}
