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

//! # Dao Core Library
//!
//! This is the main library entry point for the Dao data ingestion pipeline.
//! It turns raw training data — in-memory tensors, labeled directory trees,
//! CSV files, streamed chunks, classified text corpora — into fixed-shape
//! numeric batches ready for a training loop.
//!
//! ## Module Overview
//!
//! The library is organized into the following major modules:
//!
//! - **sequence**: Tokenizer (frequency-ranked vocabulary) and Preprocessor
//!   (sequence padding/truncation)
//! - **dataset**: The dataset family, the `DaoDataset`/`DaoDatasetFilter`
//!   contracts, and the label registry
//! - **crawler**: Deterministic recursive directory enumeration
//! - **errors**: `DaoError` and the crate-wide `Result` alias
//!
//! ## Feature Flags
//!
//! - `csv`: Enables the CSV dataset (pulls in the `csv` crate); on by
//!   default
//!
//! ## Quick Start
//!
//! ```rust
//! use dao::{DaoNDArrayDataset, DaoArrayDatasetConfig, DaoDataset};
//! use ndarray::Array2;
//!
//! let inputs = Array2::<f32>::zeros((100, 8)).into_dyn();
//! let mut dataset =
//!     DaoNDArrayDataset::new(inputs, None, DaoArrayDatasetConfig::default()).unwrap();
//!
//! for (step, batch) in dataset.epoch().unwrap().enumerate() {
//!     let (inputs, labels) = batch.unwrap();
//!     // feed the training loop
//! }
//! ```
//!
//! ## Data Flow
//!
//! 1. **Source**: a dataset enumerates raw items/records in fixed-size
//!    windows
//! 2. **Filter**: `DaoDatasetFilter::translate` converts each window to
//!    tensors (tokenization, label-id mapping, padding)
//! 3. **Shuffle**: an optional per-batch index permutation is gathered into
//!    the tensor pair
//! 4. **Yield**: `(step, (inputs, labels))` to the consumer; re-iterating
//!    starts a fresh epoch
//!
//! ## Error Handling
//!
//! All operations return `Result<T, DaoError>` for explicit error handling.
//! Common error types include configuration errors, shape mismatches,
//! vocabulary lookup failures, and I/O errors. Nothing is retried
//! internally; consumers treat any raised error as epoch-aborting.

pub mod crawler;
pub mod dataset;
pub mod errors;
pub mod sequence;

pub use errors::{DaoError, Result};

pub use crawler::DaoDirectoryCrawler;
pub use sequence::{
    pad_sequences, DaoAnalyzer, DaoPadOptions, DaoPadPosition, DaoTokenizer, DaoTokenizerConfig,
    DEFAULT_FILTERS,
};

pub use dataset::array::{DaoArrayDatasetConfig, DaoNDArrayDataset};
pub use dataset::classified::{
    DaoClassifiedDirectoryConfig, DaoClassifiedDirectoryDataset, DaoClassifiedStream,
};
#[cfg(feature = "csv")]
pub use dataset::csv::{DaoCsvConfig, DaoCsvDataset};
pub use dataset::sequential::{
    DaoChunk, DaoChunkIter, DaoChunkSource, DaoSequentialConfig, DaoSequentialDataset,
};
pub use dataset::text::{DaoSharedTokenizer, DaoTextClassifiedDataset, DaoTextFilter};
pub use dataset::{
    DaoBatch, DaoBatchStream, DaoDataset, DaoDatasetFilter, DaoLabelRegistry, DaoRawItem,
    DaoRawRecord, DaoSharedLabels,
};
