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

//! Text-sequence processing: tokenization and padding.

pub mod preprocessor;
pub mod tokenizer;

pub use preprocessor::{pad_sequences, DaoPadOptions, DaoPadPosition};
pub use tokenizer::{DaoAnalyzer, DaoTokenizer, DaoTokenizerConfig, DEFAULT_FILTERS};
