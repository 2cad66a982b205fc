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

//! # Dao Text Classified Dataset
//!
//! Two-phase text-classification source on top of
//! [`DaoClassifiedDirectoryDataset`]. Phase one
//! ([`DaoTextClassifiedDataset::fit_on_texts`]) streams the raw corpus to
//! build the tokenizer vocabulary and the label registry; phase two encodes
//! either the whole retained corpus at once
//! ([`DaoTextClassifiedDataset::load_data`]) or batch-by-batch through the
//! attached [`DaoTextFilter`].
//!
//! The tokenizer and the label registry live behind `Arc<Mutex<..>>` so a
//! validation split constructed afterwards can share the training split's
//! assignments: pass `no_fit` (or rely on `load_data` detecting the fitted
//! vocabulary) and the validation pass reuses the existing indices. Keeping
//! the validation corpus from introducing new words or labels is the
//! caller's responsibility.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use ndarray::{Array1, ArrayD};

use crate::dataset::classified::{DaoClassifiedDirectoryConfig, DaoClassifiedDirectoryDataset};
use crate::dataset::{
    lock, DaoBatchStream, DaoDataset, DaoDatasetFilter, DaoLabelRegistry, DaoRawRecord,
    DaoSharedLabels,
};
use crate::errors::{DaoError, Result};
use crate::sequence::{pad_sequences, DaoPadOptions, DaoTokenizer};

/// Tokenizer shared by reference across train/validation splits.
pub type DaoSharedTokenizer = Arc<Mutex<DaoTokenizer>>;

/// Raw-to-tensor filter for text classification: tokenize, pad, map label
/// names to registry ids.
pub struct DaoTextFilter {
    tokenizer: DaoSharedTokenizer,
    labels: DaoSharedLabels,
    pad: DaoPadOptions<i32>,
}

impl DaoTextFilter {
    pub fn new(
        tokenizer: DaoSharedTokenizer,
        labels: DaoSharedLabels,
        pad: DaoPadOptions<i32>,
    ) -> Self {
        Self {
            tokenizer,
            labels,
            pad,
        }
    }
}

impl DaoDatasetFilter<i32> for DaoTextFilter {
    fn translate(
        &mut self,
        inputs: &[DaoRawRecord<i32>],
        labels: Option<&[DaoRawRecord<i32>]>,
    ) -> Result<(ArrayD<i32>, Option<ArrayD<i32>>)> {
        let tokenizer = lock(&self.tokenizer)?;
        let mut sequences = Vec::with_capacity(inputs.len());
        for record in inputs {
            match record {
                DaoRawRecord::Text(text) => sequences.push(tokenizer.text_to_sequence(text)),
                _ => {
                    return Err(DaoError::config(
                        "text filter expects raw text records as inputs",
                    ))
                }
            }
        }
        let inputs = pad_sequences(&sequences, &self.pad).into_dyn();

        let labels = match labels {
            Some(labels) => {
                let mut registry = lock(&self.labels)?;
                let mut ids = Vec::with_capacity(labels.len());
                for record in labels {
                    match record {
                        DaoRawRecord::Text(name) => ids.push(registry.get_or_insert(name)),
                        _ => {
                            return Err(DaoError::config(
                                "text filter expects raw text records as labels",
                            ))
                        }
                    }
                }
                Some(Array1::from_vec(ids).into_dyn())
            }
            None => None,
        };

        Ok((inputs, labels))
    }
}

/// Classified text corpus with two-phase fitting.
pub struct DaoTextClassifiedDataset {
    inner: DaoClassifiedDirectoryDataset<i32>,
    tokenizer: DaoSharedTokenizer,
    labels: DaoSharedLabels,
    pad: DaoPadOptions<i32>,
    retained: Vec<(String, String)>,
}

impl DaoTextClassifiedDataset {
    /// Builds a dataset with a fresh tokenizer and label registry.
    pub fn new(
        root: impl Into<PathBuf>,
        config: DaoClassifiedDirectoryConfig,
        tokenizer: DaoTokenizer,
        pad: DaoPadOptions<i32>,
    ) -> Result<Self> {
        Self::with_shared(
            root,
            config,
            Arc::new(Mutex::new(tokenizer)),
            Arc::new(Mutex::new(DaoLabelRegistry::new())),
            pad,
        )
    }

    /// Builds a dataset around an existing tokenizer and label registry,
    /// typically a validation split reusing its training split's state.
    pub fn with_shared(
        root: impl Into<PathBuf>,
        config: DaoClassifiedDirectoryConfig,
        tokenizer: DaoSharedTokenizer,
        labels: DaoSharedLabels,
        pad: DaoPadOptions<i32>,
    ) -> Result<Self> {
        let mut inner = DaoClassifiedDirectoryDataset::new(root, config)?;
        inner.set_filter(Box::new(DaoTextFilter::new(
            Arc::clone(&tokenizer),
            Arc::clone(&labels),
            pad.clone(),
        )));
        Ok(Self {
            inner,
            tokenizer,
            labels,
            pad,
            retained: Vec::new(),
        })
    }

    pub fn tokenizer(&self) -> DaoSharedTokenizer {
        Arc::clone(&self.tokenizer)
    }

    pub fn labels(&self) -> DaoSharedLabels {
        Arc::clone(&self.labels)
    }

    /// Phase one: a single raw streaming pass over the corpus, bypassing
    /// batching and the attached filter.
    ///
    /// Each text is fed to the tokenizer unless `no_fit` is set (a shared,
    /// already-fitted vocabulary stays untouched). When `load_all` is set
    /// the labels are registered incrementally and all `(text, label)`
    /// pairs are retained in memory for [`Self::load_data`].
    pub fn fit_on_texts(&mut self, load_all: bool, no_fit: bool) -> Result<()> {
        if load_all {
            self.retained.clear();
        }
        for item in self.inner.stream()? {
            let item = item?;
            if !no_fit {
                lock(&self.tokenizer)?.fit_on_text(&item.content);
            }
            if load_all {
                let label = item.label.ok_or_else(|| {
                    DaoError::config("text classified corpus requires labeled items")
                })?;
                lock(&self.labels)?.get_or_insert(&label);
                self.retained.push((item.content, label));
            }
        }
        if !no_fit {
            lock(&self.tokenizer)?.finish_fit();
        }
        Ok(())
    }

    /// Phase two over the whole corpus at once: fit (skipped when the
    /// vocabulary is already non-empty), then tokenize and pad every
    /// retained text. Returns the `[N, W]` input tensor and the `[N]`
    /// label-id tensor.
    pub fn load_data(&mut self) -> Result<(ArrayD<i32>, ArrayD<i32>)> {
        let no_fit = lock(&self.tokenizer)?.is_fitted();
        self.fit_on_texts(true, no_fit)?;

        let tokenizer = lock(&self.tokenizer)?;
        let sequences: Vec<Vec<i32>> = self
            .retained
            .iter()
            .map(|(text, _)| tokenizer.text_to_sequence(text))
            .collect();
        drop(tokenizer);
        let inputs = pad_sequences(&sequences, &self.pad).into_dyn();

        let registry = lock(&self.labels)?;
        let mut ids = Vec::with_capacity(self.retained.len());
        for (_, label) in &self.retained {
            ids.push(registry.get(label)?);
        }
        Ok((inputs, Array1::from_vec(ids).into_dyn()))
    }
}

impl DaoDataset<i32> for DaoTextClassifiedDataset {
    fn dataset_size(&self) -> usize {
        self.inner.dataset_size()
    }

    fn batch_size(&self) -> usize {
        self.inner.batch_size()
    }

    fn set_filter(&mut self, filter: Box<dyn DaoDatasetFilter<i32>>) {
        self.inner.set_filter(filter);
    }

    /// Batch-mode epochs run through the attached text filter.
    fn epoch(&mut self) -> Result<DaoBatchStream<'_, i32>> {
        self.inner.epoch()
    }
}
