//! Streaming persistence for [`LanguageModel`]
//!
//! The document is produced as an iterator of JSON text chunks, each holding
//! at most one batch of table entries, and written through any `AsyncWrite`.
//! The writer awaits every chunk (so a bounded sink applies backpressure) and
//! yields to the scheduler every few chunks during large saves.
//!
//! File layout (camelCase keys):
//! `bigrams`, `trigrams`: `[[context, [[word, count], ...]], ...]`
//! `bigramTotals`, `trigramTotals`: `[[context, count], ...]`
//! `totalBigrams`, `totalTrigrams`: integers
//! `vocabulary`: `[word, ...]`
//!
//! Older files may omit every field after the two tables; those are
//! recomputed on load.

use super::model::{LanguageModel, TransitionTable};
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::iter::once;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

/// Largest model file accepted by `load`
pub const MAX_MODEL_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Table entries serialized per chunk
pub const WRITE_BATCH_SIZE: usize = 500;

/// Chunks written between cooperative yields
const YIELD_EVERY_CHUNKS: usize = 16;

type Row = (String, Vec<(String, u64)>);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelDocument {
    bigrams: Vec<Row>,
    #[serde(default)]
    trigrams: Vec<Row>,
    bigram_totals: Option<Vec<(String, u64)>>,
    trigram_totals: Option<Vec<(String, u64)>>,
    total_bigrams: Option<u64>,
    total_trigrams: Option<u64>,
    vocabulary: Option<Vec<String>>,
}

fn into_table(rows: Vec<Row>) -> TransitionTable {
    rows.into_iter()
        .map(|(context, row)| (context, row.into_iter().collect()))
        .collect()
}

fn row_totals(table: &TransitionTable) -> HashMap<String, u64> {
    table
        .iter()
        .map(|(context, row)| (context.clone(), row.values().sum()))
        .collect()
}

impl ModelDocument {
    fn into_model(self) -> LanguageModel {
        let bigrams = into_table(self.bigrams);
        let trigrams = into_table(self.trigrams);

        let bigram_totals = match self.bigram_totals {
            Some(totals) => totals.into_iter().collect(),
            None => {
                debug!("Recomputing bigram totals");
                row_totals(&bigrams)
            }
        };
        let trigram_totals = match self.trigram_totals {
            Some(totals) => totals.into_iter().collect(),
            None => {
                debug!("Recomputing trigram totals");
                row_totals(&trigrams)
            }
        };
        let total_bigrams = self
            .total_bigrams
            .unwrap_or_else(|| bigram_totals.values().sum());
        let total_trigrams = self
            .total_trigrams
            .unwrap_or_else(|| trigram_totals.values().sum());

        let vocabulary: HashSet<String> = match self.vocabulary {
            Some(words) => words.into_iter().collect(),
            None => {
                debug!("Recomputing vocabulary");
                let mut words = HashSet::new();
                for (context, row) in &bigrams {
                    words.insert(context.clone());
                    words.extend(row.keys().cloned());
                }
                for (context, row) in &trigrams {
                    words.extend(context.split(' ').map(str::to_string));
                    words.extend(row.keys().cloned());
                }
                words
            }
        };

        LanguageModel {
            bigrams,
            trigrams,
            bigram_totals,
            trigram_totals,
            total_bigrams,
            total_trigrams,
            vocabulary,
        }
    }
}

/// Groups an iterator into vectors of at most `size` items
struct Batches<I> {
    inner: I,
    size: usize,
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<I::Item> = self.inner.by_ref().take(self.size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

/// `prefix`, comma-joined batches of entries, then `]`
fn array_section<'a, T, I>(
    prefix: &'static str,
    entries: I,
    batch_size: usize,
) -> impl Iterator<Item = serde_json::Result<String>> + 'a
where
    T: Serialize + 'a,
    I: Iterator<Item = T> + 'a,
{
    let batches = Batches {
        inner: entries,
        size: batch_size.max(1),
    }
    .enumerate()
    .map(|(i, batch)| -> serde_json::Result<String> {
        let encoded = batch
            .iter()
            .map(serde_json::to_string)
            .collect::<serde_json::Result<Vec<_>>>()?;
        let joined = encoded.join(",");
        Ok(if i == 0 { joined } else { format!(",{joined}") })
    });

    once(Ok(prefix.to_string()))
        .chain(batches)
        .chain(once(Ok("]".to_string())))
}

fn table_rows(table: &TransitionTable) -> impl Iterator<Item = (&String, Vec<(&String, &u64)>)> {
    table.iter().map(|(context, row)| (context, row.iter().collect()))
}

impl LanguageModel {
    /// Serialized document as a sequence of bounded JSON chunks
    pub fn document_chunks(
        &self,
        batch_size: usize,
    ) -> impl Iterator<Item = serde_json::Result<String>> + '_ {
        let totals = format!(
            ",\"totalBigrams\":{},\"totalTrigrams\":{}",
            self.total_bigrams, self.total_trigrams
        );

        array_section("{\"bigrams\":[", table_rows(&self.bigrams), batch_size)
            .chain(array_section(",\"trigrams\":[", table_rows(&self.trigrams), batch_size))
            .chain(array_section(",\"bigramTotals\":[", self.bigram_totals.iter(), batch_size))
            .chain(array_section(",\"trigramTotals\":[", self.trigram_totals.iter(), batch_size))
            .chain(once(Ok(totals)))
            .chain(array_section(",\"vocabulary\":[", self.vocabulary.iter(), batch_size))
            .chain(once(Ok("}".to_string())))
    }

    /// Stream the document into `writer`; returns bytes written
    pub async fn write_to<W>(&self, writer: &mut W) -> Result<u64, ModelError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        for (i, chunk) in self.document_chunks(WRITE_BATCH_SIZE).enumerate() {
            let chunk = chunk?;
            writer.write_all(chunk.as_bytes()).await?;
            written += chunk.len() as u64;
            if (i + 1) % YIELD_EVERY_CHUNKS == 0 {
                tokio::task::yield_now().await;
            }
        }
        writer.flush().await?;
        Ok(written)
    }

    /// Save to `path`, creating parent directories
    pub async fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::File::create(path).await?;
        let mut writer = BufWriter::new(file);
        let bytes = self.write_to(&mut writer).await?;

        info!(
            path = %path.display(),
            bytes,
            vocabulary = self.vocabulary.len(),
            "Saved language model"
        );
        Ok(())
    }

    /// Parse a document already in memory
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let document: ModelDocument = serde_json::from_slice(bytes)?;
        Ok(document.into_model())
    }

    /// Load from `path`, refusing files larger than [`MAX_MODEL_FILE_SIZE`]
    pub async fn load(path: &Path) -> Result<Self, ModelError> {
        Self::load_with_limit(path, MAX_MODEL_FILE_SIZE).await
    }

    pub async fn load_with_limit(path: &Path, limit: u64) -> Result<Self, ModelError> {
        let size = tokio::fs::metadata(path).await?.len();
        if size > limit {
            warn!(path = %path.display(), size, limit, "Refusing oversized model file");
            return Err(ModelError::TooLarge { size, limit });
        }

        let bytes = tokio::fs::read(path).await?;
        let model = Self::from_json_slice(&bytes)?;
        info!(
            path = %path.display(),
            vocabulary = model.vocabulary.len(),
            bigrams = model.total_bigrams,
            "Loaded language model"
        );
        Ok(model)
    }

    /// Load from `path` unless this instance already holds a model
    pub async fn ensure_loaded(&mut self, path: &Path) -> Result<(), ModelError> {
        if !self.is_empty() {
            debug!("Language model already loaded");
            return Ok(());
        }
        *self = Self::load(path).await?;
        Ok(())
    }
}
