//! Persisted embedding index
//!
//! Two artifacts are written together and read together:
//! - the embeddings file: a dense row-major `rows x dim` float matrix
//! - the metadata file: a manifest plus one entry per row
//!
//! Row `i` of the matrix belongs to the metadata entry with `id == i`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::errors::{Result, TutorError};

/// Metadata for one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Global identifier, unique across the corpus
    pub id: usize,
    /// Source document file name
    pub source: String,
    /// Position of the chunk within its document
    pub chunk_index: usize,
    pub text: String,
}

/// On-disk shape of the embeddings artifact
#[derive(Debug, Serialize, Deserialize)]
struct EmbeddingMatrix {
    rows: usize,
    dim: usize,
    values: Vec<f32>,
}

/// On-disk shape of the metadata artifact
#[derive(Debug, Serialize, Deserialize)]
struct IndexManifest {
    built_at: DateTime<Utc>,
    embed_model: String,
    dimension: usize,
    count: usize,
    chunks: Vec<ChunkMetadata>,
}

/// Read-only snapshot of all chunk vectors and their metadata
#[derive(Debug, Clone)]
pub struct IndexStore {
    chunks: Vec<ChunkMetadata>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
    embed_model: String,
    built_at: DateTime<Utc>,
}

impl IndexStore {
    /// Assemble a store, checking that rows and metadata are aligned
    pub fn from_parts(
        chunks: Vec<ChunkMetadata>,
        vectors: Vec<Vec<f32>>,
        embed_model: impl Into<String>,
    ) -> Result<Self> {
        Self::with_timestamp(chunks, vectors, embed_model.into(), Utc::now())
    }

    fn with_timestamp(
        chunks: Vec<ChunkMetadata>,
        vectors: Vec<Vec<f32>>,
        embed_model: String,
        built_at: DateTime<Utc>,
    ) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(TutorError::CorruptIndex(format!(
                "{} metadata entries but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        if let Some((position, chunk)) = chunks.iter().enumerate().find(|(i, c)| c.id != *i) {
            return Err(TutorError::CorruptIndex(format!(
                "metadata entry {} has id {}",
                position, chunk.id
            )));
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if let Some(row) = vectors.iter().position(|v| v.len() != dimension) {
            return Err(TutorError::CorruptIndex(format!(
                "row {} has dimension {}, expected {}",
                row,
                vectors[row].len(),
                dimension
            )));
        }

        Ok(Self {
            chunks,
            vectors,
            dimension,
            embed_model,
            built_at,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn chunk(&self, id: usize) -> Option<&ChunkMetadata> {
        self.chunks.get(id)
    }

    /// Metadata paired with its vector, in id order
    pub fn entries(&self) -> impl Iterator<Item = (&ChunkMetadata, &[f32])> {
        self.chunks
            .iter()
            .zip(self.vectors.iter().map(Vec::as_slice))
    }

    /// Write both artifacts
    pub fn save(&self, embeddings_path: &Path, metadata_path: &Path) -> Result<()> {
        let matrix = EmbeddingMatrix {
            rows: self.vectors.len(),
            dim: self.dimension,
            values: self.vectors.iter().flatten().copied().collect(),
        };
        write_json(embeddings_path, &matrix, false)?;

        let manifest = IndexManifest {
            built_at: self.built_at,
            embed_model: self.embed_model.clone(),
            dimension: self.dimension,
            count: self.chunks.len(),
            chunks: self.chunks.clone(),
        };
        write_json(metadata_path, &manifest, true)?;

        info!(
            count = self.len(),
            dimension = self.dimension,
            embeddings = %embeddings_path.display(),
            metadata = %metadata_path.display(),
            "Index artifacts written"
        );

        Ok(())
    }

    /// Load both artifacts. Either one missing is `MissingIndexArtifact`.
    pub fn load(embeddings_path: &Path, metadata_path: &Path) -> Result<Self> {
        for path in [embeddings_path, metadata_path] {
            if !path.exists() {
                return Err(TutorError::MissingIndexArtifact {
                    path: path.to_path_buf(),
                });
            }
        }

        let matrix: EmbeddingMatrix = read_json(embeddings_path)?;
        let manifest: IndexManifest = read_json(metadata_path)?;

        if matrix.rows * matrix.dim != matrix.values.len() {
            return Err(TutorError::CorruptIndex(format!(
                "matrix declares {}x{} but holds {} values",
                matrix.rows,
                matrix.dim,
                matrix.values.len()
            )));
        }

        if manifest.count != manifest.chunks.len() || manifest.count != matrix.rows {
            return Err(TutorError::CorruptIndex(format!(
                "manifest count {}, {} metadata entries, {} matrix rows",
                manifest.count,
                manifest.chunks.len(),
                matrix.rows
            )));
        }

        if matrix.rows > 0 && manifest.dimension != matrix.dim {
            return Err(TutorError::CorruptIndex(format!(
                "manifest dimension {} but matrix dimension {}",
                manifest.dimension, matrix.dim
            )));
        }

        let vectors = if matrix.dim == 0 {
            vec![Vec::new(); matrix.rows]
        } else {
            matrix
                .values
                .chunks(matrix.dim)
                .map(<[f32]>::to_vec)
                .collect()
        };

        let store = Self::with_timestamp(
            manifest.chunks,
            vectors,
            manifest.embed_model,
            manifest.built_at,
        )?;

        info!(
            count = store.len(),
            dimension = store.dimension,
            model = %store.embed_model,
            "Index loaded"
        );

        Ok(store)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writer.flush()?;

    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);

    serde_json::from_reader(reader).map_err(|e| {
        TutorError::CorruptIndex(format!("{} is not a valid index file: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn meta(id: usize, source: &str, chunk_index: usize) -> ChunkMetadata {
        ChunkMetadata {
            id,
            source: source.to_string(),
            chunk_index,
            text: format!("{} part {}", source, chunk_index),
        }
    }

    fn sample_store() -> IndexStore {
        IndexStore::from_parts(
            vec![meta(0, "a.txt", 0), meta(1, "a.txt", 1), meta(2, "b.md", 0)],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.6, 0.8]],
            "test-model",
        )
        .unwrap()
    }

    #[test]
    fn test_save_and_load_preserve_alignment() {
        let dir = TempDir::new().unwrap();
        let emb = dir.path().join("embeddings.json");
        let meta_path = dir.path().join("metadata.json");

        let store = sample_store();
        store.save(&emb, &meta_path).unwrap();

        let loaded = IndexStore::load(&emb, &meta_path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.dimension(), 2);
        assert_eq!(loaded.embed_model(), "test-model");
        assert_eq!(loaded.built_at(), store.built_at());

        for ((m1, v1), (m2, v2)) in store.entries().zip(loaded.entries()) {
            assert_eq!(m1, m2);
            assert_eq!(v1, v2);
        }
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let emb = dir.path().join("embeddings.json");
        let meta_path = dir.path().join("metadata.json");
        sample_store().save(&emb, &meta_path).unwrap();
        std::fs::remove_file(&meta_path).unwrap();

        match IndexStore::load(&emb, &meta_path) {
            Err(TutorError::MissingIndexArtifact { path }) => assert_eq!(path, meta_path),
            other => panic!("expected missing artifact, got {:?}", other),
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = IndexStore::from_parts(vec![meta(0, "a.txt", 0)], vec![], "m");
        assert!(matches!(result, Err(TutorError::CorruptIndex(_))));
    }

    #[test]
    fn test_misaligned_ids_rejected() {
        let result = IndexStore::from_parts(
            vec![meta(1, "a.txt", 0)],
            vec![vec![1.0]],
            "m",
        );
        assert!(matches!(result, Err(TutorError::CorruptIndex(_))));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = IndexStore::from_parts(
            vec![meta(0, "a.txt", 0), meta(1, "a.txt", 1)],
            vec![vec![1.0, 0.0], vec![1.0]],
            "m",
        );
        assert!(matches!(result, Err(TutorError::CorruptIndex(_))));
    }

    #[test]
    fn test_truncated_matrix_rejected() {
        let dir = TempDir::new().unwrap();
        let emb = dir.path().join("embeddings.json");
        let meta_path = dir.path().join("metadata.json");
        sample_store().save(&emb, &meta_path).unwrap();

        std::fs::write(&emb, r#"{"rows":3,"dim":2,"values":[1.0,0.0,0.0]}"#).unwrap();
        assert!(matches!(
            IndexStore::load(&emb, &meta_path),
            Err(TutorError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_garbage_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let emb = dir.path().join("embeddings.json");
        let meta_path = dir.path().join("metadata.json");
        sample_store().save(&emb, &meta_path).unwrap();

        std::fs::write(&meta_path, "not json").unwrap();
        assert!(matches!(
            IndexStore::load(&emb, &meta_path),
            Err(TutorError::CorruptIndex(_))
        ));
    }
}
