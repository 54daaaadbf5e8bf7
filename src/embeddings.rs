//! Embedding model seam used by the vector store.

/// Text used to discover a model's real output dimensionality.
pub const DIMENSION_PROBE_TEXT: &str = "dimension probe";

/// Synchronous embedding model.
///
/// The pipeline is single-threaded from the caller's perspective, so
/// implementations block until the provider answers.
pub trait Embeddings: Send + Sync {
    fn name(&self) -> &str;

    /// Embed documents for storage. Output order matches input order.
    fn embed_documents(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Embed a search query.
    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Ask the model for one embedding and report its length.
pub fn probe_dimension(model: &dyn Embeddings) -> anyhow::Result<usize> {
    let vector = model.embed_query(DIMENSION_PROBE_TEXT)?;
    anyhow::ensure!(
        !vector.is_empty(),
        "Embedding model '{}' returned an empty vector",
        model.name()
    );
    Ok(vector.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(usize);

    impl Embeddings for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn embed_documents(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.5; self.0]).collect())
        }

        fn embed_query(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(vec![0.5; self.0])
        }
    }

    #[test]
    fn probe_reports_model_length() {
        assert_eq!(probe_dimension(&Fixed(384)).unwrap(), 384);
    }

    #[test]
    fn probe_rejects_empty_vectors() {
        assert!(probe_dimension(&Fixed(0)).is_err());
    }
}
