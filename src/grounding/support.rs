//! Sentence-level support scoring against retrieved evidence.
//!
//! Each answer sentence is embedded on its own and compared with every
//! evidence chunk; its score is the best match. One well-matched passage is
//! enough to ground a narrow claim, so the maximum is used rather than a mean.

use crate::availability::Availability;
use crate::embeddings::Embedder;
use crate::retrieve::EvidenceChunk;
use crate::text::{cosine_similarity, prefix_chars, split_sentences};
use serde::Serialize;

/// Per-sentence support scores for one answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportAnalysis {
    pub sentences: Vec<String>,
    /// Aligned 1:1 with `sentences`.
    pub scores: Vec<f64>,
    pub low_support: Vec<String>,
    pub threshold: f64,
    /// No scoring signal was available; every sentence counts as low-support.
    pub offline: bool,
}

impl SupportAnalysis {
    pub fn low_support_count(&self) -> usize {
        self.low_support.len()
    }

    /// `low_support / max(sentences, 1)`.
    pub fn low_support_ratio(&self) -> f64 {
        self.low_support.len() as f64 / self.sentences.len().max(1) as f64
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SupportScorer {
    threshold: f64,
    chunk_chars: usize,
    min_sentence_chars: usize,
}

impl SupportScorer {
    /// * `threshold` - best similarity below which a sentence is low-support
    /// * `chunk_chars` - evidence prefix embedded per chunk
    /// * `min_sentence_chars` - sentences this short or shorter are skipped
    pub fn new(threshold: f64, chunk_chars: usize, min_sentence_chars: usize) -> Self {
        Self {
            threshold,
            chunk_chars,
            min_sentence_chars,
        }
    }

    /// Sentences worth scoring; list markers and headers fall under the
    /// length cut.
    pub fn sentences(&self, text: &str) -> Vec<String> {
        split_sentences(text)
            .into_iter()
            .filter(|s| s.chars().count() > self.min_sentence_chars)
            .map(String::from)
            .collect()
    }

    /// Degenerate analysis: zero scores, every sentence low-support.
    pub fn offline(&self, answer: &str) -> SupportAnalysis {
        let sentences = self.sentences(answer);
        SupportAnalysis {
            scores: vec![0.0; sentences.len()],
            low_support: sentences.clone(),
            sentences,
            threshold: self.threshold,
            offline: true,
        }
    }

    pub async fn score<E: Embedder>(
        &self,
        answer: &str,
        evidence: &[EvidenceChunk],
        embedder: &Availability<E>,
    ) -> SupportAnalysis {
        let embedder = match embedder.get() {
            Some(e) => e,
            None => return self.offline(answer),
        };

        let sentences = self.sentences(answer);
        let chunk_vecs = self.embed_chunks(embedder, evidence).await;

        let mut scores = Vec::with_capacity(sentences.len());
        let mut low_support = Vec::new();
        for sentence in &sentences {
            let vec = match embedder.embed(sentence).await {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("Sentence embedding failed, scoring as unsupported: {}", e);
                    Vec::new()
                }
            };
            let best = chunk_vecs
                .iter()
                .map(|c| cosine_similarity(&vec, c))
                .fold(0.0_f64, f64::max);
            if best < self.threshold {
                low_support.push(sentence.clone());
            }
            scores.push(best);
        }

        log::debug!(
            "Support analysis: {} sentences, {} low-support (threshold {})",
            sentences.len(),
            low_support.len(),
            self.threshold
        );

        SupportAnalysis {
            sentences,
            scores,
            low_support,
            threshold: self.threshold,
            offline: false,
        }
    }

    /// Embed evidence prefixes in one batch; if the batch fails, embed each
    /// chunk separately so one bad item only zeroes itself.
    async fn embed_chunks<E: Embedder>(&self, embedder: &E, evidence: &[EvidenceChunk]) -> Vec<Vec<f32>> {
        if evidence.is_empty() {
            return Vec::new();
        }
        let texts: Vec<String> = evidence
            .iter()
            .map(|c| prefix_chars(&c.text, self.chunk_chars).to_string())
            .collect();

        match embedder.embed_batch(&texts).await {
            Ok(vecs) if vecs.len() == texts.len() => return vecs,
            Ok(vecs) => log::warn!(
                "Evidence batch returned {} embeddings for {} chunks, retrying individually",
                vecs.len(),
                texts.len()
            ),
            Err(e) => log::warn!("Evidence batch embedding failed, retrying individually: {}", e),
        }

        let mut vecs = Vec::with_capacity(texts.len());
        for text in &texts {
            vecs.push(embedder.embed(text).await.unwrap_or_else(|e| {
                log::warn!("Evidence chunk embedding failed, scoring as zero: {}", e);
                Vec::new()
            }));
        }
        vecs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingEmbedder, HashEmbedder};

    const ANSWER: &str = "Article 1 sets out fundamental principles. It requires fairness and transparency.";

    fn scorer() -> SupportScorer {
        SupportScorer::new(0.58, 800, 20)
    }

    fn evidence() -> Vec<EvidenceChunk> {
        vec![
            EvidenceChunk::new("Article 1 Principles.", Some(1)),
            EvidenceChunk::new("Article 2 Scope.", Some(2)),
        ]
    }

    #[test]
    fn test_length_filter_counts_fragments_over_twenty_chars() {
        let s = scorer().sentences("Short one. This sentence is long enough to keep. Tiny!");
        assert_eq!(s, vec!["This sentence is long enough to keep."]);
    }

    #[tokio::test]
    async fn test_offline_marks_everything_low() {
        let unavailable: Availability<HashEmbedder> = Availability::Unavailable("no key".into());
        let analysis = scorer().score(ANSWER, &evidence(), &unavailable).await;

        // Both sentences exceed 20 characters.
        assert_eq!(analysis.sentences.len(), 2);
        assert!(analysis.offline);
        assert_eq!(analysis.scores, vec![0.0, 0.0]);
        assert_eq!(analysis.low_support, analysis.sentences);
        assert_eq!(analysis.low_support_ratio(), 1.0);
    }

    #[tokio::test]
    async fn test_offline_is_idempotent() {
        let unavailable: Availability<HashEmbedder> = Availability::Unavailable("no key".into());
        let first = scorer().score(ANSWER, &evidence(), &unavailable).await;
        let second = scorer().score(ANSWER, &evidence(), &unavailable).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_verbatim_sentence_is_supported() {
        let embedder = Availability::Available(HashEmbedder::default());
        let evidence = vec![
            EvidenceChunk::new("Personal data shall be processed lawfully and fairly.", Some(35)),
            EvidenceChunk::new("Supervisory authorities may impose administrative fines.", Some(82)),
        ];
        let answer = "Personal data shall be processed lawfully and fairly. Quantum chromodynamics explains hadrons.";
        let analysis = scorer().score(answer, &evidence, &embedder).await;

        assert!(!analysis.offline);
        assert_eq!(analysis.sentences.len(), 2);
        assert!((analysis.scores[0] - 1.0).abs() < 1e-6);
        assert_eq!(analysis.low_support, vec!["Quantum chromodynamics explains hadrons."]);
    }

    #[tokio::test]
    async fn test_no_evidence_scores_zero() {
        let embedder = Availability::Available(HashEmbedder::default());
        let analysis = scorer().score(ANSWER, &[], &embedder).await;
        assert!(!analysis.offline);
        assert_eq!(analysis.scores, vec![0.0, 0.0]);
        assert_eq!(analysis.low_support_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_chunk_does_not_abort_batch() {
        let embedder = Availability::Available(FailingEmbedder::new("POISON"));
        let evidence = vec![
            EvidenceChunk::new("POISON chunk that cannot be embedded", Some(1)),
            EvidenceChunk::new("Personal data shall be processed lawfully and fairly.", Some(2)),
        ];
        let answer = "Personal data shall be processed lawfully and fairly.";
        let analysis = scorer().score(answer, &evidence, &embedder).await;

        assert_eq!(analysis.scores.len(), 1);
        assert!((analysis.scores[0] - 1.0).abs() < 1e-6);
        assert!(analysis.low_support.is_empty());
    }

    #[tokio::test]
    async fn test_failing_sentence_scores_zero() {
        let embedder = Availability::Available(FailingEmbedder::new("POISON"));
        let answer = "This POISON sentence cannot be embedded. Personal data shall be processed lawfully.";
        let evidence = vec![EvidenceChunk::new("Personal data shall be processed lawfully.", Some(2))];
        let analysis = scorer().score(answer, &evidence, &embedder).await;

        assert_eq!(analysis.scores[0], 0.0);
        assert_eq!(analysis.low_support, vec!["This POISON sentence cannot be embedded."]);
    }
}
