//! Deterministic lexical embeddings.
//!
//! Feature-hashes word unigrams and bigrams into signed slots and
//! L2-normalizes, so cosine similarity reduces to weighted token overlap.
//! Not semantic in the transformer sense, but fully offline, reproducible
//! byte for byte, and strong enough for statutory text whose vocabulary the
//! corpus itself controls. The default capability; remote inference is an
//! upgrade, not a requirement.

use async_trait::async_trait;

use crate::capability::{CapabilityError, CompletionRequest, LanguageCapability};

/// Default number of hash slots.
pub const DEFAULT_DIM: usize = 256;

/// Offline embedding capability. `complete` always reports unavailable,
/// which downstream treats as "use the bilingual templates".
#[derive(Debug, Clone)]
pub struct LexicalCapability {
    dim: usize,
}

impl Default for LexicalCapability {
    fn default() -> Self {
        Self::new(DEFAULT_DIM)
    }
}

impl LexicalCapability {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        let tokens = tokenize(text);
        for token in &tokens {
            bump(&mut vector, fnv1a(token.as_bytes()));
        }
        for pair in tokens.windows(2) {
            let mut joined = String::with_capacity(pair[0].len() + pair[1].len() + 1);
            joined.push_str(&pair[0]);
            joined.push(' ');
            joined.push_str(&pair[1]);
            bump(&mut vector, fnv1a(joined.as_bytes()));
        }
        normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl LanguageCapability for LexicalCapability {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError> {
        Ok(self.embed_sync(text))
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, CapabilityError> {
        Err(CapabilityError::Unavailable(
            "lexical capability has no generative model".into(),
        ))
    }
}

/// English function words and legal boilerplate that carry no signal but
/// would otherwise dominate overlap between unrelated provisions.
const STOPWORDS: &[&str] = &[
    "the", "of", "an", "to", "or", "and", "in", "on", "at", "for", "be", "is", "are", "any",
    "no", "not", "shall", "may", "with", "by", "this", "that", "its",
];

/// Lowercased alphanumeric words, length ≥ 2, stopwords removed. Keeps
/// Devanagari and other non-ASCII word characters intact.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .map(|w| w.to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Add a hashed feature: slot from the low bits, sign from bit 32.
fn bump(vector: &mut [f32], hash: u64) {
    let slot = (hash % vector.len() as u64) as usize;
    let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
    vector[slot] += sign;
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// L2-normalize in place. A zero vector stays zero.
pub(crate) fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn embeddings_are_unit_length_and_deterministic() {
        let cap = LexicalCapability::default();
        let a = cap.embed("maximum retail price overcharge").await.unwrap();
        let b = cap.embed("maximum retail price overcharge").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIM);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "expected unit norm, got {norm}");
    }

    #[tokio::test]
    async fn overlapping_vocabulary_scores_higher() {
        let cap = LexicalCapability::default();
        let query = cap
            .embed("shop charged above the maximum retail price printed on the soap")
            .await
            .unwrap();
        let mrp_rule = cap
            .embed("no person shall sell any packaged commodity above the declared maximum retail price")
            .await
            .unwrap();
        let challan_rule = cap
            .embed("the schedule fixes the fine for each traffic offence challan")
            .await
            .unwrap();

        let sim_mrp = cosine(&query, &mrp_rule);
        let sim_challan = cosine(&query, &challan_rule);
        assert!(
            sim_mrp > sim_challan,
            "mrp rule ({sim_mrp:.4}) should outscore challan rule ({sim_challan:.4})"
        );
        assert!(sim_mrp > 0.15, "on-topic similarity too low: {sim_mrp:.4}");
    }

    #[tokio::test]
    async fn empty_text_embeds_to_zero() {
        let cap = LexicalCapability::default();
        let v = cap.embed("").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn batch_matches_single() {
        let cap = LexicalCapability::default();
        let texts = vec!["service charge".to_string(), "traffic challan".to_string()];
        let batch = cap.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], cap.embed("service charge").await.unwrap());
        assert_eq!(batch[1], cap.embed("traffic challan").await.unwrap());
    }

    #[tokio::test]
    async fn completion_is_unavailable() {
        let cap = LexicalCapability::default();
        let request = CompletionRequest {
            instructions: "phrase this".into(),
            facts: "fact".into(),
            language: nyaya_core::Language::En,
            max_tokens: 64,
            temperature: 0.0,
        };
        assert!(matches!(
            cap.complete(&request).await,
            Err(CapabilityError::Unavailable(_))
        ));
    }

    #[test]
    fn tokenizer_splits_and_lowercases() {
        assert_eq!(
            tokenize("Cafe X: ₹200.00 Service-Charge!"),
            vec!["cafe", "200", "00", "service", "charge"]
        );
    }
}
