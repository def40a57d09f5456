use crate::category::syntax::FeatureMatching;
use crate::chart::Inference;
use crate::lexicon::UNKNOWN_WORD_PREFIX;

/// Knobs of a `CcgParser`
#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
  pub inference: Inference,
  pub features: FeatureMatching,
  /// Allow harmonic composition in addition to application
  pub composition: bool,
  /// Keep at most this many root analyses
  pub max_parses: Option<usize>,
  /// Prefix of the pseudo-words used to look up unknown words by POS tag
  pub unknown_word_prefix: String,
}

impl Default for ParserConfig {
  fn default() -> Self {
    Self {
      inference: Inference::Exact,
      features: FeatureMatching::Strict,
      composition: false,
      max_parses: None,
      unknown_word_prefix: UNKNOWN_WORD_PREFIX.to_string(),
    }
  }
}

impl ParserConfig {
  pub fn with_inference(mut self, inference: Inference) -> Self {
    self.inference = inference;
    self
  }

  pub fn with_beam(self, size: usize) -> Self {
    self.with_inference(Inference::Beam { size })
  }

  pub fn with_features(mut self, features: FeatureMatching) -> Self {
    self.features = features;
    self
  }

  pub fn with_composition(mut self, composition: bool) -> Self {
    self.composition = composition;
    self
  }

  pub fn with_max_parses(mut self, max_parses: usize) -> Self {
    self.max_parses = Some(max_parses);
    self
  }

  pub fn with_unknown_word_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.unknown_word_prefix = prefix.into();
    self
  }
}
