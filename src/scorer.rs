//! Weights for chart entries. A derivation's probability is the product of
//! its children's probabilities, the local weight of the step that built it
//! and the weights of the dependencies that step filled. A weight of zero
//! keeps the candidate out of the chart.

use std::collections::HashMap;

use crate::category::headed::HeadedSyntacticCategory;
use crate::category::semantics::Dependency;
use crate::category::Sign;
use crate::chart::ChartEntry;
use crate::combinator::Combinator;
use crate::lexicon::LexiconEntry;
use crate::parser::Sentence;
use crate::rules::UnaryRule;

pub trait Scorer {
  /// Weight of using `entry` for the words `start..=end`
  fn lexical_weight(&self, sentence: &Sentence, start: usize, end: usize, entry: &LexiconEntry) -> f64 {
    let _ = (sentence, start, end, entry);
    1.0
  }

  fn binary_weight(&self, combinator: Combinator, left: &ChartEntry, right: &ChartEntry, result: &Sign) -> f64 {
    let _ = (combinator, left, right, result);
    1.0
  }

  fn unary_weight(&self, rule: &UnaryRule, input: &ChartEntry) -> f64 {
    let _ = (rule, input);
    1.0
  }

  fn dependency_weight(&self, dependency: &Dependency) -> f64 {
    let _ = dependency;
    1.0
  }
}

/// Weighs everything 1.0
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformScorer;

impl Scorer for UniformScorer {}

/// Weights looked up in tables; anything missing weighs 1.0.
#[derive(Debug, Clone, Default)]
pub struct TableScorer {
  lexical: HashMap<(Vec<String>, HeadedSyntacticCategory), f64>,
  unary: HashMap<UnaryRule, f64>,
  dependencies: HashMap<(String, usize, String), f64>,
}

impl TableScorer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Weight for `words` (case-insensitive) used with `syntax`
  pub fn with_lexical(mut self, words: &[&str], syntax: HeadedSyntacticCategory, weight: f64) -> Self {
    let words = words.iter().map(|w| w.to_lowercase()).collect();
    self
      .lexical
      .insert((words, syntax.canonical_form().0), weight);
    self
  }

  /// Weight for every application of `rule`
  pub fn with_unary(mut self, rule: UnaryRule, weight: f64) -> Self {
    self.unary.insert(rule, weight);
    self
  }

  /// Weight for `subject` taking `object` as its `argument`th argument,
  /// wherever the words occur
  pub fn with_dependency(mut self, subject: &str, argument: usize, object: &str, weight: f64) -> Self {
    self
      .dependencies
      .insert((subject.to_string(), argument, object.to_string()), weight);
    self
  }
}

impl Scorer for TableScorer {
  fn lexical_weight(&self, _: &Sentence, _: usize, _: usize, entry: &LexiconEntry) -> f64 {
    let words = entry.words().iter().map(|w| w.to_lowercase()).collect();
    let key = (words, entry.category().syntax().clone());
    self.lexical.get(&key).copied().unwrap_or(1.0)
  }

  fn unary_weight(&self, rule: &UnaryRule, _: &ChartEntry) -> f64 {
    self.unary.get(rule).copied().unwrap_or(1.0)
  }

  fn dependency_weight(&self, dependency: &Dependency) -> f64 {
    let key = (
      dependency.subject.head.clone(),
      dependency.argument,
      dependency.object.head.clone(),
    );
    self.dependencies.get(&key).copied().unwrap_or(1.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::rc::Rc;

  use crate::category::semantics::IndexedPredicate;
  use crate::rules::parse_unary_rules;

  #[test]
  fn test_table_scorer() {
    let scorer = TableScorer::new()
      .with_lexical(&["Green"], "N{3}".parse().unwrap(), 0.25)
      .with_dependency("red", 1, "block", 0.5);

    let sentence = Sentence::from("green block");
    let noun: LexiconEntry = "green, N{0}".parse().unwrap();
    let adjective: LexiconEntry = r"green, (N{1}/N{1}){0}".parse().unwrap();
    assert_eq!(scorer.lexical_weight(&sentence, 0, 0, &noun), 0.25);
    assert_eq!(scorer.lexical_weight(&sentence, 0, 0, &adjective), 1.0);

    let dep = Dependency::new(
      IndexedPredicate::new("red", 0),
      1,
      IndexedPredicate::new("block", 1),
    );
    assert_eq!(scorer.dependency_weight(&dep), 0.5);
    assert_eq!(UniformScorer.dependency_weight(&dep), 1.0);
  }

  #[test]
  fn test_unary_weights() {
    let rules = parse_unary_rules("N{0} NP{0}\nN{0} (S{1}/(S{1}\\N{0}){1}){1}").unwrap();
    let scorer = TableScorer::new().with_unary(rules[0].clone(), 0.25);

    let entry: LexiconEntry = "block, N{0}, 0 block".parse().unwrap();
    let combination = entry.category().to_sign(0);
    let input = ChartEntry::terminal(Rc::new(entry), vec!["block".into()], combination, (0, 0));

    assert_eq!(scorer.unary_weight(&rules[0], &input), 0.25);
    assert_eq!(scorer.unary_weight(&rules[1], &input), 1.0);
    assert_eq!(UniformScorer.unary_weight(&rules[0], &input), 1.0);
  }
}
