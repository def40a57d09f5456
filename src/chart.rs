use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::category::headed::HeadedSyntacticCategory;
use crate::category::semantics::{Dependency, UnfilledDependency};
use crate::category::Sign;
use crate::combinator::{Combination, Combinator};
use crate::filter::ChartFilter;
use crate::lexicon::LexiconEntry;
use crate::rules::UnaryRule;

/// How many entries a chart cell may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Inference {
  /// Keep every distinct entry
  #[default]
  Exact,
  /// Keep the `size` most probable entries per cell
  Beam { size: usize },
}

/// A reference to a child entry, with the probability it had when used
#[derive(Debug, Clone)]
pub struct Child {
  pub entry: Rc<ChartEntry>,
  pub probability: f64,
}

#[derive(Debug, Clone)]
pub enum Derivation {
  Terminal {
    entry: Rc<LexiconEntry>,
    /// The words as they appear in the sentence
    words: Vec<String>,
  },
  Nonterminal {
    combinator: Combinator,
    /// Last word of the left child
    split: usize,
    left: Child,
    right: Child,
  },
}

/// A unary rule applied on top of a derivation
#[derive(Debug, Clone)]
pub struct UnaryApplication {
  pub rule: Rc<UnaryRule>,
  pub input_syntax: Rc<HeadedSyntacticCategory>,
}

/// One analysis of a span: its sign, how it was derived, and the dependencies
/// filled or abandoned at this node.
#[derive(Debug, Clone)]
pub struct ChartEntry {
  sign: Sign,
  span: (usize, usize),
  derivation: Derivation,
  unary: Option<UnaryApplication>,
  filled: Vec<Dependency>,
  abandoned: Vec<UnfilledDependency>,
  key: u64,
}

fn sign_key(sign: &Sign) -> u64 {
  let mut hasher = DefaultHasher::new();
  sign.hash(&mut hasher);
  hasher.finish()
}

impl ChartEntry {
  fn from_parts(combination: Combination, span: (usize, usize), derivation: Derivation) -> Self {
    let key = sign_key(&combination.sign);
    Self {
      sign: combination.sign,
      span,
      derivation,
      unary: None,
      filled: combination.filled,
      abandoned: combination.abandoned,
      key,
    }
  }

  pub fn terminal(
    entry: Rc<LexiconEntry>,
    words: Vec<String>,
    combination: Combination,
    span: (usize, usize),
  ) -> Self {
    Self::from_parts(combination, span, Derivation::Terminal { entry, words })
  }

  pub fn nonterminal(
    combinator: Combinator,
    split: usize,
    left: Child,
    right: Child,
    combination: Combination,
    span: (usize, usize),
  ) -> Self {
    Self::from_parts(
      combination,
      span,
      Derivation::Nonterminal {
        combinator,
        split,
        left,
        right,
      },
    )
  }

  /// This entry rewritten by `rule`. The derivation is shared; the rule's
  /// dependencies are added to the ones filled at this node.
  pub fn with_unary(&self, rule: Rc<UnaryRule>, combination: Combination) -> Self {
    let mut filled = self.filled.clone();
    filled.extend(combination.filled);
    let mut abandoned = self.abandoned.clone();
    abandoned.extend(combination.abandoned);

    Self {
      key: sign_key(&combination.sign),
      sign: combination.sign,
      span: self.span,
      derivation: self.derivation.clone(),
      unary: Some(UnaryApplication {
        rule,
        input_syntax: self.sign.syntax_rc().clone(),
      }),
      filled,
      abandoned,
    }
  }

  pub fn sign(&self) -> &Sign {
    &self.sign
  }

  pub fn syntax(&self) -> &HeadedSyntacticCategory {
    self.sign.syntax()
  }

  pub fn span(&self) -> (usize, usize) {
    self.span
  }

  pub fn derivation(&self) -> &Derivation {
    &self.derivation
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self.derivation, Derivation::Terminal { .. })
  }

  pub fn unary(&self) -> Option<&UnaryApplication> {
    self.unary.as_ref()
  }

  pub fn unary_rule(&self) -> Option<&Rc<UnaryRule>> {
    self.unary.as_ref().map(|u| &u.rule)
  }

  /// Syntax before the unary rule, or the current syntax when none applied
  pub fn pre_unary_syntax(&self) -> &HeadedSyntacticCategory {
    match &self.unary {
      Some(u) => &u.input_syntax,
      None => self.sign.syntax(),
    }
  }

  pub fn children(&self) -> Option<(&Child, &Child)> {
    match &self.derivation {
      Derivation::Nonterminal { left, right, .. } => Some((left, right)),
      Derivation::Terminal { .. } => None,
    }
  }

  pub fn left_unary_rule(&self) -> Option<&Rc<UnaryRule>> {
    self.children().and_then(|(left, _)| left.entry.unary_rule())
  }

  pub fn right_unary_rule(&self) -> Option<&Rc<UnaryRule>> {
    self.children().and_then(|(_, right)| right.entry.unary_rule())
  }

  /// Dependencies filled at this node
  pub fn filled(&self) -> &[Dependency] {
    &self.filled
  }

  /// Pending dependencies dropped at this node
  pub fn abandoned(&self) -> &[UnfilledDependency] {
    &self.abandoned
  }

  /// Same syntax, assignments and pending dependencies. Equivalent entries
  /// behave identically in every later combination.
  pub fn is_equivalent(&self, other: &ChartEntry) -> bool {
    self.key == other.key && self.sign == other.sign
  }
}

#[derive(Debug, Clone, Default)]
struct Cell {
  entries: Vec<Rc<ChartEntry>>,
  probabilities: Vec<f64>,
}

/// Triangular CKY chart over inclusive spans `start..=end`
pub struct Chart<'f> {
  len: usize,
  cells: Vec<Cell>,
  inference: Inference,
  filter: Option<&'f dyn ChartFilter>,
}

impl<'f> Chart<'f> {
  pub fn new(len: usize, inference: Inference, filter: Option<&'f dyn ChartFilter>) -> Self {
    Self {
      len,
      cells: vec![Cell::default(); len * (len + 1) / 2],
      inference,
      filter,
    }
  }

  /// Number of words
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn inference(&self) -> Inference {
    self.inference
  }

  fn index(&self, start: usize, end: usize) -> usize {
    assert!(
      start <= end && end < self.len,
      "span {}..{} outside chart of length {}",
      start,
      end,
      self.len
    );
    end * (end + 1) / 2 + start
  }

  /// Inserts `entry` unless its probability is zero or the filter rejects it.
  /// An equivalent entry already in the cell keeps whichever derivation is
  /// more probable. Returns whether `entry` ended up in the cell.
  pub fn add_entry(&mut self, entry: ChartEntry, probability: f64, start: usize, end: usize) -> bool {
    if probability <= 0.0 || probability.is_nan() {
      return false;
    }
    if let Some(filter) = self.filter {
      if !filter.accepts(&entry, start, end) {
        return false;
      }
    }

    let idx = self.index(start, end);
    let inference = self.inference;
    let cell = &mut self.cells[idx];

    if let Some(i) = cell.entries.iter().position(|e| e.is_equivalent(&entry)) {
      if probability > cell.probabilities[i] {
        cell.entries[i] = Rc::new(entry);
        cell.probabilities[i] = probability;
        return true;
      }
      return false;
    }

    cell.entries.push(Rc::new(entry));
    cell.probabilities.push(probability);

    if let Inference::Beam { size } = inference {
      if cell.entries.len() > size {
        // lowest probability goes; among ties, the most recent
        let mut worst = 0;
        for (i, p) in cell.probabilities.iter().enumerate() {
          if *p <= cell.probabilities[worst] {
            worst = i;
          }
        }
        cell.entries.remove(worst);
        cell.probabilities.remove(worst);
        return worst != cell.entries.len();
      }
    }
    true
  }

  pub fn entries(&self, start: usize, end: usize) -> &[Rc<ChartEntry>] {
    &self.cells[self.index(start, end)].entries
  }

  /// Parallel to `entries`
  pub fn probabilities(&self, start: usize, end: usize) -> &[f64] {
    &self.cells[self.index(start, end)].probabilities
  }

  pub fn num_entries(&self, start: usize, end: usize) -> usize {
    self.cells[self.index(start, end)].entries.len()
  }

  pub fn total_entries(&self) -> usize {
    self.cells.iter().map(|c| c.entries.len()).sum()
  }

  pub fn clear(&mut self, start: usize, end: usize) {
    let idx = self.index(start, end);
    self.cells[idx] = Cell::default();
  }

  /// Orders the cell by descending probability. Ties keep insertion order.
  pub fn done_adding(&mut self, start: usize, end: usize) {
    let idx = self.index(start, end);
    let cell = &mut self.cells[idx];
    let mut order = (0..cell.entries.len()).collect::<Vec<_>>();
    order.sort_by(|a, b| cell.probabilities[*b].total_cmp(&cell.probabilities[*a]));
    cell.entries = order.iter().map(|i| cell.entries[*i].clone()).collect();
    cell.probabilities = order.iter().map(|i| cell.probabilities[*i]).collect();
  }

  /// Owned copies of a cell's entries and probabilities
  pub fn snapshot(&self, start: usize, end: usize) -> Vec<(Rc<ChartEntry>, f64)> {
    let cell = &self.cells[self.index(start, end)];
    cell
      .entries
      .iter()
      .cloned()
      .zip(cell.probabilities.iter().copied())
      .collect()
  }

  /// The cell's entries, most probable first
  pub fn ranked(&self, start: usize, end: usize) -> Vec<(Rc<ChartEntry>, f64)> {
    let mut entries = self.snapshot(start, end);
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries
  }

  pub fn best(&self, start: usize, end: usize) -> Option<(Rc<ChartEntry>, f64)> {
    self.ranked(start, end).into_iter().next()
  }
}

impl fmt::Display for Chart<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for length in 1..=self.len {
      for start in 0..=(self.len - length) {
        let end = start + length - 1;
        let cell = &self.cells[self.index(start, end)];
        if cell.entries.is_empty() {
          continue;
        }
        writeln!(f, "Span {}..{}:", start, end)?;
        for (entry, probability) in cell.entries.iter().zip(cell.probabilities.iter()) {
          write!(f, "  {} ({:.4})", entry.sign(), probability)?;
          if let Some(unary) = entry.unary() {
            write!(f, " <- {}", unary.input_syntax)?;
          }
          writeln!(f)?;
        }
      }
    }
    Ok(())
  }
}
