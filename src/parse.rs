use std::fmt;
use std::rc::Rc;

use crate::category::headed::HeadedSyntacticCategory;
use crate::category::semantics::{Dependency, IndexedPredicate, UnfilledDependency};
use crate::chart::{ChartEntry, Derivation};
use crate::combinator::Combinator;
use crate::lexicon::LexiconEntry;
use crate::rules::UnaryRule;

#[derive(Debug, Clone)]
pub enum ParseNode {
  Terminal,
  Nonterminal {
    combinator: Combinator,
    left: Box<CcgParse>,
    right: Box<CcgParse>,
  },
}

/// A complete derivation decoded from the chart
#[derive(Debug, Clone)]
pub struct CcgParse {
  entry: Rc<ChartEntry>,
  probability: f64,
  node: ParseNode,
}

impl CcgParse {
  pub fn new(entry: Rc<ChartEntry>, probability: f64) -> Self {
    let node = match entry.derivation() {
      Derivation::Terminal { .. } => ParseNode::Terminal,
      Derivation::Nonterminal {
        combinator,
        left,
        right,
        ..
      } => ParseNode::Nonterminal {
        combinator: *combinator,
        left: Box::new(Self::new(left.entry.clone(), left.probability)),
        right: Box::new(Self::new(right.entry.clone(), right.probability)),
      },
    };
    Self {
      entry,
      probability,
      node,
    }
  }

  pub fn entry(&self) -> &ChartEntry {
    &self.entry
  }

  pub fn syntax(&self) -> &HeadedSyntacticCategory {
    self.entry.syntax()
  }

  pub fn probability(&self) -> f64 {
    self.probability
  }

  pub fn span(&self) -> (usize, usize) {
    self.entry.span()
  }

  pub fn semantic_heads(&self) -> &[IndexedPredicate] {
    self.entry.sign().semantic_heads()
  }

  pub fn unary_rule(&self) -> Option<&UnaryRule> {
    self.entry.unary_rule().map(|r| r.as_ref())
  }

  pub fn node(&self) -> &ParseNode {
    &self.node
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self.node, ParseNode::Terminal)
  }

  pub fn combinator(&self) -> Option<Combinator> {
    match &self.node {
      ParseNode::Nonterminal { combinator, .. } => Some(*combinator),
      ParseNode::Terminal => None,
    }
  }

  pub fn left(&self) -> Option<&CcgParse> {
    match &self.node {
      ParseNode::Nonterminal { left, .. } => Some(left.as_ref()),
      ParseNode::Terminal => None,
    }
  }

  pub fn right(&self) -> Option<&CcgParse> {
    match &self.node {
      ParseNode::Nonterminal { right, .. } => Some(right.as_ref()),
      ParseNode::Terminal => None,
    }
  }

  /// The lexicon entry of a terminal
  pub fn lexicon_entry(&self) -> Option<&LexiconEntry> {
    match self.entry.derivation() {
      Derivation::Terminal { entry, .. } => Some(entry.as_ref()),
      Derivation::Nonterminal { .. } => None,
    }
  }

  /// The words covered, as they appear in the sentence
  pub fn words(&self) -> Vec<&str> {
    match (&self.node, self.entry.derivation()) {
      (_, Derivation::Terminal { words, .. }) => words.iter().map(|w| w.as_str()).collect(),
      (ParseNode::Nonterminal { left, right, .. }, _) => {
        let mut words = left.words();
        words.extend(right.words());
        words
      }
      (ParseNode::Terminal, Derivation::Nonterminal { .. }) => Vec::new(),
    }
  }

  /// Every dependency filled anywhere in the derivation, parents first
  pub fn dependencies(&self) -> Vec<Dependency> {
    let mut deps = Vec::new();
    self.visit(&mut |p| deps.extend(p.entry.filled().iter().cloned()));
    deps
  }

  /// Dependencies that were never filled: the ones still pending at the root
  /// plus the ones abandoned along the way
  pub fn unfilled_dependencies(&self) -> Vec<UnfilledDependency> {
    let mut deps = self.entry.sign().unfilled_dependencies().to_vec();
    self.visit(&mut |p| deps.extend(p.entry.abandoned().iter().cloned()));
    deps
  }

  fn visit<'a>(&'a self, f: &mut impl FnMut(&'a CcgParse)) {
    f(self);
    if let ParseNode::Nonterminal { left, right, .. } = &self.node {
      left.visit(f);
      right.visit(f);
    }
  }
}

impl fmt::Display for CcgParse {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "<{}", self.syntax().syntax())?;
    if let Some(unary) = self.entry.unary() {
      write!(f, "_{}", unary.input_syntax.syntax())?;
    }
    match &self.node {
      ParseNode::Terminal => {
        for word in self.words() {
          write!(f, " {}", word)?;
        }
      }
      ParseNode::Nonterminal { left, right, .. } => write!(f, " {} {}", left, right)?,
    }
    write!(f, ">")
  }
}
