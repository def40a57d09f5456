use std::fmt;
use std::str::FromStr;

use crate::category::headed::HeadedSyntacticCategory;
use crate::category::syntax::SyntacticCategory;
use crate::error::CcgError;
use crate::parse_grammar;

#[derive(Debug, PartialEq, Clone)]
pub struct Constituent<T> {
  pub value: T,
  pub span: (usize, usize),
}

impl<T> fmt::Display for Constituent<T>
where
  T: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

/// The category of a gold tree node. `pre_unary` is set when a unary rule
/// rewrote it into `syntax`.
#[derive(Debug, PartialEq, Clone)]
pub struct GoldCategory {
  pub syntax: SyntacticCategory,
  pub pre_unary: Option<SyntacticCategory>,
}

impl GoldCategory {
  /// The category before any unary rule applied
  pub fn pre_unary_syntax(&self) -> &SyntacticCategory {
    self.pre_unary.as_ref().unwrap_or(&self.syntax)
  }

  pub fn has_unary_rule(&self) -> bool {
    self.pre_unary.is_some()
  }
}

impl fmt::Display for GoldCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.syntax)?;
    if let Some(pre) = &self.pre_unary {
      write!(f, "_{}", pre)?;
    }
    Ok(())
  }
}

#[derive(Debug, PartialEq, Clone)]
pub struct TreeWord {
  pub pos: String,
  pub words: Vec<String>,
  /// The exact lexical category, when the tree specifies one
  pub headed: Option<HeadedSyntacticCategory>,
}

/// A gold-standard syntactic derivation, used to restrict parsing. Every
/// internal node is binary.
#[derive(Debug, PartialEq, Clone)]
pub enum SyntaxTree {
  Branch(Constituent<GoldCategory>, Box<SyntaxTree>, Box<SyntaxTree>),
  Leaf(Constituent<GoldCategory>, TreeWord),
}

impl SyntaxTree {
  pub fn constituent(&self) -> &Constituent<GoldCategory> {
    match self {
      Self::Branch(c, _, _) | Self::Leaf(c, _) => c,
    }
  }

  pub fn category(&self) -> &GoldCategory {
    &self.constituent().value
  }

  pub fn span(&self) -> (usize, usize) {
    self.constituent().span
  }

  pub fn is_leaf(&self) -> bool {
    matches!(self, Self::Leaf(..))
  }

  pub fn get_leaf(&self) -> Option<&TreeWord> {
    match self {
      Self::Leaf(_, w) => Some(w),
      _ => None,
    }
  }

  pub fn get_branch(&self) -> Option<(&Constituent<GoldCategory>, &SyntaxTree, &SyntaxTree)> {
    match self {
      Self::Branch(c, left, right) => Some((c, left, right)),
      _ => None,
    }
  }

  /// The node covering exactly `start..=end`, if any
  pub fn find(&self, start: usize, end: usize) -> Option<&SyntaxTree> {
    let (s, e) = self.span();
    if (s, e) == (start, end) {
      return Some(self);
    }
    if start < s || end > e {
      return None;
    }
    let (_, left, right) = self.get_branch()?;
    left.find(start, end).or_else(|| right.find(start, end))
  }

  /// Words of the sentence, in order
  pub fn words(&self) -> Vec<&str> {
    match self {
      Self::Leaf(_, w) => w.words.iter().map(|w| w.as_str()).collect(),
      Self::Branch(_, left, right) => {
        let mut words = left.words();
        words.extend(right.words());
        words
      }
    }
  }

  /// Part-of-speech tag for every word; multi-word leaves repeat their tag
  pub fn pos_tags(&self) -> Vec<&str> {
    match self {
      Self::Leaf(_, w) => vec![w.pos.as_str(); w.words.len()],
      Self::Branch(_, left, right) => {
        let mut tags = left.pos_tags();
        tags.extend(right.pos_tags());
        tags
      }
    }
  }
}

impl fmt::Display for SyntaxTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(c, w) => {
        write!(f, "<{} {}", c.value, w.pos)?;
        for word in w.words.iter() {
          write!(f, " {}", word)?;
        }
        write!(f, ">")
      }
      Self::Branch(c, left, right) => write!(f, "<{} {} {}>", c.value, left, right),
    }
  }
}

impl FromStr for SyntaxTree {
  type Err = CcgError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_grammar::parse_syntax_tree(s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display_round_trips() {
    let src = r"<N <(N/N) JJ red> <N <(N/N) JJ green> <N NN block>>>";
    let tree: SyntaxTree = src.parse().unwrap();
    assert_eq!(tree.to_string(), src);
    assert_eq!(tree.words(), vec!["red", "green", "block"]);
    assert_eq!(tree.pos_tags(), vec!["JJ", "JJ", "NN"]);
  }

  #[test]
  fn test_find() {
    let tree: SyntaxTree = r"<N <(N/N) JJ red> <N <(N/N) JJ green> <N NN block>>>"
      .parse()
      .unwrap();
    assert_eq!(tree.find(1, 2).map(|t| t.span()), Some((1, 2)));
    assert!(tree.find(2, 2).unwrap().is_leaf());
    assert!(tree.find(0, 1).is_none());
    assert!(tree.find(0, 5).is_none());
  }

  #[test]
  fn test_unary_label() {
    let tree: SyntaxTree = "<ABCD_ABC NN foo>".parse().unwrap();
    let category = tree.category();
    assert!(category.has_unary_rule());
    assert_eq!(category.syntax, "ABCD".parse::<SyntacticCategory>().unwrap());
    assert_eq!(category.pre_unary_syntax(), &"ABC".parse::<SyntacticCategory>().unwrap());
    assert_eq!(tree.to_string(), "<ABCD_ABC NN foo>");
  }
}
