use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CcgError;
use crate::parse_grammar;

/// Which side a functional category expects its argument on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
  /// `/`, argument to the right
  Forward,
  /// `\`, argument to the left
  Backward,
}

impl Direction {
  pub fn slash(self) -> char {
    match self {
      Self::Forward => '/',
      Self::Backward => '\\',
    }
  }

  pub fn from_slash(c: char) -> Option<Self> {
    match c {
      '/' => Some(Self::Forward),
      '\\' => Some(Self::Backward),
      _ => None,
    }
  }
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.slash())
  }
}

/// A feature on an atomic category, such as `dcl` in `S[dcl]`. Numeric features
/// (`S[9]`) are variables that bind to whatever concrete feature they unify with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Feature {
  #[default]
  Unspecified,
  Value(String),
  Variable(u32),
}

impl Feature {
  pub fn is_unspecified(&self) -> bool {
    matches!(self, Self::Unspecified)
  }

  /// Unspecified features and variables unify with anything.
  pub fn is_compatible_with(&self, other: &Feature) -> bool {
    match (self, other) {
      (Self::Value(a), Self::Value(b)) => a == b,
      _ => true,
    }
  }
}

impl fmt::Display for Feature {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Unspecified => Ok(()),
      Self::Value(v) => write!(f, "[{}]", v),
      Self::Variable(n) => write!(f, "[{}]", n),
    }
  }
}

/// Whether features have to agree when categories unify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureMatching {
  /// Concrete features must be equal; unspecified features are wildcards
  #[default]
  Strict,
  /// Features never block unification
  Ignore,
}

/// Feature variable bindings collected while unifying a pattern against a
/// concrete category.
pub type FeatureBindings = HashMap<u32, Feature>;

/// Unifies the feature of a pattern atom against the feature of the atom it's
/// matched with, recording bindings for the pattern's feature variables.
pub(crate) fn unify_feature(
  pattern: &Feature,
  actual: &Feature,
  matching: FeatureMatching,
  bindings: &mut FeatureBindings,
) -> bool {
  let strict = matching == FeatureMatching::Strict;
  match pattern {
    Feature::Variable(n) => {
      if let Feature::Value(_) = actual {
        match bindings.get(n) {
          Some(bound) if strict && !bound.is_compatible_with(actual) => return false,
          Some(_) => {}
          None => {
            bindings.insert(*n, actual.clone());
          }
        }
      }
      true
    }
    Feature::Value(_) => !strict || pattern.is_compatible_with(actual),
    Feature::Unspecified => true,
  }
}

/// A syntactic category without head variables, as found in gold syntax trees
/// and supertagger output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyntacticCategory {
  Atomic {
    value: String,
    feature: Feature,
  },
  Functional {
    direction: Direction,
    result: Box<SyntacticCategory>,
    argument: Box<SyntacticCategory>,
  },
}

impl SyntacticCategory {
  pub fn atomic(value: impl Into<String>) -> Self {
    Self::Atomic {
      value: value.into(),
      feature: Feature::Unspecified,
    }
  }

  pub fn functional(direction: Direction, result: Self, argument: Self) -> Self {
    Self::Functional {
      direction,
      result: Box::new(result),
      argument: Box::new(argument),
    }
  }

  pub fn is_atomic(&self) -> bool {
    matches!(self, Self::Atomic { .. })
  }

  /// The atom's name, or None for functional categories
  pub fn value(&self) -> Option<&str> {
    match self {
      Self::Atomic { value, .. } => Some(value),
      Self::Functional { .. } => None,
    }
  }

  pub fn direction(&self) -> Option<Direction> {
    match self {
      Self::Functional { direction, .. } => Some(*direction),
      Self::Atomic { .. } => None,
    }
  }

  pub fn argument_type(&self) -> Option<&SyntacticCategory> {
    match self {
      Self::Functional { argument, .. } => Some(argument),
      Self::Atomic { .. } => None,
    }
  }

  pub fn return_type(&self) -> Option<&SyntacticCategory> {
    match self {
      Self::Functional { result, .. } => Some(result),
      Self::Atomic { .. } => None,
    }
  }

  pub fn without_features(&self) -> Self {
    match self {
      Self::Atomic { value, .. } => Self::atomic(value.clone()),
      Self::Functional {
        direction,
        result,
        argument,
      } => Self::functional(
        *direction,
        result.without_features(),
        argument.without_features(),
      ),
    }
  }

  /// Same shape, same atoms, and pairwise compatible features.
  pub fn is_unifiable_with(&self, other: &SyntacticCategory) -> bool {
    match (self, other) {
      (
        Self::Atomic { value, feature },
        Self::Atomic {
          value: other_value,
          feature: other_feature,
        },
      ) => value == other_value && feature.is_compatible_with(other_feature),
      (
        Self::Functional {
          direction,
          result,
          argument,
        },
        Self::Functional {
          direction: other_direction,
          result: other_result,
          argument: other_argument,
        },
      ) => {
        direction == other_direction
          && result.is_unifiable_with(other_result)
          && argument.is_unifiable_with(other_argument)
      }
      _ => false,
    }
  }

  /// Checks an actual category against this expected one. Features left
  /// unspecified (or variable) in the expectation match anything.
  pub fn accepts(&self, actual: &SyntacticCategory) -> bool {
    match (self, actual) {
      (
        Self::Atomic { value, feature },
        Self::Atomic {
          value: actual_value,
          feature: actual_feature,
        },
      ) => {
        value == actual_value
          && match feature {
            Feature::Value(_) => feature == actual_feature,
            _ => true,
          }
      }
      (
        Self::Functional {
          direction,
          result,
          argument,
        },
        Self::Functional {
          direction: actual_direction,
          result: actual_result,
          argument: actual_argument,
        },
      ) => {
        direction == actual_direction
          && result.accepts(actual_result)
          && argument.accepts(actual_argument)
      }
      _ => false,
    }
  }
}

impl fmt::Display for SyntacticCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Atomic { value, feature } => write!(f, "{}{}", value, feature),
      Self::Functional {
        direction,
        result,
        argument,
      } => write!(f, "({}{}{})", result, direction, argument),
    }
  }
}

impl FromStr for SyntacticCategory {
  type Err = CcgError;

  /// Parses a category such as `(S[dcl]\NP)/NP`. Head annotations are
  /// accepted and discarded.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_grammar::parse_syntactic_category(s)
  }
}
