use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::syntax::{
  unify_feature, Direction, Feature, FeatureBindings, FeatureMatching, SyntacticCategory,
};
use crate::error::CcgError;
use crate::parse_grammar;

/// A head variable
pub type Var = usize;

/// A relabeling of head variables
pub type VarMap = BTreeMap<Var, Var>;

/// A syntactic category where every node carries a head variable. Variables
/// shared between nodes say which constituent's semantics becomes the head of
/// the whole category once arguments are consumed: in `(N{1}/N{1}){0}` the
/// result of applying the category is headed by its argument.
///
/// Categories are immutable; every operation builds a new tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeadedSyntacticCategory {
  Atomic {
    value: String,
    feature: Feature,
    head: Var,
  },
  Functional {
    direction: Direction,
    result: Box<HeadedSyntacticCategory>,
    argument: Box<HeadedSyntacticCategory>,
    head: Var,
  },
}

impl HeadedSyntacticCategory {
  pub fn atomic(value: impl Into<String>, feature: Feature, head: Var) -> Self {
    Self::Atomic {
      value: value.into(),
      feature,
      head,
    }
  }

  pub fn functional(direction: Direction, result: Self, argument: Self, head: Var) -> Self {
    Self::Functional {
      direction,
      result: Box::new(result),
      argument: Box::new(argument),
      head,
    }
  }

  pub fn head_variable(&self) -> Var {
    match self {
      Self::Atomic { head, .. } | Self::Functional { head, .. } => *head,
    }
  }

  pub fn is_atomic(&self) -> bool {
    matches!(self, Self::Atomic { .. })
  }

  pub fn direction(&self) -> Option<Direction> {
    self.split().map(|(direction, _, _)| direction)
  }

  pub fn argument_type(&self) -> Option<&HeadedSyntacticCategory> {
    self.split().map(|(_, _, argument)| argument)
  }

  pub fn return_type(&self) -> Option<&HeadedSyntacticCategory> {
    self.split().map(|(_, result, _)| result)
  }

  /// Decomposes a functional category into (direction, result, argument)
  pub fn split(&self) -> Option<(Direction, &HeadedSyntacticCategory, &HeadedSyntacticCategory)> {
    match self {
      Self::Functional {
        direction,
        result,
        argument,
        ..
      } => Some((*direction, result, argument)),
      Self::Atomic { .. } => None,
    }
  }

  /// Number of arguments that can be peeled off before reaching an atom
  pub fn arity(&self) -> usize {
    let mut arity = 0;
    let mut current = self;
    while let Some((_, result, _)) = current.split() {
      arity += 1;
      current = result;
    }
    arity
  }

  /// The atom reached after consuming every argument
  pub fn final_return_type(&self) -> &HeadedSyntacticCategory {
    let mut current = self;
    while let Some((_, result, _)) = current.split() {
      current = result;
    }
    current
  }

  /// The atom's name, or None for functional categories
  pub fn value(&self) -> Option<&str> {
    match self {
      Self::Atomic { value, .. } => Some(value),
      Self::Functional { .. } => None,
    }
  }

  /// Strips the head variables
  pub fn syntax(&self) -> SyntacticCategory {
    match self {
      Self::Atomic { value, feature, .. } => SyntacticCategory::Atomic {
        value: value.clone(),
        feature: feature.clone(),
      },
      Self::Functional {
        direction,
        result,
        argument,
        ..
      } => SyntacticCategory::functional(*direction, result.syntax(), argument.syntax()),
    }
  }

  /// Visits variables in canonical order: node, then result, then argument.
  fn visit_variables(&self, f: &mut impl FnMut(Var)) {
    f(self.head_variable());
    if let Some((_, result, argument)) = self.split() {
      result.visit_variables(f);
      argument.visit_variables(f);
    }
  }

  /// Sorted, deduplicated variables of this category
  pub fn unique_variables(&self) -> Vec<Var> {
    let mut vars = BTreeSet::new();
    self.visit_variables(&mut |v| {
      vars.insert(v);
    });
    vars.into_iter().collect()
  }

  pub fn max_variable(&self) -> Var {
    let mut max = 0;
    self.visit_variables(&mut |v| max = max.max(v));
    max
  }

  pub fn relabel(&self, f: &impl Fn(Var) -> Var) -> Self {
    match self {
      Self::Atomic {
        value,
        feature,
        head,
      } => Self::atomic(value.clone(), feature.clone(), f(*head)),
      Self::Functional {
        direction,
        result,
        argument,
        head,
      } => Self::functional(*direction, result.relabel(f), argument.relabel(f), f(*head)),
    }
  }

  /// Relabels by `map`; variables missing from the map keep their number.
  pub fn relabel_with(&self, map: &VarMap) -> Self {
    self.relabel(&|v| map.get(&v).copied().unwrap_or(v))
  }

  /// Renumbers variables 0..k in order of first appearance, returning the new
  /// category and the old -> new relabeling. Two structurally identical
  /// categories have the same canonical form no matter how they were numbered.
  pub fn canonical_form(&self) -> (Self, VarMap) {
    let mut relabeling = VarMap::new();
    self.visit_variables(&mut |v| {
      let next = relabeling.len();
      relabeling.entry(v).or_insert(next);
    });
    (self.relabel_with(&relabeling), relabeling)
  }

  pub fn is_canonical(&self) -> bool {
    self.canonical_form().1.iter().all(|(old, new)| old == new)
  }

  /// Substitutes bound feature variables
  pub fn bind_features(&self, bindings: &FeatureBindings) -> Self {
    if bindings.is_empty() {
      return self.clone();
    }
    match self {
      Self::Atomic {
        value,
        feature,
        head,
      } => {
        let feature = match feature {
          Feature::Variable(n) => bindings.get(n).cloned().unwrap_or_else(|| feature.clone()),
          _ => feature.clone(),
        };
        Self::atomic(value.clone(), feature, *head)
      }
      Self::Functional {
        direction,
        result,
        argument,
        head,
      } => Self::functional(
        *direction,
        result.bind_features(bindings),
        argument.bind_features(bindings),
        *head,
      ),
    }
  }

  /// Aligns this category's variables with the numbering of `pattern`,
  /// returning a map from this category's variables to the pattern's. Fails
  /// when the shapes differ or one of our variables would have to bind two
  /// different pattern variables.
  pub fn unify_variables(&self, pattern: &Self, matching: FeatureMatching) -> Option<VarMap> {
    self.unify_variables_with(pattern, VarMap::new(), matching, &mut FeatureBindings::new())
  }

  /// Like `unify_variables`, starting from existing constraints and collecting
  /// bindings for the pattern's feature variables.
  pub fn unify_variables_with(
    &self,
    pattern: &Self,
    initial: VarMap,
    matching: FeatureMatching,
    bindings: &mut FeatureBindings,
  ) -> Option<VarMap> {
    let mut map = initial;
    if self.unify_into(pattern, &mut map, matching, bindings) {
      Some(map)
    } else {
      None
    }
  }

  fn unify_into(
    &self,
    pattern: &Self,
    map: &mut VarMap,
    matching: FeatureMatching,
    bindings: &mut FeatureBindings,
  ) -> bool {
    match map.get(&self.head_variable()) {
      Some(bound) if *bound != pattern.head_variable() => return false,
      Some(_) => {}
      None => {
        map.insert(self.head_variable(), pattern.head_variable());
      }
    }

    match (self, pattern) {
      (
        Self::Atomic { value, feature, .. },
        Self::Atomic {
          value: pattern_value,
          feature: pattern_feature,
          ..
        },
      ) => value == pattern_value && unify_feature(pattern_feature, feature, matching, bindings),
      (
        Self::Functional {
          direction,
          result,
          argument,
          ..
        },
        Self::Functional {
          direction: pattern_direction,
          result: pattern_result,
          argument: pattern_argument,
          ..
        },
      ) => {
        direction == pattern_direction
          && result.unify_into(pattern_result, map, matching, bindings)
          && argument.unify_into(pattern_argument, map, matching, bindings)
      }
      _ => false,
    }
  }
}

impl fmt::Display for HeadedSyntacticCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Atomic {
        value,
        feature,
        head,
      } => write!(f, "{}{}{{{}}}", value, feature, head),
      Self::Functional {
        direction,
        result,
        argument,
        head,
      } => write!(f, "({}{}{}){{{}}}", result, direction, argument, head),
    }
  }
}

impl FromStr for HeadedSyntacticCategory {
  type Err = CcgError;

  /// Parses a headed category such as `((S{0}\N{1}){0}/N{2}){0}`. Variables
  /// are kept as written; use `canonical_form` to renumber them. A functional
  /// category without an explicit head takes the head of its result.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_grammar::parse_headed_category(s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cat(s: &str) -> HeadedSyntacticCategory {
    s.parse().unwrap()
  }

  #[test]
  fn test_canonical_form() {
    let c = cat(r"((N{5}\N{5}){3}/N{7}){3}");
    let (canonical, relabeling) = c.canonical_form();
    assert_eq!(canonical, cat(r"((N{1}\N{1}){0}/N{2}){0}"));
    assert_eq!(relabeling.get(&3), Some(&0));
    assert_eq!(relabeling.get(&5), Some(&1));
    assert_eq!(relabeling.get(&7), Some(&2));
    assert!(canonical.is_canonical());
    assert!(!c.is_canonical());
  }

  #[test]
  fn test_canonical_form_idempotent() {
    for s in [
      "N{4}",
      r"(N{1}/N{1}){0}",
      r"((S{2}\N{0}){2}/N{1}){2}",
      r"(((S[9]{0}\N{1}){0}\(S[9]{0}\N{1}){0}){2}/N{3}){2}",
      r"((N{1}\N{1}){0}/(S{2}/N{1}){2}){0}",
    ] {
      let once = cat(s).canonical_form().0;
      let twice = once.canonical_form().0;
      assert_eq!(once, twice, "{}", s);
    }
  }

  #[test]
  fn test_structurally_identical_categories_are_equal() {
    let a = cat(r"((S{7}\N{3}){7}/N{1}){7}").canonical_form().0;
    let b = cat(r"((S{2}\N{0}){2}/N{9}){2}").canonical_form().0;
    assert_eq!(a, b);
  }

  #[test]
  fn test_decompose() {
    let c = cat(r"((S{0}\N{1}){0}/N{2}){0}");
    assert_eq!(c.arity(), 2);
    assert_eq!(c.argument_type(), Some(&cat("N{2}")));
    assert_eq!(c.return_type(), Some(&cat(r"(S{0}\N{1}){0}")));
    assert_eq!(c.final_return_type(), &cat("S{0}"));
    assert_eq!(c.unique_variables(), vec![0, 1, 2]);
    assert_eq!(c.max_variable(), 2);
    assert_eq!(c.syntax(), r"(S\N)/N".parse::<SyntacticCategory>().unwrap());
  }

  #[test]
  fn test_unify_variables() {
    let entry = cat(r"(N{1}/N{1}){0}");
    let pattern = cat(r"(N{4}/N{4}){2}");
    let map = entry.unify_variables(&pattern, FeatureMatching::Strict).unwrap();
    assert_eq!(map.get(&0), Some(&2));
    assert_eq!(map.get(&1), Some(&4));

    // shape mismatch
    assert!(entry.unify_variables(&cat("N{0}"), FeatureMatching::Strict).is_none());
    // one variable can't bind two pattern variables
    assert!(
      entry
        .unify_variables(&cat(r"(N{3}/N{4}){2}"), FeatureMatching::Strict)
        .is_none()
    );
    // but two variables may bind the same pattern variable
    assert!(
      cat(r"(N{2}/N{1}){0}")
        .unify_variables(&cat(r"(N{1}/N{1}){0}"), FeatureMatching::Strict)
        .is_some()
    );
  }

  #[test]
  fn test_unify_respects_features() {
    let dcl = cat(r"(S[dcl]{0}\N{1}){0}");
    let pss = cat(r"(S[pss]{0}\N{1}){0}");
    let bare = cat(r"(S{0}\N{1}){0}");
    assert!(dcl.unify_variables(&pss, FeatureMatching::Strict).is_none());
    assert!(dcl.unify_variables(&pss, FeatureMatching::Ignore).is_some());
    assert!(dcl.unify_variables(&bare, FeatureMatching::Strict).is_some());
  }

  #[test]
  fn test_bind_features() {
    let pattern = cat(r"(S[9]{0}\N{1}){0}");
    let actual = cat(r"(S[dcl]{0}\N{1}){0}");
    let mut bindings = FeatureBindings::new();
    actual
      .unify_variables_with(&pattern, VarMap::new(), FeatureMatching::Strict, &mut bindings)
      .unwrap();
    assert_eq!(pattern.bind_features(&bindings), actual);
  }

  #[test]
  fn test_display_round_trips() {
    let c = cat(r"((S[dcl]{0}\NP{1}){0}/(S[pss]{2}\NP{1}){2}){0}");
    assert_eq!(cat(&c.to_string()), c);
  }

  #[test]
  fn test_missing_head_defaults_to_result() {
    assert_eq!(cat(r"S{0}\N{1}"), cat(r"(S{0}\N{1}){0}"));
  }
}
