//! Binary combinators: application and harmonic composition.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::category::headed::{HeadedSyntacticCategory, Var, VarMap};
use crate::category::semantics::{Dependency, IndexedPredicate, Resolution, UnfilledDependency};
use crate::category::syntax::{Direction, FeatureBindings, FeatureMatching};
use crate::category::Sign;

/// The result of combining signs: the new sign, the dependencies that were
/// filled by this step, and pending dependencies that can never be filled
/// because their variable is no longer part of the syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
  pub sign: Sign,
  pub filled: Vec<Dependency>,
  pub abandoned: Vec<UnfilledDependency>,
}

/// Semantic state being merged in a single variable space, before the result
/// syntax is canonicalized.
pub(crate) struct Joint {
  assignments: BTreeMap<Var, Vec<IndexedPredicate>>,
  unfilled: Vec<UnfilledDependency>,
  abandoned: Vec<UnfilledDependency>,
}

impl Joint {
  pub(crate) fn empty() -> Self {
    Self {
      assignments: BTreeMap::new(),
      unfilled: Vec::new(),
      abandoned: Vec::new(),
    }
  }

  /// Starts from a sign whose variables already are the joint space
  pub(crate) fn from_sign(sign: &Sign) -> Self {
    let mut joint = Self::empty();
    for (var, pred) in sign.assignments() {
      joint.assign(var, pred.clone());
    }
    joint.unfilled.extend(sign.unfilled_dependencies().iter().cloned());
    joint
  }

  /// Merges a sign whose variables are carried into the joint space by `map`
  pub(crate) fn absorb(&mut self, sign: &Sign, map: &VarMap) {
    for (var, pred) in sign.assignments() {
      if let Some(var) = map.get(&var) {
        self.assign(*var, pred.clone());
      }
    }
    for dep in sign.unfilled_dependencies() {
      match dep.try_relabel(map) {
        Some(dep) => self.unfilled.push(dep),
        None => self.abandoned.push(dep.clone()),
      }
    }
  }

  pub(crate) fn assign(&mut self, var: Var, pred: IndexedPredicate) {
    let preds = self.assignments.entry(var).or_default();
    if !preds.contains(&pred) {
      preds.push(pred);
    }
  }

  pub(crate) fn add_dependency(&mut self, dep: UnfilledDependency) {
    self.unfilled.push(dep);
  }

  /// Resolves pending dependencies against the merged assignments and
  /// canonicalizes `result`. Assignments of variables missing from `result`
  /// are dropped; dependencies still waiting on such variables are abandoned.
  pub(crate) fn finish(mut self, result: HeadedSyntacticCategory) -> Combination {
    for preds in self.assignments.values_mut() {
      preds.sort();
    }

    let mut filled = Vec::new();
    let mut unfilled = Vec::with_capacity(self.unfilled.len());
    for dep in self.unfilled.drain(..) {
      let resolution = dep.resolve(|v| {
        self
          .assignments
          .get(&v)
          .map(|preds| &preds[..])
          .unwrap_or(&[])
      });
      match resolution {
        Resolution::Filled(deps) => filled.extend(deps),
        Resolution::Rewritten(deps) => unfilled.extend(deps),
        Resolution::Unchanged => unfilled.push(dep),
      }
    }
    filled.sort();

    let (syntax, relabeling) = result.canonical_form();

    let assignments = self
      .assignments
      .into_iter()
      .filter_map(|(var, preds)| relabeling.get(&var).map(|new| (*new, preds)))
      .flat_map(|(var, preds)| preds.into_iter().map(move |p| (var, p)))
      .collect::<Vec<_>>();

    let mut remaining = Vec::with_capacity(unfilled.len());
    for dep in unfilled {
      match dep.try_relabel(&relabeling) {
        Some(dep) => remaining.push(dep),
        None => self.abandoned.push(dep),
      }
    }

    Combination {
      sign: Sign::new(Rc::new(syntax), assignments, remaining),
      filled,
      abandoned: self.abandoned,
    }
  }
}

/// Function application: `X/Y Y => X` (forward) or `Y X\Y => X` (backward).
/// The functor's argument type is the pattern the argument must unify with;
/// feature variables bound on the way are substituted into the result.
pub fn apply(
  functor: &Sign,
  argument: &Sign,
  direction: Direction,
  matching: FeatureMatching,
) -> Option<Combination> {
  let (functor_direction, result, functor_argument) = functor.syntax().split()?;
  if functor_direction != direction {
    return None;
  }

  let mut bindings = FeatureBindings::new();
  let map =
    argument
      .syntax()
      .unify_variables_with(functor_argument, VarMap::new(), matching, &mut bindings)?;

  let mut joint = Joint::from_sign(functor);
  joint.absorb(argument, &map);
  Some(joint.finish(result.bind_features(&bindings)))
}

/// Harmonic composition: `X/Y Y/Z => X/Z` (forward) or `Y\Z X\Y => X\Z`
/// (backward). `other` is the `Y|Z` category; its `Z` variables that don't
/// unify with anything in the functor get fresh numbers above the functor's.
pub fn compose(
  functor: &Sign,
  other: &Sign,
  direction: Direction,
  matching: FeatureMatching,
) -> Option<Combination> {
  let (functor_direction, result, functor_argument) = functor.syntax().split()?;
  let (other_direction, other_result, other_argument) = other.syntax().split()?;
  if functor_direction != direction || other_direction != direction {
    return None;
  }

  let mut bindings = FeatureBindings::new();
  let mut map =
    other_result.unify_variables_with(functor_argument, VarMap::new(), matching, &mut bindings)?;

  let mut fresh = functor.syntax().max_variable() + 1;
  for var in other.syntax().unique_variables() {
    map.entry(var).or_insert_with(|| {
      fresh += 1;
      fresh - 1
    });
  }

  let syntax = HeadedSyntacticCategory::functional(
    direction,
    result.bind_features(&bindings),
    other_argument.relabel_with(&map),
    result.head_variable(),
  );

  let mut joint = Joint::from_sign(functor);
  joint.absorb(other, &map);
  Some(joint.finish(syntax))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
  ForwardApplication,
  BackwardApplication,
  ForwardComposition,
  BackwardComposition,
}

impl fmt::Display for Combinator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}",
      match self {
        Self::ForwardApplication => ">",
        Self::BackwardApplication => "<",
        Self::ForwardComposition => ">B",
        Self::BackwardComposition => "<B",
      }
    )
  }
}

/// The binary combinators a parser is allowed to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombinatorSet {
  pub composition: bool,
  pub features: FeatureMatching,
}

impl CombinatorSet {
  pub fn new(composition: bool, features: FeatureMatching) -> Self {
    Self {
      composition,
      features,
    }
  }

  /// Every way `left` and `right` (adjacent, in that order) combine
  pub fn combine(&self, left: &Sign, right: &Sign) -> Vec<(Combinator, Combination)> {
    let mut results = Vec::new();

    if let Some(c) = apply(left, right, Direction::Forward, self.features) {
      results.push((Combinator::ForwardApplication, c));
    }
    if let Some(c) = apply(right, left, Direction::Backward, self.features) {
      results.push((Combinator::BackwardApplication, c));
    }
    if self.composition {
      if let Some(c) = compose(left, right, Direction::Forward, self.features) {
        results.push((Combinator::ForwardComposition, c));
      }
      if let Some(c) = compose(right, left, Direction::Backward, self.features) {
        results.push((Combinator::BackwardComposition, c));
      }
    }

    trace!(
      "combine {} + {} => {} result(s)",
      left,
      right,
      results.len()
    );
    results
  }
}
