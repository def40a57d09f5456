//! Categories: unheaded and headed syntax, plus the semantic state that rides
//! along with a category through the chart.

pub mod headed;
pub mod logical_form;
pub mod semantics;
pub mod syntax;

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::combinator::{Combination, Joint};
use crate::error::{CcgError, Result};
pub use headed::{HeadedSyntacticCategory, Var, VarMap};
pub use logical_form::InducedForm;
pub use semantics::{Dependency, IndexedPredicate, UnfilledDependency};
pub use syntax::{Direction, Feature, FeatureMatching, SyntacticCategory};

/// The subject of a lexical dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
  /// Introduced by the word itself
  Predicate(String),
  /// Whatever ends up assigned to this head variable
  Variable(Var),
}

impl fmt::Display for Subject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Predicate(p) => write!(f, "{}", p),
      Self::Variable(v) => write!(f, "{{{}}}", v),
    }
  }
}

/// A dependency as written in the lexicon: `subject` takes whatever fills
/// `object` as its `argument`th argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryDependency {
  pub subject: Subject,
  pub argument: usize,
  pub object: Var,
}

impl CategoryDependency {
  pub fn new(subject: Subject, argument: usize, object: Var) -> Self {
    Self {
      subject,
      argument,
      object,
    }
  }

  fn relabel(&self, map: &VarMap) -> Self {
    let image = |v: Var| map.get(&v).copied().unwrap_or(v);
    Self {
      subject: match &self.subject {
        Subject::Variable(v) => Subject::Variable(image(*v)),
        predicate => predicate.clone(),
      },
      argument: self.argument,
      object: image(self.object),
    }
  }

  /// The dependency in terms of word `word_index`'s predicates
  pub(crate) fn instantiate(&self, word_index: usize) -> UnfilledDependency {
    match &self.subject {
      Subject::Predicate(p) => UnfilledDependency::ObjectPending {
        subject: IndexedPredicate::new(p.clone(), word_index),
        argument: self.argument,
        object: self.object,
      },
      Subject::Variable(v) => UnfilledDependency::BothPending {
        subject: *v,
        argument: self.argument,
        object: self.object,
      },
    }
  }
}

impl fmt::Display for CategoryDependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {} {}", self.subject, self.argument, self.object)
  }
}

/// Hand-written semantics for a lexical category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CategorySemantics {
  pub dependencies: Vec<CategoryDependency>,
  /// Predicate names for each head variable, indexed like
  /// `HeadedSyntacticCategory::unique_variables`
  pub assignments: Vec<BTreeSet<String>>,
}

/// A lexical category: canonical headed syntax with optional semantics
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CcgCategory {
  syntax: Rc<HeadedSyntacticCategory>,
  semantics: Option<CategorySemantics>,
}

impl CcgCategory {
  /// Builds a category, checking that the semantics only mention variables
  /// of `syntax`. The syntax is canonicalized and the semantics renumbered to
  /// match.
  pub fn new(syntax: HeadedSyntacticCategory, semantics: Option<CategorySemantics>) -> Result<Self> {
    let variables = syntax.unique_variables();

    if let Some(semantics) = &semantics {
      if semantics.assignments.len() != variables.len() {
        return Err(CcgError::AssignmentArity {
          syntax: syntax.to_string(),
          expected: variables.len(),
          actual: semantics.assignments.len(),
        });
      }
      for dep in &semantics.dependencies {
        let mut referenced = vec![dep.object];
        if let Subject::Variable(v) = dep.subject {
          referenced.push(v);
        }
        if let Some(v) = referenced.into_iter().find(|v| !variables.contains(v)) {
          return Err(CcgError::UndeclaredVariable {
            part: dep.to_string(),
            variable: v,
            syntax: syntax.to_string(),
          });
        }
      }
    }

    let (canonical, relabeling) = syntax.canonical_form();
    let semantics = semantics.map(|semantics| {
      // canonical variables are 0..k, so slot order follows the relabeling
      let mut assignments = vec![BTreeSet::new(); variables.len()];
      for (old, names) in variables.iter().zip(semantics.assignments) {
        if let Some(new) = relabeling.get(old) {
          assignments[*new] = names;
        }
      }
      CategorySemantics {
        dependencies: semantics
          .dependencies
          .iter()
          .map(|d| d.relabel(&relabeling))
          .collect(),
        assignments,
      }
    });

    Ok(Self {
      syntax: Rc::new(canonical),
      semantics,
    })
  }

  /// A category without semantics
  pub fn from_syntax(syntax: HeadedSyntacticCategory) -> Self {
    Self {
      syntax: Rc::new(syntax.canonical_form().0),
      semantics: None,
    }
  }

  pub fn syntax(&self) -> &HeadedSyntacticCategory {
    &self.syntax
  }

  pub fn semantics(&self) -> Option<&CategorySemantics> {
    self.semantics.as_ref()
  }

  /// Predicate names assigned to the root head variable
  pub fn semantic_heads(&self) -> Option<&BTreeSet<String>> {
    self
      .semantics
      .as_ref()
      .and_then(|s| s.assignments.get(self.syntax.head_variable()))
  }

  pub fn dependencies(&self) -> &[CategoryDependency] {
    self
      .semantics
      .as_ref()
      .map(|s| &s.dependencies[..])
      .unwrap_or(&[])
  }

  /// The chart state for this category used at a span ending at
  /// `word_index`. Dependencies that the category's own assignments already
  /// resolve come back filled.
  pub fn to_sign(&self, word_index: usize) -> Combination {
    let mut joint = Joint::empty();
    if let Some(semantics) = &self.semantics {
      for (var, names) in semantics.assignments.iter().enumerate() {
        for name in names {
          joint.assign(var, IndexedPredicate::new(name.clone(), word_index));
        }
      }
      for dep in &semantics.dependencies {
        joint.add_dependency(dep.instantiate(word_index));
      }
    }
    joint.finish(self.syntax.as_ref().clone())
  }

  /// A logical form guessed from the syntax alone. Hand-written semantics,
  /// if any, are not consulted.
  pub fn logical_form(&self) -> Result<InducedForm> {
    logical_form::induce_logical_form(&self.syntax)
  }
}

impl fmt::Display for CcgCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.syntax)?;
    if let Some(semantics) = &self.semantics {
      for (var, names) in semantics.assignments.iter().enumerate() {
        for name in names {
          write!(f, ", {} {}", var, name)?;
        }
      }
      for dep in &semantics.dependencies {
        write!(f, ", {}", dep)?;
      }
    }
    Ok(())
  }
}

/// Syntax plus semantic state, the thing combinators operate on. Assignments
/// are kept sorted by variable so that equal states compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sign {
  syntax: Rc<HeadedSyntacticCategory>,
  assignment_vars: Vec<Var>,
  assignment_predicates: Vec<IndexedPredicate>,
  unfilled: Vec<UnfilledDependency>,
}

impl Sign {
  pub(crate) fn new(
    syntax: Rc<HeadedSyntacticCategory>,
    mut assignments: Vec<(Var, IndexedPredicate)>,
    mut unfilled: Vec<UnfilledDependency>,
  ) -> Self {
    assignments.sort();
    assignments.dedup();
    unfilled.sort();
    let (assignment_vars, assignment_predicates) = assignments.into_iter().unzip();
    Self {
      syntax,
      assignment_vars,
      assignment_predicates,
      unfilled,
    }
  }

  /// A sign with no semantics at all
  pub fn bare(syntax: HeadedSyntacticCategory) -> Self {
    Self::new(Rc::new(syntax.canonical_form().0), Vec::new(), Vec::new())
  }

  pub fn syntax(&self) -> &HeadedSyntacticCategory {
    &self.syntax
  }

  pub fn syntax_rc(&self) -> &Rc<HeadedSyntacticCategory> {
    &self.syntax
  }

  /// Predicates assigned to `var`
  pub fn assignment(&self, var: Var) -> &[IndexedPredicate] {
    let start = self.assignment_vars.partition_point(|v| *v < var);
    let end = self.assignment_vars.partition_point(|v| *v <= var);
    &self.assignment_predicates[start..end]
  }

  pub fn assignments(&self) -> impl Iterator<Item = (Var, &IndexedPredicate)> + '_ {
    self
      .assignment_vars
      .iter()
      .copied()
      .zip(self.assignment_predicates.iter())
  }

  pub fn semantic_heads(&self) -> &[IndexedPredicate] {
    self.assignment(self.syntax.head_variable())
  }

  pub fn unfilled_dependencies(&self) -> &[UnfilledDependency] {
    &self.unfilled
  }
}

impl fmt::Display for Sign {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.syntax)?;
    let heads = self.semantic_heads();
    if !heads.is_empty() {
      let heads = heads.iter().map(|h| h.to_string()).collect::<Vec<_>>();
      write!(f, " [{}]", heads.join(" "))?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names(ns: &[&str]) -> BTreeSet<String> {
    ns.iter().map(|n| n.to_string()).collect()
  }

  #[test]
  fn test_new_canonicalizes() {
    let syntax: HeadedSyntacticCategory = r"(N{4}/N{4}){2}".parse().unwrap();
    let category = CcgCategory::new(
      syntax,
      Some(CategorySemantics {
        dependencies: vec![CategoryDependency::new(
          Subject::Predicate("red".into()),
          1,
          4,
        )],
        // slots follow sorted variables: 2, then 4
        assignments: vec![names(&["red"]), names(&[])],
      }),
    )
    .unwrap();

    assert_eq!(category.syntax(), &r"(N{1}/N{1}){0}".parse::<HeadedSyntacticCategory>().unwrap());
    assert_eq!(category.semantic_heads(), Some(&names(&["red"])));
    assert_eq!(
      category.dependencies(),
      &[CategoryDependency::new(Subject::Predicate("red".into()), 1, 1)]
    );
  }

  #[test]
  fn test_logical_form_uses_canonical_syntax() {
    let modifier = CcgCategory::from_syntax(r"((N{0}\N{0}){1}/N{2}){1}".parse().unwrap());
    assert_eq!(modifier.syntax().to_string(), r"((N{1}\N{1}){0}/N{2}){0}");
    assert_eq!(
      modifier.logical_form().unwrap().to_string(),
      "(lambda $2 $1 $1)"
    );

    let noun = CcgCategory::from_syntax("N{0}".parse().unwrap());
    assert_eq!(noun.logical_form().unwrap(), InducedForm::Unknown);
  }

  #[test]
  fn test_new_validates_variables() {
    let syntax: HeadedSyntacticCategory = r"(N{1}/N{1}){0}".parse().unwrap();
    let arity = CcgCategory::new(
      syntax.clone(),
      Some(CategorySemantics {
        dependencies: vec![],
        assignments: vec![names(&["red"])],
      }),
    );
    assert!(matches!(
      arity,
      Err(CcgError::AssignmentArity {
        expected: 2,
        actual: 1,
        ..
      })
    ));

    let undeclared = CcgCategory::new(
      syntax,
      Some(CategorySemantics {
        dependencies: vec![CategoryDependency::new(Subject::Variable(7), 1, 1)],
        assignments: vec![names(&[]), names(&[])],
      }),
    );
    assert!(matches!(
      undeclared,
      Err(CcgError::UndeclaredVariable { variable: 7, .. })
    ));
  }

  #[test]
  fn test_to_sign_fills_internal_dependencies() {
    let syntax: HeadedSyntacticCategory = r"(N{1}/N{1}){0}".parse().unwrap();
    let category = CcgCategory::new(
      syntax,
      Some(CategorySemantics {
        dependencies: vec![
          CategoryDependency::new(Subject::Predicate("red".into()), 1, 1),
          CategoryDependency::new(Subject::Predicate("self".into()), 2, 0),
        ],
        assignments: vec![names(&["red"]), names(&[])],
      }),
    )
    .unwrap();

    let combination = category.to_sign(3);
    assert_eq!(
      combination.filled,
      vec![Dependency::new(
        IndexedPredicate::new("self", 3),
        2,
        IndexedPredicate::new("red", 3)
      )]
    );
    assert_eq!(combination.sign.unfilled_dependencies().len(), 1);
    assert_eq!(
      combination.sign.semantic_heads(),
      &[IndexedPredicate::new("red", 3)]
    );
    assert!(combination.sign.assignment(1).is_empty());
  }
}
