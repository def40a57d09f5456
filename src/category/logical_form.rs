//! Guesses a logical form for a category from its syntax alone, for lexicon
//! entries that come without hand-written semantics.

use std::fmt;

use super::headed::{HeadedSyntacticCategory, Var};
use crate::error::{CcgError, Result};

/// The body of an induced lambda term
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
  Variable(Var),
  Application { function: Var, arguments: Vec<Var> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InducedForm {
  /// `(lambda $a $b ... body)`, one parameter per argument of the category
  Lambda { parameters: Vec<Var>, body: Body },
  /// A bare atom other than `S`, such as an unknown noun
  Unknown,
  /// No argument could be identified as the head of the result
  Indeterminate,
}

impl fmt::Display for Body {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Variable(v) => write!(f, "${}", v),
      Self::Application {
        function,
        arguments,
      } => {
        write!(f, "(${}", function)?;
        for a in arguments {
          write!(f, " ${}", a)?;
        }
        write!(f, ")")
      }
    }
  }
}

impl fmt::Display for InducedForm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Lambda { parameters, body } => {
        write!(f, "(lambda")?;
        for p in parameters {
          write!(f, " ${}", p)?;
        }
        write!(f, " {})", body)
      }
      Self::Unknown => write!(f, "unknown"),
      Self::Indeterminate => write!(f, "indeterminate"),
    }
  }
}

/// Induces a logical form for `syntax`. `CcgCategory::logical_form` calls this
/// for lexical categories. The body is headed by the argument whose variable
/// heads the final result. When no argument does, the last argument (peeling
/// from the outside in) whose featureless syntax unifies with the category
/// left after removing it is used instead.
///
/// Variables are expected to be numbered contiguously from 0, as they are in
/// canonical form.
pub fn induce_logical_form(syntax: &HeadedSyntacticCategory) -> Result<InducedForm> {
  let mut arguments: Vec<&HeadedSyntacticCategory> = Vec::new();
  let mut heuristic_root = None;

  let mut current = syntax;
  while let Some((_, result, argument)) = current.split() {
    arguments.push(argument);
    current = result;

    if argument
      .syntax()
      .without_features()
      .is_unifiable_with(&current.syntax().without_features())
    {
      heuristic_root = Some(argument.head_variable());
    }
  }

  let roots = arguments
    .iter()
    .map(|a| a.head_variable())
    .collect::<Vec<_>>();
  for (i, root) in roots.iter().enumerate() {
    if roots[..i].contains(root) {
      return Err(CcgError::AmbiguousArgumentBinding {
        syntax: syntax.to_string(),
        variable: *root,
      });
    }
  }

  if arguments.is_empty() && current.value() != Some("S") {
    return Ok(InducedForm::Unknown);
  }

  let head_index = roots
    .iter()
    .position(|r| *r == current.head_variable())
    .or_else(|| heuristic_root.and_then(|h| roots.iter().position(|r| *r == h)));

  let Some(head_index) = head_index else {
    return Ok(InducedForm::Indeterminate);
  };

  let head = arguments[head_index];
  let body = if head.is_atomic() {
    Body::Variable(roots[head_index])
  } else {
    let mut head_arguments = Vec::new();
    let mut h = head;
    while let Some((_, result, argument)) = h.split() {
      head_arguments.push(argument.head_variable());
      h = result;
    }
    Body::Application {
      function: roots[head_index],
      arguments: head_arguments,
    }
  };

  Ok(InducedForm::Lambda {
    parameters: roots,
    body,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn induce(s: &str) -> Result<InducedForm> {
    induce_logical_form(&s.parse().unwrap())
  }

  #[test]
  fn test_noun_modifier() {
    assert_eq!(
      induce(r"((N{0}\N{0}){1}/N{2}){1}").unwrap().to_string(),
      "(lambda $2 $0 $0)"
    );
  }

  #[test]
  fn test_verb_modifier() {
    assert_eq!(
      induce(r"(((S[9]{0}\N{1}){0}\(S[9]{0}\N{1}){0}){2}/N{3}){2}")
        .unwrap()
        .to_string(),
      "(lambda $3 $0 $1 ($0 $1))"
    );
  }

  #[test]
  fn test_auxiliary_uses_heuristic_head() {
    assert_eq!(
      induce(r"((S[dcl]{0}\NP{1}){0}/(S[pss]{2}\NP{1}){2}){0}")
        .unwrap()
        .to_string(),
      "(lambda $2 $1 ($2 $1))"
    );
  }

  #[test]
  fn test_relative_pronoun() {
    assert_eq!(
      induce(r"((N{0}\N{0}){1}/(S{2}/N{0}){2}){1}")
        .unwrap()
        .to_string(),
      "(lambda $2 $0 $0)"
    );
  }

  #[test]
  fn test_atoms() {
    assert_eq!(induce("N{0}").unwrap(), InducedForm::Unknown);
    assert_eq!(induce("S{0}").unwrap(), InducedForm::Indeterminate);
  }

  #[test]
  fn test_ambiguous_arguments() {
    assert!(matches!(
      induce(r"((S{0}\N{1}){0}/N{1}){0}"),
      Err(CcgError::AmbiguousArgumentBinding { variable: 1, .. })
    ));
  }
}
