use std::fmt;
use std::str::FromStr;

use crate::category::headed::{HeadedSyntacticCategory, VarMap};
use crate::category::syntax::{FeatureBindings, FeatureMatching};
use crate::category::{CategoryDependency, Sign, Subject};
use crate::combinator::{Combination, Joint};
use crate::error::CcgError;
use crate::parse_grammar;

/// A type-changing rule rewriting one category into another, like type
/// raising `N{0} => (S{1}/(S{1}\N{0}){1}){1}`. Input and result share one
/// variable numbering, and every input variable has to survive into the
/// result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnaryRule {
  input: HeadedSyntacticCategory,
  result: HeadedSyntacticCategory,
  dependencies: Vec<CategoryDependency>,
}

impl UnaryRule {
  pub fn new(
    input: HeadedSyntacticCategory,
    result: HeadedSyntacticCategory,
    dependencies: Vec<CategoryDependency>,
  ) -> Result<Self, CcgError> {
    let result_variables = result.unique_variables();
    if let Some(variable) = input
      .unique_variables()
      .into_iter()
      .find(|v| !result_variables.contains(v))
    {
      return Err(CcgError::UnaryRuleVariables {
        input: input.to_string(),
        result: result.to_string(),
        variable,
      });
    }

    for dep in dependencies.iter() {
      let subject = match dep.subject {
        Subject::Variable(v) => v,
        Subject::Predicate(_) => {
          return Err(CcgError::MalformedGrammar {
            line: 0,
            message: format!("unary rule dependency `{}` needs a variable subject", dep),
          });
        }
      };
      for variable in [subject, dep.object] {
        if !result_variables.contains(&variable) {
          return Err(CcgError::UndeclaredVariable {
            part: dep.to_string(),
            variable,
            syntax: result.to_string(),
          });
        }
      }
    }

    Ok(Self {
      input,
      result,
      dependencies,
    })
  }

  pub fn input(&self) -> &HeadedSyntacticCategory {
    &self.input
  }

  pub fn result(&self) -> &HeadedSyntacticCategory {
    &self.result
  }

  pub fn dependencies(&self) -> &[CategoryDependency] {
    &self.dependencies
  }

  /// Rewrites `sign`, or returns None if its syntax doesn't match the input.
  pub fn apply(&self, sign: &Sign, matching: FeatureMatching) -> Option<Combination> {
    let mut bindings = FeatureBindings::new();
    let map =
      sign
        .syntax()
        .unify_variables_with(&self.input, VarMap::new(), matching, &mut bindings)?;

    let mut joint = Joint::empty();
    joint.absorb(sign, &map);
    for dep in self.dependencies.iter() {
      // word index is unused: rule dependencies have variable subjects
      joint.add_dependency(dep.instantiate(0));
    }
    Some(joint.finish(self.result.bind_features(&bindings)))
  }
}

impl fmt::Display for UnaryRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.input, self.result)?;
    for dep in self.dependencies.iter() {
      write!(f, ", {}", dep)?;
    }
    Ok(())
  }
}

impl FromStr for UnaryRule {
  type Err = CcgError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_grammar::parse_unary_rule(s)
  }
}

/// Reads one unary rule per line, skipping blank lines and `//` comments.
pub fn parse_unary_rules(s: &str) -> Result<Vec<UnaryRule>, CcgError> {
  s.lines()
    .enumerate()
    .map(|(idx, line)| (idx + 1, line.trim()))
    .filter(|(_, line)| !line.is_empty() && !line.starts_with("//"))
    .map(|(line_number, line)| line.parse().map_err(|e: CcgError| e.at_line(line_number)))
    .collect()
}
