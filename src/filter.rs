//! Filters deciding which entries may enter the chart.

use std::collections::HashMap;

use crate::category::headed::HeadedSyntacticCategory;
use crate::category::syntax::SyntacticCategory;
use crate::chart::{ChartEntry, Child};
use crate::syntree::{GoldCategory, SyntaxTree};

/// Consulted on every insertion into a chart cell `start..=end`
pub trait ChartFilter {
  fn accepts(&self, entry: &ChartEntry, start: usize, end: usize) -> bool;
}

impl<F> ChartFilter for F
where
  F: Fn(&ChartEntry, usize, usize) -> bool,
{
  fn accepts(&self, entry: &ChartEntry, start: usize, end: usize) -> bool {
    self(entry, start, end)
  }
}

/// Restricts single-word spans to the categories a supertagger proposed.
/// Words with an empty candidate list are unrestricted.
#[derive(Debug, Clone, Default)]
pub struct SupertagChartFilter {
  supertags: Vec<Vec<HeadedSyntacticCategory>>,
}

impl SupertagChartFilter {
  pub fn new(supertags: Vec<Vec<HeadedSyntacticCategory>>) -> Self {
    let supertags = supertags
      .into_iter()
      .map(|tags| tags.into_iter().map(|t| t.canonical_form().0).collect())
      .collect();
    Self { supertags }
  }
}

impl ChartFilter for SupertagChartFilter {
  fn accepts(&self, entry: &ChartEntry, start: usize, end: usize) -> bool {
    if start != end {
      return true;
    }
    match self.supertags.get(start) {
      Some(tags) if !tags.is_empty() => tags.contains(entry.syntax()),
      _ => true,
    }
  }
}

#[derive(Debug, Clone)]
struct GoldNode {
  category: GoldCategory,
  terminal: bool,
  headed: Option<HeadedSyntacticCategory>,
  /// Result of the unary rule the gold tree applies to each child
  left_unary: Option<SyntacticCategory>,
  right_unary: Option<SyntacticCategory>,
}

/// Restricts parsing to derivations that agree with a gold syntax tree:
/// entries may only occupy spans of the tree, must be compatible with the
/// gold category there, and must use unary rules exactly where the tree does.
/// Gold categories without features match any feature.
#[derive(Debug, Clone)]
pub struct SyntacticChartFilter {
  nodes: HashMap<(usize, usize), GoldNode>,
}

impl SyntacticChartFilter {
  pub fn new(tree: &SyntaxTree) -> Self {
    let mut nodes = HashMap::new();
    Self::collect(tree, &mut nodes);
    Self { nodes }
  }

  fn collect(tree: &SyntaxTree, nodes: &mut HashMap<(usize, usize), GoldNode>) {
    let unary_result = |t: &SyntaxTree| {
      let category = t.category();
      category
        .has_unary_rule()
        .then(|| category.syntax.clone())
    };

    let node = match tree {
      SyntaxTree::Leaf(c, word) => GoldNode {
        category: c.value.clone(),
        terminal: true,
        headed: word.headed.clone(),
        left_unary: None,
        right_unary: None,
      },
      SyntaxTree::Branch(c, left, right) => {
        Self::collect(left, nodes);
        Self::collect(right, nodes);
        GoldNode {
          category: c.value.clone(),
          terminal: false,
          headed: None,
          left_unary: unary_result(left),
          right_unary: unary_result(right),
        }
      }
    };
    nodes.insert(tree.span(), node);
  }

  fn child_agrees(expected: Option<&SyntacticCategory>, child: &Child) -> bool {
    match (expected, child.entry.unary()) {
      (Some(expected), Some(_)) => expected.accepts(&child.entry.syntax().syntax()),
      (None, None) => true,
      _ => false,
    }
  }
}

impl ChartFilter for SyntacticChartFilter {
  fn accepts(&self, entry: &ChartEntry, start: usize, end: usize) -> bool {
    let Some(node) = self.nodes.get(&(start, end)) else {
      return false;
    };
    if node.terminal != entry.is_terminal() {
      return false;
    }

    let gold = &node.category;
    let syntax_agrees = match entry.unary() {
      Some(unary) => {
        gold.has_unary_rule()
          && gold.syntax.accepts(&entry.syntax().syntax())
          && gold.pre_unary_syntax().accepts(&unary.input_syntax.syntax())
      }
      // entries without a unary rule are the rule's input where the tree
      // applies one
      None => gold.pre_unary_syntax().accepts(&entry.syntax().syntax()),
    };
    if !syntax_agrees {
      return false;
    }

    if let Some((left, right)) = entry.children() {
      if !Self::child_agrees(node.left_unary.as_ref(), left)
        || !Self::child_agrees(node.right_unary.as_ref(), right)
      {
        return false;
      }
    }

    match &node.headed {
      Some(headed) => entry.pre_unary_syntax() == headed,
      None => true,
    }
  }
}

/// Accepts what every one of its filters accepts
#[derive(Default)]
pub struct ConjunctionFilter {
  filters: Vec<Box<dyn ChartFilter>>,
}

impl ConjunctionFilter {
  pub fn new(filters: Vec<Box<dyn ChartFilter>>) -> Self {
    Self { filters }
  }

  pub fn with(mut self, filter: impl ChartFilter + 'static) -> Self {
    self.filters.push(Box::new(filter));
    self
  }
}

impl ChartFilter for ConjunctionFilter {
  fn accepts(&self, entry: &ChartEntry, start: usize, end: usize) -> bool {
    self.filters.iter().all(|f| f.accepts(entry, start, end))
  }
}
