use std::fmt;

use super::headed::{Var, VarMap};

/// A predicate anchored to the word that introduced it. For lexical predicates
/// the index is the last token of the lexicon entry's span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexedPredicate {
  pub head: String,
  pub word_index: usize,
}

impl IndexedPredicate {
  pub fn new(head: impl Into<String>, word_index: usize) -> Self {
    Self {
      head: head.into(),
      word_index,
    }
  }
}

impl fmt::Display for IndexedPredicate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.head, self.word_index)
  }
}

/// A filled predicate-argument dependency: `object` fills argument slot
/// `argument` of `subject`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dependency {
  pub subject: IndexedPredicate,
  pub argument: usize,
  pub object: IndexedPredicate,
}

impl Dependency {
  pub fn new(subject: IndexedPredicate, argument: usize, object: IndexedPredicate) -> Self {
    Self {
      subject,
      argument,
      object,
    }
  }
}

impl fmt::Display for Dependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {}, {})", self.subject, self.argument, self.object)
  }
}

/// A dependency where at least one side is still a head variable of the
/// category that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnfilledDependency {
  ObjectPending {
    subject: IndexedPredicate,
    argument: usize,
    object: Var,
  },
  SubjectPending {
    subject: Var,
    argument: usize,
    object: IndexedPredicate,
  },
  BothPending {
    subject: Var,
    argument: usize,
    object: Var,
  },
}

/// The outcome of resolving a pending dependency against variable assignments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  /// Both sides are known; one dependency per (subject, object) pair.
  Filled(Vec<Dependency>),
  /// One pending side became known; one rewritten dependency per predicate.
  Rewritten(Vec<UnfilledDependency>),
  Unchanged,
}

impl UnfilledDependency {
  pub fn argument(&self) -> usize {
    match self {
      Self::ObjectPending { argument, .. }
      | Self::SubjectPending { argument, .. }
      | Self::BothPending { argument, .. } => *argument,
    }
  }

  pub fn subject_variable(&self) -> Option<Var> {
    match self {
      Self::SubjectPending { subject, .. } | Self::BothPending { subject, .. } => Some(*subject),
      Self::ObjectPending { .. } => None,
    }
  }

  pub fn object_variable(&self) -> Option<Var> {
    match self {
      Self::ObjectPending { object, .. } | Self::BothPending { object, .. } => Some(*object),
      Self::SubjectPending { .. } => None,
    }
  }

  /// Relabels the pending variables, or returns None when one of them has no
  /// image under `map`.
  pub fn try_relabel(&self, map: &VarMap) -> Option<Self> {
    let image = |v: &Var| map.get(v).copied();
    Some(match self {
      Self::ObjectPending {
        subject,
        argument,
        object,
      } => Self::ObjectPending {
        subject: subject.clone(),
        argument: *argument,
        object: image(object)?,
      },
      Self::SubjectPending {
        subject,
        argument,
        object,
      } => Self::SubjectPending {
        subject: image(subject)?,
        argument: *argument,
        object: object.clone(),
      },
      Self::BothPending {
        subject,
        argument,
        object,
      } => Self::BothPending {
        subject: image(subject)?,
        argument: *argument,
        object: image(object)?,
      },
    })
  }

  /// Fills whatever sides `lookup` knows predicates for. Variables mapped to
  /// several predicates produce the cross product.
  pub fn resolve<'a, F>(&self, lookup: F) -> Resolution
  where
    F: Fn(Var) -> &'a [IndexedPredicate],
  {
    match self {
      Self::ObjectPending {
        subject,
        argument,
        object,
      } => {
        let objects = lookup(*object);
        if objects.is_empty() {
          return Resolution::Unchanged;
        }
        Resolution::Filled(
          objects
            .iter()
            .map(|o| Dependency::new(subject.clone(), *argument, o.clone()))
            .collect(),
        )
      }
      Self::SubjectPending {
        subject,
        argument,
        object,
      } => {
        let subjects = lookup(*subject);
        if subjects.is_empty() {
          return Resolution::Unchanged;
        }
        Resolution::Filled(
          subjects
            .iter()
            .map(|s| Dependency::new(s.clone(), *argument, object.clone()))
            .collect(),
        )
      }
      Self::BothPending {
        subject,
        argument,
        object,
      } => {
        let (subjects, objects) = (lookup(*subject), lookup(*object));
        match (subjects.is_empty(), objects.is_empty()) {
          (false, false) => Resolution::Filled(
            subjects
              .iter()
              .flat_map(|s| {
                objects
                  .iter()
                  .map(move |o| Dependency::new(s.clone(), *argument, o.clone()))
              })
              .collect(),
          ),
          (false, true) => Resolution::Rewritten(
            subjects
              .iter()
              .map(|s| Self::ObjectPending {
                subject: s.clone(),
                argument: *argument,
                object: *object,
              })
              .collect(),
          ),
          (true, false) => Resolution::Rewritten(
            objects
              .iter()
              .map(|o| Self::SubjectPending {
                subject: *subject,
                argument: *argument,
                object: o.clone(),
              })
              .collect(),
          ),
          (true, true) => Resolution::Unchanged,
        }
      }
    }
  }
}

impl fmt::Display for UnfilledDependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ObjectPending {
        subject,
        argument,
        object,
      } => write!(f, "({}, {}, ${})", subject, argument, object),
      Self::SubjectPending {
        subject,
        argument,
        object,
      } => write!(f, "(${}, {}, {})", subject, argument, object),
      Self::BothPending {
        subject,
        argument,
        object,
      } => write!(f, "(${}, {}, ${})", subject, argument, object),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pred(head: &str, idx: usize) -> IndexedPredicate {
    IndexedPredicate::new(head, idx)
  }

  #[test]
  fn test_resolve_object() {
    let dep = UnfilledDependency::ObjectPending {
      subject: pred("red", 0),
      argument: 1,
      object: 1,
    };
    let assigned = vec![pred("block", 1)];
    let resolution = dep.resolve(|v| if v == 1 { &assigned[..] } else { &[] });
    assert_eq!(
      resolution,
      Resolution::Filled(vec![Dependency::new(pred("red", 0), 1, pred("block", 1))])
    );
    assert_eq!(dep.resolve(|_| &[]), Resolution::Unchanged);
  }

  #[test]
  fn test_resolve_cross_product() {
    let dep = UnfilledDependency::BothPending {
      subject: 0,
      argument: 2,
      object: 1,
    };
    let subjects = vec![pred("a", 0), pred("b", 1)];
    let objects = vec![pred("x", 2), pred("y", 3)];
    let Resolution::Filled(filled) = dep.resolve(|v| if v == 0 { &subjects[..] } else { &objects[..] })
    else {
      panic!("expected filled dependencies");
    };
    assert_eq!(
      filled,
      vec![
        Dependency::new(pred("a", 0), 2, pred("x", 2)),
        Dependency::new(pred("a", 0), 2, pred("y", 3)),
        Dependency::new(pred("b", 1), 2, pred("x", 2)),
        Dependency::new(pred("b", 1), 2, pred("y", 3)),
      ]
    );
  }

  #[test]
  fn test_resolve_cross_product_with_single_subject() {
    let dep = UnfilledDependency::BothPending {
      subject: 0,
      argument: 1,
      object: 1,
    };
    let subjects = vec![pred("on", 4)];
    let objects = vec![pred("block", 2), pred("table", 7), pred("blocks", 9)];
    let Resolution::Filled(filled) = dep.resolve(|v| if v == 0 { &subjects[..] } else { &objects[..] })
    else {
      panic!("expected filled dependencies");
    };
    assert_eq!(filled.len(), 3);
    assert!(filled.iter().all(|d| d.subject == pred("on", 4) && d.argument == 1));
  }

  #[test]
  fn test_resolve_rewrites_one_side() {
    let dep = UnfilledDependency::BothPending {
      subject: 0,
      argument: 1,
      object: 1,
    };
    let subjects = vec![pred("eat", 1), pred("devour", 1)];
    let resolution = dep.resolve(|v| if v == 0 { &subjects[..] } else { &[] });
    assert_eq!(
      resolution,
      Resolution::Rewritten(vec![
        UnfilledDependency::ObjectPending {
          subject: pred("eat", 1),
          argument: 1,
          object: 1,
        },
        UnfilledDependency::ObjectPending {
          subject: pred("devour", 1),
          argument: 1,
          object: 1,
        },
      ])
    );
  }

  #[test]
  fn test_try_relabel() {
    let dep = UnfilledDependency::BothPending {
      subject: 3,
      argument: 1,
      object: 5,
    };
    let mut map = VarMap::new();
    map.insert(3, 0);
    assert_eq!(dep.try_relabel(&map), None);
    map.insert(5, 1);
    assert_eq!(
      dep.try_relabel(&map),
      Some(UnfilledDependency::BothPending {
        subject: 0,
        argument: 1,
        object: 1,
      })
    );
  }
}
