//! Error types for grammar loading and parsing.

use thiserror::Error;

/// Everything that can go wrong while loading a grammar or preparing input.
///
/// Unification failures and sentences without a parse are *not* errors: the
/// combinators return `None` and the parser returns an empty list.
#[derive(Debug, Error)]
pub enum CcgError {
  /// A syntactic category string could not be parsed.
  #[error("malformed category `{input}`: {message}")]
  MalformedCategory { input: String, message: String },

  /// A lexicon, unary rule or syntax tree line could not be parsed.
  #[error("line {line}: {message}")]
  MalformedGrammar { line: usize, message: String },

  /// A bracketed gold syntax tree could not be parsed.
  #[error("malformed syntax tree `{input}`: {message}")]
  MalformedTree { input: String, message: String },

  /// A semantic part refers to a variable that the syntax doesn't declare.
  #[error("`{part}` refers to variable {variable}, which does not occur in {syntax}")]
  UndeclaredVariable {
    part: String,
    variable: usize,
    syntax: String,
  },

  /// The number of assignment slots doesn't match the category's variables.
  #[error("{syntax} has {expected} variables but {actual} assignment slots")]
  AssignmentArity {
    syntax: String,
    expected: usize,
    actual: usize,
  },

  /// A unary rule drops a variable of its input category.
  #[error("unary rule {input} => {result}: variable {variable} is missing from the result")]
  UnaryRuleVariables {
    input: String,
    result: String,
    variable: usize,
  },

  /// Several arguments of a category bind the same head variable, so no
  /// logical form can be induced for it.
  #[error("{syntax}: multiple arguments bind variable {variable}")]
  AmbiguousArgumentBinding { syntax: String, variable: usize },

  /// POS tags must parallel the words of a sentence.
  #[error("sentence has {words} words but {tags} part-of-speech tags")]
  TagCountMismatch { words: usize, tags: usize },

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl CcgError {
  pub(crate) fn category(input: &str, message: impl Into<String>) -> Self {
    Self::MalformedCategory {
      input: input.to_string(),
      message: message.into(),
    }
  }

  /// Attaches a line number to an error raised while parsing a single line.
  pub(crate) fn at_line(self, line: usize) -> Self {
    match self {
      Self::MalformedGrammar { message, .. } => Self::MalformedGrammar { line, message },
      other => Self::MalformedGrammar {
        line,
        message: other.to_string(),
      },
    }
  }
}

pub type Result<T> = std::result::Result<T, CcgError>;
