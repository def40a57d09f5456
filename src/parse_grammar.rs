use regex::Regex;
/// Simple recursive-descent parsing of categories, lexicon lines, unary rules
/// and gold syntax trees
use std::collections::BTreeSet;

use crate::category::headed::{HeadedSyntacticCategory, Var};
use crate::category::syntax::{Direction, Feature, SyntacticCategory};
use crate::category::{CategoryDependency, CategorySemantics, CcgCategory, Subject};
use crate::error::CcgError;
use crate::lexicon::LexiconEntry;
use crate::rules::UnaryRule;
use crate::syntree::{Constituent, GoldCategory, SyntaxTree, TreeWord};

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), String>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  match re.find(s) {
    Some(m) if m.start() == 0 => (Some(m.as_str()), &s[m.end()..]),
    _ => (None, s),
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(format!("couldn't match {} at `{}`", re, s))
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<'_, Option<char>> {
  match s.strip_prefix(c) {
    Some(rest) => (Some(c), rest),
    None => (None, s),
  }
}

/// Try to consume a char, failing if it doesn't match
fn needed_char(c: char, s: &str) -> ParseResult<'_, char> {
  if let (Some(c), rest) = optional_char(c, s) {
    Ok((c, rest))
  } else {
    Err(format!("expected `{}` at `{}`", c, s))
  }
}

fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE, r"\s+");
  optional_re(&WHITESPACE, s).1
}

/// A category as written, heads optional
#[derive(Debug)]
enum RawCategory {
  Atomic {
    value: String,
    feature: Feature,
    head: Option<Var>,
  },
  Functional {
    direction: Direction,
    result: Box<RawCategory>,
    argument: Box<RawCategory>,
    head: Option<Var>,
  },
}

impl RawCategory {
  fn with_head(self, new_head: Option<Var>) -> Self {
    if new_head.is_none() {
      return self;
    }
    match self {
      Self::Atomic { value, feature, .. } => Self::Atomic {
        value,
        feature,
        head: new_head,
      },
      Self::Functional {
        direction,
        result,
        argument,
        ..
      } => Self::Functional {
        direction,
        result,
        argument,
        head: new_head,
      },
    }
  }

  fn has_heads(&self) -> bool {
    match self {
      Self::Atomic { head, .. } => head.is_some(),
      Self::Functional {
        result,
        argument,
        head,
        ..
      } => head.is_some() || result.has_heads() || argument.has_heads(),
    }
  }

  fn to_syntax(&self) -> SyntacticCategory {
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
      } => SyntacticCategory::functional(*direction, result.to_syntax(), argument.to_syntax()),
    }
  }

  /// Every atom needs a head; functional nodes default to their result's.
  fn to_headed(&self) -> Result<HeadedSyntacticCategory, String> {
    match self {
      Self::Atomic {
        value,
        feature,
        head,
      } => match head {
        Some(head) => Ok(HeadedSyntacticCategory::atomic(
          value.clone(),
          feature.clone(),
          *head,
        )),
        None => Err(format!("atom {}{} has no head variable", value, feature)),
      },
      Self::Functional {
        direction,
        result,
        argument,
        head,
      } => {
        let result = result.to_headed()?;
        let argument = argument.to_headed()?;
        let head = head.unwrap_or_else(|| result.head_variable());
        Ok(HeadedSyntacticCategory::functional(
          *direction, result, argument, head,
        ))
      }
    }
  }
}

fn parse_head(s: &str) -> ParseResult<'_, Option<Var>> {
  regex_static!(HEAD, r"\{\s*[0-9]+\s*\}");
  match optional_re(&HEAD, s) {
    (Some(h), rest) => {
      let var = h[1..h.len() - 1]
        .trim()
        .parse::<Var>()
        .map_err(|e| format!("head variable {}: {}", h, e))?;
      Ok((Some(var), rest))
    }
    (None, rest) => Ok((None, rest)),
  }
}

fn parse_feature(s: &str) -> ParseResult<'_, Feature> {
  regex_static!(FEATURE, r"\[[^\[\]\s]+\]");
  match optional_re(&FEATURE, s) {
    (Some(f), rest) => {
      let name = &f[1..f.len() - 1];
      let feature = match name.parse::<u32>() {
        Ok(n) => Feature::Variable(n),
        Err(_) => Feature::Value(name.to_string()),
      };
      Ok((feature, rest))
    }
    (None, rest) => Ok((Feature::Unspecified, rest)),
  }
}

/// `( category ) head?` or `atom feature? head?`
fn parse_term(s: &str) -> ParseResult<'_, RawCategory> {
  regex_static!(ATOM, r"[^\s/\\()\[\]{}<>_]+");

  if let (Some(_), rest) = optional_char('(', s) {
    let (category, rest) = parse_raw_category(rest)?;
    let (_, rest) = needed_char(')', rest)?;
    let (head, rest) = parse_head(rest)?;
    return Ok((category.with_head(head), rest));
  }

  let (value, rest) = needed_re(&ATOM, s).map_err(|e| format!("atom: {}", e))?;
  let (feature, rest) = parse_feature(rest)?;
  let (head, rest) = parse_head(rest)?;
  Ok((
    RawCategory::Atomic {
      value: value.to_string(),
      feature,
      head,
    },
    rest,
  ))
}

/// `term (slash term)*`, slashes associate to the left
fn parse_raw_category(s: &str) -> ParseResult<'_, RawCategory> {
  let (mut category, mut rem) = parse_term(s)?;
  while let Some(direction) = rem.chars().next().and_then(Direction::from_slash) {
    let (argument, rest) = parse_term(&rem[1..])?;
    category = RawCategory::Functional {
      direction,
      result: Box::new(category),
      argument: Box::new(argument),
      head: None,
    };
    rem = rest;
  }
  Ok((category, rem))
}

fn parse_complete(s: &str) -> Result<RawCategory, CcgError> {
  let input = s.trim();
  let (category, rest) = parse_raw_category(input).map_err(|m| CcgError::category(input, m))?;
  if !rest.is_empty() {
    return Err(CcgError::category(
      input,
      format!("unexpected trailing input `{}`", rest),
    ));
  }
  Ok(category)
}

/// Parses an unheaded category. Head annotations are accepted and dropped.
pub fn parse_syntactic_category(s: &str) -> Result<SyntacticCategory, CcgError> {
  Ok(parse_complete(s)?.to_syntax())
}

/// Parses a headed category, keeping the variable numbering as written.
pub fn parse_headed_category(s: &str) -> Result<HeadedSyntacticCategory, CcgError> {
  parse_complete(s)?
    .to_headed()
    .map_err(|m| CcgError::category(s.trim(), m))
}

fn malformed(message: impl Into<String>) -> CcgError {
  CcgError::MalformedGrammar {
    line: 0,
    message: message.into(),
  }
}

/// Splits a line on commas. A field may be wrapped in double quotes to
/// protect commas; inside quotes `~` escapes the next character.
pub fn split_fields(line: &str) -> Result<Vec<String>, CcgError> {
  let mut fields = Vec::new();
  let mut field = String::new();
  let mut quoted = false;
  let mut chars = line.chars();

  while let Some(c) = chars.next() {
    match c {
      '"' => quoted = !quoted,
      '~' if quoted => match chars.next() {
        Some(escaped) => field.push(escaped),
        None => return Err(malformed("dangling escape at end of line")),
      },
      ',' if !quoted => fields.push(std::mem::take(&mut field)),
      c => field.push(c),
    }
  }
  if quoted {
    return Err(malformed(format!("unterminated quote in `{}`", line)));
  }
  fields.push(field);

  Ok(fields.into_iter().map(|f| f.trim().to_string()).collect())
}

enum SemanticPart {
  Assignment(Var, String),
  Dependency(CategoryDependency),
}

fn parse_var(s: &str) -> Result<Var, CcgError> {
  let digits = s
    .strip_prefix('{')
    .and_then(|s| s.strip_suffix('}'))
    .unwrap_or(s);
  digits
    .parse::<Var>()
    .map_err(|_| malformed(format!("expected a variable, got `{}`", s)))
}

/// `var predicate` or `subject argument var`, where a subject written `{n}`
/// is a variable
fn parse_semantic_part(part: &str) -> Result<SemanticPart, CcgError> {
  match part.split_whitespace().collect::<Vec<_>>()[..] {
    [var, predicate] => Ok(SemanticPart::Assignment(
      parse_var(var)?,
      predicate.to_string(),
    )),
    [subject, argument, object] => {
      let subject = if subject.starts_with('{') {
        Subject::Variable(parse_var(subject)?)
      } else {
        Subject::Predicate(subject.to_string())
      };
      let argument = argument
        .parse::<usize>()
        .map_err(|_| malformed(format!("argument number `{}` in `{}`", argument, part)))?;
      Ok(SemanticPart::Dependency(CategoryDependency::new(
        subject,
        argument,
        parse_var(object)?,
      )))
    }
    _ => Err(malformed(format!(
      "`{}` is neither `var predicate` nor `subject argument var`",
      part
    ))),
  }
}

fn parse_category_semantics(
  syntax: HeadedSyntacticCategory,
  parts: &[String],
) -> Result<CcgCategory, CcgError> {
  let parts = parts
    .iter()
    .filter(|p| !p.is_empty())
    .collect::<Vec<_>>();
  if parts.is_empty() {
    return Ok(CcgCategory::from_syntax(syntax));
  }

  let variables = syntax.unique_variables();
  let mut assignments = vec![BTreeSet::new(); variables.len()];
  let mut dependencies = Vec::new();
  for part in parts {
    match parse_semantic_part(part)? {
      SemanticPart::Assignment(var, predicate) => {
        let slot = variables
          .iter()
          .position(|v| *v == var)
          .ok_or_else(|| CcgError::UndeclaredVariable {
            part: part.to_string(),
            variable: var,
            syntax: syntax.to_string(),
          })?;
        assignments[slot].insert(predicate);
      }
      SemanticPart::Dependency(dep) => dependencies.push(dep),
    }
  }

  CcgCategory::new(
    syntax,
    Some(CategorySemantics {
      dependencies,
      assignments,
    }),
  )
}

/// `word1 word2, syntax, part, part, ...`
pub fn parse_lexicon_entry(line: &str) -> Result<LexiconEntry, CcgError> {
  let fields = split_fields(line)?;
  if fields.len() < 2 {
    return Err(malformed(format!(
      "expected `words, syntax, ...` but got `{}`",
      line
    )));
  }

  let words = fields[0]
    .split_whitespace()
    .map(|w| w.to_string())
    .collect::<Vec<_>>();
  if words.is_empty() {
    return Err(malformed("lexicon entry has no words"));
  }

  let syntax = parse_headed_category(&fields[1])?;
  let category = parse_category_semantics(syntax, &fields[2..])?;
  Ok(LexiconEntry::new(words, category))
}

/// `input result` followed by optional `{subject} argument var` parts
pub fn parse_unary_rule(line: &str) -> Result<UnaryRule, CcgError> {
  let fields = split_fields(line)?;
  let categories = fields[0].split_whitespace().collect::<Vec<_>>();
  let [input, result] = categories[..] else {
    return Err(malformed(format!(
      "unary rule needs an input and a result category, got `{}`",
      fields[0]
    )));
  };
  let input = parse_headed_category(input)?;
  let result = parse_headed_category(result)?;

  let mut dependencies = Vec::new();
  for part in fields[1..].iter().filter(|p| !p.is_empty()) {
    match parse_semantic_part(part)? {
      SemanticPart::Dependency(dep) if matches!(dep.subject, Subject::Variable(_)) => {
        dependencies.push(dep)
      }
      _ => {
        return Err(malformed(format!(
          "unary rule part `{}` must be `{{subject}} argument var`",
          part
        )));
      }
    }
  }

  UnaryRule::new(input, result, dependencies)
}

/// Parses a tree label: a category, or `POST_PRE` for a node where a unary
/// rule rewrote PRE into POST. Returns the gold category and, when the
/// lexical category carries head variables, its canonical headed form.
fn parse_tree_label(label: &str) -> Result<(GoldCategory, Option<HeadedSyntacticCategory>), String> {
  let (post, pre) = match label.split_once('_') {
    Some((post, pre)) => (post, Some(pre)),
    None => (label, None),
  };
  let post = parse_complete(post).map_err(|e| e.to_string())?;
  let pre = pre
    .map(parse_complete)
    .transpose()
    .map_err(|e| e.to_string())?;

  let lexical = pre.as_ref().unwrap_or(&post);
  let headed = if lexical.has_heads() {
    Some(lexical.to_headed()?.canonical_form().0)
  } else {
    None
  };

  Ok((
    GoldCategory {
      syntax: post.to_syntax(),
      pre_unary: pre.map(|p| p.to_syntax()),
    },
    headed,
  ))
}

fn parse_tree_node<'a>(s: &'a str, next_word: &mut usize) -> ParseResult<'a, SyntaxTree> {
  regex_static!(TOKEN, r"[^\s<>]+");

  let (_, s) = needed_char('<', s)?;
  let s = skip_whitespace(s);
  let (label, s) = needed_re(&TOKEN, s).map_err(|e| format!("node label: {}", e))?;
  let (category, headed) = parse_tree_label(label)?;
  let s = skip_whitespace(s);

  let start = *next_word;
  if s.starts_with('<') {
    let (left, s) = parse_tree_node(s, next_word)?;
    let s = skip_whitespace(s);
    let (right, s) = parse_tree_node(s, next_word)?;
    let s = skip_whitespace(s);
    let (_, s) = needed_char('>', s).map_err(|e| format!("nonterminal {}: {}", label, e))?;
    let span = (start, *next_word - 1);
    return Ok((
      SyntaxTree::Branch(
        Constituent {
          value: category,
          span,
        },
        Box::new(left),
        Box::new(right),
      ),
      s,
    ));
  }

  let (pos, mut rem) = needed_re(&TOKEN, s).map_err(|e| format!("part of speech: {}", e))?;
  let mut words = Vec::new();
  loop {
    rem = skip_whitespace(rem);
    if let (Some(_), rest) = optional_char('>', rem) {
      rem = rest;
      break;
    }
    let (word, rest) = needed_re(&TOKEN, rem).map_err(|e| format!("terminal {}: {}", label, e))?;
    words.push(word.to_string());
    rem = rest;
  }
  if words.is_empty() {
    return Err(format!("terminal {} has no words", label));
  }

  *next_word += words.len();
  Ok((
    SyntaxTree::Leaf(
      Constituent {
        value: category,
        span: (start, *next_word - 1),
      },
      TreeWord {
        pos: pos.to_string(),
        words,
        headed,
      },
    ),
    rem,
  ))
}

/// Parses a bracketed tree such as `<N <(N/N) JJ red> <N NN block>>`. Spans
/// are inclusive word indices.
pub fn parse_syntax_tree(s: &str) -> Result<SyntaxTree, CcgError> {
  let input = s.trim();
  let error = |message: String| CcgError::MalformedTree {
    input: input.to_string(),
    message,
  };

  let mut next_word = 0;
  let (tree, rest) = parse_tree_node(input, &mut next_word).map_err(error)?;
  if !skip_whitespace(rest).is_empty() {
    return Err(error(format!("unexpected trailing input `{}`", rest)));
  }
  Ok(tree)
}
