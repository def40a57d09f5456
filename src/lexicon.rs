use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

use tracing::debug;

use crate::category::CcgCategory;
use crate::error::CcgError;
use crate::parse_grammar;

/// Prefix of the pseudo-words that stand in for unknown words of a given part
/// of speech, e.g. `UNK-JJ`. Lookups are lowercased, so the lexicon may spell
/// it `unk-jj`.
pub const UNKNOWN_WORD_PREFIX: &str = "UNK-";

/// A word sequence paired with one of its categories
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LexiconEntry {
  words: Vec<String>,
  category: CcgCategory,
}

impl LexiconEntry {
  pub fn new(words: Vec<String>, category: CcgCategory) -> Self {
    Self { words, category }
  }

  pub fn words(&self) -> &[String] {
    &self.words
  }

  pub fn category(&self) -> &CcgCategory {
    &self.category
  }
}

impl fmt::Display for LexiconEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} := {}", self.words.join(" "), self.category.syntax())
  }
}

impl FromStr for LexiconEntry {
  type Err = CcgError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_grammar::parse_lexicon_entry(s)
  }
}

fn lookup_key<S: AsRef<str>>(words: &[S]) -> Vec<String> {
  words.iter().map(|w| w.as_ref().to_lowercase()).collect()
}

/// Lexicon entries keyed by lowercased word sequence
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
  entries: HashMap<Vec<String>, Vec<Rc<LexiconEntry>>>,
  longest: usize,
  len: usize,
}

impl Lexicon {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, entry: LexiconEntry) {
    let key = lookup_key(entry.words());
    self.longest = self.longest.max(key.len());
    self.len += 1;
    self.entries.entry(key).or_default().push(Rc::new(entry));
  }

  /// Entries spelled exactly `words`, ignoring case
  pub fn entries_for<S: AsRef<str>>(&self, words: &[S]) -> &[Rc<LexiconEntry>] {
    self
      .entries
      .get(&lookup_key(words))
      .map(|e| &e[..])
      .unwrap_or(&[])
  }

  /// Entries for the pseudo-word `prefix` + `pos`
  pub fn unknown_word_entries(&self, pos: &str, prefix: &str) -> &[Rc<LexiconEntry>] {
    self.entries_for(&[format!("{}{}", prefix, pos)])
  }

  /// Length of the longest word sequence with an entry
  pub fn longest_entry(&self) -> usize {
    self.longest
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Every entry, in no particular order
  pub fn iter(&self) -> impl Iterator<Item = &Rc<LexiconEntry>> {
    self.entries.values().flatten()
  }

  pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CcgError> {
    let lexicon: Self = fs::read_to_string(path.as_ref())?.parse()?;
    debug!(
      "read {} lexicon entries from {}",
      lexicon.len(),
      path.as_ref().display()
    );
    Ok(lexicon)
  }
}

impl FromIterator<LexiconEntry> for Lexicon {
  fn from_iter<I: IntoIterator<Item = LexiconEntry>>(iter: I) -> Self {
    let mut lexicon = Self::new();
    for entry in iter {
      lexicon.add(entry);
    }
    lexicon
  }
}

impl FromStr for Lexicon {
  type Err = CcgError;

  /// One entry per line; blank lines and lines starting with `//` are skipped.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.lines()
      .enumerate()
      .map(|(idx, line)| (idx + 1, line.trim()))
      .filter(|(_, line)| !line.is_empty() && !line.starts_with("//"))
      .map(|(line_number, line)| {
        parse_grammar::parse_lexicon_entry(line).map_err(|e| e.at_line(line_number))
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const LEXICON: &str = r"
    // nouns
    block, N{0}, 0 pred:block
    green, N{0}, 0 pred:green
    green, (N{1}/N{1}){0}, 0 pred:green, pred:green 1 1
    New York, N{0}, 0 pred:new_york
    unk-jj, (N{1}/N{1}){0}, 0 pred:unk-jj, pred:unk-jj 1 1
  ";

  #[test]
  fn test_lookup() {
    let lexicon: Lexicon = LEXICON.parse().unwrap();
    assert_eq!(lexicon.len(), 5);
    assert_eq!(lexicon.longest_entry(), 2);
    assert_eq!(lexicon.entries_for(&["green"]).len(), 2);
    assert_eq!(lexicon.entries_for(&["Block"]).len(), 1);
    assert_eq!(lexicon.entries_for(&["new", "york"]).len(), 1);
    assert!(lexicon.entries_for(&["york"]).is_empty());
    assert_eq!(
      lexicon.unknown_word_entries("JJ", UNKNOWN_WORD_PREFIX).len(),
      1
    );
    assert!(lexicon
      .unknown_word_entries("NN", UNKNOWN_WORD_PREFIX)
      .is_empty());
  }

  #[test]
  fn test_iter() {
    let lexicon: Lexicon = LEXICON.parse().unwrap();
    assert_eq!(lexicon.iter().count(), lexicon.len());

    let mut spellings = lexicon
      .iter()
      .map(|e| e.words().join(" "))
      .collect::<Vec<_>>();
    spellings.sort();
    assert_eq!(
      spellings,
      vec!["New York", "block", "green", "green", "unk-jj"]
    );
    assert!(Lexicon::new().iter().next().is_none());
  }

  #[test]
  fn test_display() {
    let lexicon: Lexicon = LEXICON.parse().unwrap();
    let entry = &lexicon.entries_for(&["new", "york"])[0];
    assert_eq!(entry.to_string(), "New York := N{0}");
  }

  #[test]
  fn test_errors_carry_line_numbers() {
    let err = "block, N{0}, 0 pred:block\n\nred, (N/N){0}"
      .parse::<Lexicon>()
      .unwrap_err();
    assert!(matches!(err, CcgError::MalformedGrammar { line: 3, .. }));
  }
}
