//! The CKY driver: fills a chart bottom-up and decodes the root cell.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::category::semantics::Dependency;
use crate::chart::{Chart, ChartEntry, Child};
use crate::combinator::CombinatorSet;
use crate::config::ParserConfig;
use crate::error::{CcgError, Result};
use crate::filter::ChartFilter;
use crate::lexicon::{Lexicon, LexiconEntry};
use crate::parse::CcgParse;
use crate::rules::{self, UnaryRule};
use crate::scorer::Scorer;

/// A tokenized sentence, optionally with one POS tag per word
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sentence {
  words: Vec<String>,
  pos_tags: Option<Vec<String>>,
}

impl Sentence {
  pub fn new<I>(words: I) -> Self
  where
    I: IntoIterator,
    I::Item: Into<String>,
  {
    Self {
      words: words.into_iter().map(Into::into).collect(),
      pos_tags: None,
    }
  }

  pub fn with_pos_tags<I>(mut self, tags: I) -> Result<Self>
  where
    I: IntoIterator,
    I::Item: Into<String>,
  {
    let tags = tags.into_iter().map(Into::into).collect::<Vec<String>>();
    if tags.len() != self.words.len() {
      return Err(CcgError::TagCountMismatch {
        words: self.words.len(),
        tags: tags.len(),
      });
    }
    self.pos_tags = Some(tags);
    Ok(self)
  }

  pub fn words(&self) -> &[String] {
    &self.words
  }

  pub fn pos_tags(&self) -> Option<&[String]> {
    self.pos_tags.as_deref()
  }

  pub fn pos(&self, idx: usize) -> Option<&str> {
    self
      .pos_tags
      .as_ref()
      .and_then(|tags| tags.get(idx))
      .map(|t| t.as_str())
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }
}

impl From<&str> for Sentence {
  /// Splits on whitespace
  fn from(s: &str) -> Self {
    Self::new(s.split_whitespace())
  }
}

fn dependency_weight<S: Scorer + ?Sized>(scorer: &S, filled: &[Dependency]) -> f64 {
  filled
    .iter()
    .map(|d| scorer.dependency_weight(d))
    .product()
}

#[derive(Debug, Clone)]
pub struct CcgParser {
  lexicon: Lexicon,
  unary_rules: Vec<Rc<UnaryRule>>,
  config: ParserConfig,
  combinators: CombinatorSet,
}

impl CcgParser {
  pub fn new(lexicon: Lexicon, unary_rules: Vec<UnaryRule>, config: ParserConfig) -> Self {
    let combinators = CombinatorSet::new(config.composition, config.features);
    Self {
      lexicon,
      unary_rules: unary_rules.into_iter().map(Rc::new).collect(),
      config,
      combinators,
    }
  }

  /// Builds a parser from the text of a lexicon and of a unary rule file
  pub fn from_grammar(lexicon: &str, unary_rules: &str, config: ParserConfig) -> Result<Self> {
    let lexicon: Lexicon = lexicon.parse()?;
    let unary_rules = rules::parse_unary_rules(unary_rules)?;
    debug!(
      "loaded grammar with {} lexicon entries and {} unary rules",
      lexicon.len(),
      unary_rules.len()
    );
    Ok(Self::new(lexicon, unary_rules, config))
  }

  pub fn lexicon(&self) -> &Lexicon {
    &self.lexicon
  }

  pub fn unary_rules(&self) -> &[Rc<UnaryRule>] {
    &self.unary_rules
  }

  pub fn config(&self) -> &ParserConfig {
    &self.config
  }

  /// Fills a chart for `sentence`. Every insertion goes through `filter`.
  pub fn parse_chart<'f, S: Scorer + ?Sized>(
    &self,
    sentence: &Sentence,
    scorer: &S,
    filter: Option<&'f dyn ChartFilter>,
  ) -> Chart<'f> {
    let n = sentence.len();
    let mut chart = Chart::new(n, self.config.inference, filter);

    for idx in self.add_terminals(&mut chart, sentence, scorer) {
      warn!("no lexicon entry covers `{}` at {}", sentence.words()[idx], idx);
    }

    for length in 1..=n {
      for start in 0..=(n - length) {
        let end = start + length - 1;
        for split in start..end {
          self.add_binary(&mut chart, scorer, start, split, end);
        }
        self.add_unary(&mut chart, scorer, start, end);
        chart.done_adding(start, end);
        trace!(
          "span {}..{}: {} entries",
          start,
          end,
          chart.num_entries(start, end)
        );
      }
    }

    debug!(
      "filled chart for {} words with {} entries, {} in the root cell",
      n,
      chart.total_entries(),
      if n > 0 { chart.num_entries(0, n - 1) } else { 0 }
    );
    chart
  }

  /// Adds every lexical entry, with POS backoff for single unknown tokens.
  /// Returns the indices of words no entry covers.
  fn add_terminals<S: Scorer + ?Sized>(
    &self,
    chart: &mut Chart<'_>,
    sentence: &Sentence,
    scorer: &S,
  ) -> Vec<usize> {
    let words = sentence.words();
    let longest = self.lexicon.longest_entry();
    let mut covered = vec![false; words.len()];

    for start in 0..words.len() {
      for end in start..words.len().min(start + longest) {
        let entries = self.lexicon.entries_for(&words[start..=end]);
        if !entries.is_empty() {
          covered[start..=end].fill(true);
        }
        for entry in entries {
          self.add_terminal(chart, sentence, scorer, entry, (start, end));
        }
      }

      if self.lexicon.entries_for(&words[start..=start]).is_empty() {
        let backoff = sentence
          .pos(start)
          .map(|pos| {
            self
              .lexicon
              .unknown_word_entries(pos, &self.config.unknown_word_prefix)
          })
          .unwrap_or(&[]);
        if !backoff.is_empty() {
          covered[start] = true;
        }
        for entry in backoff {
          self.add_terminal(chart, sentence, scorer, entry, (start, start));
        }
      }
    }

    covered
      .iter()
      .enumerate()
      .filter(|(_, c)| !**c)
      .map(|(i, _)| i)
      .collect()
  }

  fn add_terminal<S: Scorer + ?Sized>(
    &self,
    chart: &mut Chart<'_>,
    sentence: &Sentence,
    scorer: &S,
    entry: &Rc<LexiconEntry>,
    (start, end): (usize, usize),
  ) {
    let combination = entry.category().to_sign(end);
    let probability = scorer.lexical_weight(sentence, start, end, entry)
      * dependency_weight(scorer, &combination.filled);
    let words = sentence.words()[start..=end].to_vec();
    let chart_entry = ChartEntry::terminal(entry.clone(), words, combination, (start, end));
    chart.add_entry(chart_entry, probability, start, end);
  }

  fn add_binary<S: Scorer + ?Sized>(
    &self,
    chart: &mut Chart<'_>,
    scorer: &S,
    start: usize,
    split: usize,
    end: usize,
  ) {
    let lefts = chart.snapshot(start, split);
    let rights = chart.snapshot(split + 1, end);

    for (left, left_prob) in lefts.iter() {
      for (right, right_prob) in rights.iter() {
        for (combinator, combination) in self.combinators.combine(left.sign(), right.sign()) {
          let probability = left_prob
            * right_prob
            * scorer.binary_weight(combinator, left, right, &combination.sign)
            * dependency_weight(scorer, &combination.filled);
          let entry = ChartEntry::nonterminal(
            combinator,
            split,
            Child {
              entry: left.clone(),
              probability: *left_prob,
            },
            Child {
              entry: right.clone(),
              probability: *right_prob,
            },
            combination,
            (start, end),
          );
          chart.add_entry(entry, probability, start, end);
        }
      }
    }
  }

  /// Applies every unary rule once to the entries of a cell that didn't come
  /// from a unary rule themselves
  fn add_unary<S: Scorer + ?Sized>(&self, chart: &mut Chart<'_>, scorer: &S, start: usize, end: usize) {
    if self.unary_rules.is_empty() {
      return;
    }

    for (entry, entry_prob) in chart.snapshot(start, end) {
      if entry.unary().is_some() {
        continue;
      }
      for rule in self.unary_rules.iter() {
        let Some(combination) = rule.apply(entry.sign(), self.config.features) else {
          continue;
        };
        let probability = entry_prob
          * scorer.unary_weight(rule, &entry)
          * dependency_weight(scorer, &combination.filled);
        let rewritten = entry.with_unary(rule.clone(), combination);
        chart.add_entry(rewritten, probability, start, end);
      }
    }
  }

  /// Root analyses of `sentence`, most probable first
  pub fn parse<S: Scorer + ?Sized>(
    &self,
    sentence: &Sentence,
    scorer: &S,
    filter: Option<&dyn ChartFilter>,
  ) -> Vec<CcgParse> {
    if sentence.is_empty() {
      return Vec::new();
    }

    let chart = self.parse_chart(sentence, scorer, filter);
    let mut parses = chart
      .ranked(0, sentence.len() - 1)
      .into_iter()
      .map(|(entry, probability)| CcgParse::new(entry, probability))
      .collect::<Vec<_>>();

    if let Some(max) = self.config.max_parses {
      parses.truncate(max);
    }
    debug!("{} parse(s) for `{}`", parses.len(), sentence.words().join(" "));
    parses
  }

  pub fn best_parse<S: Scorer + ?Sized>(
    &self,
    sentence: &Sentence,
    scorer: &S,
    filter: Option<&dyn ChartFilter>,
  ) -> Option<CcgParse> {
    self.parse(sentence, scorer, filter).into_iter().next()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::category::headed::HeadedSyntacticCategory;
  use crate::category::semantics::IndexedPredicate;
  use crate::combinator::Combinator;
  use crate::filter::{SupertagChartFilter, SyntacticChartFilter};
  use crate::scorer::{TableScorer, UniformScorer};
  use crate::syntree::SyntaxTree;

  const LEXICON: &str = r"
    red, (N{1}/N{1}){0}, 0 pred:red, pred:red 1 1
    block, N{0}, 0 pred:block
    green, N{0}, 0 pred:green
    green, (N{1}/N{1}){0}, 0 pred:green, pred:green 1 1
    big, (N{1}/N{1}){0}, 0 pred:big, pred:big 1 1
    New York, N{0}, 0 pred:new_york
    unk-jj, (N{1}/N{1}){0}, 0 pred:unk-jj, pred:unk-jj 1 1
  ";

  const RULES: &str = r"
    // type raising
    N{0} (S{1}/(S{1}\N{0}){1}){1}
  ";

  const BLOCKS_LEXICON: &str = include_str!("../benches/blocks.lex");
  const BLOCKS_RULES: &str = include_str!("../benches/blocks.rules");

  fn parser(config: ParserConfig) -> CcgParser {
    CcgParser::from_grammar(LEXICON, "", config).unwrap()
  }

  fn blocks_parser(config: ParserConfig) -> CcgParser {
    CcgParser::from_grammar(BLOCKS_LEXICON, BLOCKS_RULES, config).unwrap()
  }

  fn terminals(parse: &CcgParse) -> Vec<&CcgParse> {
    match (parse.left(), parse.right()) {
      (Some(left), Some(right)) => {
        let mut leaves = terminals(left);
        leaves.extend(terminals(right));
        leaves
      }
      _ => vec![parse],
    }
  }

  fn dep(subject: &str, subject_idx: usize, argument: usize, object: &str, object_idx: usize) -> Dependency {
    Dependency::new(
      IndexedPredicate::new(subject, subject_idx),
      argument,
      IndexedPredicate::new(object, object_idx),
    )
  }

  #[test]
  fn test_sentence() {
    let sentence = Sentence::from("  the  red block ");
    assert_eq!(sentence.words(), &["the", "red", "block"]);
    assert_eq!(sentence.pos(0), None);

    let tagged = sentence.clone().with_pos_tags(["DT", "JJ", "NN"]).unwrap();
    assert_eq!(tagged.pos(1), Some("JJ"));
    assert!(matches!(
      sentence.with_pos_tags(["DT"]),
      Err(CcgError::TagCountMismatch { words: 3, tags: 1 })
    ));
  }

  #[test]
  fn test_red_block() {
    let parser = parser(ParserConfig::default());
    let parses = parser.parse(&Sentence::from("red block"), &UniformScorer, None);

    assert_eq!(parses.len(), 1);
    let parse = &parses[0];
    assert_eq!(parse.syntax(), &"N{0}".parse::<HeadedSyntacticCategory>().unwrap());
    assert_eq!(parse.span(), (0, 1));
    assert_eq!(parse.combinator(), Some(Combinator::ForwardApplication));
    assert_eq!(parse.dependencies(), vec![dep("pred:red", 0, 1, "pred:block", 1)]);
    assert!(parse.unfilled_dependencies().is_empty());
    assert_eq!(parse.semantic_heads(), &[IndexedPredicate::new("pred:block", 1)]);
    assert_eq!(parse.probability(), 1.0);
    assert_eq!(parse.to_string(), "<N <(N/N) red> <N block>>");
  }

  #[test]
  fn test_green_block_senses() {
    let parser = parser(ParserConfig::default());
    let chart = parser.parse_chart(&Sentence::from("green block"), &UniformScorer, None);
    assert_eq!(chart.num_entries(0, 0), 2);

    // only the adjective sense combines
    let parses = parser.parse(&Sentence::from("green block"), &UniformScorer, None);
    assert_eq!(parses.len(), 1);
    assert_eq!(
      parses[0].dependencies(),
      vec![dep("pred:green", 0, 1, "pred:block", 1)]
    );

    let parses = parser.parse(&Sentence::from("green"), &UniformScorer, None);
    assert_eq!(parses.len(), 2);
    assert!(parses.iter().all(|p| p.dependencies().is_empty()));
  }

  #[test]
  fn test_stacked_modifiers() {
    let parser = parser(ParserConfig::default());
    let parses = parser.parse(&Sentence::from("big red block"), &UniformScorer, None);

    // without composition the modifiers can't combine with each other
    assert_eq!(parses.len(), 1);
    assert_eq!(
      parses[0].dependencies(),
      vec![
        dep("pred:big", 0, 1, "pred:block", 2),
        dep("pred:red", 1, 1, "pred:block", 2),
      ]
    );
  }

  #[test]
  fn test_type_raising_doubles_root_analyses() {
    let without = parser(ParserConfig::default());
    let with = CcgParser::from_grammar(LEXICON, RULES, ParserConfig::default()).unwrap();
    assert_eq!(with.unary_rules().len(), 1);

    let sentence = Sentence::from("red block");
    let plain = without.parse(&sentence, &UniformScorer, None);
    let raised = with.parse(&sentence, &UniformScorer, None);
    assert_eq!(raised.len(), 2 * plain.len());
    assert_eq!(raised.iter().filter(|p| p.unary_rule().is_some()).count(), plain.len());

    let raised_parse = raised.iter().find(|p| p.unary_rule().is_some()).unwrap();
    assert_eq!(raised_parse.to_string(), "<(S/(S\\N))_N <(N/N) red> <N block>>");
  }

  #[test]
  fn test_supertag_filter_restricts_terminals() {
    let parser = parser(ParserConfig::default());
    let filter = SupertagChartFilter::new(vec![vec!["N{0}".parse().unwrap()], vec![]]);
    let chart = parser.parse_chart(&Sentence::from("green block"), &UniformScorer, Some(&filter));

    assert_eq!(chart.num_entries(0, 0), 1);
    assert!(chart.entries(0, 0)[0].syntax().is_atomic());
    assert_eq!(chart.num_entries(0, 1), 0);
  }

  #[test]
  fn test_unknown_words() {
    let parser = parser(ParserConfig::default());
    assert!(parser
      .parse(&Sentence::from("shiny block"), &UniformScorer, None)
      .is_empty());

    let tagged = Sentence::from("shiny block")
      .with_pos_tags(["JJ", "NN"])
      .unwrap();
    let parses = parser.parse(&tagged, &UniformScorer, None);
    assert_eq!(parses.len(), 1);
    assert_eq!(
      parses[0].dependencies(),
      vec![dep("pred:unk-jj", 0, 1, "pred:block", 1)]
    );
    assert_eq!(parses[0].to_string(), "<N <(N/N) shiny> <N block>>");
  }

  #[test]
  fn test_coverage_is_per_word() {
    let parser = parser(ParserConfig::default());
    let uncovered = |sentence: &Sentence| {
      let mut chart = Chart::new(sentence.len(), parser.config().inference, None);
      parser.add_terminals(&mut chart, sentence, &UniformScorer)
    };

    // `York` only appears inside the two-word entry
    assert!(uncovered(&Sentence::from("big New York")).is_empty());
    assert_eq!(uncovered(&Sentence::from("shiny block")), vec![0]);
    assert_eq!(uncovered(&Sentence::from("York block New")), vec![0, 2]);

    let tagged = Sentence::from("shiny block")
      .with_pos_tags(["JJ", "NN"])
      .unwrap();
    assert!(uncovered(&tagged).is_empty());
  }

  #[test]
  fn test_empty_sentence() {
    let parser = parser(ParserConfig::default());
    let sentence = Sentence::new(Vec::<String>::new());
    assert!(parser.parse(&sentence, &UniformScorer, None).is_empty());
    assert!(parser.best_parse(&sentence, &UniformScorer, None).is_none());
    assert!(parser.parse_chart(&sentence, &UniformScorer, None).is_empty());
  }

  #[test]
  fn test_multi_word_entries() {
    let parser = parser(ParserConfig::default());
    let parses = parser.parse(&Sentence::from("big New York"), &UniformScorer, None);
    assert_eq!(parses.len(), 1);

    let right = parses[0].right().unwrap();
    assert!(right.is_terminal());
    assert_eq!(right.words(), vec!["New", "York"]);
    assert_eq!(right.span(), (1, 2));
    // predicates are indexed by the last word of the entry
    assert_eq!(
      parses[0].dependencies(),
      vec![dep("pred:big", 0, 1, "pred:new_york", 2)]
    );
  }

  #[test]
  fn test_scores_rank_parses() {
    let parser = parser(ParserConfig::default());
    let scorer = TableScorer::new()
      .with_lexical(&["green"], "N{0}".parse().unwrap(), 0.25)
      .with_lexical(&["green"], r"(N{1}/N{1}){0}".parse().unwrap(), 0.5);

    let parses = parser.parse(&Sentence::from("green"), &scorer, None);
    assert_eq!(parses.len(), 2);
    assert_eq!(parses[0].probability(), 0.5);
    assert_eq!(parses[1].probability(), 0.25);

    let scorer = scorer.with_dependency("pred:green", 1, "pred:block", 0.5);
    let best = parser
      .best_parse(&Sentence::from("green block"), &scorer, None)
      .unwrap();
    assert_eq!(best.probability(), 0.25);
  }

  #[test]
  fn test_beam() {
    let sentence = Sentence::from("big green red block");
    let scorer = TableScorer::new().with_lexical(&["green"], "N{0}".parse().unwrap(), 0.5);
    let exact = parser(ParserConfig::default());
    let wide = parser(ParserConfig::default().with_beam(1000));
    let narrow = parser(ParserConfig::default().with_beam(1));

    let exact_parses = exact.parse(&sentence, &scorer, None);
    let wide_parses = wide.parse(&sentence, &scorer, None);
    assert_eq!(exact_parses.len(), wide_parses.len());
    for (a, b) in exact_parses.iter().zip(wide_parses.iter()) {
      assert_eq!(a.probability(), b.probability());
      assert_eq!(a.dependencies(), b.dependencies());
    }

    let chart = narrow.parse_chart(&sentence, &scorer, None);
    for start in 0..sentence.len() {
      for end in start..sentence.len() {
        assert!(chart.num_entries(start, end) <= 1);
      }
    }
  }

  #[test]
  fn test_beam_is_monotone() {
    let sentence = Sentence::from("the big green block is on the red block");
    let noun_phrase = rules::parse_unary_rules(BLOCKS_RULES).unwrap().remove(0);
    // the noun reading of `green` outscores the adjective, which the only
    // full parse needs
    let scorer = TableScorer::new()
      .with_lexical(&["green"], "N{0}".parse().unwrap(), 0.9)
      .with_lexical(&["green"], r"(N{1}/N{1}){0}".parse().unwrap(), 0.2)
      .with_unary(noun_phrase, 0.1);

    let exact = blocks_parser(ParserConfig::default());
    let exact_best = exact
      .best_parse(&sentence, &scorer, None)
      .map(|p| p.probability());
    assert_eq!(exact_best, Some(0.2));

    let chart = exact.parse_chart(&sentence, &scorer, None);
    let widest = (0..sentence.len())
      .flat_map(|start| (start..sentence.len()).map(move |end| (start, end)))
      .map(|(start, end)| chart.num_entries(start, end))
      .max()
      .unwrap();
    assert_eq!(widest, 3);

    let bests = (1..=widest + 2)
      .map(|size| {
        blocks_parser(ParserConfig::default().with_beam(size))
          .best_parse(&sentence, &scorer, None)
          .map(|p| p.probability())
      })
      .collect::<Vec<_>>();

    assert_eq!(bests[0], None);
    for pair in bests.windows(2) {
      assert!(pair[0].unwrap_or(0.0) <= pair[1].unwrap_or(0.0), "{:?}", bests);
    }
    assert!(bests.iter().all(|b| b.unwrap_or(0.0) <= 0.2));
    assert_eq!(bests[widest - 1], exact_best);
    assert_eq!(bests.last().copied().flatten(), exact_best);
  }

  #[test]
  fn test_dependencies_are_conserved() {
    let parser = blocks_parser(ParserConfig::default());
    for text in [
      "the big green block is on the red block",
      "the big green block is on the red block on a green table",
      "a block is green",
    ] {
      let parses = parser.parse(&Sentence::from(text), &UniformScorer, None);
      assert!(!parses.is_empty(), "no parse for {:?}", text);

      for parse in parses {
        let lexical = terminals(&parse)
          .iter()
          .filter_map(|t| t.lexicon_entry())
          .map(|e| e.category().dependencies().len())
          .sum::<usize>();
        let filled = parse.dependencies();
        let unfilled = parse.unfilled_dependencies();
        assert_eq!(lexical, filled.len() + unfilled.len(), "{}", parse);

        let mut distinct = filled.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), filled.len(), "{}", parse);
      }
    }

    let parse = parser
      .best_parse(&Sentence::from("the red block"), &UniformScorer, None)
      .unwrap();
    assert_eq!(
      parse.dependencies(),
      vec![dep("the", 0, 1, "block", 2), dep("red", 1, 1, "block", 2)]
    );
  }

  #[test]
  fn test_syntactic_filter() {
    let parser = parser(ParserConfig::default());
    let sentence = Sentence::from("big red block");

    let tree: SyntaxTree = "<N <(N/N) JJ big> <N <(N/N) JJ red> <N NN block>>>".parse().unwrap();
    let filter = SyntacticChartFilter::new(&tree);
    let parses = parser.parse(&sentence, &UniformScorer, Some(&filter));
    assert_eq!(parses.len(), 1);
    assert_eq!(parses[0].left().unwrap().span(), (0, 0));

    let tree: SyntaxTree = "<N <(N/N) <(N/N) JJ big> <N JJ red>> <N NN block>>".parse().unwrap();
    let filter = SyntacticChartFilter::new(&tree);
    assert!(parser.parse(&sentence, &UniformScorer, Some(&filter)).is_empty());
  }

  #[test]
  fn test_composition() {
    let sentence = Sentence::from("big red");
    let without = parser(ParserConfig::default());
    let with = parser(ParserConfig::default().with_composition(true));

    assert!(without.parse(&sentence, &UniformScorer, None).is_empty());
    let parses = with.parse(&sentence, &UniformScorer, None);
    assert_eq!(parses.len(), 1);
    assert_eq!(parses[0].combinator(), Some(Combinator::ForwardComposition));
    assert_eq!(parses[0].syntax().syntax().to_string(), "(N/N)");
  }

  #[test]
  fn test_max_parses() {
    let parser = parser(ParserConfig::default().with_max_parses(1));
    assert_eq!(
      parser.parse(&Sentence::from("green"), &UniformScorer, None).len(),
      1
    );
  }
}
