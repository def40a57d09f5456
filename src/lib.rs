//! A chart parser for Combinatory Categorial Grammar.
//!
//! Lexical categories carry head variables and semantic dependencies; as the
//! chart is filled bottom-up, combinators unify categories and fill the
//! dependencies whose arguments become known. Parses come out ranked by the
//! weights of a [`Scorer`].
//!
//! ```
//! use ccgchart::{CcgParser, ParserConfig, Sentence, UniformScorer};
//!
//! let parser = CcgParser::from_grammar(
//!   r"
//!     red, (N{1}/N{1}){0}, 0 red, red 1 1
//!     block, N{0}, 0 block
//!   ",
//!   "",
//!   ParserConfig::default(),
//! )
//! .unwrap();
//!
//! let parses = parser.parse(&Sentence::from("red block"), &UniformScorer, None);
//! assert_eq!(parses.len(), 1);
//! assert_eq!(parses[0].dependencies()[0].to_string(), "(red@0, 1, block@1)");
//! ```

#[macro_use]
extern crate lazy_static;

pub mod category;
pub mod chart;
pub mod combinator;
pub mod config;
pub mod error;
pub mod filter;
pub mod lexicon;
pub mod parse;
pub mod parse_grammar;
pub mod parser;
pub mod rules;
pub mod scorer;
pub mod syntree;

pub use crate::category::{CcgCategory, Dependency, HeadedSyntacticCategory, InducedForm, SyntacticCategory};
pub use crate::chart::{Chart, ChartEntry, Inference};
pub use crate::config::ParserConfig;
pub use crate::error::{CcgError, Result};
pub use crate::filter::{ChartFilter, ConjunctionFilter, SupertagChartFilter, SyntacticChartFilter};
pub use crate::lexicon::{Lexicon, LexiconEntry};
pub use crate::parse::CcgParse;
pub use crate::parser::{CcgParser, Sentence};
pub use crate::rules::UnaryRule;
pub use crate::scorer::{Scorer, TableScorer, UniformScorer};
pub use crate::syntree::SyntaxTree;
