use std::collections::HashSet;
use std::env;
use std::error::Error;
use std::fs;
use std::io;
use std::io::Write;
use std::process;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ccgchart::{CcgParser, Lexicon, ParserConfig, Sentence, UniformScorer};

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} LEXICON [options]

Each input line is a sentence. Tokens may be tagged as word/POS, in which case
unknown words back off to the lexicon's UNK-<POS> entries.

Options:
  -h, --help          Print this message
  -r, --rules FILE    Read unary rules from FILE
  -b, --beam SIZE     Keep at most SIZE entries per chart cell (defaults to exact)
  -n, --max N         Print at most N parses
  -B, --composition   Allow harmonic composition
  -c, --chart         Print the parse chart (defaults to not printing)",
    prog_name
  )
}

/// Splits `word/POS` tokens. Either every token is tagged or none is.
fn read_sentence(line: &str) -> Result<Sentence, Box<dyn Error>> {
  let tokens = line.split_whitespace().collect::<Vec<_>>();
  let tagged = tokens
    .iter()
    .filter_map(|t| t.rsplit_once('/'))
    .collect::<Vec<_>>();

  if !tokens.is_empty() && tagged.len() == tokens.len() {
    let sentence = Sentence::new(tagged.iter().map(|(w, _)| *w));
    Ok(sentence.with_pos_tags(tagged.iter().map(|(_, pos)| *pos))?)
  } else {
    Ok(Sentence::new(tokens))
  }
}

fn parse(parser: &CcgParser, line: &str, print_chart: bool) -> Result<(), Box<dyn Error>> {
  let sentence = read_sentence(line)?;

  if print_chart {
    let chart = parser.parse_chart(&sentence, &UniformScorer, None);
    println!("chart:\n{}", chart);
  }

  let parses = parser.parse(&sentence, &UniformScorer, None);
  debug!("{} parses for {} words", parses.len(), sentence.len());

  println!(
    "Parsed {} tree{}",
    parses.len(),
    if parses.len() == 1 { "" } else { "s" }
  );

  for parse in parses {
    println!("{} ({:.4})", parse, parse.probability());
    for dep in parse.dependencies() {
      println!("  {}", dep);
    }
    for dep in parse.unfilled_dependencies() {
      println!("  unfilled: {}", dep);
    }
    println!();
  }

  Ok(())
}

struct Args {
  lexicon: String,
  rules: Option<String>,
  print_chart: bool,
  config: ParserConfig,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    if v.is_empty() {
      return Err(Self::make_error_message("bad argument vector", "cli"));
    }

    let args_len = v.len();
    let mut iter = v.into_iter();
    let prog_name = iter.next().unwrap_or_default();

    if args_len < 2 {
      return Err(Self::make_error_message("not enough arguments", prog_name));
    }

    let mut lexicon: Option<String> = None;
    let mut rules: Option<String> = None;
    let mut print_chart = false;
    let mut config = ParserConfig::default();

    while let Some(o) = iter.next() {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-c" || o == "--chart" {
        print_chart = true;
      } else if o == "-B" || o == "--composition" {
        config = config.with_composition(true);
      } else if o == "-r" || o == "--rules" {
        match iter.next() {
          Some(file) => rules = Some(file),
          None => return Err(Self::make_error_message("missing rules file", prog_name)),
        }
      } else if o == "-b" || o == "--beam" || o == "-n" || o == "--max" {
        let Some(size) = iter.next().and_then(|s| s.parse::<usize>().ok()) else {
          return Err(Self::make_error_message(
            &format!("{} needs a number", o),
            prog_name,
          ));
        };
        config = if o == "-b" || o == "--beam" {
          config.with_beam(size)
        } else {
          config.with_max_parses(size)
        };
      } else if lexicon.is_none() {
        lexicon = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    if let Some(lexicon) = lexicon {
      Ok(Self {
        lexicon,
        rules,
        print_chart,
        config,
      })
    } else {
      Err(Self::make_error_message("missing lexicon file", prog_name))
    }
  }
}

fn main() -> Result<(), Box<dyn Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let lexicon = Lexicon::read_from_file(&opts.lexicon)?;
  let rules = match &opts.rules {
    Some(path) => {
      let rules = ccgchart::rules::parse_unary_rules(&fs::read_to_string(path)?)?;
      debug!("read {} unary rules from {}", rules.len(), path);
      rules
    }
    None => Vec::new(),
  };
  info!(
    "loaded {} lexicon entries ({} distinct words) and {} unary rules",
    lexicon.len(),
    lexicon
      .iter()
      .flat_map(|entry| entry.words())
      .collect::<HashSet<_>>()
      .len(),
    rules.len()
  );
  let parser = CcgParser::new(lexicon, rules, opts.config);

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        parse(&parser, input.trim(), opts.print_chart)?;
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
