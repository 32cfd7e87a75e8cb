//! Interactive explorer.
//!
//! By default lines are read with `rustyline` (history, line editing); a
//! plain stdin reader is used when built without `repl-rustyline`.

use anyhow::{anyhow, Result};
use colored::Colorize;
use walsgraph_geo::GeoResolver;
use walsgraph_query::families::family_search_label;
use walsgraph_query::{
    render, QueryConfig, QueryExecutor, QueryResolver, QueryResult, ResolvedQuery,
};
use walsgraph_storage::GraphStore;

/// Questions shown by the `examples` command.
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "Which languages are spoken in Spain?",
    "languages in Papunesia",
    "Show me Romance languages",
    "lenguas de la familia indoeuropeo",
    "How many languages are there?",
    "SELECT macroarea, COUNT(*) FROM Language GROUP BY macroarea",
    "sql: SELECT id, iso_code FROM Language WHERE country_id = 'PE' LIMIT 10",
];

const MENU: &str = "\
  1) Statistics
  2) Languages by country or region
  3) Languages by family
  4) Raw query
  5) Exit
Anything else is read as a question. `menu` shows this again, `examples` lists sample questions.";

/// Where explorer input comes from.
pub trait LineSource {
    /// `Ok(None)` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

#[cfg(feature = "repl-rustyline")]
pub struct RustylineSource {
    editor: rustyline::DefaultEditor,
}

#[cfg(feature = "repl-rustyline")]
impl RustylineSource {
    pub fn new() -> Result<Self> {
        let editor =
            rustyline::DefaultEditor::new().map_err(|e| anyhow!("failed to init rustyline: {e}"))?;
        Ok(Self { editor })
    }
}

#[cfg(feature = "repl-rustyline")]
impl LineSource for RustylineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        use rustyline::error::ReadlineError;
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        self.editor
                            .add_history_entry(line.as_str())
                            .map_err(|e| anyhow!("failed to record history: {e}"))?;
                    }
                    return Ok(Some(line));
                }
                Err(ReadlineError::Eof) => return Ok(None),
                Err(ReadlineError::Interrupted) => continue,
                Err(e) => return Err(anyhow!("readline error: {e}")),
            }
        }
    }
}

/// Line reader over any `BufRead`: piped input, builds without rustyline, tests.
pub struct PlainSource<R> {
    input: R,
    echo: bool,
}

impl<R: std::io::BufRead> PlainSource<R> {
    pub fn new(input: R, echo: bool) -> Self {
        Self { input, echo }
    }
}

impl<R: std::io::BufRead> LineSource for PlainSource<R> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        use std::io::Write;
        if self.echo {
            print!("{prompt}");
            std::io::stdout().flush()?;
        }
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Line editor on a terminal, plain line reads when stdin is piped.
pub fn default_source() -> Result<Box<dyn LineSource>> {
    use std::io::IsTerminal;
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Ok(Box::new(PlainSource::new(stdin.lock(), false)));
    }
    #[cfg(feature = "repl-rustyline")]
    {
        Ok(Box::new(RustylineSource::new()?))
    }
    #[cfg(not(feature = "repl-rustyline"))]
    {
        Ok(Box::new(PlainSource::new(stdin.lock(), true)))
    }
}

/// Run the explorer loop until `exit`, `quit`, option 5 or end of input.
pub fn run_explorer<S: GraphStore>(
    store: S,
    config: &QueryConfig,
    input: &mut dyn LineSource,
) -> Result<()> {
    let executor = QueryExecutor::new(store, config.clone());
    let resolver = QueryResolver::default();

    println!("{}", "WALS language explorer".green().bold());
    println!("{MENU}\n");

    while let Some(line) = input.read_line("walsgraph> ")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let resolved = match line.to_lowercase().as_str() {
            "5" | "exit" | "quit" => break,
            "menu" | "help" => {
                println!("{MENU}");
                continue;
            }
            "examples" => {
                for q in EXAMPLE_QUESTIONS {
                    println!("  {}", q.cyan());
                }
                continue;
            }
            "1" => ResolvedQuery::Statistics,
            "2" => match follow_up(input, "country or region: ")? {
                Some(text) => ResolvedQuery::Geographic {
                    place: GeoResolver::global().resolve(&text),
                    place_text: text,
                },
                None => break,
            },
            "3" => match follow_up(input, "family: ")? {
                Some(text) => ResolvedQuery::Family {
                    family: family_search_label(&text),
                },
                None => break,
            },
            "4" => match follow_up(input, "query: ")? {
                Some(query) => ResolvedQuery::Raw { query },
                None => break,
            },
            _ => resolver.resolve(line),
        };
        show(&executor, &resolved);
    }

    println!("bye");
    Ok(())
}

/// Read one trimmed value; `None` at end of input.
fn follow_up(input: &mut dyn LineSource, prompt: &str) -> Result<Option<String>> {
    Ok(input.read_line(prompt)?.map(|l| l.trim().to_string()))
}

fn show<S: GraphStore>(executor: &QueryExecutor<S>, resolved: &ResolvedQuery) {
    match executor.execute(resolved) {
        Ok(result) => print_result(&result, executor.config().list_limit),
        Err(e) => eprintln!("{} {e}", "error:".red().bold()),
    }
}

/// Print a result with a colored header line.
pub fn print_result(result: &QueryResult, list_limit: usize) {
    println!(
        "{} {}",
        format!("[{}]", result.intent).blue().bold(),
        result.summary.message.bold()
    );
    if let Some(query) = &result.query {
        println!("{}", query.dimmed());
    }
    let body = render(result, list_limit);
    // The first rendered line repeats the summary message.
    for line in body.lines().skip(1) {
        println!("{line}");
    }
}
