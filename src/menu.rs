//! Interactive single-character command loop.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::{debug, info, warn};

use crate::analyzers::types::Metric;
use crate::dataset::WorldDataset;
use crate::output::{print_comparable, print_countries, print_series};
use crate::render::{ChartLauncher, ChartRequest};

/// Typed at any country or graph-type prompt to return to the command list.
pub const ESCAPE: &str = "b";

/// Countries and metrics drawn by the `t` command.
pub const PRESET_PAIR: (&str, &str) = ("USA", "ITA");
pub const PRESET_METRICS: [Metric; 4] = [
    Metric::TotalCases,
    Metric::DeathRate,
    Metric::CasesPerMillion,
    Metric::DeathsPerMillion,
];

const COMMAND_PROMPT: &str = "
    Command List:
    'n' for list of all country names and abbreviations
    'c' for list of comparable countries
    'p' to print the aggregated data of one country

    'g' to plot a graph
    'd' to plot a graph comparing two countries (both countries must be found in the 'Comparable Countries' list)
    't' to plot the four preset USA vs ITA graphs

    'q' to quit

    Please type a command: ";

const COUNTRY_PROMPT: &str =
    "\n    Please enter the ABBREVIATION of the desired country (or 'b' to go back): ";

const TYPO: &str = "\n    Hmmm, was there a typo?";

const COMPARE_ERROR: &str = "\n\n    ERROR: One of the countries is not in the 'Comparable Countries' list. Please try again.\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ListCountries,
    ListComparable,
    PrintCountry,
    Graph,
    CompareGraph,
    Preset,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Option<Command> {
        match input.trim().to_lowercase().as_str() {
            "n" => Some(Command::ListCountries),
            "c" => Some(Command::ListComparable),
            "p" => Some(Command::PrintCountry),
            "g" => Some(Command::Graph),
            "d" => Some(Command::CompareGraph),
            "t" => Some(Command::Preset),
            "q" => Some(Command::Quit),
            _ => None,
        }
    }
}

fn graph_type_prompt() -> String {
    let mut prompt = String::from("\n    Graph Types:\n");
    for metric in Metric::GRAPHABLE {
        if let Some(selector) = metric.selector() {
            prompt.push_str(&format!("    '{selector}': {}\n", metric.label()));
        }
    }
    prompt.push_str("\n    Please enter the desired graph type number (or 'b' to go back): ");
    prompt
}

/// The command loop over any line source and sink. End of input quits.
pub struct Menu<'a, R, W, L> {
    dataset: &'a WorldDataset,
    input: R,
    out: W,
    launcher: L,
}

impl<'a, R: BufRead, W: Write, L: ChartLauncher> Menu<'a, R, W, L> {
    pub fn new(dataset: &'a WorldDataset, input: R, out: W, launcher: L) -> Self {
        Self {
            dataset,
            input,
            out,
            launcher,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            let Some(line) = self.prompt(COMMAND_PROMPT)? else {
                debug!("Input closed, leaving menu");
                return Ok(());
            };
            let Some(command) = Command::parse(&line) else {
                continue;
            };
            debug!(?command, "Menu command");

            match command {
                Command::Quit => {
                    writeln!(self.out, "q")?;
                    return Ok(());
                }
                Command::ListCountries => print_countries(self.dataset, &mut self.out)?,
                Command::ListComparable => print_comparable(self.dataset, &mut self.out)?,
                Command::PrintCountry => self.print_country()?,
                Command::Graph => self.graph()?,
                Command::CompareGraph => self.compare_graph()?,
                Command::Preset => self.preset()?,
            }
        }
    }

    fn print_country(&mut self) -> Result<()> {
        if let Some(code) = self.ask_country_code()? {
            print_series(self.dataset.series(&code)?, &mut self.out)?;
        }
        Ok(())
    }

    fn graph(&mut self) -> Result<()> {
        let Some(code) = self.ask_country_code()? else {
            return Ok(());
        };
        let Some(metric) = self.ask_graph_type()? else {
            return Ok(());
        };
        info!(country = %code, metric = metric.slug(), "Launching chart");
        self.launcher.launch(ChartRequest::single(&code, metric));
        Ok(())
    }

    fn compare_graph(&mut self) -> Result<()> {
        writeln!(self.out, "\n    First country:")?;
        let Some(first) = self.ask_country_code()? else {
            return Ok(());
        };
        writeln!(self.out, "\n    Second country:")?;
        let Some(second) = self.ask_country_code()? else {
            return Ok(());
        };
        let Some(metric) = self.ask_graph_type()? else {
            return Ok(());
        };
        self.launch_comparison(&first, &second, metric)
    }

    fn preset(&mut self) -> Result<()> {
        let (first, second) = PRESET_PAIR;
        for metric in PRESET_METRICS {
            self.launch_comparison(first, second, metric)?;
        }
        Ok(())
    }

    /// Launches a comparison chart, or tells the user why it cannot be drawn.
    fn launch_comparison(&mut self, first: &str, second: &str, metric: Metric) -> Result<()> {
        if let Err(e) = self.dataset.ensure_comparable(&[first, second]) {
            warn!(first, second, error = %e, "Comparison refused");
            write!(self.out, "{COMPARE_ERROR}")?;
            return Ok(());
        }
        info!(first, second, metric = metric.slug(), "Launching comparison chart");
        self.launcher.launch(ChartRequest::compare(first, second, metric));
        Ok(())
    }

    /// Prompts until a known country code is entered. `None` on escape or end
    /// of input.
    fn ask_country_code(&mut self) -> Result<Option<String>> {
        let mut prompt = COUNTRY_PROMPT.to_string();
        loop {
            let Some(line) = self.prompt(&prompt)? else {
                return Ok(None);
            };
            let code = line.trim().to_uppercase();
            if code.eq_ignore_ascii_case(ESCAPE) {
                return Ok(None);
            }
            if self.dataset.contains(&code) {
                writeln!(self.out, "    Selected: {code}")?;
                return Ok(Some(code));
            }
            prompt = format!("{TYPO}{COUNTRY_PROMPT}");
        }
    }

    /// Prompts until a graph type `1`..`6` is entered. `None` on escape or
    /// end of input.
    fn ask_graph_type(&mut self) -> Result<Option<Metric>> {
        let base = graph_type_prompt();
        let mut prompt = base.clone();
        loop {
            let Some(line) = self.prompt(&prompt)? else {
                return Ok(None);
            };
            let selector = line.trim();
            if selector.eq_ignore_ascii_case(ESCAPE) {
                return Ok(None);
            }
            if let Some(metric) = Metric::from_selector(selector) {
                writeln!(self.out, "    Selected: {selector}")?;
                return Ok(Some(metric));
            }
            prompt = format!("{TYPO}\n    {base}");
        }
    }

    /// Writes `prompt` and reads one line. `None` once input is exhausted.
    fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
