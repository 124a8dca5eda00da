//! Interactive startup questions over a terminal.
//!
//! [`Prompter`] is generic over its input and output so the question
//! flow in [`ask_source`] can be driven from byte buffers in tests.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use liveradar_core::config::SourceConfig;

/// Line-oriented question/answer session.
#[derive(Debug)]
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Create a prompter reading answers from `input`.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and return the trimmed answer.
    ///
    /// End of input counts as an empty answer.
    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_owned())
    }

    /// Ask a yes/no question where an empty answer means yes.
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(question)?.to_lowercase();
        Ok(!matches!(answer.as_str(), "n" | "no"))
    }

    /// Print an informational line.
    pub fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }
}

/// Clean up a path typed or pasted by the user.
///
/// Surrounding whitespace and every double quote are removed, and
/// backslashes become forward slashes.
pub fn normalize_path_input(raw: &str) -> String {
    raw.trim().replace('"', "").replace('\\', "/")
}

/// Fill in the recording directory, recording name and map of `source`.
///
/// The directory question is skipped when `source` already has one. A
/// `detected` directory is offered first and only asked for manually
/// when declined. An empty map answer keeps the current map.
pub fn ask_source<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    source: &mut SourceConfig,
    detected: Option<&Path>,
) -> io::Result<()> {
    if source.recording_dir.is_none() {
        let mut dir = None;
        if let Some(found) = detected {
            prompter.say(&format!("Game directory detected: {}", found.display()))?;
            if prompter.confirm("Use this path? (Y/n): ")? {
                dir = Some(found.to_path_buf());
            }
        }
        if dir.is_none() {
            let typed = normalize_path_input(&prompter.ask("Enter the recording directory: ")?);
            if !typed.is_empty() {
                dir = Some(PathBuf::from(typed));
            }
        }
        source.recording_dir = dir;
    }

    let extension = source.recording_extension.clone();
    let name = normalize_path_input(&prompter.ask(&format!(
        "Recording file name (e.g. 'radar' or 'radar.{extension}'): "
    ))?);
    if !name.is_empty() {
        source.recording_name = Some(name);
    }

    let map = prompter.ask(&format!("Map name [{}]: ", source.map_name))?;
    if !map.is_empty() {
        source.map_name = map;
    }
    Ok(())
}
