//! Execute a command script against a fresh engine

use super::CliError;
use crate::{
    engine::{STATUS_FAILURE, STATUS_QUIT},
    output, Engine, ErrorInfo, Flags,
};

/// Where seeded trees are grafted and dumps are taken from
const FILES: &str = "/files";

/// Options for one batch run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Filesystem root recorded under /augeas/root
    pub root: String,
    /// `:`-separated module directories
    pub load_path: Option<String>,
    pub flags: Flags,
    /// Command script, one command per line
    pub script: String,
    /// JSON snapshot grafted under /files before the script runs
    pub seed: Option<String>,
    /// Echo each command before its output
    pub echo: bool,
    /// Dump /files as JSON after the script
    pub dump: bool,
}

/// A command that failed, with the engine's error record when it has one
#[derive(Debug, Clone)]
pub struct CommandFailure {
    pub line: usize,
    pub command: String,
    pub error: Option<ErrorInfo>,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Output of every executed command
    pub output: String,
    /// Commands executed successfully
    pub executed: usize,
    pub quit: bool,
    pub failure: Option<CommandFailure>,
    pub dump: Option<String>,
}

/// Run a script. Execution stops at `quit` or at the first failing command.
pub fn execute_run(options: &RunOptions) -> Result<RunReport, CliError> {
    if options.script.trim().is_empty() && !options.dump {
        return Err(CliError::NoInput);
    }

    let mut engine = Engine::create(&options.root, options.load_path.as_deref(), options.flags);
    if let Some(seed) = &options.seed {
        let snapshot = output::from_json(seed)?;
        engine.load_snapshot(FILES, &snapshot)?;
    }

    let mut report = RunReport::default();
    for (index, line) in options.script.lines().enumerate() {
        if options.echo && !line.trim().is_empty() {
            report.output.push_str(&format!("> {}\n", line.trim()));
        }
        let (status, out) = engine.srun(line);
        report.output.push_str(&out);

        match status {
            STATUS_QUIT => {
                report.quit = true;
                break;
            }
            STATUS_FAILURE => {
                let error = engine.error();
                report.failure = Some(CommandFailure {
                    line: index + 1,
                    command: line.trim().to_string(),
                    error: error.is_error().then(|| error.clone()),
                });
                break;
            }
            n => report.executed += n as usize,
        }
    }

    if options.dump {
        let snapshot = engine.snapshot(FILES)?;
        report.dump = Some(output::to_json(&snapshot)?);
    }
    engine.close()?;
    Ok(report)
}
