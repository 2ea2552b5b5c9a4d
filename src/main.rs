use cfgtree::{
    cli::{self, CliError, RunOptions, RunReport},
    logging::{self, Verbosity},
    Flags,
};
use clap::Parser as ClapParser;
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "cfgtool")]
#[command(about = "Run edit commands against a configuration tree")]
#[command(version)]
struct Cli {
    /// Filesystem root the tree describes
    #[arg(short, long, env = "CFGTREE_ROOT", default_value = "/")]
    root: String,

    /// Colon-separated module directories
    #[arg(short = 'I', long)]
    load_path: Option<String>,

    /// Keep backups of changed files
    #[arg(short, long)]
    backup: bool,

    /// Write changes to new files next to the originals
    #[arg(short, long)]
    new: bool,

    /// Save without writing anything
    #[arg(long)]
    noop: bool,

    /// Read commands from this file
    #[arg(short, long)]
    file: Option<String>,

    /// JSON snapshot grafted under /files before running
    #[arg(short, long)]
    tree: Option<String>,

    /// Print /files as JSON after running
    #[arg(long)]
    dump: bool,

    /// Echo each command before its output
    #[arg(short, long)]
    echo: bool,

    /// Log every operation to stderr
    #[arg(short, long)]
    verbose: bool,

    /// A single command to run, e.g. `get /augeas/root`
    command: Vec<String>,
}

impl Cli {
    fn flags(&self) -> Flags {
        let mut flags = Flags::NONE;
        if self.backup {
            flags = flags | Flags::SAVE_BACKUP;
        }
        if self.new {
            flags = flags | Flags::SAVE_NEWFILE;
        }
        if self.noop {
            flags = flags | Flags::SAVE_NOOP;
        }
        flags
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(if cli.verbose {
        Verbosity::Debug
    } else {
        Verbosity::Quiet
    });

    match run(cli) {
        Ok(report) => {
            print!("{}", report.output);
            if let Some(dump) = &report.dump {
                println!("{}", dump);
            }
            if let Some(failure) = report.failure {
                match failure.error {
                    Some(info) => eprintln!(
                        "error: line {}: {}: {}",
                        failure.line, info.message, info.details
                    ),
                    None => eprintln!(
                        "error: line {}: invalid command '{}'",
                        failure.line, failure.command
                    ),
                }
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<RunReport, CliError> {
    let script = if !cli.command.is_empty() {
        cli.command.join(" ")
    } else if let Some(file) = &cli.file {
        std::fs::read_to_string(file)?
    } else if !atty::is(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        String::new()
    };

    let seed = match &cli.tree {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };

    let options = RunOptions {
        root: cli.root.clone(),
        load_path: cli.load_path.clone(),
        flags: cli.flags(),
        script,
        seed,
        echo: cli.echo,
        dump: cli.dump,
    };
    cli::execute_run(&options)
}
