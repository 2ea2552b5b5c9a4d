pub mod ast;
pub mod command;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod tree;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod logging;

pub use ast::{CompiledPath, PathRef, Step, Token};
pub use command::{Command, CommandError};
pub use engine::{Engine, Flags, SaveMode, STATUS_FAILURE, STATUS_QUIT};
pub use error::{EngineError, ErrorCode, ErrorInfo, PathError, PathErrorKind};
pub use evaluator::Evaluator;
pub use lexer::Lexer;
pub use output::{Entry, NodeSnapshot};
pub use parser::{Parser, compile};
pub use tree::{NodeId, NodeStore};
