//! # Path Expressions - Abstract Syntax
//!
//! This module defines the compiled form of the path-expression language used
//! to address nodes in a configuration tree. The language is a narrow XPath
//! dialect:
//!
//! ```text
//! /files/etc/hosts/*[canonical='localhost']/ipaddr
//! /files/etc/group/disk/user[last()+1]
//! ../alias[2]
//! ```
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[path]** - Compiled paths, steps, label matchers and predicates
//!
//! ## Steps
//!
//! A path is a sequence of steps separated by `/`. A leading `/` anchors the
//! path at the tree root; otherwise it is relative to the engine's context.
//!
//! - `label` - children carrying exactly that label
//! - `*` - all children, whatever their label
//! - `.` - the node itself
//! - `..` - the parent node
//!
//! ## Predicates
//!
//! Any step may be followed by bracketed predicates, applied left to right:
//!
//! - `[2]` - the second node of the step's candidates (1-based)
//! - `[last()]`, `[last()-1]` - counted from the end
//! - `[name='value']`, `[.='value']` - child (or own) value equality
//! - `[name!='value']` - the negated test
//! - `[name]` - a child labelled `name` exists
//!
//! `[last()+1]` is not a selector. It marks the final step as an append
//! target and compiles to [`Step::Append`].
pub mod path;
pub mod tokens;

pub use path::{Axis, CompiledPath, LabelMatcher, Operand, PathRef, Predicate, Step};
pub use tokens::{Spanned, Token};
