use crate::{
    ast::{Axis, CompiledPath, LabelMatcher, Operand, Predicate, Spanned, Step, Token},
    error::{PathError, PathErrorKind},
    lexer::Lexer,
};
use std::mem;

/// Compile a path expression.
///
/// Compilation never touches a tree; a malformed expression is rejected here
/// before any evaluation happens.
///
/// # Examples
///
/// ```
/// use cfgtree::parser::compile;
///
/// let path = compile("/files/etc/hosts/*[canonical='localhost']/ipaddr").unwrap();
/// assert!(path.is_absolute());
/// assert_eq!(path.steps().len(), 5);
///
/// assert!(compile("/files//etc").is_err());
/// ```
pub fn compile(text: &str) -> Result<CompiledPath, PathError> {
    let mut parser = Parser::new(Lexer::new(text))?;
    parser.parse_path()
}

/// What a bracketed predicate turned out to be.
enum Bracket {
    Predicate(Predicate),
    Append,
}

pub struct Parser {
    lexer: Lexer,
    current: Spanned,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, PathError> {
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    fn advance(&mut self) -> Result<(), PathError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current.token) == mem::discriminant(token)
    }

    fn offset(&self) -> usize {
        self.current.pos.offset
    }

    fn error(&self, kind: PathErrorKind) -> PathError {
        PathError::new(kind, self.offset())
    }

    /// Parse a complete path expression
    pub fn parse_path(&mut self) -> Result<CompiledPath, PathError> {
        if self.check(&Token::Eof) {
            return Err(self.error(PathErrorKind::Empty));
        }

        let mut absolute = false;
        if self.check(&Token::Slash) {
            absolute = true;
            self.advance()?;
            match self.current.token {
                // A lone '/' denotes the root itself
                Token::Eof => {
                    return Ok(CompiledPath::new(self.lexer.source(), true, vec![]));
                }
                Token::Slash => return Err(self.error(PathErrorKind::EmptyStep)),
                _ => {}
            }
        }

        let mut steps = vec![];
        loop {
            steps.push(self.parse_step()?);

            match self.current.token {
                Token::Eof => break,
                Token::Slash => {
                    let slash_at = self.offset();
                    self.advance()?;
                    match self.current.token {
                        Token::Eof => {
                            return Err(PathError::new(PathErrorKind::TrailingSlash, slash_at));
                        }
                        Token::Slash => return Err(self.error(PathErrorKind::EmptyStep)),
                        _ => {}
                    }
                }
                _ => {
                    let found = self.current.token.to_string();
                    return Err(self.error(PathErrorKind::TrailingInput(found)));
                }
            }
        }

        // The append marker is only meaningful on the final step
        if let Some(Step::Append { offset, .. }) =
            steps.iter().rev().skip(1).find(|s| s.is_append())
        {
            return Err(PathError::new(PathErrorKind::MisplacedAppend, *offset));
        }

        Ok(CompiledPath::new(self.lexer.source(), absolute, steps))
    }

    fn parse_step(&mut self) -> Result<Step, PathError> {
        let axis = match mem::replace(&mut self.current.token, Token::Eof) {
            Token::Label(label) => Axis::Child(LabelMatcher::Exact(label)),
            Token::Star => Axis::Child(LabelMatcher::Any),
            Token::Dot => Axis::SelfNode,
            Token::DotDot => Axis::Parent,
            other => {
                self.current.token = other;
                let found = self.current.token.to_string();
                return Err(self.error(PathErrorKind::ExpectedStep(found)));
            }
        };
        self.advance()?;

        let mut predicates = vec![];
        let mut append_at = None;

        while self.check(&Token::LBracket) {
            let open = self.offset();
            if append_at.is_some() {
                return Err(PathError::new(PathErrorKind::MisplacedAppend, open));
            }
            self.advance()?; // consume '['

            let bracket = self.parse_predicate()?;

            if !self.check(&Token::RBracket) {
                let found = self.current.token.to_string();
                return Err(self.error(PathErrorKind::UnclosedPredicate(found)));
            }
            self.advance()?; // consume ']'

            match bracket {
                Bracket::Predicate(p) => predicates.push(p),
                Bracket::Append => {
                    if !predicates.is_empty() {
                        return Err(PathError::new(PathErrorKind::MisplacedAppend, open));
                    }
                    append_at = Some(open);
                }
            }
        }

        match append_at {
            None => Ok(Step::Select { axis, predicates }),
            Some(offset) => match axis {
                Axis::Child(LabelMatcher::Exact(label)) => Ok(Step::Append { label, offset }),
                // There is no label to give a node created through '*', '.' or '..'
                _ => Err(PathError::new(PathErrorKind::UnknownPredicate, offset)),
            },
        }
    }

    fn parse_predicate(&mut self) -> Result<Bracket, PathError> {
        match mem::replace(&mut self.current.token, Token::Eof) {
            Token::Integer(n) => {
                self.advance()?;
                Ok(Bracket::Predicate(Predicate::Position(n)))
            }
            Token::Label(name) => {
                self.advance()?;
                if name == "last" && self.check(&Token::LParen) {
                    self.parse_last()
                } else {
                    self.parse_comparison(Operand::Child(name))
                }
            }
            Token::Dot => {
                self.advance()?;
                self.parse_comparison(Operand::SelfValue)
            }
            other => {
                self.current.token = other;
                Err(self.error(PathErrorKind::UnknownPredicate))
            }
        }
    }

    /// `last()`, `last()-n` or `last()+1`; the current token is '('
    fn parse_last(&mut self) -> Result<Bracket, PathError> {
        self.advance()?; // consume '('
        if !self.check(&Token::RParen) {
            return Err(self.error(PathErrorKind::UnknownPredicate));
        }
        self.advance()?; // consume ')'

        match self.current.token {
            Token::Plus => {
                self.advance()?;
                match self.current.token {
                    Token::Integer(1) => {
                        self.advance()?;
                        Ok(Bracket::Append)
                    }
                    _ => Err(self.error(PathErrorKind::UnknownPredicate)),
                }
            }
            Token::Minus => {
                self.advance()?;
                match self.current.token {
                    Token::Integer(back) => {
                        self.advance()?;
                        Ok(Bracket::Predicate(Predicate::Last { back }))
                    }
                    _ => Err(self.error(PathErrorKind::UnknownPredicate)),
                }
            }
            _ => Ok(Bracket::Predicate(Predicate::Last { back: 0 })),
        }
    }

    fn parse_comparison(&mut self, operand: Operand) -> Result<Bracket, PathError> {
        let negated = match self.current.token {
            Token::Eq => false,
            Token::NotEq => true,
            _ => {
                return match operand {
                    Operand::Child(name) => Ok(Bracket::Predicate(Predicate::HasChild(name))),
                    // '[.]' on its own says nothing
                    Operand::SelfValue => Err(self.error(PathErrorKind::UnknownPredicate)),
                };
            }
        };
        self.advance()?;

        match mem::replace(&mut self.current.token, Token::Eof) {
            Token::String(literal) => {
                self.advance()?;
                Ok(Bracket::Predicate(Predicate::Compare {
                    operand,
                    literal,
                    negated,
                }))
            }
            other => {
                let found = other.to_string();
                self.current.token = other;
                Err(self.error(PathErrorKind::ExpectedLiteral(found)))
            }
        }
    }
}
