use crate::{
    ast::{Spanned, Token, tokens::Position},
    error::{PathError, PathErrorKind},
};

/// Characters that end a label outside of brackets.
fn is_step_delimiter(ch: char) -> bool {
    matches!(ch, '/' | '[' | ']' | '*')
}

fn is_predicate_label_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '#'
}

fn is_predicate_label_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '#' | '-' | '.' | ':')
}

/// Splits a path expression into tokens.
///
/// Labels are lexed differently inside and outside brackets: between slashes
/// a label runs until the next delimiter (so `1`, `foo-bar` and `#comment`
/// are labels), while inside a predicate digits form numbers and `+`, `-`,
/// `=` are operators.
pub struct Lexer {
    source: String,
    input: Vec<(usize, char)>,
    len: usize,
    position: usize,
    depth: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            source: input.to_string(),
            input: input.char_indices().collect(),
            len: input.len(),
            position: 0,
            depth: 0,
        }
    }

    /// The full text being tokenized
    pub fn source(&self) -> &str {
        &self.source
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).map(|&(_, c)| c)
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).map(|&(_, c)| c)
    }

    /// Byte offset of the current character
    fn offset(&self) -> usize {
        self.input
            .get(self.position)
            .map(|&(o, _)| o)
            .unwrap_or(self.len)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read a label up to the next delimiter. Unescaped whitespace at the
    /// end is dropped; inner whitespace is part of the label.
    fn read_step_label(&mut self) -> Result<String, PathError> {
        let mut result = String::new();
        let mut kept = 0;
        while let Some(ch) = self.current_char() {
            match ch {
                '\\' => {
                    let at = self.offset();
                    self.advance();
                    match self.current_char() {
                        Some(escaped) => result.push(escaped),
                        None => return Err(PathError::new(PathErrorKind::DanglingEscape, at)),
                    }
                    self.advance();
                    kept = result.len();
                }
                c if is_step_delimiter(c) => break,
                c => {
                    result.push(c);
                    self.advance();
                    if !c.is_whitespace() {
                        kept = result.len();
                    }
                }
            }
        }
        result.truncate(kept);
        Ok(result)
    }

    fn read_predicate_label(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if is_predicate_label_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, PathError> {
        let start = self.offset();
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some(escaped) => result.push(escaped),
                        None => break,
                    }
                    self.advance();
                }
                c => {
                    result.push(c);
                    self.advance();
                }
            }
        }

        Err(PathError::new(PathErrorKind::UnterminatedString, start))
    }

    fn read_number(&mut self) -> Result<Token, PathError> {
        let start = self.offset();
        let mut number = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        number
            .parse::<u64>()
            .map(Token::Integer)
            .map_err(|_| PathError::new(PathErrorKind::NumberTooLarge, start))
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    pub fn next_token(&mut self) -> Result<Spanned, PathError> {
        self.skip_whitespace();
        let pos = Position {
            offset: self.offset(),
        };
        let token = if self.depth > 0 {
            self.predicate_token()?
        } else {
            self.step_token()?
        };
        Ok(Spanned { token, pos })
    }

    fn step_token(&mut self) -> Result<Token, PathError> {
        match self.current_char() {
            None => Ok(Token::Eof),
            Some('/') => Ok(self.single(Token::Slash)),
            Some('*') => Ok(self.single(Token::Star)),
            Some('[') => {
                self.depth += 1;
                Ok(self.single(Token::LBracket))
            }
            Some(']') => Ok(self.single(Token::RBracket)),
            Some(_) => {
                // Escaped dots are plain labels, so check the raw text first
                let raw_dot = self.current_char() == Some('.');
                let raw_dotdot = raw_dot && self.peek_char(1) == Some('.');
                let label = self.read_step_label()?;
                match label.as_str() {
                    "." if raw_dot => Ok(Token::Dot),
                    ".." if raw_dotdot => Ok(Token::DotDot),
                    _ => Ok(Token::Label(label)),
                }
            }
        }
    }

    fn predicate_token(&mut self) -> Result<Token, PathError> {
        match self.current_char() {
            None => Ok(Token::Eof),
            Some('[') => {
                self.depth += 1;
                Ok(self.single(Token::LBracket))
            }
            Some(']') => {
                self.depth -= 1;
                Ok(self.single(Token::RBracket))
            }
            Some('(') => Ok(self.single(Token::LParen)),
            Some(')') => Ok(self.single(Token::RParen)),
            Some('+') => Ok(self.single(Token::Plus)),
            Some('-') => Ok(self.single(Token::Minus)),
            Some('=') => Ok(self.single(Token::Eq)),
            Some('/') => Ok(self.single(Token::Slash)),
            Some('*') => Ok(self.single(Token::Star)),
            Some('!') if self.peek_char(1) == Some('=') => {
                self.advance();
                Ok(self.single(Token::NotEq))
            }
            Some('.') if self.peek_char(1) == Some('.') => {
                self.advance();
                Ok(self.single(Token::DotDot))
            }
            Some('.') => Ok(self.single(Token::Dot)),
            Some(q @ ('\'' | '"')) => self.read_string(q).map(Token::String),
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) if is_predicate_label_start(ch) => Ok(Token::Label(self.read_predicate_label())),
            Some(ch) => Err(PathError::new(PathErrorKind::UnexpectedChar(ch), self.offset())),
        }
    }
}

#[test]
fn test_step_labels() {
    let mut lexer = Lexer::new("/files/etc/hosts/1");
    let mut tokens = vec![];
    loop {
        let t = lexer.next_token().unwrap().token;
        if t == Token::Eof {
            break;
        }
        tokens.push(t);
    }
    assert_eq!(
        tokens,
        vec![
            Token::Slash,
            Token::Label("files".into()),
            Token::Slash,
            Token::Label("etc".into()),
            Token::Slash,
            Token::Label("hosts".into()),
            Token::Slash,
            Token::Label("1".into()),
        ]
    );
}

#[test]
fn test_predicate_offsets() {
    let mut lexer = Lexer::new("a[last()-1]");
    assert_eq!(lexer.next_token().unwrap().token, Token::Label("a".into()));
    let bracket = lexer.next_token().unwrap();
    assert_eq!(bracket.token, Token::LBracket);
    assert_eq!(bracket.pos.offset, 1);
    assert_eq!(lexer.next_token().unwrap().token, Token::Label("last".into()));
    assert_eq!(lexer.next_token().unwrap().token, Token::LParen);
    assert_eq!(lexer.next_token().unwrap().token, Token::RParen);
    assert_eq!(lexer.next_token().unwrap().token, Token::Minus);
    assert_eq!(lexer.next_token().unwrap().token, Token::Integer(1));
    assert_eq!(lexer.next_token().unwrap().token, Token::RBracket);
    assert_eq!(lexer.next_token().unwrap().token, Token::Eof);
}
