use std::fmt;

/// Byte offset of a token within the path expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
}

/// A token together with the offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Step separator, or the root anchor when leading
    ///
    /// # Examples
    /// ```text
    /// /
    /// /files/etc
    /// ```
    Slash,

    /// Node label
    ///
    /// Outside brackets almost any character is part of a label; a backslash
    /// escapes the next character. Inside brackets labels start with a letter,
    /// `_` or `#`.
    ///
    /// # Examples
    /// ```text
    /// hosts
    /// 1
    /// #comment
    /// my\ label
    /// ```
    Label(String),

    /// Wildcard step matching every child
    Star,

    /// Self step, or the node's own value inside a predicate
    ///
    /// # Examples
    /// ```text
    /// ./ipaddr
    /// *[.='root']
    /// ```
    Dot,

    /// Parent step
    DotDot,

    /// Non-negative integer literal (only inside brackets)
    ///
    /// # Examples
    /// ```text
    /// [2]
    /// [last()-1]
    /// ```
    Integer(u64),

    /// Quoted string literal, single or double quotes
    ///
    /// # Examples
    /// ```text
    /// 'localhost'
    /// "a value"
    /// ```
    String(String),

    // Operators
    /// Equality test
    Eq,

    /// Inequality test
    NotEq,

    /// Offset after `last()`
    Plus,

    /// Offset after `last()`
    Minus,

    // Delimiters
    /// Opens a predicate
    LBracket,

    /// Closes a predicate
    RBracket,

    /// Only valid in `last()`
    LParen,

    /// Only valid in `last()`
    RParen,

    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Slash => write!(f, "'/'"),
            Token::Label(l) => write!(f, "label '{}'", l),
            Token::Star => write!(f, "'*'"),
            Token::Dot => write!(f, "'.'"),
            Token::DotDot => write!(f, "'..'"),
            Token::Integer(n) => write!(f, "number {}", n),
            Token::String(s) => write!(f, "string '{}'", s),
            Token::Eq => write!(f, "'='"),
            Token::NotEq => write!(f, "'!='"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Eof => write!(f, "end of path"),
        }
    }
}
