/// Position of a token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLoc {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl SourceLoc {
    pub fn new(offset: usize, line: usize, col: usize) -> Self {
        SourceLoc { offset, line, col }
    }

    pub fn start() -> Self {
        SourceLoc::new(0, 1, 1)
    }

    /// Human-readable "line:col"
    pub fn position(&self) -> String {
        format!("{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithLoc<'a> {
    pub token: Token<'a>,
    pub loc: SourceLoc,
    /// Byte offset one past the token's last character
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    /// `#{` opening a set literal
    HashBrace,
    Quote,
    Symbol(&'a str),
    Keyword(&'a str),
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Nil,
}

/// Owned token variant for storage in the parser
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedToken {
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    HashBrace,
    Quote,
    Symbol(String),
    Keyword(String),
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Nil,
}

impl<'a> From<Token<'a>> for OwnedToken {
    fn from(token: Token<'a>) -> Self {
        match token {
            Token::LeftParen => OwnedToken::LeftParen,
            Token::RightParen => OwnedToken::RightParen,
            Token::LeftBracket => OwnedToken::LeftBracket,
            Token::RightBracket => OwnedToken::RightBracket,
            Token::LeftBrace => OwnedToken::LeftBrace,
            Token::RightBrace => OwnedToken::RightBrace,
            Token::HashBrace => OwnedToken::HashBrace,
            Token::Quote => OwnedToken::Quote,
            Token::Symbol(s) => OwnedToken::Symbol(s.to_string()),
            Token::Keyword(s) => OwnedToken::Keyword(s.to_string()),
            Token::Integer(i) => OwnedToken::Integer(i),
            Token::Float(f) => OwnedToken::Float(f),
            Token::String(s) => OwnedToken::String(s),
            Token::Bool(b) => OwnedToken::Bool(b),
            Token::Nil => OwnedToken::Nil,
        }
    }
}
