use super::token::{SourceLoc, Token, TokenWithLoc};

/// Checks if a character ends a symbol or number
#[inline]
fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '\'' | '"' | ';' | ',')
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn get_loc(&self) -> SourceLoc {
        SourceLoc::new(self.pos, self.line, self.col)
    }

    fn current(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current();
        if let Some(ch) = c {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += ch.len_utf8();
        }
        c
    }

    /// Commas are whitespace, `;` starts a line comment
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            if c.is_whitespace() || c == ',' {
                self.advance();
            } else if c == ';' {
                while let Some(c) = self.advance() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self) -> Result<String, String> {
        let start = self.get_loc();
        self.advance(); // skip opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(format!("{}: unterminated string", start.position())),
                Some('"') => return Ok(s),
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some(c) => s.push(c),
                    None => {
                        return Err(format!("{}: unterminated string escape", start.position()))
                    }
                },
                Some(c) => s.push(c),
            }
        }
    }

    /// Read up to the next delimiter, returning the raw slice
    fn read_atom(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.current() {
            if is_delimiter(c) {
                break;
            }
            self.advance();
        }
        &self.input[start..self.pos]
    }

    fn classify_number(text: &str) -> Option<Token<'a>> {
        if let Ok(n) = text.parse::<i64>() {
            return Some(Token::Integer(n));
        }
        if text.contains('.') || text.contains('e') {
            if let Ok(f) = text.parse::<f64>() {
                return Some(Token::Float(f));
            }
        }
        None
    }

    pub fn next_token_with_loc(&mut self) -> Result<Option<TokenWithLoc<'a>>, String> {
        self.skip_whitespace();
        let loc = self.get_loc();

        let token = match self.current() {
            None => return Ok(None),
            Some(c @ ('(' | ')' | '[' | ']' | '{' | '}' | '\'')) => {
                self.advance();
                match c {
                    '(' => Token::LeftParen,
                    ')' => Token::RightParen,
                    '[' => Token::LeftBracket,
                    ']' => Token::RightBracket,
                    '{' => Token::LeftBrace,
                    '}' => Token::RightBrace,
                    _ => Token::Quote,
                }
            }
            Some('"') => Token::String(self.read_string()?),
            Some(':') => {
                self.advance();
                let name = self.read_atom();
                if name.is_empty() {
                    return Err(format!(
                        "{}: invalid keyword: expected name after :",
                        loc.position()
                    ));
                }
                Token::Keyword(name)
            }
            Some('#') => match self.peek(1) {
                Some('{') => {
                    self.advance();
                    self.advance();
                    Token::HashBrace
                }
                Some('t') if self.peek(2).map_or(true, is_delimiter) => {
                    self.advance();
                    self.advance();
                    Token::Bool(true)
                }
                Some('f') if self.peek(2).map_or(true, is_delimiter) => {
                    self.advance();
                    self.advance();
                    Token::Bool(false)
                }
                _ => return Err(format!("{}: invalid # syntax", loc.position())),
            },
            Some(c) => {
                let starts_numeric = c.is_ascii_digit()
                    || ((c == '-' || c == '+') && self.peek(1).is_some_and(|n| n.is_ascii_digit()));
                let text = self.read_atom();
                if starts_numeric {
                    Self::classify_number(text).ok_or_else(|| {
                        format!("{}: invalid number: {}", loc.position(), text)
                    })?
                } else {
                    match text {
                        "nil" => Token::Nil,
                        "true" => Token::Bool(true),
                        "false" => Token::Bool(false),
                        _ => Token::Symbol(text),
                    }
                }
            }
        };

        Ok(Some(TokenWithLoc {
            token,
            loc,
            end: self.pos,
        }))
    }

    pub fn next_token(&mut self) -> Result<Option<Token<'a>>, String> {
        self.next_token_with_loc()
            .map(|opt| opt.map(|twl| twl.token))
    }
}
