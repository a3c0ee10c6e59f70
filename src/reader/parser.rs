//! Parser that produces Syntax nodes from owned tokens
//!
//! Every node carries the span of the text it was read from. Compound
//! spans run from the opening delimiter to the closing one.

use super::token::{OwnedToken, SourceLoc};
use crate::syntax::{Span, Syntax, SyntaxKind};

pub struct SyntaxReader {
    tokens: Vec<OwnedToken>,
    /// (start location, end offset) per token
    locations: Vec<(SourceLoc, usize)>,
    pos: usize,
}

impl SyntaxReader {
    pub fn new(tokens: Vec<OwnedToken>, locations: Vec<(SourceLoc, usize)>) -> Self {
        SyntaxReader {
            tokens,
            locations,
            pos: 0,
        }
    }

    fn current(&self) -> Option<&OwnedToken> {
        self.tokens.get(self.pos)
    }

    fn location(&self, index: usize) -> (SourceLoc, usize) {
        self.locations
            .get(index)
            .or_else(|| self.locations.last())
            .copied()
            .unwrap_or((SourceLoc::start(), 0))
    }

    fn span_between(&self, first: usize, last: usize) -> Span {
        let (start, _) = self.location(first);
        let (_, end) = self.location(last);
        Span::new(start.offset, end, start.line as u32, start.col as u32)
    }

    /// Try to read a single syntax form. Returns None at EOF.
    pub fn try_read(&mut self) -> Option<Result<Syntax, String>> {
        self.current()?;
        Some(self.read())
    }

    /// Read a single syntax form. Returns error at EOF.
    pub fn read(&mut self) -> Result<Syntax, String> {
        let first = self.pos;
        let token = match self.current() {
            Some(token) => token.clone(),
            None => {
                let (loc, _) = self.location(first);
                return Err(format!("{}: unexpected end of input", loc.position()));
            }
        };
        self.pos += 1;

        let kind = match token {
            OwnedToken::LeftParen => SyntaxKind::List(self.read_until(first, OwnedToken::RightParen, "list")?),
            OwnedToken::LeftBracket => {
                SyntaxKind::Vector(self.read_until(first, OwnedToken::RightBracket, "vector")?)
            }
            OwnedToken::LeftBrace => {
                let items = self.read_until(first, OwnedToken::RightBrace, "map")?;
                if items.len() % 2 != 0 {
                    let (loc, _) = self.location(first);
                    return Err(format!(
                        "{}: map literal must contain an even number of forms",
                        loc.position()
                    ));
                }
                SyntaxKind::Map(items)
            }
            OwnedToken::HashBrace => SyntaxKind::Set(self.read_until(first, OwnedToken::RightBrace, "set")?),
            OwnedToken::Quote => SyntaxKind::Quote(Box::new(self.read()?)),

            OwnedToken::Integer(n) => SyntaxKind::Int(n),
            OwnedToken::Float(f) => SyntaxKind::Float(f),
            OwnedToken::String(s) => SyntaxKind::String(s),
            OwnedToken::Bool(b) => SyntaxKind::Bool(b),
            OwnedToken::Nil => SyntaxKind::Nil,
            OwnedToken::Symbol(s) => SyntaxKind::Symbol(s),
            OwnedToken::Keyword(s) => SyntaxKind::Keyword(s),

            OwnedToken::RightParen | OwnedToken::RightBracket | OwnedToken::RightBrace => {
                let (loc, _) = self.location(first);
                return Err(format!("{}: unexpected closing delimiter", loc.position()));
            }
        };

        let span = self.span_between(first, self.pos - 1);
        Ok(Syntax::new(kind, span))
    }

    /// Read all remaining forms
    pub fn read_all(&mut self) -> Result<Vec<Syntax>, String> {
        let mut results = Vec::new();
        while let Some(form) = self.try_read() {
            results.push(form?);
        }
        Ok(results)
    }

    fn read_until(
        &mut self,
        open: usize,
        close: OwnedToken,
        what: &str,
    ) -> Result<Vec<Syntax>, String> {
        let mut elements = Vec::new();
        loop {
            match self.current() {
                None => {
                    let (loc, _) = self.location(open);
                    return Err(format!("{}: unterminated {}", loc.position(), what));
                }
                Some(token) if *token == close => {
                    self.pos += 1;
                    return Ok(elements);
                }
                Some(_) => elements.push(self.read()?),
            }
        }
    }
}
