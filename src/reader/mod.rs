//! Textual front-end: source text to `Syntax`

mod lexer;
mod parser;
mod token;

pub use lexer::Lexer;
pub use parser::SyntaxReader;
pub use token::{OwnedToken, SourceLoc, Token, TokenWithLoc};

use crate::syntax::Syntax;

fn tokenize(input: &str) -> Result<SyntaxReader, String> {
    // Strip shebang if present (e.g., #!/usr/bin/env elle-ioc)
    let input = if input.starts_with("#!") {
        input.find('\n').map_or("", |nl| &input[nl..])
    } else {
        input
    };

    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    let mut locations = Vec::new();
    while let Some(token_with_loc) = lexer.next_token_with_loc()? {
        tokens.push(OwnedToken::from(token_with_loc.token));
        locations.push((token_with_loc.loc, token_with_loc.end));
    }
    Ok(SyntaxReader::new(tokens, locations))
}

/// Read exactly one form from a string
pub fn read_syntax(input: &str) -> Result<Syntax, String> {
    let mut reader = tokenize(input)?;
    let form = reader.read()?;
    if let Some(extra) = reader.try_read() {
        let extra = extra?;
        return Err(format!("{}: unexpected trailing form {}", extra.span, extra));
    }
    Ok(form)
}

/// Read every form in a string
pub fn read_syntax_all(input: &str) -> Result<Vec<Syntax>, String> {
    tokenize(input)?.read_all()
}
