//! Recursive-descent parser building the command AST from the token stream.
//!
//! ```text
//! line := pipe ('&')* (';' line)?
//! pipe := exec ('|' pipe)?
//! exec := '(' line ')' redr*        -- subshell
//!       | redr* (arg redr*)+        -- command with surrounding redirections
//! redr := ('<' | '>' | '>>') arg
//! ```
//!
//! Leftmost alternatives reduce first. A syntax error is a single
//! diagnostic to stderr with no recovery: the caller discards whatever was
//! built and re-prompts.

mod ast;
mod tokenizer;

pub use ast::{Cmd, ExecCmd, Redirect, RedirectOp, MAX_ARGS};

use tokenizer::{Token, Tokenizer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Recoverable: reported to stderr, AST discarded, shell re-prompts.
    Syntax(String),
    /// Fatal per spec: exceeding the 16-argument limit aborts the shell.
    TooManyArgs,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Syntax(msg) => write!(f, "{}", msg),
            ParseError::TooManyArgs => write!(f, "too many arguments"),
        }
    }
}

struct Parser<'a> {
    tok: Tokenizer<'a>,
    lookahead: Token,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let mut tok = Tokenizer::new(input);
        let lookahead = tok.next_token();
        Parser { tok, lookahead }
    }

    fn bump(&mut self) -> Token {
        let next = self.tok.next_token();
        std::mem::replace(&mut self.lookahead, next)
    }

    fn parse_line(&mut self) -> Result<Cmd, ParseError> {
        let mut node = self.parse_pipe()?;

        while self.lookahead == Token::Amp {
            self.bump();
            node = Cmd::background(node);
        }

        if self.lookahead == Token::Semi {
            self.bump();
            let right = self.parse_line()?;
            node = Cmd::list(node, right);
        }

        Ok(node)
    }

    fn parse_pipe(&mut self) -> Result<Cmd, ParseError> {
        let left = self.parse_exec()?;

        if self.lookahead == Token::Pipe {
            self.bump();
            let right = self.parse_pipe()?;
            Ok(Cmd::pipe(left, right))
        } else {
            Ok(left)
        }
    }

    fn parse_exec(&mut self) -> Result<Cmd, ParseError> {
        if self.lookahead == Token::LParen {
            self.bump();
            let inner = self.parse_line()?;
            if self.lookahead != Token::RParen {
                return Err(ParseError::Syntax(
                    "syntax error: expected ')'".to_string(),
                ));
            }
            self.bump();
            let mut node = Cmd::subshell(inner);
            node = self.wrap_trailing_redirects(node)?;
            return Ok(node);
        }

        let mut pending: Vec<(RedirectOp, String)> = Vec::new();
        pending.extend(self.parse_redirect_run()?);

        let mut argv: Vec<String> = Vec::new();
        loop {
            match &self.lookahead {
                Token::Arg(_) => {
                    if let Token::Arg(word) = self.bump() {
                        argv.push(word);
                    }
                    pending.extend(self.parse_redirect_run()?);
                }
                _ => break,
            }
        }

        if argv.is_empty() {
            return Err(ParseError::Syntax(
                "syntax error near unexpected token: command expected".to_string(),
            ));
        }
        if argv.len() > MAX_ARGS {
            return Err(ParseError::TooManyArgs);
        }

        let mut node = Cmd::exec(argv);
        for (op, file) in pending {
            node = Cmd::redirect(node, op, file);
        }
        Ok(node)
    }

    fn wrap_trailing_redirects(&mut self, mut node: Cmd) -> Result<Cmd, ParseError> {
        for (op, file) in self.parse_redirect_run()? {
            node = Cmd::redirect(node, op, file);
        }
        Ok(node)
    }

    fn parse_redirect_run(&mut self) -> Result<Vec<(RedirectOp, String)>, ParseError> {
        let mut redirects = Vec::new();
        loop {
            let op = match self.lookahead {
                Token::Lt => RedirectOp::In,
                Token::Gt => RedirectOp::Out,
                Token::Append => RedirectOp::Append,
                _ => break,
            };
            self.bump();
            let file = match self.bump() {
                Token::Arg(word) => word,
                _ => {
                    return Err(ParseError::Syntax(
                        "syntax error near unexpected token: redirection target expected"
                            .to_string(),
                    ))
                }
            };
            redirects.push((op, file));
        }
        Ok(redirects)
    }
}

/// Parse a full input line into a [`Cmd`] tree.
///
/// Returns `Ok(None)` for a blank (whitespace-only) line — nothing to run,
/// not a syntax error. `";"`, `"|"`, `"a ; "`, `"a | "` and similar all
/// surface `Err(ParseError::Syntax(..))`.
pub fn parse_line(input: &str) -> Result<Option<Cmd>, ParseError> {
    if input.trim().is_empty() {
        return Ok(None);
    }

    let mut parser = Parser::new(input);
    let cmd = parser.parse_line()?;

    if !parser.tok.at_eof() || parser.lookahead != Token::Eof {
        return Err(ParseError::Syntax(format!(
            "syntax error near unexpected token: '{}'",
            parser.tok.remainder().trim()
        )));
    }

    Ok(Some(cmd))
}
