//! Lexer: classifies the next lexeme from an input buffer. Whitespace is
//! ` \t\r\n\x0B`; the symbol set is `<|>&;()`, plus the two-byte `>>`
//! append operator. Everything else collects into a maximal run as an
//! argument word.

const WHITESPACE: &[char] = &[' ', '\t', '\r', '\n', '\x0B'];
const SYMBOLS: &[char] = &['<', '>', '|', '&', ';', '(', ')'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Eof,
    Lt,
    Gt,
    Append,
    Pipe,
    Amp,
    Semi,
    LParen,
    RParen,
    Arg(String),
}

pub struct Tokenizer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && WHITESPACE.contains(&(self.bytes[self.pos] as char)) {
            self.pos += 1;
        }
    }

    /// Skip whitespace and report whether the next byte is in `delims`,
    /// without consuming anything.
    pub fn peek_is(&mut self, delims: &[char]) -> bool {
        self.skip_ws();
        match self.bytes.get(self.pos) {
            Some(&b) => delims.contains(&(b as char)),
            None => false,
        }
    }

    pub fn at_eof(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.bytes.len()
    }

    /// Position just past the trailing whitespace already skipped by the
    /// most recent `next_token`/`peek_is`/`at_eof` call. Used by the parser
    /// to check that nothing but whitespace remains after a full parse.
    pub fn remainder(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_ws();
        if self.pos >= self.bytes.len() {
            return Token::Eof;
        }

        let c = self.bytes[self.pos] as char;
        match c {
            '<' => {
                self.pos += 1;
                Token::Lt
            }
            '>' => {
                if self.bytes.get(self.pos + 1) == Some(&b'>') {
                    self.pos += 2;
                    Token::Append
                } else {
                    self.pos += 1;
                    Token::Gt
                }
            }
            '|' => {
                self.pos += 1;
                Token::Pipe
            }
            '&' => {
                self.pos += 1;
                Token::Amp
            }
            ';' => {
                self.pos += 1;
                Token::Semi
            }
            '(' => {
                self.pos += 1;
                Token::LParen
            }
            ')' => {
                self.pos += 1;
                Token::RParen
            }
            _ => {
                let start = self.pos;
                while self.pos < self.bytes.len() {
                    let ch = self.bytes[self.pos] as char;
                    if WHITESPACE.contains(&ch) || SYMBOLS.contains(&ch) {
                        break;
                    }
                    self.pos += 1;
                }
                Token::Arg(self.input[start..self.pos].to_string())
            }
        }
    }
}
