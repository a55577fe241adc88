//! XML tokenizer
//!
//! Two-slot lexer over the character cursor, as used by predictive
//! parsing: `current` is the single token of lookahead, `matched` the
//! most recently consumed token.
//!
//! - whitespace is consumed and never emitted as a token
//! - comments are consumed whole; their spans are recorded so the parser
//!   can carve them out of text runs
//! - multi-character tokens (`</`, `/>`, `<?`, `<?xml`, `?>`) are matched
//!   by probing and restoring the cursor when the probe fails

use crate::core::chars::CharCursor;
use crate::core::span::RawSpan;
use crate::error::{Error, ErrorKind};

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input.
    Eof,
    /// `"`
    Quote,
    /// `&`
    Amp,
    /// `'`
    Apostrophe,
    /// `:`
    Colon,
    /// `<`
    TagStart,
    /// `=`
    Equal,
    /// `>`
    TagEnd,
    /// Identifier: `[A-Za-z_][A-Za-z0-9_.-]*`
    Name,
    /// `/>`
    EmptyTagEnd,
    /// `</`
    EndTagStart,
    /// `<?`
    ProcInstrStart,
    /// `?>`
    ProcInstrStop,
    /// `<?xml`
    XmlDeclStart,
    /// Any other single character, carried by code point.
    Char(u32),
}

/// A token and its span in the input buffer.
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub text: RawSpan,
}

impl Default for Token {
    fn default() -> Self {
        Token {
            kind: TokenKind::Eof,
            text: RawSpan::new(0, 0),
        }
    }
}

#[inline]
fn is_space(code: u32) -> bool {
    matches!(code, 0x20 | 0x09 | 0x0a | 0x0d | 0x0b | 0x0c)
}

#[inline]
fn is_name_start(code: u32) -> bool {
    matches!(code, 0x41..=0x5a | 0x61..=0x7a) || code == '_' as u32
}

#[inline]
fn is_name_char(code: u32) -> bool {
    is_name_start(code)
        || matches!(code, 0x30..=0x39)
        || code == '.' as u32
        || code == '-' as u32
}

/// Two-slot lexer: one token of lookahead plus the last consumed token.
#[derive(Debug)]
pub struct Lexer<'a> {
    chars: CharCursor<'a>,
    /// Lookahead token.
    pub current: Token,
    /// Most recently consumed token.
    pub matched: Token,
    /// Spans of skipped comments, in source order.
    pub comments: Vec<RawSpan>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer and prime the lookahead token.
    pub fn new(input: &'a [u8]) -> Result<Self, Error> {
        let mut lexer = Lexer {
            chars: CharCursor::new(input),
            current: Token::default(),
            matched: Token::default(),
            comments: Vec::new(),
        };
        lexer.chars.advance()?;
        lexer.next_token()?;
        Ok(lexer)
    }

    /// The input buffer being tokenized.
    #[inline]
    pub fn input(&self) -> &'a [u8] {
        self.chars.input()
    }

    /// Shift `current` into `matched` and lex the next token.
    pub fn next_token(&mut self) -> Result<(), Error> {
        self.matched = self.current;

        // Explicit restart loop: skipped whitespace and comments re-enter
        // scanning from the top.
        loop {
            self.current.text.begin = self.chars.span().begin;

            if self.chars.code == 0 {
                self.current.kind = TokenKind::Eof;
                break;
            }

            match self.chars.code {
                code if is_space(code) => {
                    while is_space(self.chars.code) {
                        self.chars.advance()?;
                    }
                    continue;
                }
                code if code == '/' as u32 => {
                    self.chars.advance()?;
                    if self.chars.code == '>' as u32 {
                        self.chars.advance()?;
                        self.current.kind = TokenKind::EmptyTagEnd;
                    } else {
                        self.current.kind = TokenKind::Char('/' as u32);
                    }
                }
                code if code == '<' as u32 => {
                    self.current.kind = TokenKind::TagStart;
                    self.chars.advance()?;
                    if self.chars.code == '/' as u32 {
                        self.chars.advance()?;
                        self.current.kind = TokenKind::EndTagStart;
                    } else if self.chars.code == '?' as u32 {
                        self.current.kind = TokenKind::ProcInstrStart;
                        self.chars.advance()?;
                        let save = self.chars;
                        if self.chars.code == 'x' as u32 {
                            self.chars.advance()?;
                            if self.chars.code == 'm' as u32 {
                                self.chars.advance()?;
                                if self.chars.code == 'l' as u32 {
                                    self.chars.advance()?;
                                    self.current.kind = TokenKind::XmlDeclStart;
                                    break;
                                }
                            }
                        }
                        self.chars = save;
                    } else if self.chars.code == '!' as u32 {
                        let save = self.chars;
                        self.chars.advance()?;
                        if self.chars.code == '-' as u32 {
                            self.chars.advance()?;
                            if self.chars.code == '-' as u32 {
                                self.skip_comment()?;
                                continue;
                            }
                        }
                        self.chars = save;
                    }
                }
                code if code == '?' as u32 => {
                    self.chars.advance()?;
                    if self.chars.code == '>' as u32 {
                        self.chars.advance()?;
                        self.current.kind = TokenKind::ProcInstrStop;
                    } else {
                        self.current.kind = TokenKind::Char('?' as u32);
                    }
                }
                code if code == '"' as u32 => {
                    self.chars.advance()?;
                    self.current.kind = TokenKind::Quote;
                }
                code if code == '&' as u32 => {
                    self.chars.advance()?;
                    self.current.kind = TokenKind::Amp;
                }
                code if code == '\'' as u32 => {
                    self.chars.advance()?;
                    self.current.kind = TokenKind::Apostrophe;
                }
                code if code == ':' as u32 => {
                    self.chars.advance()?;
                    self.current.kind = TokenKind::Colon;
                }
                code if code == '=' as u32 => {
                    self.chars.advance()?;
                    self.current.kind = TokenKind::Equal;
                }
                code if code == '>' as u32 => {
                    self.chars.advance()?;
                    self.current.kind = TokenKind::TagEnd;
                }
                code if is_name_start(code) => {
                    self.current.kind = TokenKind::Name;
                    while is_name_char(self.chars.code) {
                        self.chars.advance()?;
                    }
                }
                code => {
                    self.chars.advance()?;
                    self.current.kind = TokenKind::Char(code);
                }
            }
            break;
        }

        self.current.text.end = self.chars.span().begin;
        Ok(())
    }

    /// Consume a `<!-- ... -->` comment; the cursor stands on the second
    /// `-` of the opener. Records the comment's span.
    fn skip_comment(&mut self) -> Result<(), Error> {
        let begin = self.current.text.begin;
        self.chars.advance()?;
        while self.chars.code != 0 {
            let code = self.chars.code;
            self.chars.advance()?;
            if code == '-' as u32 && self.chars.code == '-' as u32 {
                self.chars.advance()?;
                if self.chars.code == '>' as u32 {
                    self.chars.advance()?;
                    self.comments
                        .push(RawSpan::new(begin, self.chars.span().begin));
                    return Ok(());
                }
            }
        }
        Err(Error::report(
            self.input(),
            ErrorKind::PrematureEof,
            RawSpan::new(begin, self.chars.span().begin),
            "EOF while scanning for end of XML comment".to_string(),
        ))
    }

    /// Consume `current` if it has the given kind.
    pub fn match_token(&mut self, kind: TokenKind) -> Result<bool, Error> {
        if self.current.kind == kind {
            self.next_token()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Consume `current` or fail with `UnexpectedToken`.
    pub fn expect_token(&mut self, kind: TokenKind, msg: &str) -> Result<(), Error> {
        if self.match_token(kind)? {
            return Ok(());
        }
        Err(Error::report(
            self.input(),
            ErrorKind::UnexpectedToken,
            self.current.text,
            msg.to_string(),
        ))
    }

    /// Scan raw characters up to (not including) `delim`, consume the
    /// delimiter and re-prime the lookahead.
    ///
    /// On entry the cursor stands on the first raw character (the token
    /// for the opening delimiter has already been lexed). Returns `None`
    /// if end of input was reached before the delimiter.
    pub(crate) fn scan_delimited(&mut self, delim: u32) -> Result<Option<RawSpan>, Error> {
        let begin = self.chars.span().begin;
        while self.chars.code != 0 && self.chars.code != delim {
            self.chars.advance()?;
        }
        if self.chars.code == 0 {
            return Ok(None);
        }
        let span = RawSpan::new(begin, self.chars.span().begin);
        self.chars.advance()?;
        self.next_token()?;
        Ok(Some(span))
    }
}
