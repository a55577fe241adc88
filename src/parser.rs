//! Recursive-descent XML parser
//!
//! Drives the tokenizer and builds the arena document:
//! prolog, then the root element, then exactly one EOF. Each element
//! frame parses its attribute list (diverting `xmlns` declarations into
//! the namespace resolver), then its content: raw text runs and nested
//! elements, closed by a matching end tag.
//!
//! All transient state lives in a single-owner parse context threaded by
//! `&mut`; the namespace scope and the attribute stash are restored to
//! their entry heights when an element frame is left, success or failure.
//! The first error aborts the parse: no document is returned and the
//! diagnostic has already been emitted.

use memchr::memchr_iter;

use crate::core::entities;
use crate::core::span::{RawSpan, Span};
use crate::core::tokenizer::{Lexer, TokenKind};
use crate::dom::namespace::NamespaceResolver;
use crate::dom::node::{NodeId, NsId};
use crate::dom::Document;
use crate::error::{Error, ErrorKind};

/// Recursion guard for pathologically nested input.
const MAX_DEPTH: u32 = 512;

/// An attribute parsed from an open tag, stashed until the element's
/// namespace declarations are all known.
#[derive(Debug, Clone, Copy)]
struct StashedAttr {
    prefix: Option<RawSpan>,
    name: RawSpan,
    value: Span,
}

/// Single-owner state threaded through the recursive descent.
struct ParseCtx<'input> {
    doc: Document<'input>,
    input: &'input [u8],
    lexer: Lexer<'input>,
    stash: Vec<StashedAttr>,
    resolver: NamespaceResolver,
    /// Cursor into the tokenizer's recorded comment spans.
    comment_ix: usize,
    depth: u32,
}

/// Parse a buffer into a [`Document`].
///
/// The buffer must outlive the document: most spans are zero-copy
/// borrows into it. On failure the diagnostic has already been emitted
/// and no document state survives.
pub fn parse(input: &[u8]) -> Result<Document<'_>, Error> {
    let lexer = Lexer::new(input)?;
    let mut ctx = ParseCtx {
        doc: Document::with_input(input),
        input,
        lexer,
        stash: Vec::new(),
        resolver: NamespaceResolver::new(),
        comment_ix: 0,
        depth: 0,
    };

    parse_prolog(&mut ctx)?;
    ctx.lexer
        .expect_token(TokenKind::TagStart, "expected element start '<'")?;
    parse_element(&mut ctx, None)?;
    ctx.lexer
        .expect_token(TokenKind::Eof, "expected end of document")?;
    Ok(ctx.doc)
}

fn parse_prolog(ctx: &mut ParseCtx<'_>) -> Result<(), Error> {
    if ctx.lexer.match_token(TokenKind::XmlDeclStart)? {
        parse_xml_decl(ctx)?;
    }
    while ctx.lexer.match_token(TokenKind::ProcInstrStart)? {
        skip_proc_instr(ctx)?;
    }
    Ok(())
}

/// Parse `<?xml ...?>`; only `version`, `encoding` and `standalone`
/// attributes are recognized.
fn parse_xml_decl(ctx: &mut ParseCtx<'_>) -> Result<(), Error> {
    let begin = ctx.lexer.matched.text.begin;
    loop {
        if ctx.lexer.match_token(TokenKind::Name)? {
            let att_begin = ctx.lexer.matched.text.begin;
            let name = ctx.lexer.matched.text;
            ctx.lexer.expect_token(TokenKind::Equal, "expected '='")?;
            let value = parse_attribute_value(ctx)?;
            check_decl_attribute(ctx, att_begin, name, value)?;
        } else if ctx.lexer.match_token(TokenKind::ProcInstrStop)? {
            return Ok(());
        } else if ctx.lexer.current.kind == TokenKind::Eof {
            let end = (begin + 20).min(ctx.input.len());
            return Err(Error::report(
                ctx.input,
                ErrorKind::MalformedDeclaration,
                RawSpan::new(begin, end),
                "EOF while parsing xml declaration".to_string(),
            ));
        } else {
            ctx.lexer.next_token()?;
        }
    }
}

fn check_decl_attribute(
    ctx: &ParseCtx<'_>,
    att_begin: usize,
    name: RawSpan,
    value: Span,
) -> Result<(), Error> {
    let span = RawSpan::new(att_begin, ctx.lexer.current.text.begin);
    let value_bytes = ctx.doc.bytes(value);
    match name.slice(ctx.input) {
        b"version" => {
            if value_bytes != b"1.0" {
                return Err(Error::report(
                    ctx.input,
                    ErrorKind::UnsupportedVersion,
                    span,
                    format!(
                        "unsupported xml version '{}'",
                        String::from_utf8_lossy(value_bytes)
                    ),
                ));
            }
        }
        b"encoding" => {
            if value_bytes != b"ASCII" && value_bytes != b"UTF-8" {
                return Err(Error::report(
                    ctx.input,
                    ErrorKind::UnsupportedEncoding,
                    span,
                    format!(
                        "unsupported encoding '{}'",
                        String::from_utf8_lossy(value_bytes)
                    ),
                ));
            }
        }
        b"standalone" => {} // recognized, value ignored
        other => {
            return Err(Error::report(
                ctx.input,
                ErrorKind::MalformedDeclaration,
                span,
                format!(
                    "unrecognized declaration attribute '{}'",
                    String::from_utf8_lossy(other)
                ),
            ));
        }
    }
    Ok(())
}

/// Scan a generic `<?...?>` processing instruction and discard it.
fn skip_proc_instr(ctx: &mut ParseCtx<'_>) -> Result<(), Error> {
    let begin = ctx.lexer.matched.text.begin;
    loop {
        if ctx.lexer.match_token(TokenKind::ProcInstrStop)? {
            let end = ctx.lexer.matched.text.end;
            log::debug!(
                "skipped processing instruction '{}'",
                String::from_utf8_lossy(&ctx.input[begin..end])
            );
            return Ok(());
        }
        if ctx.lexer.current.kind == TokenKind::Eof {
            let end = (begin + 20).min(ctx.input.len());
            return Err(Error::report(
                ctx.input,
                ErrorKind::PrematureEof,
                RawSpan::new(begin, end),
                "EOF while parsing processing instruction".to_string(),
            ));
        }
        ctx.lexer.next_token()?;
    }
}

/// Parse a quoted attribute value and decode its entities.
fn parse_attribute_value(ctx: &mut ParseCtx<'_>) -> Result<Span, Error> {
    let delim = match ctx.lexer.current.kind {
        TokenKind::Quote => '"' as u32,
        TokenKind::Apostrophe => '\'' as u32,
        _ => {
            return Err(Error::report(
                ctx.input,
                ErrorKind::UnexpectedToken,
                ctx.lexer.current.text,
                "expected attribute value enclosed by either ' or \"".to_string(),
            ));
        }
    };
    let open = ctx.lexer.current.text;
    match ctx.lexer.scan_delimited(delim)? {
        Some(raw) => decode_text_span(ctx, raw),
        None => Err(Error::report(
            ctx.input,
            ErrorKind::PrematureEof,
            RawSpan::new(open.begin, ctx.input.len()),
            "EOF while scanning for closing attribute value delimiter".to_string(),
        )),
    }
}

/// Decode a raw text range, zero-copy when it holds no ampersand.
fn decode_text_span(ctx: &mut ParseCtx<'_>, raw: RawSpan) -> Result<Span, Error> {
    let bytes = raw.slice(ctx.input);
    let amps = memchr_iter(b'&', bytes).count();
    match entities::decode(bytes, amps) {
        Ok(None) => Ok(Span::input(raw)),
        Ok(Some(buf)) => Ok(ctx.doc.attach_buffer(buf)),
        Err(e) => Err(Error::report(
            ctx.input,
            ErrorKind::MalformedEntity,
            RawSpan::new(raw.begin + e.begin, raw.begin + e.end),
            e.message,
        )),
    }
}

/// Parse one attribute; `matched` holds its leading name token.
///
/// `xmlns="uri"` and `xmlns:prefix="uri"` are namespace declarations:
/// they go to the resolver and the document's namespace array, never
/// into the attribute arena.
fn parse_attribute(ctx: &mut ParseCtx<'_>) -> Result<(), Error> {
    let mut prefix: Option<RawSpan> = None;
    let mut name = ctx.lexer.matched.text;
    if ctx.lexer.match_token(TokenKind::Colon)? {
        if !ctx.lexer.match_token(TokenKind::Name)? {
            return Err(Error::report(
                ctx.input,
                ErrorKind::UnexpectedToken,
                RawSpan::new(name.begin, ctx.lexer.matched.text.end),
                "expected attribute name after ':'".to_string(),
            ));
        }
        prefix = Some(name);
        name = ctx.lexer.matched.text;
    }

    if !ctx.lexer.match_token(TokenKind::Equal)? {
        return Err(Error::report(
            ctx.input,
            ErrorKind::UnexpectedToken,
            RawSpan::new(name.begin, ctx.lexer.matched.text.end),
            "expected '=' after attribute name".to_string(),
        ));
    }
    let value = parse_attribute_value(ctx)?;

    if let Some(p) = prefix {
        if p.slice(ctx.input) == b"xmlns" {
            if ctx.doc.bytes(value).is_empty() {
                return Err(Error::report(
                    ctx.input,
                    ErrorKind::MalformedAttribute,
                    name,
                    "empty namespace uri".to_string(),
                ));
            }
            let ns = ctx.doc.add_namespace_span(Some(Span::input(name)), value);
            ctx.resolver.declare(name, ns);
            return Ok(());
        }
    }
    if prefix.is_none() && name.slice(ctx.input) == b"xmlns" {
        if ctx.doc.bytes(value).is_empty() {
            return Err(Error::report(
                ctx.input,
                ErrorKind::MalformedAttribute,
                name,
                "empty namespace uri".to_string(),
            ));
        }
        let ns = ctx.doc.add_namespace_span(None, value);
        ctx.resolver.set_default(ns);
        return Ok(());
    }

    ctx.stash.push(StashedAttr {
        prefix,
        name,
        value,
    });
    Ok(())
}

/// Parse `Name [':' Name]` after `<`, then the attribute loop.
fn parse_element_tag_start(
    ctx: &mut ParseCtx<'_>,
) -> Result<(Option<RawSpan>, RawSpan), Error> {
    ctx.lexer
        .expect_token(TokenKind::Name, "expected element name")?;
    let mut prefix = None;
    let mut name = ctx.lexer.matched.text;
    if ctx.lexer.match_token(TokenKind::Colon)? {
        if !ctx.lexer.match_token(TokenKind::Name)? {
            return Err(Error::report(
                ctx.input,
                ErrorKind::UnexpectedToken,
                RawSpan::new(name.begin, ctx.lexer.matched.text.end),
                "expected element name after ':'".to_string(),
            ));
        }
        prefix = Some(name);
        name = ctx.lexer.matched.text;
    }

    // Collect every namespace declaration before resolving anything.
    while ctx.lexer.match_token(TokenKind::Name)? {
        parse_attribute(ctx)?;
    }
    Ok((prefix, name))
}

fn resolve_prefix(ctx: &ParseCtx<'_>, prefix: RawSpan) -> Result<NsId, Error> {
    ctx.resolver.resolve(ctx.input, prefix).ok_or_else(|| {
        Error::report(
            ctx.input,
            ErrorKind::UnknownNamespacePrefix,
            prefix,
            "unable to resolve namespace prefix".to_string(),
        )
    })
}

/// Parse one element; `matched` holds its `<` token.
fn parse_element(ctx: &mut ParseCtx<'_>, parent: Option<NodeId>) -> Result<(), Error> {
    ctx.depth += 1;
    let mark = ctx.resolver.mark();
    let stash_base = ctx.stash.len();

    let result = parse_element_frame(ctx, parent, stash_base);

    // Scope and scratch restore on both success and failure.
    ctx.resolver.release(mark);
    ctx.stash.truncate(stash_base);
    ctx.depth -= 1;
    result
}

fn parse_element_frame(
    ctx: &mut ParseCtx<'_>,
    parent: Option<NodeId>,
    stash_base: usize,
) -> Result<(), Error> {
    if ctx.depth > MAX_DEPTH {
        return Err(Error::report(
            ctx.input,
            ErrorKind::DepthLimitExceeded,
            ctx.lexer.current.text,
            format!("element nesting deeper than {} levels", MAX_DEPTH),
        ));
    }

    let (prefix, name) = parse_element_tag_start(ctx)?;

    // Resolved only now: a default namespace declared on this element
    // applies to the element itself.
    let ns = match prefix {
        Some(p) => Some(resolve_prefix(ctx, p)?),
        None => ctx.resolver.default_ns(),
    };
    let elem = ctx.doc.add_element_span(ns, Span::input(name), parent);

    for i in stash_base..ctx.stash.len() {
        let att = ctx.stash[i];
        let att_ns = match att.prefix {
            Some(p) => Some(resolve_prefix(ctx, p)?),
            None => None,
        };
        ctx.doc
            .add_attribute_span(att_ns, Span::input(att.name), att.value, elem);
    }
    ctx.stash.truncate(stash_base);

    parse_element_contents(ctx, prefix, name, elem)
}

/// Parse element content after the attribute loop: `/>`, or `>` followed
/// by text and child elements up to the matching end tag.
fn parse_element_contents(
    ctx: &mut ParseCtx<'_>,
    elem_prefix: Option<RawSpan>,
    elem_name: RawSpan,
    elem: NodeId,
) -> Result<(), Error> {
    if ctx.lexer.match_token(TokenKind::EmptyTagEnd)? {
        return Ok(()); // leaf tag
    }
    if !ctx.lexer.match_token(TokenKind::TagEnd)? {
        return Err(Error::report(
            ctx.input,
            ErrorKind::UnexpectedToken,
            ctx.lexer.current.text,
            "expected attribute name, '>' or '/>'".to_string(),
        ));
    }

    let tag_begin = ctx.lexer.matched.text.begin;
    // Text is the raw byte range between structural tokens, so
    // whitespace survives untrimmed.
    let mut segment = ctx.lexer.matched.text.end;

    loop {
        if ctx.lexer.match_token(TokenKind::EndTagStart)? {
            flush_text(ctx, segment, ctx.lexer.matched.text.begin, elem)?;
            return parse_end_tag(ctx, elem_prefix, elem_name);
        }

        if ctx.lexer.match_token(TokenKind::TagStart)? {
            flush_text(ctx, segment, ctx.lexer.matched.text.begin, elem)?;
            parse_element(ctx, Some(elem))?;
            segment = ctx.lexer.matched.text.end;
            continue;
        }

        if ctx.lexer.current.kind == TokenKind::Eof {
            let qname = match elem_prefix {
                Some(p) => format!(
                    "{}:{}",
                    String::from_utf8_lossy(p.slice(ctx.input)),
                    String::from_utf8_lossy(elem_name.slice(ctx.input))
                ),
                None => String::from_utf8_lossy(elem_name.slice(ctx.input)).into_owned(),
            };
            return Err(Error::report(
                ctx.input,
                ErrorKind::PrematureEof,
                RawSpan::new(tag_begin, ctx.input.len()),
                format!("EOF while scanning for end of tag '{}'", qname),
            ));
        }

        // Anything else is text content.
        ctx.lexer.next_token()?;
    }
}

/// Parse `Name [':' Name] '>'` of an end tag; prefix and local name must
/// both match the open tag.
fn parse_end_tag(
    ctx: &mut ParseCtx<'_>,
    elem_prefix: Option<RawSpan>,
    elem_name: RawSpan,
) -> Result<(), Error> {
    ctx.lexer
        .expect_token(TokenKind::Name, "expected name in end tag")?;
    let mut end_prefix: Option<RawSpan> = None;
    let mut end_name = ctx.lexer.matched.text;
    if ctx.lexer.match_token(TokenKind::Colon)? {
        end_prefix = Some(end_name);
        ctx.lexer
            .expect_token(TokenKind::Name, "expected name after ':' in end tag")?;
        end_name = ctx.lexer.matched.text;
    }

    let prefix_matches = match (elem_prefix, end_prefix) {
        (None, None) => true,
        (Some(a), Some(b)) => a.slice(ctx.input) == b.slice(ctx.input),
        _ => false,
    };
    if !prefix_matches {
        return Err(Error::report(
            ctx.input,
            ErrorKind::MismatchedEndTag,
            end_prefix.unwrap_or(end_name),
            "end tag prefix does not match open tag".to_string(),
        ));
    }
    if end_name.slice(ctx.input) != elem_name.slice(ctx.input) {
        return Err(Error::report(
            ctx.input,
            ErrorKind::MismatchedEndTag,
            end_name,
            format!(
                "end tag '{}' does not match open tag '{}'",
                String::from_utf8_lossy(end_name.slice(ctx.input)),
                String::from_utf8_lossy(elem_name.slice(ctx.input))
            ),
        ));
    }

    ctx.lexer
        .expect_token(TokenKind::TagEnd, "expected '>' in end tag")
}

/// Emit the text range `[begin, upto)` as child text of `parent`,
/// carving out any comments the tokenizer recorded inside it.
fn flush_text(
    ctx: &mut ParseCtx<'_>,
    begin: usize,
    upto: usize,
    parent: NodeId,
) -> Result<(), Error> {
    let mut segment = begin;
    while ctx.comment_ix < ctx.lexer.comments.len() {
        let comment = ctx.lexer.comments[ctx.comment_ix];
        if comment.end <= segment {
            ctx.comment_ix += 1;
            continue;
        }
        if comment.begin >= upto {
            break;
        }
        emit_text(ctx, segment, comment.begin, parent)?;
        segment = comment.end;
        ctx.comment_ix += 1;
    }
    emit_text(ctx, segment, upto, parent)
}

fn emit_text(
    ctx: &mut ParseCtx<'_>,
    begin: usize,
    upto: usize,
    parent: NodeId,
) -> Result<(), Error> {
    if upto <= begin {
        return Ok(());
    }
    let span = decode_text_span(ctx, RawSpan::new(begin, upto))?;
    ctx.doc.add_text_span(span, parent);
    Ok(())
}
