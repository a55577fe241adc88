//! Parse errors and diagnostics
//!
//! Every failure carries a status kind, the byte span responsible and a
//! human-readable message. Errors are constructed at the point of
//! detection, where a source snippet with a caret underline is rendered
//! and emitted through the `log` facade; the embedding application
//! decides where that diagnostic goes.

use crate::core::span::RawSpan;

/// Status of a failed parse.
///
/// The first error encountered aborts the whole parse; there is no
/// recovery or multi-error collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A prefixed name referenced a prefix with no binding in scope.
    UnknownNamespacePrefix,
    /// The XML declaration carried a `version` other than `"1.0"`.
    UnsupportedVersion,
    /// The XML declaration carried an `encoding` other than `ASCII` or `UTF-8`.
    UnsupportedEncoding,
    /// A byte sequence that is not valid UTF-8.
    MalformedUtf8,
    /// A namespace declaration with an empty URI, or similar attribute misuse.
    MalformedAttribute,
    /// Input ended in the middle of a construct.
    PrematureEof,
    /// An unrecognized attribute in the `<?xml ...?>` declaration.
    MalformedDeclaration,
    /// A token that does not fit the grammar at this point.
    UnexpectedToken,
    /// An unterminated, unrecognized or out-of-range entity.
    MalformedEntity,
    /// An end tag whose prefix or name does not match the open element.
    MismatchedEndTag,
    /// Element nesting exceeded the recursion guard.
    DepthLimitExceeded,
}

/// A parse failure: status kind, offending byte span and message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    span: RawSpan,
    message: String,
    snippet: String,
}

// Window of context rendered on each side of the offending span.
const CONTEXT: usize = 10;

impl Error {
    /// Build an error, rendering its source snippet and emitting the
    /// diagnostic through the `log` facade at the point of detection.
    pub(crate) fn report(input: &[u8], kind: ErrorKind, span: RawSpan, message: String) -> Self {
        let snippet = context_snippet(input, span);
        log::error!("{}\n{}", message, snippet);
        Error {
            kind,
            span,
            message,
            snippet,
        }
    }

    /// The status kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The byte range of the input responsible for the failure.
    #[inline]
    pub fn span(&self) -> (usize, usize) {
        (self.span.begin, self.span.end)
    }

    /// The human-readable message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// A line of source context with a caret underline beneath the
    /// offending span, as emitted to the diagnostic sink.
    #[inline]
    pub fn context_snippet(&self) -> &str {
        &self.snippet
    }
}

/// Render a window of the input around `span` with a `^^^` underline.
fn context_snippet(input: &[u8], span: RawSpan) -> String {
    let begin = span.begin.min(input.len());
    let end = span.end.min(input.len()).max(begin);

    let window_begin = begin.saturating_sub(CONTEXT);
    let window_end = (end + CONTEXT).min(input.len());
    // Underline at most CONTEXT bytes of a long span.
    let underline_end = end.min(begin + CONTEXT);

    let mut line = String::with_capacity(window_end - window_begin);
    for &b in &input[window_begin..window_end] {
        // Control bytes would break underline alignment.
        if b < 0x20 {
            line.push(' ');
        } else {
            line.push(b as char);
        }
    }

    let mut out = line;
    out.push('\n');
    for _ in 0..(begin - window_begin) {
        out.push('-');
    }
    for _ in 0..(underline_end - begin).max(1) {
        out.push('^');
    }
    out
}
