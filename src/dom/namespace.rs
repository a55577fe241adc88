//! Namespace resolution
//!
//! Stack-based resolver scoped to the element subtree being parsed: a
//! current default namespace plus a stack of prefix bindings. Scopes are
//! snapshotted on element entry and restored on exit (success or
//! failure), which is what makes namespace scope lexical.

use crate::core::span::RawSpan;
use crate::dom::node::NsId;

/// Binding between a prefix (a span of the input) and a namespace index.
#[derive(Debug, Clone, Copy)]
struct NsBinding {
    prefix: RawSpan,
    namespace: NsId,
}

/// Snapshot of the resolver state at element entry.
#[derive(Debug, Clone, Copy)]
pub struct ScopeMark {
    default_ns: Option<NsId>,
    height: usize,
}

/// Stack-based namespace resolver.
#[derive(Debug, Default)]
pub struct NamespaceResolver {
    default_ns: Option<NsId>,
    bindings: Vec<NsBinding>,
}

impl NamespaceResolver {
    pub fn new() -> Self {
        NamespaceResolver {
            default_ns: None,
            bindings: Vec::with_capacity(16),
        }
    }

    /// Snapshot the current scope; pass to [`release`](Self::release) on
    /// leaving the element.
    pub fn mark(&self) -> ScopeMark {
        ScopeMark {
            default_ns: self.default_ns,
            height: self.bindings.len(),
        }
    }

    /// Restore the scope captured by `mark`, dropping any bindings and
    /// default-namespace change declared since.
    pub fn release(&mut self, mark: ScopeMark) {
        self.bindings.truncate(mark.height);
        self.default_ns = mark.default_ns;
    }

    /// Declare a prefix binding for the current scope.
    pub fn declare(&mut self, prefix: RawSpan, namespace: NsId) {
        self.bindings.push(NsBinding { prefix, namespace });
    }

    /// Set the default namespace for the current scope.
    pub fn set_default(&mut self, namespace: NsId) {
        self.default_ns = Some(namespace);
    }

    /// The default namespace in scope, if any.
    #[inline]
    pub fn default_ns(&self) -> Option<NsId> {
        self.default_ns
    }

    /// Resolve a prefix, most recent binding first.
    pub fn resolve(&self, input: &[u8], prefix: RawSpan) -> Option<NsId> {
        let needle = prefix.slice(input);
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix.slice(input) == needle)
            .map(|b| b.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_of(input: &[u8], needle: &[u8]) -> RawSpan {
        let begin = input
            .windows(needle.len())
            .position(|w| w == needle)
            .unwrap();
        RawSpan::new(begin, begin + needle.len())
    }

    #[test]
    fn test_declare_and_resolve() {
        let input = b"svg other";
        let mut resolver = NamespaceResolver::new();
        resolver.declare(span_of(input, b"svg"), 0);
        assert_eq!(resolver.resolve(input, span_of(input, b"svg")), Some(0));
        assert_eq!(resolver.resolve(input, span_of(input, b"other")), None);
    }

    #[test]
    fn test_scope_release() {
        let input = b"foo";
        let mut resolver = NamespaceResolver::new();
        let mark = resolver.mark();
        resolver.declare(span_of(input, b"foo"), 1);
        resolver.set_default(0);
        assert_eq!(resolver.resolve(input, span_of(input, b"foo")), Some(1));
        assert_eq!(resolver.default_ns(), Some(0));

        resolver.release(mark);
        assert_eq!(resolver.resolve(input, span_of(input, b"foo")), None);
        assert_eq!(resolver.default_ns(), None);
    }

    #[test]
    fn test_shadow_binding() {
        // The same prefix bound twice: the most recent binding wins, and
        // releasing the inner scope re-exposes the outer one.
        let input = b"ns ns";
        let outer = RawSpan::new(0, 2);
        let inner = RawSpan::new(3, 5);
        let mut resolver = NamespaceResolver::new();
        resolver.declare(outer, 0);
        let mark = resolver.mark();
        resolver.declare(inner, 1);
        assert_eq!(resolver.resolve(input, outer), Some(1));

        resolver.release(mark);
        assert_eq!(resolver.resolve(input, outer), Some(0));
    }

    #[test]
    fn test_default_restored_without_bindings() {
        let mut resolver = NamespaceResolver::new();
        resolver.set_default(2);
        let mark = resolver.mark();
        resolver.set_default(5);
        resolver.release(mark);
        assert_eq!(resolver.default_ns(), Some(2));
    }
}
