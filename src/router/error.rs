/// Errors raised while building a routing tree.
///
/// A tree that produced any of these must not be served.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("unbalanced braces in pattern {pattern:?}")]
    UnbalancedBraces { pattern: Box<str> },

    #[error("capture name can not be empty: pattern = {pattern:?}")]
    EmptyCaptureName { pattern: Box<str> },

    #[error("invalid regex in pattern {pattern:?}: {source}")]
    InvalidRegex {
        pattern: Box<str>,
        #[source]
        source: regex::Error,
    },

    #[error("node {parent:?} already has a child named {name:?}")]
    DuplicateChild { parent: Box<str>, name: Box<str> },

    #[error("attaching {name:?} would make it its own ancestor")]
    CyclicAttach { name: Box<str> },

    #[error("node {name:?} can not have children")]
    NotAttachable { name: Box<str> },

    #[error("default page of {name:?} resolves back to itself")]
    SelfReferentialDefault { name: Box<str> },

    #[error("invalid default page for {name:?}")]
    InvalidDefault { name: Box<str> },

    #[error("unknown node kind {kind:?}")]
    UnknownKind { kind: Box<str> },

    #[error("node kind {kind:?} requires option {option:?}")]
    MissingOption {
        kind: Box<str>,
        option: &'static str,
    },

    #[error("node id does not belong to this tree")]
    UnknownNode,
}
