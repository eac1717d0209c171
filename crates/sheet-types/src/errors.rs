/// Errors raised when textual shape parameters are validated at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unrecognized base shape archetype: {name:?}")]
    UnrecognizedArchetype { name: String },

    #[error("invalid origin anchor: {text:?} (expected e.g. \"+X,-Y\" or \"0,0\")")]
    InvalidOriginAnchor { text: String },
}
