use std::fmt;

/// Fatal structural failure in the source tree or its extracted archives:
/// unexpected extraction root count, an absent partition root, a malformed
/// numbered directory name, or a missing required table set.
#[derive(Debug, Clone)]
pub struct StructuralError(pub String);

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "structural error: {}", self.0)
    }
}

impl std::error::Error for StructuralError {}
