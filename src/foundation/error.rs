pub type FormworkResult<T> = Result<T, FormworkError>;

/// Fatal errors for a resolution pass.
///
/// Authoring mistakes (dangling references, claim conflicts, bad bindings) are
/// deliberately *not* represented here: those are logged, recorded as
/// [`StructuralProblem`](crate::layout::lookups::StructuralProblem)s or
/// validation issues, and the pass continues degraded. Only genuine internal
/// invariant violations (a required lookup missing) abort the pass.
#[derive(thiserror::Error, Debug)]
pub enum FormworkError {
    #[error("lookup failed: {0}")]
    LookupNotFound(String),

    #[error("component '{id}': expected type '{expected}', found '{actual}'")]
    TypeMismatch {
        id: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Expression(#[from] crate::expression::eval::ExprError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FormworkError {
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::LookupNotFound(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            FormworkError::lookup("no such page 'x'")
                .to_string()
                .contains("lookup failed:")
        );
        let err = FormworkError::TypeMismatch {
            id: "a".into(),
            expected: "RepeatingGroup".into(),
            actual: "Input".into(),
        };
        assert!(err.to_string().contains("expected type 'RepeatingGroup'"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = FormworkError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
