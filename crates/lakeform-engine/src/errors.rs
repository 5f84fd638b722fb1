//! Run-level error model.

use lakeform_types::{ErrorClass, Stage, TransformError};

/// Error returned by a transformation run.
///
/// `Stage` wraps a typed [`TransformError`] together with the stage that
/// reported it. The run stops at that stage; nothing after it executes.
///
/// `Infrastructure` wraps opaque host-side failures (definition file I/O,
/// YAML parsing, store setup) that happen outside the five stages.
#[derive(Debug)]
pub enum PipelineError {
    /// Typed failure from one of the five stages.
    Stage { stage: Stage, error: TransformError },
    /// Infrastructure error (file I/O, YAML, store setup, etc.)
    Infrastructure(anyhow::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stage { stage, error } => write!(f, "{stage} stage failed: {error}"),
            Self::Infrastructure(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Stage { error, .. } => Some(error),
            Self::Infrastructure(e) => Some(e.as_ref()),
        }
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(e: anyhow::Error) -> Self {
        Self::Infrastructure(e)
    }
}

impl PipelineError {
    pub(crate) fn at(stage: Stage) -> impl FnOnce(TransformError) -> Self {
        move |error| Self::Stage { stage, error }
    }

    /// Stage that failed, if the failure came from a stage.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            Self::Infrastructure(_) => None,
        }
    }

    /// Error class of a stage failure.
    pub fn class(&self) -> Option<ErrorClass> {
        self.as_transform_error().map(TransformError::class)
    }

    /// Runs have no retry semantics: a failed run restarts from binding.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Returns the typed stage error if this is a `Stage` variant.
    pub fn as_transform_error(&self) -> Option<&TransformError> {
        match self {
            Self::Stage { error, .. } => Some(error),
            Self::Infrastructure(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_display_names_stage() {
        let err = PipelineError::Stage {
            stage: Stage::Bind,
            error: TransformError::UnknownTable {
                table: "tableone".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("bind stage failed"), "got: {msg}");
        assert!(msg.contains("tableone"), "got: {msg}");
        assert_eq!(err.stage(), Some(Stage::Bind));
        assert_eq!(err.class(), Some(ErrorClass::Resolution));
    }

    #[test]
    fn test_infrastructure_from_anyhow() {
        let pe: PipelineError = anyhow::anyhow!("definition unreadable").into();
        assert!(matches!(pe, PipelineError::Infrastructure(_)));
        assert!(pe.stage().is_none());
        assert!(pe.as_transform_error().is_none());
        assert!(pe.to_string().contains("definition unreadable"));
    }

    #[test]
    fn test_never_retryable() {
        let err = PipelineError::at(Stage::Write)(TransformError::WriteConflict {
            table: "DimExample".into(),
            reason: "lineage mismatch".into(),
        });
        assert!(!err.is_retryable());
        assert_eq!(err.class(), Some(ErrorClass::Persistence));
    }
}
