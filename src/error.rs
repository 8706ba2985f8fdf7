//! Error types for the harness.
//!
//! Two layers: `ToolError` covers everything that can go wrong invoking an
//! external collaborator (spawn failure, non-success exit where success is
//! required, unparseable output), and `CaseError` classifies the ways a
//! single test case can fail. All case-level errors are handled inside the
//! case runner; none abort the run.

use thiserror::Error;

/// Errors from invoking an external collaborator tool.
///
/// A non-zero exit from the compiler or the rename tool is *not* a
/// `ToolError` — those tools report pass/fail through their exit status and
/// the runner inspects it. `Unsuccessful` is reserved for tools whose output
/// the harness must parse (smap generator, identifier lister), where a
/// failing exit means there is nothing valid to parse.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool process could not be started at all.
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// A tool that must succeed exited with a failure status.
    #[error("{tool} exited unsuccessfully (code {code:?}): {stderr}")]
    Unsuccessful {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Tool output failed to deserialize as the expected structure.
    #[error("malformed {tool} output: {source}")]
    Malformed {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO error while communicating with the tool.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tool invocations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Classification of a single test case failure.
#[derive(Debug, Error)]
pub enum CaseError {
    /// A collaborator invocation failed or produced malformed output.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The semantic map does not cover every identifier occurrence.
    #[error("semantic map does not cover all identifier occurrences")]
    CompletenessViolation,

    /// The rename tool rejected an occurrence.
    #[error("rename tool rejected offset {offset}")]
    RenameFailure { offset: usize },

    /// The rewritten source no longer compiles.
    #[error("renamed source at offset {offset} does not compile")]
    PostRenameCompileFailure { offset: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_display_includes_tool_name() {
        let err = ToolError::Unsuccessful {
            tool: "listidents".to_string(),
            code: Some(1),
            stderr: String::new(),
        };
        assert!(err.to_string().contains("listidents"));
    }

    #[test]
    fn malformed_output_wraps_serde_error() {
        let serde_err = serde_json::from_str::<Vec<u32>>("not json").unwrap_err();
        let err = ToolError::Malformed {
            tool: "smap".to_string(),
            source: serde_err,
        };
        assert!(err.to_string().starts_with("malformed smap output"));
    }

    #[test]
    fn case_error_from_tool_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = CaseError::from(ToolError::Io(io_err));
        assert!(matches!(err, CaseError::Tool(_)));
    }

    #[test]
    fn rename_failure_display_names_offset() {
        let err = CaseError::RenameFailure { offset: 42 };
        assert_eq!(err.to_string(), "rename tool rejected offset 42");
    }
}
