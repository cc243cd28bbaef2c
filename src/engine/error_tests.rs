//! Unit tests for engine error types

#[cfg(test)]
mod tests {
    use crate::engine::error::EngineError;
    use std::error::Error;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_not_found_display() {
        let error = EngineError::NotFound(PathBuf::from("photo.jpg"));
        assert_eq!(error.to_string(), "File not found: photo.jpg");
    }

    #[test]
    fn test_io_error_keeps_source() {
        let error = EngineError::io("a/b.png", io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let display = error.to_string();
        assert!(display.contains("a/b.png"));
        assert!(display.contains("denied"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_cancelled() {
        let error = EngineError::Cancelled;
        assert!(error.is_cancelled());
        assert_eq!(error.to_string(), "Operation cancelled");
        assert!(!EngineError::Store("boom".into()).is_cancelled());
    }

    #[test]
    fn test_name_resolution_exhausted_display() {
        let error = EngineError::NameResolutionExhausted {
            file: PathBuf::from("x.jpg"),
            attempts: 3,
        };
        assert_eq!(
            error.to_string(),
            "No destination name available for x.jpg after 3 attempts"
        );
    }

    #[test]
    fn test_invalid_tag_name_debug() {
        let error = EngineError::InvalidTagName("../up".into());
        let debug = format!("{error:?}");
        assert!(debug.contains("InvalidTagName"));
        assert!(error.to_string().contains("\"../up\""));
    }
}
