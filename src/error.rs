use std::io;
use std::path::PathBuf;

/// Failures outside the schema itself. Problems in the schema are
/// diagnostics, and only surface here as [`Error::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("compilation failed with {count} error(s)")]
    Failed { count: usize },
    #[error("could not write diagnostics")]
    Output(#[from] io::Error),
}

#[test]
fn messages() {
    let error = Error::Read {
        path: PathBuf::from("missing.thrift"),
        source: io::Error::from(io::ErrorKind::NotFound),
    };
    assert_eq!(error.to_string(), "could not read missing.thrift");
    assert!(std::error::Error::source(&error).is_some());
    assert_eq!(
        Error::Failed { count: 2 }.to_string(),
        "compilation failed with 2 error(s)"
    );
}
