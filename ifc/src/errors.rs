use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::io;

/// The different kinds of errors for `ifc`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  /// `ColumnLengthMismatch` errors occur during CSV reconstruction,
  /// indicating the decoded columns disagree on row count.
  ColumnLengthMismatch,
  /// `DictionaryMiss` errors occur during decompression, indicating a token
  /// references an id absent from the persisted dictionary.
  DictionaryMiss,
  /// `EndOfStream` errors occur when a bit reader is asked for more bits
  /// than the payload contains.
  EndOfStream,
  /// `FileNotFound` errors indicate the input path does not exist.
  FileNotFound,
  /// `InvalidArgument` errors indicate input data the pipeline does not
  /// accept, e.g. JSON containing floats.
  InvalidArgument,
  /// `InvalidContainer` errors occur during decompression, indicating the
  /// provided file violates the IFC1 format.
  InvalidContainer,
  /// `Io` errors wrap operating system failures other than a missing file.
  Io,
  /// `MalformedTokenStream` errors occur during reconstruction, indicating
  /// the decoded token sequence does not match the strategy's grammar.
  MalformedTokenStream,
  /// `UnknownToken` errors occur during encoding when a token was not seen
  /// while the codebook was built. This is a programmer error.
  UnknownToken,
  /// `UnsupportedFormat` errors indicate the input file's extension maps to
  /// no known strategy.
  UnsupportedFormat,
  /// `UnsupportedVersion` errors indicate a container whose version byte
  /// this library is too old (or too new) to understand.
  UnsupportedVersion,
}

/// The error type used in results for all `ifc` functionality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfcError {
  pub kind: ErrorKind,
  pub message: String,
}

impl IfcError {
  pub(crate) fn new<S: AsRef<str>>(kind: ErrorKind, message: S) -> Self {
    IfcError {
      kind,
      message: message.as_ref().to_string(),
    }
  }

  pub(crate) fn column_length_mismatch<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::ColumnLengthMismatch, message)
  }

  pub(crate) fn dictionary_miss<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::DictionaryMiss, message)
  }

  pub(crate) fn end_of_stream<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::EndOfStream, message)
  }

  pub(crate) fn file_not_found<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::FileNotFound, message)
  }

  pub(crate) fn invalid_argument<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::InvalidArgument, message)
  }

  pub(crate) fn invalid_container<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::InvalidContainer, message)
  }

  pub(crate) fn malformed_token_stream<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::MalformedTokenStream, message)
  }

  pub(crate) fn unknown_token<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::UnknownToken, message)
  }

  pub(crate) fn unsupported_format<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::UnsupportedFormat, message)
  }

  pub(crate) fn unsupported_version<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::UnsupportedVersion, message)
  }
}

impl Display for IfcError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "ifc {:?} error: {}", self.kind, &self.message)
  }
}

impl Error for IfcError {}

impl From<io::Error> for IfcError {
  fn from(err: io::Error) -> Self {
    let kind = match err.kind() {
      io::ErrorKind::NotFound => ErrorKind::FileNotFound,
      _ => ErrorKind::Io,
    };
    IfcError::new(kind, err.to_string())
  }
}

pub type IfcResult<T> = Result<T, IfcError>;
