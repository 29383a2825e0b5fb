use std::path::Path;

use crate::errors::{IfcError, IfcResult};

/// The structural kind of an input file, which selects the tokenization
/// strategy. The discriminant doubles as the container's strategy id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
  Json = 1,
  Csv = 2,
  Log = 3,
  Text = 4,
}

impl FileKind {
  pub fn strategy_id(self) -> u8 {
    self as u8
  }

  pub fn from_strategy_id(id: u8) -> IfcResult<FileKind> {
    match id {
      1 => Ok(FileKind::Json),
      2 => Ok(FileKind::Csv),
      3 => Ok(FileKind::Log),
      4 => Ok(FileKind::Text),
      _ => Err(IfcError::invalid_container(format!(
        "unknown strategy id {}",
        id
      ))),
    }
  }
}

/// Classifies `path` by its lowercased extension. No content sniffing.
pub fn detect(path: &Path) -> IfcResult<FileKind> {
  if !path.exists() {
    return Err(IfcError::file_not_found(format!(
      "file not found: {}",
      path.display()
    )));
  }

  let ext = path
    .extension()
    .map(|e| e.to_string_lossy().to_lowercase())
    .unwrap_or_default();
  match ext.as_str() {
    "json" => Ok(FileKind::Json),
    "csv" => Ok(FileKind::Csv),
    "log" => Ok(FileKind::Log),
    "txt" | "md" => Ok(FileKind::Text),
    _ => Err(IfcError::unsupported_format(format!(
      "unsupported file format .{} (supported: .json, .csv, .log, .txt, .md)",
      ext
    ))),
  }
}
