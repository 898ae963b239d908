use thiserror::Error;

/// A row that could not be turned into a segment. The row is skipped and
/// the run continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordWarning {
    #[error("line {line}: missing segment id")]
    MissingId { line: u64 },
    #[error("line {line}: segment {id} has unknown zone type {zone:?}")]
    UnknownZone { line: u64, id: String, zone: String },
    #[error("line {line}: segment {id} has negative spot count {value}")]
    NegativeSpots { line: u64, id: String, value: i64 },
    #[error("line {line}: segment {id} has invalid spot count {value:?}")]
    InvalidSpots { line: u64, id: String, value: String },
    #[error("line {line}: segment {id} appears more than once")]
    DuplicateId { line: u64, id: String },
    #[error("line {line}: segment {id} has no geometry for key {key:?}")]
    Unmatched { line: u64, id: String, key: String },
}

impl RecordWarning {
    pub fn line(&self) -> u64 {
        match self {
            RecordWarning::MissingId { line }
            | RecordWarning::UnknownZone { line, .. }
            | RecordWarning::NegativeSpots { line, .. }
            | RecordWarning::InvalidSpots { line, .. }
            | RecordWarning::DuplicateId { line, .. }
            | RecordWarning::Unmatched { line, .. } => *line,
        }
    }
}
