//! Conversions between generated prost enums (which always carry an
//! `_UNSPECIFIED = 0` member because proto3 requires a zero default) and the
//! internal domain types they represent.

use thiserror::Error;

use crate::{ControlSignalType, JobStatus as WireJobStatusRaw};
use hodei_core::JobStatus as InternalJobStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireMappingError {
    #[error("unspecified or unknown wire job status: {0}")]
    UnknownJobStatus(i32),
    #[error("unspecified or unknown control signal type: {0}")]
    UnknownControlSignal(i32),
    #[error("internal job status {0:?} has no wire representation")]
    NoWireRepresentation(InternalJobStatus),
}

/// A validated, non-`UNSPECIFIED` wire job status (spec §6: "bijective
/// except RUNNING <-> RUNNING").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireJobStatus {
    Queued,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl WireJobStatus {
    pub fn from_i32(raw: i32) -> Result<Self, WireMappingError> {
        match WireJobStatusRaw::try_from(raw).ok() {
            Some(WireJobStatusRaw::Queued) => Ok(Self::Queued),
            Some(WireJobStatusRaw::Running) => Ok(Self::Running),
            Some(WireJobStatusRaw::Success) => Ok(Self::Success),
            Some(WireJobStatusRaw::Failed) => Ok(Self::Failed),
            Some(WireJobStatusRaw::Cancelled) => Ok(Self::Cancelled),
            _ => Err(WireMappingError::UnknownJobStatus(raw)),
        }
    }

    pub fn to_internal(self) -> InternalJobStatus {
        match self {
            WireJobStatus::Queued => InternalJobStatus::Queued,
            WireJobStatus::Running => InternalJobStatus::Running,
            WireJobStatus::Success => InternalJobStatus::Completed,
            WireJobStatus::Failed => InternalJobStatus::Failed,
            WireJobStatus::Cancelled => InternalJobStatus::Cancelled,
        }
    }

    pub fn from_internal(status: InternalJobStatus) -> Result<Self, WireMappingError> {
        match status {
            InternalJobStatus::Queued => Ok(Self::Queued),
            InternalJobStatus::Running => Ok(Self::Running),
            InternalJobStatus::Completed => Ok(Self::Success),
            InternalJobStatus::Failed => Ok(Self::Failed),
            InternalJobStatus::Cancelled => Ok(Self::Cancelled),
            other => Err(WireMappingError::NoWireRepresentation(other)),
        }
    }
}

/// A validated, non-`UNSPECIFIED` control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Cancel,
    Pause,
    Resume,
}

impl ControlKind {
    pub fn from_i32(raw: i32) -> Result<Self, WireMappingError> {
        match ControlSignalType::try_from(raw).ok() {
            Some(ControlSignalType::Cancel) => Ok(Self::Cancel),
            Some(ControlSignalType::Pause) => Ok(Self::Pause),
            Some(ControlSignalType::Resume) => Ok(Self::Resume),
            _ => Err(WireMappingError::UnknownControlSignal(raw)),
        }
    }
}
