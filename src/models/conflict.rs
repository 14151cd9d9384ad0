use serde::{Deserialize, Serialize};

/// Kinds of consistency findings a candidate plan can raise. Boundary
/// touches are informational; every other kind blocks a save.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConflictKind {
    TimeOrder,
    TimeOverlap,
    BoundaryTouch,
    DepartureContinuity,
    ArrivalContinuity,
}

impl ConflictKind {
    pub fn is_blocking(self) -> bool {
        !matches!(self, ConflictKind::BoundaryTouch)
    }
}

/// Candidate fields a finding is attributed to, for field-level display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConflictField {
    StartTime,
    EndTime,
    DepartureBaseId,
    ArrivalBaseId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanConflict {
    pub kind: ConflictKind,
    pub fields: Vec<ConflictField>,
    pub message: String,
    pub blocking: bool,
}

impl PlanConflict {
    pub fn new(kind: ConflictKind, fields: Vec<ConflictField>, message: impl Into<String>) -> Self {
        Self {
            kind,
            fields,
            message: message.into(),
            blocking: kind.is_blocking(),
        }
    }

    pub fn touches_field(&self, field: ConflictField) -> bool {
        self.fields.contains(&field)
    }
}

/// Aggregated validator output for one candidate plan. Ordering is
/// deterministic: time-order findings, then overlaps in sibling time
/// order, then departure/arrival continuity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub conflicts: Vec<PlanConflict>,
}

impl ConflictReport {
    pub fn new(conflicts: Vec<PlanConflict>) -> Self {
        Self { conflicts }
    }

    /// A candidate may be committed when nothing blocking was found;
    /// warnings alone do not stop a save.
    pub fn passes(&self) -> bool {
        !self.conflicts.iter().any(|conflict| conflict.blocking)
    }

    pub fn blocking(&self) -> Vec<&PlanConflict> {
        self.conflicts
            .iter()
            .filter(|conflict| conflict.blocking)
            .collect()
    }

    pub fn warnings(&self) -> Vec<&PlanConflict> {
        self.conflicts
            .iter()
            .filter(|conflict| !conflict.blocking)
            .collect()
    }

    pub fn messages_for(&self, field: ConflictField) -> Vec<&str> {
        self.conflicts
            .iter()
            .filter(|conflict| conflict.touches_field(field))
            .map(|conflict| conflict.message.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }
}
