use std::collections::HashMap;

use tracing::debug;

use crate::error::AppResult;
use crate::models::conflict::{ConflictField, ConflictKind, ConflictReport, PlanConflict};
use crate::models::operation_plan::OperationPlanRecord;
use crate::services::timeline::{self, PlanTimes};

/// Base-chain continuity is only enforced across directly adjacent days;
/// over longer unscheduled gaps the vehicle may be repositioned freely.
pub const MAX_CONTINUITY_GAP_DAYS: i64 = 1;

/// Checks one candidate plan against the vehicle's existing plans. Pure
/// over the snapshot it is given: no I/O, deterministic output, so
/// validating the same candidate twice yields the same report. A sibling
/// carrying the candidate's own id (an edit) is excluded.
pub fn validate_candidate(
    candidate: &OperationPlanRecord,
    existing_plans: &[OperationPlanRecord],
    base_names: &HashMap<String, String>,
) -> AppResult<ConflictReport> {
    let candidate_times = timeline::plan_times(candidate)?;
    let mut conflicts = Vec::new();

    if candidate_times.start_date == candidate_times.end_date
        && candidate_times.window.end_min <= candidate_times.window.start_min
    {
        conflicts.push(PlanConflict::new(
            ConflictKind::TimeOrder,
            vec![ConflictField::StartTime, ConflictField::EndTime],
            "同日计划的结束时刻必须晚于开始时刻",
        ));
    }

    let mut siblings: Vec<(&OperationPlanRecord, PlanTimes)> = Vec::new();
    for plan in existing_plans {
        if plan.id == candidate.id {
            continue;
        }
        siblings.push((plan, timeline::plan_times(plan)?));
    }
    siblings.sort_by_key(|(_, times)| (times.window.start_min, times.window.end_min));

    conflicts.extend(check_overlap(&candidate_times, &siblings));
    conflicts.extend(check_continuity(
        candidate,
        &candidate_times,
        &siblings,
        base_names,
    ));

    debug!(
        target: "app::validation",
        vehicle_id = %candidate.vehicle_id,
        siblings = siblings.len(),
        conflicts = conflicts.len(),
        "candidate validated"
    );

    Ok(ConflictReport::new(conflicts))
}

/// Time-window comparison against every sibling sharing a calendar day.
/// Real intersections block; exact endpoint contact is only a warning,
/// since adjacent shifts are expected to abut.
pub fn check_overlap(
    candidate: &PlanTimes,
    siblings: &[(&OperationPlanRecord, PlanTimes)],
) -> Vec<PlanConflict> {
    let mut conflicts = Vec::new();

    for (_, times) in siblings {
        if !timeline::shares_calendar_day(candidate, times) {
            continue;
        }

        if candidate.window.overlaps(&times.window) {
            conflicts.push(PlanConflict::new(
                ConflictKind::TimeOverlap,
                vec![ConflictField::StartTime, ConflictField::EndTime],
                format!("与既有计划（{}）时间重叠", timeline::describe_window(times)),
            ));
        } else if candidate.window.touches(&times.window) {
            let field = if candidate.window.end_min == times.window.start_min {
                ConflictField::EndTime
            } else {
                ConflictField::StartTime
            };
            conflicts.push(PlanConflict::new(
                ConflictKind::BoundaryTouch,
                vec![field],
                format!("与既有计划（{}）时间相接", timeline::describe_window(times)),
            ));
        }
    }

    conflicts
}

/// Base-chain check: the candidate's departure base must match the arrival
/// base of its chronological predecessor, and its arrival base the
/// departure base of its successor, whenever the neighbor is at most one
/// calendar day away and both sides are known.
pub fn check_continuity(
    candidate: &OperationPlanRecord,
    candidate_times: &PlanTimes,
    siblings: &[(&OperationPlanRecord, PlanTimes)],
    base_names: &HashMap<String, String>,
) -> Vec<PlanConflict> {
    let mut conflicts = Vec::new();

    let previous = siblings
        .iter()
        .filter(|(_, times)| times.window.end_min < candidate_times.window.start_min)
        .max_by_key(|(_, times)| (times.window.end_min, times.window.start_min));

    if let Some((previous_plan, previous_times)) = previous {
        let gap = timeline::days_between(previous_times.end_date, candidate_times.start_date);
        if gap <= MAX_CONTINUITY_GAP_DAYS {
            if let (Some(required), Some(chosen)) = (
                previous_plan.arrival_base_id.as_deref(),
                candidate.departure_base_id.as_deref(),
            ) {
                if required != chosen {
                    conflicts.push(PlanConflict::new(
                        ConflictKind::DepartureContinuity,
                        vec![ConflictField::DepartureBaseId],
                        format!(
                            "出发基地需与前一计划的到达基地一致（应为 {}）",
                            base_display(base_names, required)
                        ),
                    ));
                }
            }
        }
    }

    let next = siblings
        .iter()
        .filter(|(_, times)| times.window.start_min > candidate_times.window.end_min)
        .min_by_key(|(_, times)| (times.window.start_min, times.window.end_min));

    if let Some((next_plan, next_times)) = next {
        let gap = timeline::days_between(candidate_times.end_date, next_times.start_date);
        if gap <= MAX_CONTINUITY_GAP_DAYS {
            if let (Some(required), Some(chosen)) = (
                next_plan.departure_base_id.as_deref(),
                candidate.arrival_base_id.as_deref(),
            ) {
                if required != chosen {
                    conflicts.push(PlanConflict::new(
                        ConflictKind::ArrivalContinuity,
                        vec![ConflictField::ArrivalBaseId],
                        format!(
                            "到达基地需与后一计划的出发基地一致（应为 {}）",
                            base_display(base_names, required)
                        ),
                    ));
                }
            }
        }
    }

    conflicts
}

fn base_display<'a>(base_names: &'a HashMap<String, String>, base_id: &'a str) -> &'a str {
    base_names.get(base_id).map_or(base_id, String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::operation_plan::ShiftType;

    fn plan(
        id: &str,
        dates: (&str, &str),
        times: (&str, &str),
        bases: (Option<&str>, Option<&str>),
    ) -> OperationPlanRecord {
        OperationPlanRecord {
            id: id.into(),
            vehicle_id: "v1".into(),
            start_date: dates.0.into(),
            end_date: dates.1.into(),
            shift_type: ShiftType::Day,
            start_time: times.0.into(),
            end_time: times.1.into(),
            departure_base_id: bases.0.map(Into::into),
            arrival_base_id: bases.1.map(Into::into),
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn maintenance_plan(id: &str, dates: (&str, &str), times: (&str, &str)) -> OperationPlanRecord {
        OperationPlanRecord {
            shift_type: ShiftType::Maintenance,
            ..plan(id, dates, times, (None, None))
        }
    }

    fn names() -> HashMap<String, String> {
        let mut names = HashMap::new();
        names.insert("base-x".to_string(), "西山基地".to_string());
        names.insert("base-y".to_string(), "东环基地".to_string());
        names.insert("base-z".to_string(), "南港基地".to_string());
        names
    }

    #[test]
    fn same_day_overlap_flags_both_time_fields() {
        let existing = plan(
            "a",
            ("2024-05-01", "2024-05-01"),
            ("08:00", "17:00"),
            (Some("base-x"), Some("base-x")),
        );
        let candidate = plan(
            "b",
            ("2024-05-01", "2024-05-01"),
            ("16:00", "20:00"),
            (Some("base-x"), Some("base-x")),
        );

        let report =
            validate_candidate(&candidate, &[existing], &names()).expect("validate");
        assert!(!report.passes());
        let overlap = report
            .conflicts
            .iter()
            .find(|c| c.kind == ConflictKind::TimeOverlap)
            .expect("overlap conflict");
        assert!(overlap.touches_field(ConflictField::StartTime));
        assert!(overlap.touches_field(ConflictField::EndTime));
        assert!(overlap.message.contains("2024-05-01 08:00〜17:00"));
        assert_eq!(report.messages_for(ConflictField::StartTime).len(), 1);
    }

    #[test]
    fn overnight_continuation_is_an_overlap() {
        // The vehicle is still engaged in the previous day's shift through
        // midnight, so a next-day candidate inside the extended window
        // must be rejected.
        let overnight = plan(
            "a",
            ("2024-05-01", "2024-05-02"),
            ("20:00", "05:00"),
            (Some("base-x"), Some("base-y")),
        );
        let candidate = plan(
            "b",
            ("2024-05-02", "2024-05-02"),
            ("00:00", "03:00"),
            (Some("base-y"), Some("base-y")),
        );

        let report =
            validate_candidate(&candidate, &[overnight], &names()).expect("validate");
        assert!(report
            .conflicts
            .iter()
            .any(|c| c.kind == ConflictKind::TimeOverlap));
    }

    #[test]
    fn disjoint_windows_pass_cleanly() {
        let existing = plan(
            "a",
            ("2024-05-01", "2024-05-01"),
            ("08:00", "12:00"),
            (Some("base-x"), Some("base-x")),
        );
        let candidate = plan(
            "b",
            ("2024-05-01", "2024-05-01"),
            ("13:00", "15:00"),
            (Some("base-x"), Some("base-x")),
        );

        let report =
            validate_candidate(&candidate, &[existing], &names()).expect("validate");
        assert!(report.is_empty());
    }

    #[test]
    fn boundary_touch_warns_without_blocking() {
        let existing = plan(
            "a",
            ("2024-05-01", "2024-05-01"),
            ("08:00", "17:00"),
            (Some("base-x"), Some("base-x")),
        );
        let candidate = plan(
            "b",
            ("2024-05-01", "2024-05-01"),
            ("17:00", "20:00"),
            (Some("base-x"), Some("base-x")),
        );

        let report =
            validate_candidate(&candidate, &[existing], &names()).expect("validate");
        assert!(report.passes());
        let warning = report
            .conflicts
            .iter()
            .find(|c| c.kind == ConflictKind::BoundaryTouch)
            .expect("boundary warning");
        assert!(!warning.blocking);
        assert_eq!(warning.fields, vec![ConflictField::StartTime]);
    }

    #[test]
    fn departure_must_chain_from_previous_arrival() {
        let previous = plan(
            "a",
            ("2024-05-01", "2024-05-01"),
            ("08:00", "17:00"),
            (Some("base-x"), Some("base-y")),
        );
        let candidate = plan(
            "b",
            ("2024-05-02", "2024-05-02"),
            ("08:00", "17:00"),
            (Some("base-z"), Some("base-z")),
        );

        let report =
            validate_candidate(&candidate, &[previous], &names()).expect("validate");
        let conflict = report
            .conflicts
            .iter()
            .find(|c| c.kind == ConflictKind::DepartureContinuity)
            .expect("departure conflict");
        assert_eq!(conflict.fields, vec![ConflictField::DepartureBaseId]);
        assert!(conflict.message.contains("东环基地"));
    }

    #[test]
    fn arrival_must_chain_into_next_departure() {
        let next = plan(
            "a",
            ("2024-05-03", "2024-05-03"),
            ("08:00", "17:00"),
            (Some("base-z"), Some("base-z")),
        );
        let candidate = plan(
            "b",
            ("2024-05-02", "2024-05-02"),
            ("08:00", "17:00"),
            (Some("base-y"), Some("base-y")),
        );

        let report = validate_candidate(&candidate, &[next], &names()).expect("validate");
        let conflict = report
            .conflicts
            .iter()
            .find(|c| c.kind == ConflictKind::ArrivalContinuity)
            .expect("arrival conflict");
        assert_eq!(conflict.fields, vec![ConflictField::ArrivalBaseId]);
        assert!(conflict.message.contains("南港基地"));
    }

    #[test]
    fn continuity_lapses_beyond_one_day_gap() {
        let previous = plan(
            "a",
            ("2024-05-01", "2024-05-01"),
            ("08:00", "17:00"),
            (Some("base-x"), Some("base-y")),
        );
        let candidate = plan(
            "b",
            ("2024-05-04", "2024-05-04"),
            ("08:00", "17:00"),
            (Some("base-z"), Some("base-z")),
        );

        let report =
            validate_candidate(&candidate, &[previous], &names()).expect("validate");
        assert!(report.is_empty());
    }

    #[test]
    fn maintenance_without_bases_skips_continuity() {
        let previous = maintenance_plan("a", ("2024-05-01", "2024-05-01"), ("08:00", "17:00"));
        let candidate = plan(
            "b",
            ("2024-05-02", "2024-05-02"),
            ("08:00", "17:00"),
            (Some("base-z"), Some("base-z")),
        );

        let report =
            validate_candidate(&candidate, &[previous], &names()).expect("validate");
        assert!(report.is_empty());
    }

    #[test]
    fn editing_a_plan_excludes_itself() {
        let stored = plan(
            "a",
            ("2024-05-01", "2024-05-01"),
            ("08:00", "17:00"),
            (Some("base-x"), Some("base-x")),
        );
        // Same id, shifted by an hour; must not conflict with its own
        // stored version.
        let edited = plan(
            "a",
            ("2024-05-01", "2024-05-01"),
            ("09:00", "18:00"),
            (Some("base-x"), Some("base-x")),
        );

        let report = validate_candidate(&edited, &[stored], &names()).expect("validate");
        assert!(report.is_empty());
    }

    #[test]
    fn reversed_same_day_times_are_a_time_order_conflict() {
        let candidate = plan(
            "b",
            ("2024-05-01", "2024-05-01"),
            ("17:00", "08:00"),
            (Some("base-x"), Some("base-x")),
        );

        let report = validate_candidate(&candidate, &[], &names()).expect("validate");
        assert!(!report.passes());
        assert_eq!(report.conflicts[0].kind, ConflictKind::TimeOrder);
    }

    #[test]
    fn validation_is_idempotent() {
        let existing = vec![
            plan(
                "a",
                ("2024-05-01", "2024-05-02"),
                ("20:00", "05:00"),
                (Some("base-x"), Some("base-y")),
            ),
            plan(
                "c",
                ("2024-05-03", "2024-05-03"),
                ("08:00", "17:00"),
                (Some("base-z"), Some("base-z")),
            ),
        ];
        let candidate = plan(
            "b",
            ("2024-05-02", "2024-05-02"),
            ("02:00", "10:00"),
            (Some("base-y"), Some("base-y")),
        );

        let first = validate_candidate(&candidate, &existing, &names()).expect("validate");
        let second = validate_candidate(&candidate, &existing, &names()).expect("validate");
        assert_eq!(first, second);
        assert!(!first.passes());
    }
}
