//! One week of operation planning for a single vehicle: building a chained
//! schedule, rejecting the edits a dispatcher must not make, and deriving
//! detention locations for unplanned days.

use railops::db::DbPool;
use railops::error::AppError;
use railops::models::fleet::{BaseCreateInput, VehicleCreateInput};
use railops::models::operation_plan::{PlanCreateInput, PlanUpdateInput, ShiftType};
use railops::services::detention_service::Detention;
use railops::services::fleet_service::FleetService;
use railops::services::plan_service::PlanService;
use tempfile::tempdir;

fn plan_input(
    vehicle_id: &str,
    shift_type: ShiftType,
    dates: (&str, Option<&str>),
    times: (&str, &str),
    bases: (&str, &str),
) -> PlanCreateInput {
    PlanCreateInput {
        vehicle_id: vehicle_id.into(),
        start_date: dates.0.into(),
        end_date: dates.1.map(Into::into),
        shift_type,
        start_time: times.0.into(),
        end_time: times.1.into(),
        departure_base_id: Some(bases.0.into()),
        arrival_base_id: Some(bases.1.into()),
        notes: None,
    }
}

#[test]
fn weekly_schedule_flow() {
    let dir = tempdir().expect("temp dir");
    let db_path = dir.path().join("flow.sqlite");
    let pool = DbPool::new(&db_path).expect("db pool");

    let fleet = FleetService::new(pool.clone());
    let plans = PlanService::new(pool);

    let vehicle = fleet
        .register_vehicle(VehicleCreateInput {
            number: "MTT-07".into(),
        })
        .expect("register vehicle");
    let base_x = fleet
        .register_base(BaseCreateInput {
            name: "西山基地".into(),
            location: Some("上行 12km".into()),
        })
        .expect("register base x");
    let base_y = fleet
        .register_base(BaseCreateInput {
            name: "东环基地".into(),
            location: None,
        })
        .expect("register base y");

    // Monday: day shift X -> Y, then an overnight night shift Y -> X.
    let monday_day = plans
        .create_plan(plan_input(
            &vehicle.id,
            ShiftType::Day,
            ("2024-06-03", None),
            ("08:00", "17:00"),
            (&base_x.id, &base_y.id),
        ))
        .expect("monday day shift");
    assert!(monday_day.report.is_empty());

    plans
        .create_plan(plan_input(
            &vehicle.id,
            ShiftType::Night,
            ("2024-06-03", Some("2024-06-04")),
            ("19:00", "04:00"),
            (&base_y.id, &base_x.id),
        ))
        .expect("monday overnight shift");

    // Tuesday day shift chains from the overnight arrival.
    let tuesday_day = plans
        .create_plan(plan_input(
            &vehicle.id,
            ShiftType::Day,
            ("2024-06-04", None),
            ("08:00", "17:00"),
            (&base_x.id, &base_x.id),
        ))
        .expect("tuesday day shift");

    // A window inside the overnight extension must be refused.
    let error = plans
        .create_plan(plan_input(
            &vehicle.id,
            ShiftType::Day,
            ("2024-06-04", None),
            ("02:00", "06:00"),
            (&base_x.id, &base_x.id),
        ))
        .expect_err("overnight continuation overlap");
    match error {
        AppError::Validation { details, .. } => {
            let details = details.expect("details");
            assert_eq!(
                details["conflicts"][0]["kind"].as_str(),
                Some("timeOverlap")
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // Wednesday must depart from Tuesday's arrival base.
    let error = plans
        .create_plan(plan_input(
            &vehicle.id,
            ShiftType::Day,
            ("2024-06-05", None),
            ("08:00", "17:00"),
            (&base_y.id, &base_y.id),
        ))
        .expect_err("broken departure chain");
    match error {
        AppError::Validation { details, .. } => {
            let details = details.expect("details");
            let conflict = &details["conflicts"][0];
            assert_eq!(conflict["kind"].as_str(), Some("departureContinuity"));
            assert!(conflict["message"]
                .as_str()
                .expect("message")
                .contains("西山基地"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let wednesday = plans
        .create_plan(plan_input(
            &vehicle.id,
            ShiftType::Day,
            ("2024-06-05", None),
            ("08:00", "17:00"),
            (&base_x.id, &base_y.id),
        ))
        .expect("wednesday day shift");

    // An evening shift abutting Tuesday's 17:00 end is fine, with a warning.
    let tuesday_evening = plans
        .create_plan(plan_input(
            &vehicle.id,
            ShiftType::Night,
            ("2024-06-04", None),
            ("17:00", "20:00"),
            (&base_x.id, &base_x.id),
        ))
        .expect("tuesday evening shift");
    assert!(tuesday_evening.report.passes());
    assert_eq!(tuesday_evening.report.warnings().len(), 1);

    // Thursday through the weekend carry Wednesday's arrival base forward.
    for date in ["2024-06-06", "2024-06-08"] {
        assert_eq!(
            plans
                .resolve_detention(&vehicle.id, date)
                .expect("resolve detention"),
            Detention::AtBase(base_y.id.clone())
        );
    }

    // On a covered date the plan itself answers: Wednesday starts at its
    // departure base.
    assert_eq!(
        plans
            .resolve_detention(&vehicle.id, "2024-06-05")
            .expect("resolve detention"),
        Detention::AtBase(base_x.id.clone())
    );

    // Rescheduling Wednesday two days out relaxes the continuity window.
    let moved = plans
        .update_plan(
            &wednesday.record.id,
            PlanUpdateInput {
                start_date: Some("2024-06-07".into()),
                end_date: Some("2024-06-07".into()),
                ..Default::default()
            },
        )
        .expect("move wednesday plan");
    assert_eq!(moved.record.start_date, "2024-06-07");

    // With the move, Thursday now inherits Tuesday evening's arrival.
    assert_eq!(
        plans
            .resolve_detention(&vehicle.id, "2024-06-06")
            .expect("resolve detention"),
        Detention::AtBase(base_x.id.clone())
    );

    // Range view of the first two days: Monday day + overnight + Tuesday
    // day + Tuesday evening.
    let first_days = plans
        .list_plans_in_range(&vehicle.id, "2024-06-03", "2024-06-04")
        .expect("range listing");
    assert_eq!(first_days.len(), 4);
    assert!(first_days
        .windows(2)
        .all(|pair| pair[0].start_date <= pair[1].start_date));

    // Deleting Tuesday's day shift leaves the rest of the chain intact.
    plans
        .delete_plan(&tuesday_day.record.id)
        .expect("delete tuesday day shift");
    assert_eq!(
        plans
            .list_plans(&vehicle.id)
            .expect("list plans")
            .len(),
        4
    );
}
