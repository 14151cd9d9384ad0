use railops::db::{migrations, DbPool};
use railops::error::AppError;
use railops::models::fleet::{BaseCreateInput, VehicleCreateInput};
use railops::models::operation_plan::{PlanCreateInput, ShiftType};
use railops::services::fleet_service::FleetService;
use railops::services::plan_service::PlanService;
use tempfile::tempdir;

fn setup() -> (FleetService, DbPool, tempfile::TempDir) {
    let dir = tempdir().expect("temp dir");
    let db_path = dir.path().join("fleet.sqlite");
    let pool = DbPool::new(db_path).expect("db pool");
    (FleetService::new(pool.clone()), pool, dir)
}

#[test]
fn register_and_list_vehicles() {
    let (fleet, _pool, _dir) = setup();

    fleet
        .register_vehicle(VehicleCreateInput {
            number: "MTT-02".into(),
        })
        .expect("register vehicle");
    let vehicle = fleet
        .register_vehicle(VehicleCreateInput {
            number: " MTT-01 ".into(),
        })
        .expect("register vehicle");

    assert_eq!(vehicle.number, "MTT-01");

    let vehicles = fleet.list_vehicles().expect("list vehicles");
    let numbers: Vec<&str> = vehicles.iter().map(|v| v.number.as_str()).collect();
    assert_eq!(numbers, vec!["MTT-01", "MTT-02"]);
}

#[test]
fn blank_vehicle_number_is_rejected() {
    let (fleet, _pool, _dir) = setup();
    assert!(fleet
        .register_vehicle(VehicleCreateInput { number: "  ".into() })
        .is_err());
}

#[test]
fn register_base_normalizes_location() {
    let (fleet, _pool, _dir) = setup();

    let base = fleet
        .register_base(BaseCreateInput {
            name: "西山基地".into(),
            location: Some("   ".into()),
        })
        .expect("register base");

    assert_eq!(base.location, None);
    let fetched = fleet.get_base(&base.id).expect("get base");
    assert_eq!(fetched, base);
}

#[test]
fn base_name_lookup_maps_ids_to_names() {
    let (fleet, _pool, _dir) = setup();

    let base = fleet
        .register_base(BaseCreateInput {
            name: "东环基地".into(),
            location: None,
        })
        .expect("register base");

    let lookup = fleet.base_name_lookup().expect("lookup");
    assert_eq!(lookup.get(&base.id).map(String::as_str), Some("东环基地"));
}

#[test]
fn removing_a_referenced_vehicle_is_a_conflict() {
    let (fleet, pool, _dir) = setup();
    let plans = PlanService::new(pool);

    let vehicle = fleet
        .register_vehicle(VehicleCreateInput {
            number: "MTT-03".into(),
        })
        .expect("register vehicle");
    let base = fleet
        .register_base(BaseCreateInput {
            name: "南港基地".into(),
            location: None,
        })
        .expect("register base");

    plans
        .create_plan(PlanCreateInput {
            vehicle_id: vehicle.id.clone(),
            start_date: "2024-06-03".into(),
            end_date: None,
            shift_type: ShiftType::Day,
            start_time: "08:00".into(),
            end_time: "17:00".into(),
            departure_base_id: Some(base.id.clone()),
            arrival_base_id: Some(base.id.clone()),
            notes: None,
        })
        .expect("create plan");

    assert!(matches!(
        fleet.remove_vehicle(&vehicle.id),
        Err(AppError::Conflict { .. })
    ));
}

#[test]
fn migration_history_is_recorded() {
    let (_fleet, pool, _dir) = setup();

    let history = pool
        .with_connection(|conn| migrations::get_migration_history(conn))
        .expect("migration history");

    assert!(history.len() >= 2);
    assert_eq!(history[0].version, 1);
}
