use super::*;
use std::sync::Arc;

fn plant_with<S: ReportSink>(sink: S) -> Plant<S> {
    Plant::from_catalog(Catalog::default_plant(), 7, sink).unwrap()
}

#[test]
fn tick_sends_every_record_to_sink() {
    let plant = plant_with(MemorySink::new());
    let eligible = plant.snapshot().registry.eligible_count();

    let first = plant.tick().unwrap();
    let second = plant.tick().unwrap();

    assert_eq!(first.tick, 0);
    assert_eq!(second.tick, 1);
    assert_eq!(first.records_emitted, eligible);
    let records = plant.sink().records();
    assert_eq!(records.len(), eligible * 2);
    assert!(records[..eligible].iter().all(|r| r.tick == 0));
    assert!(records[eligible..].iter().all(|r| r.tick == 1));
    assert!(records
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
    assert_eq!(plant.tick_count(), 2);
}

#[test]
fn sink_failure_is_reported_but_state_advances() {
    let plant = plant_with(FailingSink::always());
    let before = plant.snapshot();

    let result = plant.tick();

    assert!(matches!(result, Err(SinkError::Unavailable { .. })));
    assert_eq!(plant.tick_count(), 1);
    let after = plant.snapshot();
    assert_ne!(
        module(&before, "Reactor 1").telemetry,
        module(&after, "Reactor 1").telemetry
    );
}

#[test]
fn sink_failure_stops_remaining_deliveries() {
    let plant = plant_with(FailingSink::after(3));

    let result = plant.tick();

    assert!(result.is_err());
    // three accepted, the fourth refused, nothing after it attempted
    assert_eq!(plant.sink().attempts(), 4);
}

#[test]
fn snapshot_is_detached_from_live_state() {
    let plant = plant_with(MemorySink::new());
    let snapshot = plant.snapshot();

    plant.apply_action("reactor_1", "stop");
    plant.tick().unwrap();

    assert_eq!(module(&snapshot, "Reactor 1").status, Status::Online);
    assert_eq!(snapshot.meta.tick, 0);
    assert_eq!(
        module(&plant.snapshot(), "Reactor 1").status,
        Status::ShuttingDown
    );
}

#[test]
fn snapshot_serializes_grouped_by_category() {
    let plant = plant_with(MemorySink::new());

    let json = serde_json::to_value(plant.snapshot()).unwrap();

    let categories = json["registry"]["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 3);
    assert_eq!(categories[0]["category"], "Operation Module");
    assert_eq!(categories[0]["modules"][0]["name"], "Reactor 1");
    assert_eq!(categories[0]["modules"][0]["telemetry"]["kind"], "reactor");
    assert_eq!(
        categories[1]["modules"][0]["details"]["fuel_level"],
        "100%"
    );
    assert!(json["registry"].get("index").is_none());
}

#[test]
fn apply_action_through_plant() {
    let plant = plant_with(MemorySink::new());

    let first = plant.apply_action("reactor_1", "stop");
    let second = plant.apply_action("reactor_1", "stop");

    assert!(first.applied);
    assert!(first.to_string().contains("stopping"));
    assert!(!second.applied);
}

#[test]
fn concurrent_snapshots_never_see_torn_modules() {
    let plant = Arc::new(plant_with(MemorySink::new()));

    let ticker = {
        let plant = Arc::clone(&plant);
        std::thread::spawn(move || {
            for _ in 0..300 {
                plant.tick().unwrap();
            }
        })
    };
    let operator = {
        let plant = Arc::clone(&plant);
        std::thread::spawn(move || {
            for round in 0..300 {
                let action = if round % 2 == 0 { "stop" } else { "start" };
                plant.apply_action("reactor_1", action);
                plant.apply_action("reactor_2", action);
                plant.apply_action("turbine_1", action);
            }
        })
    };

    for _ in 0..300 {
        let snapshot = plant.snapshot();
        for (_, m) in snapshot.registry.modules() {
            if m.status == Status::Offline {
                if let Some(power) = m.telemetry.power_output_mw() {
                    assert!(power <= 0.0, "{} offline at {power} MW", m.name);
                }
            }
            if let Some(power) = m.telemetry.power_output_mw() {
                assert!(power >= 0.0);
            }
        }
    }

    ticker.join().unwrap();
    operator.join().unwrap();
    assert_eq!(plant.tick_count(), 300);
    assert_eq!(
        plant.sink().len(),
        300 * plant.snapshot().registry.eligible_count()
    );
}
