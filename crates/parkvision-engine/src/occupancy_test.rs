use parkvision_core::{Coordinates, Location};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::*;

fn three_spot_catalog() -> Arc<LocationCatalog> {
    let location = |id: &str, spots: &[&str]| Location {
        id: id.to_string(),
        name: format!("{id} parking"),
        localized_name: String::new(),
        address: "Old Tbilisi".to_string(),
        coordinates: Coordinates {
            lat: 41.6938,
            lng: 44.8015,
        },
        spots: spots.iter().map(ToString::to_string).collect(),
        price: "2 GEL/hour".to_string(),
    };
    Arc::new(
        LocationCatalog::new(vec![
            location("freedom-square", &["A1", "A2", "A3"]),
            location("rustaveli", &["R1", "R2"]),
        ])
        .expect("valid catalog"),
    )
}

fn engine_at(location: &str) -> OccupancyEngine {
    let mut engine = OccupancyEngine::new(three_spot_catalog());
    engine
        .select_location(location, &mut StdRng::seed_from_u64(7))
        .expect("known location");
    engine
}

fn force(engine: &mut OccupancyEngine, statuses: &[(&str, OccupancyStatus)]) {
    for (spot, status) in statuses {
        engine.set_status(spot, *status).expect("known spot");
    }
}

#[test]
fn new_engine_has_empty_state() {
    let engine = OccupancyEngine::new(three_spot_catalog());
    assert!(engine.current_state().is_empty());
    assert!(engine.current_location().is_none());
    assert!(engine.selection().is_none());
}

#[test]
fn select_location_creates_one_entry_per_spot_for_every_builtin_location() {
    let catalog = Arc::new(LocationCatalog::builtin());
    let mut engine = OccupancyEngine::new(Arc::clone(&catalog));
    let mut rng = StdRng::seed_from_u64(1);

    for location in catalog.list() {
        let state = engine.select_location(&location.id, &mut rng).unwrap();
        let keys: Vec<&str> = state.spot_ids().collect();
        let expected: Vec<&str> = location.spots.iter().map(String::as_str).collect();
        assert_eq!(keys, expected, "keys for {}", location.id);
        assert!(engine.selection().is_none());
        assert_eq!(engine.location_id(), Some(location.id.as_str()));
    }
}

#[test]
fn select_unknown_location_is_not_found_and_keeps_state() {
    let mut engine = engine_at("freedom-square");
    let before = engine.current_state().clone();

    let err = engine
        .select_location("airport", &mut StdRng::seed_from_u64(3))
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::NotFound {
            id: "airport".to_string()
        }
    );
    assert_eq!(engine.current_state(), &before);
    assert_eq!(engine.location_id(), Some("freedom-square"));
}

#[test]
fn reselecting_same_location_keeps_keys_and_rerolls() {
    let catalog = Arc::new(LocationCatalog::builtin());
    let mut engine = OccupancyEngine::new(catalog);
    let mut rng = StdRng::seed_from_u64(99);

    let first = engine
        .select_location("tbilisi-mall", &mut rng)
        .unwrap()
        .clone();
    let mut any_difference = false;
    for _ in 0..20 {
        let next = engine.select_location("tbilisi-mall", &mut rng).unwrap();
        assert!(next.spot_ids().eq(first.spot_ids()));
        any_difference |= next != &first;
    }
    assert!(any_difference, "twenty re-rolls never changed a status");
}

#[test]
fn initial_draws_follow_free_probability() {
    let catalog = Arc::new(LocationCatalog::builtin());
    let mut engine = OccupancyEngine::new(catalog);
    let mut rng = StdRng::seed_from_u64(2024);

    let mut free = 0usize;
    let mut total = 0usize;
    for _ in 0..500 {
        let state = engine.select_location("freedom-square", &mut rng).unwrap();
        free += state.iter().filter(|s| s.status.is_free()).count();
        total += state.len();
    }

    #[allow(clippy::cast_precision_loss)]
    let ratio = free as f64 / total as f64;
    assert!((ratio - 0.4).abs() < 0.03, "free ratio {ratio} not near 0.4");
}

#[test]
fn free_probability_extremes_are_deterministic() {
    let mut rng = StdRng::seed_from_u64(5);

    let mut all_free = OccupancyEngine::with_free_probability(three_spot_catalog(), 1.0);
    let state = all_free.select_location("freedom-square", &mut rng).unwrap();
    assert!(state.iter().all(|s| s.status == OccupancyStatus::Free));

    let mut all_taken = OccupancyEngine::with_free_probability(three_spot_catalog(), 0.0);
    let state = all_taken.select_location("freedom-square", &mut rng).unwrap();
    assert!(state.iter().all(|s| s.status == OccupancyStatus::Occupied));
}

#[test]
fn free_probability_is_clamped() {
    let engine = OccupancyEngine::with_free_probability(three_spot_catalog(), 3.0);
    assert!((engine.free_probability() - 1.0).abs() < f64::EPSILON);
    let engine = OccupancyEngine::with_free_probability(three_spot_catalog(), f64::NAN);
    assert!((engine.free_probability() - DEFAULT_FREE_PROBABILITY).abs() < f64::EPSILON);
}

#[test]
fn toggle_flips_only_the_target_spot() {
    let mut engine = engine_at("freedom-square");
    let before = engine.current_state().clone();

    let status = engine.toggle_spot("A2").unwrap();

    assert_eq!(Some(status), before.get("A2").map(OccupancyStatus::toggled));
    for spot in ["A1", "A3"] {
        assert_eq!(engine.status_of(spot), before.get(spot));
    }
}

#[test]
fn toggle_twice_is_identity() {
    let mut engine = engine_at("freedom-square");
    let before = engine.current_state().clone();

    engine.toggle_spot("A1").unwrap();
    engine.toggle_spot("A1").unwrap();

    assert_eq!(engine.current_state(), &before);
    assert_eq!(engine.toggle_count(), 2);
}

#[test]
fn toggle_unknown_spot_fails_and_leaves_state() {
    let mut engine = engine_at("freedom-square");
    let before = engine.current_state().clone();

    let err = engine.toggle_spot("R1").unwrap_err();

    assert_eq!(
        err,
        EngineError::UnknownSpot {
            spot_id: "R1".to_string()
        }
    );
    assert_eq!(engine.current_state(), &before);
    assert_eq!(engine.toggle_count(), 0);
}

#[test]
fn toggle_random_spot_on_empty_state_is_noop() {
    let mut engine = OccupancyEngine::new(three_spot_catalog());
    assert!(engine
        .toggle_random_spot(&mut StdRng::seed_from_u64(1))
        .is_none());
    assert_eq!(engine.toggle_count(), 0);
}

#[test]
fn toggle_random_spot_changes_exactly_one_spot() {
    let mut engine = engine_at("freedom-square");
    let before = engine.current_state().clone();

    let (spot, status) = engine
        .toggle_random_spot(&mut StdRng::seed_from_u64(11))
        .unwrap();

    let changed: Vec<&str> = engine
        .current_state()
        .iter()
        .filter(|s| before.get(&s.spot_id) != Some(s.status))
        .map(|s| s.spot_id.as_str())
        .collect();
    assert_eq!(changed, [spot.as_str()]);
    assert_eq!(engine.status_of(&spot), Some(status));
}

#[test]
fn set_status_reports_change() {
    let mut engine = engine_at("freedom-square");
    force(&mut engine, &[("A1", OccupancyStatus::Free)]);
    let toggles = engine.toggle_count();

    assert!(!engine.set_status("A1", OccupancyStatus::Free).unwrap());
    assert_eq!(engine.toggle_count(), toggles);
    assert!(engine.set_status("A1", OccupancyStatus::Occupied).unwrap());
    assert_eq!(engine.toggle_count(), toggles + 1);
}

#[test]
fn select_occupied_spot_is_invalid_selection() {
    let mut engine = engine_at("freedom-square");
    force(&mut engine, &[("A2", OccupancyStatus::Occupied)]);

    let err = engine.select_spot("A2").unwrap_err();

    assert_eq!(
        err,
        EngineError::InvalidSelection {
            spot_id: "A2".to_string(),
            status: OccupancyStatus::Occupied,
        }
    );
    assert!(engine.selection().is_none());
}

#[test]
fn select_free_spot_is_queryable() {
    let mut engine = engine_at("freedom-square");
    force(&mut engine, &[("A3", OccupancyStatus::Free)]);

    engine.select_spot("A3").unwrap();

    assert_eq!(engine.selection(), Some("A3"));
}

#[test]
fn select_unknown_spot_fails() {
    let mut engine = engine_at("freedom-square");
    assert!(matches!(
        engine.select_spot("Z9"),
        Err(EngineError::UnknownSpot { .. })
    ));
}

#[test]
fn selection_cleared_when_location_selected() {
    let mut engine = engine_at("freedom-square");
    force(&mut engine, &[("A1", OccupancyStatus::Free)]);
    engine.select_spot("A1").unwrap();

    engine
        .select_location("freedom-square", &mut StdRng::seed_from_u64(8))
        .unwrap();

    assert!(engine.selection().is_none());
}

#[test]
fn selection_cleared_when_selected_spot_becomes_occupied() {
    let mut engine = engine_at("freedom-square");
    force(
        &mut engine,
        &[("A1", OccupancyStatus::Free), ("A3", OccupancyStatus::Free)],
    );
    engine.select_spot("A1").unwrap();

    engine.toggle_spot("A3").unwrap();
    assert_eq!(engine.selection(), Some("A1"));

    engine.toggle_spot("A1").unwrap();
    assert!(engine.selection().is_none());
}

#[test]
fn clear_selection_reports_whether_anything_was_selected() {
    let mut engine = engine_at("freedom-square");
    assert!(!engine.clear_selection());

    force(&mut engine, &[("A1", OccupancyStatus::Free)]);
    engine.select_spot("A1").unwrap();
    assert!(engine.clear_selection());
    assert!(engine.selection().is_none());
}

#[test]
fn free_spots_follow_spot_order() {
    let mut engine = engine_at("freedom-square");
    force(
        &mut engine,
        &[
            ("A1", OccupancyStatus::Free),
            ("A2", OccupancyStatus::Occupied),
            ("A3", OccupancyStatus::Free),
        ],
    );
    assert_eq!(engine.free_spots(), ["A1", "A3"]);
}

#[test]
fn subscribers_see_mutations_in_order() {
    let mut engine = engine_at("freedom-square");
    force(&mut engine, &[("A1", OccupancyStatus::Free)]);
    let mut events = engine.subscribe();

    engine.select_spot("A1").unwrap();
    engine.toggle_spot("A1").unwrap();
    engine
        .select_location("rustaveli", &mut StdRng::seed_from_u64(4))
        .unwrap();

    assert_eq!(
        events.try_recv().unwrap(),
        OccupancyEvent::SelectionChanged {
            spot_id: Some("A1".to_string())
        }
    );
    assert_eq!(
        events.try_recv().unwrap(),
        OccupancyEvent::SpotToggled {
            spot_id: "A1".to_string(),
            status: OccupancyStatus::Occupied,
        }
    );
    assert_eq!(
        events.try_recv().unwrap(),
        OccupancyEvent::SelectionChanged { spot_id: None }
    );
    assert_eq!(
        events.try_recv().unwrap(),
        OccupancyEvent::LocationSelected {
            location_id: "rustaveli".to_string()
        }
    );
    assert!(events.try_recv().is_err());
}

#[test]
fn failed_commands_publish_nothing() {
    let mut engine = engine_at("freedom-square");
    force(&mut engine, &[("A2", OccupancyStatus::Occupied)]);
    let mut events = engine.subscribe();

    let _ = engine.toggle_spot("nope");
    let _ = engine.select_spot("A2");
    let _ = engine.select_location("nowhere", &mut StdRng::seed_from_u64(1));

    assert!(events.try_recv().is_err());
}

#[test]
fn state_from_iter_overwrites_duplicates() {
    let state: OccupancyState = [
        ("A1".to_string(), OccupancyStatus::Free),
        ("A2".to_string(), OccupancyStatus::Free),
        ("A1".to_string(), OccupancyStatus::Occupied),
    ]
    .into_iter()
    .collect();
    assert_eq!(state.len(), 2);
    assert_eq!(state.get("A1"), Some(OccupancyStatus::Occupied));
}

#[test]
fn event_serializes_with_type_tag() {
    let json = serde_json::to_value(OccupancyEvent::SpotToggled {
        spot_id: "A1".to_string(),
        status: OccupancyStatus::Free,
    })
    .unwrap();
    assert_eq!(json["type"], "spot_toggled");
    assert_eq!(json["status"], "free");
}

#[test]
fn lock_engine_recovers_from_poison() {
    let shared = engine_at("freedom-square").into_shared();
    let poisoner = Arc::clone(&shared);
    let _ = std::thread::spawn(move || {
        let _guard = poisoner.lock().unwrap();
        panic!("poison the engine lock");
    })
    .join();

    assert!(shared.is_poisoned());
    assert_eq!(lock_engine(&shared).current_state().len(), 3);
}

#[test]
fn freedom_square_walkthrough_updates_analytics() {
    use crate::{occupancy_rate_percent, summarize, AnalyticsSnapshot};
    use rust_decimal::Decimal;

    let mut engine = engine_at("freedom-square");
    force(
        &mut engine,
        &[
            ("A1", OccupancyStatus::Free),
            ("A2", OccupancyStatus::Occupied),
            ("A3", OccupancyStatus::Free),
        ],
    );

    let before = summarize(engine.current_state());
    assert_eq!(
        before,
        AnalyticsSnapshot {
            total: 3,
            occupied: 1,
            free: 2,
        }
    );
    assert_eq!(occupancy_rate_percent(&before), Decimal::new(333, 1));

    assert_eq!(engine.toggle_spot("A2"), Ok(OccupancyStatus::Free));

    let after = summarize(engine.current_state());
    assert_eq!(
        after,
        AnalyticsSnapshot {
            total: 3,
            occupied: 0,
            free: 3,
        }
    );
    assert_eq!(occupancy_rate_percent(&after), Decimal::ZERO);
    assert_eq!(engine.free_spots(), ["A1", "A2", "A3"]);
}
