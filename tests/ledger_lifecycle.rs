//! Box lifecycle against the in-memory store.

use cabletrack::error::ErrorKind;
use cabletrack::labels::{LabelArtifact, LabelError, LabelIssuer, TsplLabelIssuer};
use cabletrack::model::{BoxStatus, CloseBox, NewBox, NewCableType, NewProject};
use cabletrack::{Inventory, MemoryStore};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

struct Fixture {
    inventory: Inventory<MemoryStore>,
    labels: TempDir,
}

fn fixture() -> Fixture {
    let labels = TempDir::new().unwrap();
    let issuer = Arc::new(TsplLabelIssuer::new(labels.path()));
    Fixture {
        inventory: Inventory::new(MemoryStore::new(), issuer),
        labels,
    }
}

/// Cable type `CAT6` and one project; returns their ids
fn seed(inventory: &Inventory<MemoryStore>) -> (i64, i64) {
    let cable_type = inventory
        .cable_types()
        .create(NewCableType::new("Cat6", "cat6"))
        .unwrap();
    let project = inventory
        .projects()
        .create(NewProject::new("Riverside fit-out"))
        .unwrap();
    (cable_type.id, project.id)
}

#[test]
fn test_box_lifecycle_scenarios() {
    let Fixture { inventory, .. } = fixture();
    let ledger = inventory.ledger();
    let (type_id, project_id) = seed(&inventory);

    // A
    let types = inventory.cable_types().list().unwrap();
    assert_eq!(types[0].prefix, "CAT6");
    let created = ledger.create(NewBox::new(type_id, d("305"))).unwrap();
    assert_eq!(created.number, "CAT6001");
    assert_eq!(created.status, BoxStatus::New);
    assert_eq!(created.current_quantity, d("305"));

    // B
    let opened = ledger.open(created.id).unwrap();
    assert_eq!(opened.status, BoxStatus::Open);
    let receipt = ledger
        .close(created.id, CloseBox::new(d("50"), project_id, "Alice"))
        .unwrap();
    assert_eq!(receipt.quantity_used, d("255"));
    assert_eq!(receipt.status, BoxStatus::Closed);
    assert_eq!(receipt.current_quantity, d("50"));

    // C
    let receipt = ledger
        .close(created.id, CloseBox::new(d("0"), project_id, "Alice"))
        .unwrap();
    assert_eq!(receipt.quantity_used, d("50"));
    assert_eq!(receipt.status, BoxStatus::Exhausted);
    assert_eq!(receipt.current_quantity, Decimal::ZERO);

    // E: numbering ignores the status of earlier boxes
    let second = ledger.create(NewBox::new(type_id, d("100"))).unwrap();
    assert_eq!(second.number, "CAT6002");

    let history = ledger.usage_history(created.id).unwrap();
    let used: Vec<Decimal> = history.iter().map(|u| u.quantity_used).collect();
    assert_eq!(used, vec![d("255"), d("50")]);
    assert!(history.iter().all(|u| u.technician == "Alice"));
}

#[test]
fn test_overshooting_close_changes_nothing() {
    let Fixture { inventory, .. } = fixture();
    let ledger = inventory.ledger();
    let (type_id, project_id) = seed(&inventory);

    let created = ledger.create(NewBox::new(type_id, d("305"))).unwrap();
    ledger
        .close(created.id, CloseBox::new(d("50"), project_id, "Alice"))
        .unwrap();

    // D
    let err = ledger
        .close(created.id, CloseBox::new(d("999"), project_id, "Alice"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let after = ledger.get(created.id).unwrap();
    assert_eq!(after.cable_box.current_quantity, d("50"));
    assert_eq!(after.cable_box.status, BoxStatus::Closed);
    assert_eq!(ledger.usage_history(created.id).unwrap().len(), 1);
}

#[test]
fn test_quantities_stay_within_bounds() {
    let Fixture { inventory, .. } = fixture();
    let ledger = inventory.ledger();
    let (type_id, project_id) = seed(&inventory);

    let created = ledger.create(NewBox::new(type_id, d("100.5"))).unwrap();
    for remaining in ["80.25", "80.25", "12.125", "0"] {
        ledger
            .close(created.id, CloseBox::new(d(remaining), project_id, "Bo"))
            .unwrap();
        let view = ledger.get(created.id).unwrap();
        let cable_box = view.cable_box;
        assert!(cable_box.current_quantity >= Decimal::ZERO);
        assert!(cable_box.current_quantity <= cable_box.initial_quantity);
    }

    // A zero-length close still leaves a record.
    let history = ledger.usage_history(created.id).unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[1].quantity_used, Decimal::ZERO);
    let total: Decimal = history.iter().map(|u| u.quantity_used).sum();
    assert_eq!(total, d("100.5"));
}

#[test]
fn test_invalid_quantities_rejected() {
    let Fixture { inventory, .. } = fixture();
    let ledger = inventory.ledger();
    let (type_id, project_id) = seed(&inventory);

    for initial in ["0", "-3", "1.0005"] {
        let err = ledger.create(NewBox::new(type_id, d(initial))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "initial {initial}");
    }

    let created = ledger.create(NewBox::new(type_id, d("10"))).unwrap();
    let err = ledger
        .close(created.id, CloseBox::new(d("-1"), project_id, "Bo"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = ledger
        .close(created.id, CloseBox::new(d("5"), project_id, "   "))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(ledger.usage_history(created.id).unwrap().is_empty());
}

#[test]
fn test_transitions_refused() {
    let Fixture { inventory, .. } = fixture();
    let ledger = inventory.ledger();
    let (type_id, project_id) = seed(&inventory);

    let created = ledger.create(NewBox::new(type_id, d("20"))).unwrap();
    ledger.open(created.id).unwrap();
    let err = ledger.open(created.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    ledger
        .close(created.id, CloseBox::new(d("0"), project_id, "Bo"))
        .unwrap();
    assert_eq!(
        ledger.open(created.id).unwrap_err().kind(),
        ErrorKind::InvalidTransition
    );
    assert_eq!(
        ledger
            .close(created.id, CloseBox::new(d("0"), project_id, "Bo"))
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidTransition
    );
    assert_eq!(ledger.usage_history(created.id).unwrap().len(), 1);
}

#[test]
fn test_closed_box_can_reopen() {
    let Fixture { inventory, .. } = fixture();
    let ledger = inventory.ledger();
    let (type_id, project_id) = seed(&inventory);

    let created = ledger.create(NewBox::new(type_id, d("20"))).unwrap();
    ledger
        .close(created.id, CloseBox::new(d("15"), project_id, "Bo"))
        .unwrap();
    assert_eq!(ledger.open(created.id).unwrap().status, BoxStatus::Open);
}

#[test]
fn test_missing_records_are_not_found() {
    let Fixture { inventory, .. } = fixture();
    let ledger = inventory.ledger();
    let (type_id, _) = seed(&inventory);

    assert_eq!(
        ledger.create(NewBox::new(type_id + 100, d("1"))).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(ledger.open(999).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        ledger.find_by_number("NOPE001").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(ledger.usage_history(999).unwrap_err().kind(), ErrorKind::NotFound);

    let created = ledger.create(NewBox::new(type_id, d("5"))).unwrap();
    let err = ledger
        .close(created.id, CloseBox::new(d("1"), 4242, "Bo"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(ledger.get(created.id).unwrap().cable_box.current_quantity, d("5"));
}

#[test]
fn test_close_of_missing_box_is_not_found_before_validation() {
    let Fixture { inventory, .. } = fixture();
    let (_, project_id) = seed(&inventory);

    let err = inventory
        .ledger()
        .close(999, CloseBox::new(d("1"), project_id, "   "))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_duplicate_prefix_ignores_case() {
    let Fixture { inventory, .. } = fixture();
    seed(&inventory);

    let err = inventory
        .cable_types()
        .create(NewCableType::new("Another Cat6", "Cat6"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("CAT6"), "{err}");
    assert_eq!(inventory.cable_types().list().unwrap().len(), 1);
}

#[test]
fn test_registry_defaults() {
    let Fixture { inventory, .. } = fixture();
    let fibre = inventory
        .cable_types()
        .create(NewCableType::new("Fibre OM4", "om4").description("multimode"))
        .unwrap();
    assert_eq!(fibre.unit, "meters");
    assert_eq!(fibre.description.as_deref(), Some("multimode"));

    let project = inventory
        .projects()
        .create(NewProject::new("Depot rewire"))
        .unwrap();
    assert_eq!(project.status, "active");

    assert_eq!(
        inventory
            .projects()
            .create(NewProject::new("  "))
            .unwrap_err()
            .kind(),
        ErrorKind::Validation
    );
}

#[test]
fn test_list_is_newest_first_and_find_ignores_case() {
    let Fixture { inventory, .. } = fixture();
    let ledger = inventory.ledger();
    let (type_id, _) = seed(&inventory);

    for _ in 0..3 {
        ledger.create(NewBox::new(type_id, d("10"))).unwrap();
    }
    let numbers: Vec<String> = ledger
        .list()
        .unwrap()
        .into_iter()
        .map(|v| v.cable_box.number)
        .collect();
    assert_eq!(numbers, vec!["CAT6003", "CAT6002", "CAT6001"]);

    let found = ledger.find_by_number("cat6002").unwrap();
    assert_eq!(found.cable_box.number, "CAT6002");
    assert_eq!(found.cable_type_name, "Cat6");
    assert_eq!(found.prefix, "CAT6");
}

#[test]
fn test_prefix_sharing_a_stem_numbers_independently() {
    let Fixture { inventory, .. } = fixture();
    let ledger = inventory.ledger();
    let (cat6, _) = seed(&inventory);
    let cat = inventory
        .cable_types()
        .create(NewCableType::new("Generic Cat", "CAT"))
        .unwrap();

    ledger.create(NewBox::new(cat6, d("1"))).unwrap();
    ledger.create(NewBox::new(cat6, d("1"))).unwrap();
    let first_cat = ledger.create(NewBox::new(cat.id, d("1"))).unwrap();
    assert_eq!(first_cat.number, "CAT001");
    assert_eq!(ledger.create(NewBox::new(cat6, d("1"))).unwrap().number, "CAT6003");
}

#[test]
fn test_label_written_once_and_reused() {
    let Fixture { inventory, labels } = fixture();
    let ledger = inventory.ledger();
    let (type_id, _) = seed(&inventory);

    let created = ledger.create(NewBox::new(type_id, d("305"))).unwrap();
    let cached = labels.path().join("CAT6001.tspl");
    assert!(cached.exists());

    let label = ledger.label(created.id).unwrap();
    let text = String::from_utf8(label.bytes.clone()).unwrap();
    assert!(text.contains("QRCODE"));
    assert!(text.contains("CAT6001"));

    // A cached file wins over re-rendering.
    std::fs::write(&cached, b"CACHED").unwrap();
    assert_eq!(ledger.label(created.id).unwrap().bytes, b"CACHED".to_vec());
}

struct FailingIssuer;

impl LabelIssuer for FailingIssuer {
    fn issue(&self, identifier: &str) -> Result<LabelArtifact, LabelError> {
        Err(LabelError::InvalidIdentifier(identifier.to_string()))
    }
}

#[test]
fn test_label_failure_does_not_undo_creation() {
    let inventory = Inventory::new(MemoryStore::new(), Arc::new(FailingIssuer));
    let (type_id, _) = seed(&inventory);

    let created = inventory
        .ledger()
        .create(NewBox::new(type_id, d("305")))
        .unwrap();
    assert_eq!(created.number, "CAT6001");
    assert_eq!(inventory.ledger().list().unwrap().len(), 1);

    let err = inventory.ledger().label(created.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.public_message(), "internal error");
}

#[test]
fn test_concurrent_creation_mints_unique_numbers() {
    let Fixture { inventory, .. } = fixture();
    let (type_id, _) = seed(&inventory);

    let numbers: Vec<String> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let inventory = inventory.clone();
                scope.spawn(move || {
                    (0..5)
                        .map(|_| {
                            inventory
                                .ledger()
                                .create(NewBox::new(type_id, d("10")))
                                .unwrap()
                                .number
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect()
    });

    let unique: HashSet<&String> = numbers.iter().collect();
    assert_eq!(unique.len(), 40);
    let expected: HashSet<String> = (1..=40).map(|n| format!("CAT6{n:03}")).collect();
    assert_eq!(numbers.into_iter().collect::<HashSet<_>>(), expected);
}

#[test]
fn test_concurrent_closes_never_double_count() {
    let Fixture { inventory, .. } = fixture();
    let (type_id, project_id) = seed(&inventory);
    let ledger = inventory.ledger();
    let created = ledger.create(NewBox::new(type_id, d("1000"))).unwrap();
    ledger.open(created.id).unwrap();
    let box_id = created.id;

    // Distinct targets; a close aiming above the live balance is refused.
    let outcomes: Vec<bool> = std::thread::scope(|scope| {
        let workers: Vec<_> = (1..=16)
            .map(|n| {
                let inventory = inventory.clone();
                scope.spawn(move || {
                    let target = Decimal::from(1000 - n * 37);
                    match inventory
                        .ledger()
                        .close(box_id, CloseBox::new(target, project_id, format!("tech{n}")))
                    {
                        Ok(_) => true,
                        Err(e) => {
                            assert_eq!(e.kind(), ErrorKind::Validation, "{e}");
                            false
                        }
                    }
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    let succeeded = outcomes.iter().filter(|ok| **ok).count();
    assert!(succeeded >= 1);

    let history = ledger.usage_history(box_id).unwrap();
    assert_eq!(history.len(), succeeded);
    let used: Decimal = history.iter().map(|u| u.quantity_used).sum();
    let remaining = ledger.get(box_id).unwrap().cable_box.current_quantity;
    assert_eq!(used, d("1000") - remaining);
    assert!(history.iter().all(|u| u.quantity_used >= Decimal::ZERO));
}
