//! End-to-end behavior of the store through the public handle

use vaxdb_core::model::{now_millis, CheckIn, CheckInStatus, Project, Settings};
use vaxdb_core::{IndexValue, StoreError};
use vaxdb_store::export::{export_all, import_all};
use vaxdb_store::{ChangeKind, FeedPoll, Matcher, VaccineDb};

fn checkin(id: &str, mykad: &str, queue: &str, timestamp: i64) -> CheckIn {
    CheckIn::new(
        id.to_string(),
        format!("Patient {id}"),
        mykad.to_string(),
        queue.to_string(),
        timestamp,
    )
}

#[test]
fn get_returns_exactly_what_was_added() {
    let db = VaccineDb::open_in_memory().unwrap();
    let mut original = checkin("ci-1", "900101-14-1234", "20260823-001", 100);
    original.phone = Some("012-3456789".to_string());
    original.notes = Some("penicillin allergy".to_string());

    db.checkins().add(&mut original.clone()).unwrap();
    let loaded = db.checkins().get(&"ci-1".to_string()).unwrap().unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn add_rejects_duplicate_keys_but_put_overwrites() {
    let db = VaccineDb::open_in_memory().unwrap();
    let mut first = checkin("ci-1", "900101-14-1234", "20260823-001", 100);
    db.checkins().add(&mut first).unwrap();

    let mut clash = checkin("ci-1", "880505-10-5678", "20260823-002", 200);
    let err = db.checkins().add(&mut clash).unwrap_err();
    assert_eq!(
        err,
        StoreError::DuplicateKey {
            collection: "checkins",
            key: "ci-1".to_string(),
        }
    );

    db.checkins().put(&mut clash).unwrap();
    let loaded = db.checkins().get(&"ci-1".to_string()).unwrap().unwrap();
    assert_eq!(loaded.mykad, "880505-10-5678");
}

#[test]
fn update_changes_only_the_patched_fields() {
    let db = VaccineDb::open_in_memory().unwrap();
    let mut original = checkin("ci-1", "900101-14-1234", "20260823-001", 100);
    original.phone = Some("012-3456789".to_string());
    db.checkins().add(&mut original).unwrap();

    let updated = db
        .checkins()
        .update(
            &"ci-1".to_string(),
            &serde_json::json!({ "status": "completed", "vaccinator": "SN Tan" }),
        )
        .unwrap();

    assert_eq!(updated.status, CheckInStatus::Completed);
    assert_eq!(updated.vaccinator.as_deref(), Some("SN Tan"));
    // Everything else is untouched
    assert_eq!(updated.phone.as_deref(), Some("012-3456789"));
    assert_eq!(updated.mykad, original.mykad);
    assert_eq!(updated.timestamp, original.timestamp);

    let loaded = db.checkins().get(&"ci-1".to_string()).unwrap().unwrap();
    assert_eq!(loaded, updated);
}

#[test]
fn update_cannot_move_a_record_to_another_key() {
    let db = VaccineDb::open_in_memory().unwrap();
    let mut original = checkin("ci-1", "900101-14-1234", "20260823-001", 100);
    db.checkins().add(&mut original).unwrap();

    db.checkins()
        .update(&"ci-1".to_string(), &serde_json::json!({ "id": "ci-9" }))
        .unwrap();

    assert!(db.checkins().get(&"ci-9".to_string()).unwrap().is_none());
    let loaded = db.checkins().get(&"ci-1".to_string()).unwrap().unwrap();
    assert_eq!(loaded.id, "ci-1");
}

#[test]
fn update_missing_key_is_not_found() {
    let db = VaccineDb::open_in_memory().unwrap();
    let err = db
        .checkins()
        .update(&"ghost".to_string(), &serde_json::json!({ "status": "completed" }))
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::NotFound {
            collection: "checkins",
            key: "ghost".to_string(),
        }
    );
}

#[test]
fn delete_is_idempotent() {
    let db = VaccineDb::open_in_memory().unwrap();
    let mut c = checkin("ci-1", "900101-14-1234", "20260823-001", 100);
    db.checkins().add(&mut c).unwrap();

    db.checkins().delete(&"ci-1".to_string()).unwrap();
    assert!(db.checkins().get(&"ci-1".to_string()).unwrap().is_none());
    // Second delete of the same key is a no-op
    db.checkins().delete(&"ci-1".to_string()).unwrap();
}

#[test]
fn mykad_is_not_unique_but_supports_duplicate_screening() {
    let db = VaccineDb::open_in_memory().unwrap();
    let shared = "900101-14-1234";
    db.checkins()
        .add(&mut checkin("ci-1", shared, "20260823-001", 100))
        .unwrap();

    // The caller-side pre-check finds the existing visit
    let hits = db
        .checkins()
        .query_by_index("mykad", Matcher::Equals(IndexValue::from(shared)))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "ci-1");

    // But uniqueness is not enforced by the store
    db.checkins()
        .add(&mut checkin("ci-2", shared, "20260823-002", 200))
        .unwrap();
    let hits = db
        .checkins()
        .query_by_index("mykad", Matcher::Equals(IndexValue::from(shared)))
        .unwrap();
    assert_eq!(hits.len(), 2);
}

#[test]
fn querying_a_non_indexed_field_fails() {
    let db = VaccineDb::open_in_memory().unwrap();
    let err = db
        .checkins()
        .query_by_index("notes", Matcher::Equals(IndexValue::from("x")))
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::UnsupportedQuery {
            collection: "checkins",
            field: "notes".to_string(),
        }
    );
    assert!(db.checkins().order_by("notes").is_err());
}

#[test]
fn range_matchers_on_timestamp() {
    let db = VaccineDb::open_in_memory().unwrap();
    for (i, ts) in [100, 200, 300, 400].iter().enumerate() {
        let id = format!("ci-{i}");
        db.checkins()
            .add(&mut checkin(&id, "900101-14-1234", "20260823-001", *ts))
            .unwrap();
    }

    let above = db
        .checkins()
        .query_by_index("timestamp", Matcher::Above(IndexValue::Int(200)))
        .unwrap();
    assert_eq!(
        above.iter().map(|c| c.timestamp).collect::<Vec<_>>(),
        vec![300, 400]
    );

    let range = db
        .checkins()
        .query_by_index(
            "timestamp",
            Matcher::InRange(IndexValue::Int(200), IndexValue::Int(300)),
        )
        .unwrap();
    assert_eq!(
        range.iter().map(|c| c.timestamp).collect::<Vec<_>>(),
        vec![200, 300]
    );
}

#[test]
fn latest_n_via_order_by_reverse_limit() {
    let db = VaccineDb::open_in_memory().unwrap();
    for i in 0..10 {
        let id = format!("ci-{i}");
        db.checkins()
            .add(&mut checkin(&id, "900101-14-1234", "20260823-001", 100 + i))
            .unwrap();
    }

    let latest = db
        .checkins()
        .order_by("timestamp")
        .unwrap()
        .reverse()
        .limit(3)
        .run()
        .unwrap();
    assert_eq!(
        latest.iter().map(|c| c.timestamp).collect::<Vec<_>>(),
        vec![109, 108, 107]
    );
}

#[test]
fn equal_timestamps_order_stably_by_key() {
    let db = VaccineDb::open_in_memory().unwrap();
    for id in ["ci-c", "ci-a", "ci-b"] {
        db.checkins()
            .add(&mut checkin(id, "900101-14-1234", "20260823-001", 500))
            .unwrap();
    }

    let ordered = db.checkins().order_by("timestamp").unwrap().run().unwrap();
    assert_eq!(
        ordered.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        vec!["ci-a", "ci-b", "ci-c"]
    );
}

#[test]
fn project_deletion_leaves_checkin_links_dangling() {
    let db = VaccineDb::open_in_memory().unwrap();
    let mut project = Project::new(
        "Factory Drive".into(),
        "Acme Sdn Bhd".into(),
        "1 Jalan Industri".into(),
        "Puan Siti".into(),
        now_millis(),
    );
    let project_id = db.projects().add(&mut project).unwrap();

    let mut c = checkin("ci-1", "900101-14-1234", "20260823-001", 100);
    c.project_id = Some(project_id);
    db.checkins().add(&mut c).unwrap();

    db.projects().delete(&project_id).unwrap();

    // The check-in keeps its project id even though the project is gone
    let loaded = db.checkins().get(&"ci-1".to_string()).unwrap().unwrap();
    assert_eq!(loaded.project_id, Some(project_id));
    assert!(db.projects().get(&project_id).unwrap().is_none());
}

#[test]
fn auto_increment_key_is_written_into_the_document() {
    let db = VaccineDb::open_in_memory().unwrap();
    let mut p1 = Project::new("A".into(), "C".into(), "Ad".into(), "P".into(), 1);
    let mut p2 = Project::new("B".into(), "C".into(), "Ad".into(), "P".into(), 2);
    let k1 = db.projects().add(&mut p1).unwrap();
    let k2 = db.projects().add(&mut p2).unwrap();
    assert_eq!((k1, k2), (1, 2));

    let loaded = db.projects().get(&2).unwrap().unwrap();
    assert_eq!(loaded.id, Some(2));
    assert_eq!(loaded.name, "B");
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db");

    {
        let db = VaccineDb::open(&path).unwrap();
        db.checkins()
            .add(&mut checkin("ci-1", "900101-14-1234", "20260823-001", 100))
            .unwrap();
    }

    let db = VaccineDb::open(&path).unwrap();
    assert_eq!(db.checkins().count().unwrap(), 1);
    let loaded = db.checkins().get(&"ci-1".to_string()).unwrap().unwrap();
    assert_eq!(loaded.full_name, "Patient ci-1");
}

#[test]
fn export_then_import_into_empty_store_round_trips() {
    let source = VaccineDb::open_in_memory().unwrap();
    source
        .checkins()
        .add(&mut checkin("ci-1", "900101-14-1234", "20260823-001", 100))
        .unwrap();
    let mut project = Project::new("Drive".into(), "Acme".into(), "Ad".into(), "P".into(), 1);
    source.projects().add(&mut project).unwrap();
    let mut settings = source.get_settings().unwrap();
    settings.clinic_name = "Klinik Vaksin Bangsar".into();
    source.put_settings(&mut settings).unwrap();

    let bundle = export_all(&source).unwrap();
    // Survives serialization to the on-disk JSON form
    let text = serde_json::to_string(&bundle).unwrap();
    let bundle = serde_json::from_str(&text).unwrap();

    let target = VaccineDb::open_in_memory().unwrap();
    let summary = import_all(&target, &bundle).unwrap();
    assert_eq!(summary.skipped, 0);

    assert_eq!(target.checkins().count().unwrap(), 1);
    assert_eq!(target.projects().count().unwrap(), 1);
    assert_eq!(
        target.get_settings().unwrap().clinic_name,
        "Klinik Vaksin Bangsar"
    );
}

#[test]
fn import_skips_existing_records_and_keeps_local_settings() {
    let db = VaccineDb::open_in_memory().unwrap();
    db.checkins()
        .add(&mut checkin("ci-1", "900101-14-1234", "20260823-001", 100))
        .unwrap();
    let mut settings = db.get_settings().unwrap();
    settings.passcode = "9999".into();
    db.put_settings(&mut settings).unwrap();

    let bundle = export_all(&db).unwrap();
    let summary = import_all(&db, &bundle).unwrap();
    assert_eq!(summary.added, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(db.checkins().count().unwrap(), 1);
    assert_eq!(db.get_settings().unwrap().passcode, "9999");
}

#[test]
fn mutations_reach_subscribers() {
    let db = VaccineDb::open_in_memory().unwrap();
    let mut feed = db.watch(&["checkins"]);

    db.checkins()
        .add(&mut checkin("ci-1", "900101-14-1234", "20260823-001", 100))
        .unwrap();
    db.checkins()
        .update(&"ci-1".to_string(), &serde_json::json!({ "status": "completed" }))
        .unwrap();
    db.checkins().delete(&"ci-1".to_string()).unwrap();
    // Writes elsewhere do not wake this subscription
    let mut p = Project::new("D".into(), "C".into(), "A".into(), "P".into(), 1);
    db.projects().add(&mut p).unwrap();

    let mut kinds = Vec::new();
    while let FeedPoll::Event(event) = feed.poll() {
        assert_eq!(event.collection, "checkins");
        kinds.push(event.kind);
    }
    assert_eq!(
        kinds,
        vec![ChangeKind::Added, ChangeKind::Updated, ChangeKind::Deleted]
    );
}

#[test]
fn concurrent_checkins_never_share_a_queue_number() {
    let db = VaccineDb::open_in_memory().unwrap();
    let day = chrono::NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();

    // Unsequenced callers racing to check patients in
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let db = db.clone();
            std::thread::spawn(move || {
                let mut c = checkin(&format!("ci-{i}"), "900101-14-1234", "", 100);
                db.add_checkin(&mut c, day).unwrap()
            })
        })
        .collect();
    let mut numbers: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();
    numbers.sort();
    assert_eq!(
        numbers,
        vec![
            "20260823-001",
            "20260823-002",
            "20260823-003",
            "20260823-004"
        ]
    );

    // Each number is on exactly one record
    let hits = db
        .checkins()
        .query_by_index(
            "queueNumber",
            Matcher::Equals(IndexValue::from("20260823-001")),
        )
        .unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn delete_all_notifies_every_collection() {
    let db = VaccineDb::open_in_memory().unwrap();
    let mut feed = db.watch(&[]);

    db.delete_all().unwrap();

    let mut cleared = Vec::new();
    while let FeedPoll::Event(event) = feed.poll() {
        assert_eq!(event.kind, ChangeKind::Cleared);
        cleared.push(event.collection);
    }
    assert_eq!(cleared.len(), 7);
    assert!(cleared.contains(&"checkins"));
    assert!(cleared.contains(&"settings"));
}

#[test]
fn settings_singleton_stays_at_key_one() {
    let db = VaccineDb::open_in_memory().unwrap();
    let mut settings = Settings::defaults();
    settings.id = None; // even a keyless put lands on the singleton row
    settings.doctor_name = "Dr. Lim".into();
    db.put_settings(&mut settings).unwrap();

    assert_eq!(settings.id, Some(1));
    assert_eq!(db.get_settings().unwrap().doctor_name, "Dr. Lim");
}
