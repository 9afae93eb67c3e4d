//! End-to-end save and load through the orchestrator.

use std::fs;

use serde_json::json;

use savekit_engine::prelude::*;

#[derive(Debug, Clone, Default)]
struct Stats {
    health: i32,
    pos: Vector3,
}

savekit_engine::save_component!(Stats {
    health: i32 => save("health", "hp"),
    pos: Vector3 => save(),
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mood {
    #[default]
    Calm,
    Angry,
}

savekit_engine::save_enum!(Mood { Calm, Angry });

#[derive(Debug, Clone, PartialEq, Default)]
struct Tag {
    label: String,
}

savekit_engine::save_struct!(Tag);

#[derive(Debug, Clone, Default)]
struct Npc {
    speed: f32,
    mood: Mood,
    tag: Tag,
    waypoints: Vec<Vector2>,
}

savekit_engine::save_component!(Npc {
    speed: f32 => save(),
    mood: Mood => save(),
    tag: Tag => save(),
    waypoints: Vec<Vector2> => save("path"),
});

fn player(stats: Stats) -> SaveObject {
    SaveObject::new("player")
        .with_id(SaveId::new("P1").unwrap())
        .with_component(stats)
}

fn stats_of(objects: &[SaveObject]) -> &Stats {
    objects[0].component::<Stats>().unwrap()
}

#[test]
fn end_to_end_round_trip() {
    let mut manager = SaveManager::new(MemoryBackend::new());
    let objects = vec![player(Stats {
        health: 100,
        pos: Vector3::new(1.0, 2.0, 3.0),
    })];
    manager.save("slot1", &objects).unwrap();

    let stored = manager.backend().slot("slot1").unwrap();
    assert_eq!(stored.get_raw("P1.Stats.health"), Some(&json!(100)));
    assert_eq!(stored.get_raw("P1.Stats.pos"), Some(&json!([1.0, 2.0, 3.0])));
    assert_eq!(stored.len(), 2);

    let mut fresh = vec![player(Stats::default())];
    let report = manager.load("slot1", &mut fresh).unwrap();
    assert_eq!(stats_of(&fresh).health, 100);
    assert_eq!(stats_of(&fresh).pos, Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(report.fields_loaded, 2);
    assert!(report.failed_fields.is_empty());
}

#[test]
fn alias_resolves_renamed_field() {
    let mut manager = SaveManager::new(MemoryBackend::new());
    let data: SaveData = [("P1.Stats.hp".to_owned(), json!(42))].into_iter().collect();

    let mut objects = vec![player(Stats {
        health: 1,
        pos: Vector3::new(9.0, 9.0, 9.0),
    })];
    let report = manager.apply(&data, &mut objects);

    assert_eq!(stats_of(&objects).health, 42);
    assert_eq!(stats_of(&objects).pos, Vector3::new(9.0, 9.0, 9.0));
    assert_eq!(report.fields_via_alias, 1);
    assert_eq!(report.fields_missing, 1);
}

#[test]
fn absent_key_and_alias_leave_field_untouched() {
    let mut manager = SaveManager::new(MemoryBackend::new());
    let data: SaveData = [("P2.Stats.health".to_owned(), json!(5))].into_iter().collect();

    let mut objects = vec![player(Stats {
        health: 77,
        pos: Vector3::ONE,
    })];
    let report = manager.apply(&data, &mut objects);
    assert_eq!(stats_of(&objects).health, 77);
    assert_eq!(stats_of(&objects).pos, Vector3::ONE);
    assert_eq!(report.fields_loaded, 0);
    assert_eq!(report.fields_missing, 2);
}

#[test]
fn lenient_values_are_converted_on_load() {
    let mut manager = SaveManager::new(MemoryBackend::new());
    let data: SaveData = [
        ("P1.Stats.health".to_owned(), json!("12.5")),
        ("P1.Stats.pos".to_owned(), json!({"x": 4, "y": 5, "z": 6})),
    ]
    .into_iter()
    .collect();

    let mut objects = vec![player(Stats::default())];
    manager.apply(&data, &mut objects);
    assert_eq!(stats_of(&objects).health, 12);
    assert_eq!(stats_of(&objects).pos, Vector3::new(4.0, 5.0, 6.0));
}

#[test]
fn objects_without_id_are_skipped() {
    let mut manager = SaveManager::new(MemoryBackend::new());
    let objects = vec![
        SaveObject::new("anonymous").with_component(Stats::default()),
        player(Stats::default()),
    ];
    let (data, report) = manager.capture(&objects);
    assert_eq!(report.objects_saved, 1);
    assert_eq!(report.objects_skipped, 1);
    assert!(data.keys().all(|k| k.starts_with("P1.")));
}

#[test]
fn unsupported_field_is_left_out_of_reflective_entries() {
    let mut manager = SaveManager::new(MemoryBackend::new());
    let objects = vec![SaveObject::new("npc")
        .with_id(SaveId::new("N").unwrap())
        .with_component(Npc {
            speed: 2.5,
            mood: Mood::Angry,
            tag: Tag { label: "guard".into() },
            waypoints: vec![Vector2::new(1.0, 2.0)],
        })];

    let (data, report) = manager.capture(&objects);
    assert_eq!(data.get_raw("N.Npc.mood"), Some(&json!("Angry")));
    assert_eq!(data.get_raw("N.Npc.path"), Some(&json!([[1.0, 2.0]])));
    assert!(!data.has_key("N.Npc.tag"));
    assert!(report.failed_fields.is_empty());
}

#[test]
fn one_bad_field_does_not_abort_the_save() {
    let mut context = SaveContext::new();
    context
        .discovery_mut()
        .register_registry(StaticSaveRegistry::new("generated").with::<Npc>());
    let mut manager = SaveManager::with_context(MemoryBackend::new(), context);

    let objects = vec![
        SaveObject::new("npc")
            .with_id(SaveId::new("N").unwrap())
            .with_component(Npc {
                speed: f32::NAN,
                mood: Mood::Calm,
                ..Npc::default()
            }),
        player(Stats {
            health: 3,
            pos: Vector3::ZERO,
        }),
    ];

    let report = manager.save("partial", &objects).unwrap();
    assert_eq!(report.failed_fields, ["N.Npc.speed", "N.Npc.tag"]);
    assert_eq!(report.entries_written, 4);

    let stored = manager.backend().slot("partial").unwrap();
    assert_eq!(stored.get_raw("N.Npc.mood"), Some(&json!("Calm")));
    assert_eq!(stored.get_raw("P1.Stats.health"), Some(&json!(3)));
}

#[test]
fn one_bad_field_does_not_abort_the_load() {
    let mut context = SaveContext::new();
    context
        .discovery_mut()
        .register_registry(StaticSaveRegistry::new("generated").with::<Npc>());
    let mut manager = SaveManager::with_context(MemoryBackend::new(), context);

    let data: SaveData = [
        ("N.Npc.tag".to_owned(), json!({"label": "x"})),
        ("N.Npc.mood".to_owned(), json!(1)),
        ("N.Npc.speed".to_owned(), json!(4)),
    ]
    .into_iter()
    .collect();

    let mut objects = vec![SaveObject::new("npc")
        .with_id(SaveId::new("N").unwrap())
        .with_component(Npc::default())];
    let report = manager.apply(&data, &mut objects);

    let npc = objects[0].component::<Npc>().unwrap();
    assert_eq!(npc.mood, Mood::Angry);
    assert_eq!(npc.speed, 4.0);
    assert_eq!(npc.tag, Tag::default());
    assert_eq!(report.failed_fields, ["N.Npc.tag"]);
    assert_eq!(report.fields_loaded, 2);
    assert_eq!(report.fields_missing, 1);
}

#[test]
fn empty_slot_name_is_rejected() {
    let mut manager = SaveManager::new(MemoryBackend::new());
    let mut objects = vec![player(Stats::default())];
    assert!(matches!(manager.save("", &objects), Err(SaveError::InvalidSlotName)));
    assert!(matches!(manager.load("", &mut objects), Err(SaveError::InvalidSlotName)));
}

#[test]
fn file_backend_writes_bare_object_under_sanitized_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = SaveManager::new(FileBackend::new(dir.path()).unwrap());
    let objects = vec![player(Stats {
        health: 100,
        pos: Vector3::new(1.0, 2.0, 3.0),
    })];
    manager.save("Slot #1", &objects).unwrap();

    let text = fs::read_to_string(dir.path().join("Slot__1.json")).unwrap();
    let body: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        body,
        json!({"P1.Stats.health": 100, "P1.Stats.pos": [1.0, 2.0, 3.0]})
    );

    assert!(manager.has_save("Slot #1"));
    assert_eq!(manager.save_slots().unwrap(), ["Slot__1"]);

    let mut fresh = vec![player(Stats::default())];
    manager.load("Slot #1", &mut fresh).unwrap();
    assert_eq!(stats_of(&fresh).health, 100);

    assert!(manager.delete_save("Slot #1").unwrap());
    assert!(!manager.has_save("Slot #1"));
}

#[test]
fn missing_slot_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = SaveManager::new(FileBackend::new(dir.path()).unwrap());
    let mut objects = vec![player(Stats {
        health: 8,
        pos: Vector3::ZERO,
    })];
    let report = manager.load("nope", &mut objects).unwrap();
    assert_eq!(stats_of(&objects).health, 8);
    assert_eq!(report.fields_loaded, 0);
}

#[test]
fn corrupt_file_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.json"), "not json").unwrap();
    let mut manager = SaveManager::new(FileBackend::new(dir.path()).unwrap());
    let mut objects = vec![player(Stats::default())];
    assert!(matches!(
        manager.load("bad", &mut objects),
        Err(SaveError::Json { .. })
    ));
}
