//! Save a player to disk, rename a field, and load the old save back.
//!
//! Run with:
//!   cargo run --example player_stats -p savekit-engine
//!
//! Set `RUST_LOG=debug` to see alias resolution and per-slot file I/O.

use anyhow::Context;
use savekit_engine::prelude::*;

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Class {
    #[default]
    Warrior,
    Mage,
}

savekit_engine::save_enum!(Class { Warrior, Mage });

/// Version 1 of the player's stats, saved under `hp`.
#[derive(Debug, Clone, Default)]
struct StatsV1 {
    hp: i32,
}

savekit_engine::save_component!(StatsV1 {
    hp: i32 => save("hp"),
});

/// Version 2 renames `hp` to `health`; the alias keeps old saves loading.
#[derive(Debug, Clone, Default)]
struct Stats {
    health: i32,
    class: Class,
    position: Vector3,
    tint: Color,
    inventory: Vec<String>,
}

savekit_engine::save_component!(Stats {
    health: i32 => save("health", "hp"),
    class: Class => save(),
    position: Vector3 => save(),
    tint: Color => save(),
    inventory: Vec<String> => save(),
});

fn main() -> anyhow::Result<()> {
    init_logging("info");

    let dir = tempfile::tempdir().context("creating temp save dir")?;
    let config = SaveConfig::default().with_saves_dir(dir.path());
    let mut manager = SaveManager::new(FileBackend::from_config(&config)?);

    // The v1 component stores its stats under the old key.
    let id = SaveId::new("player-1")?;
    let old = vec![SaveObject::new("player")
        .with_id(id.clone())
        .with_component(StatsV1 { hp: 80 })];
    manager.save("legacy", &old)?;

    let mut current = vec![SaveObject::new("player")
        .with_id(id.clone())
        .with_component(Stats::default())];
    let report = manager.load("legacy", &mut current)?;
    println!(
        "loaded legacy save: {} field(s), {} via alias, {} missing",
        report.fields_loaded, report.fields_via_alias, report.fields_missing
    );

    if let Some(stats) = current[0].component_mut::<Stats>() {
        stats.class = Class::Mage;
        stats.position = Vector3::new(4.0, 0.5, -2.0);
        stats.tint = Color::rgb(0.2, 0.4, 0.9);
        stats.inventory = vec!["staff".into(), "potion".into()];
    }
    manager.save("slot 1", &current)?;

    let path = manager.backend().slot_path("slot 1");
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    println!("{} ->\n{text}", path.display());
    println!("slots: {:?}", manager.save_slots()?);

    let mut restored = vec![SaveObject::new("player")
        .with_id(id)
        .with_component(Stats::default())];
    manager.load("slot 1", &mut restored)?;
    let stats = restored[0]
        .component::<Stats>()
        .context("player has no Stats component")?;
    println!("restored: {stats:?}");
    Ok(())
}
