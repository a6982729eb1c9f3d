use macroquad::prelude::vec2;

use evosim::config::{ReproductionConfig, SimConfig, SpawnerConfig};
use evosim::genome::Genome;
use evosim::settings::SettingValue;
use evosim::world::World;

/// No starting population, no spawner.
fn empty_config() -> SimConfig {
    SimConfig {
        initial_population: Some(0),
        spawner: SpawnerConfig {
            enabled: false,
            ..SpawnerConfig::default()
        },
        ..SimConfig::default()
    }
}

fn genome(size: f32, speed: f32, photo: f32, digestion: f32) -> Genome {
    Genome::new(vec![size, 0.5, 0.5, 0.5, speed, photo, digestion, 0.5])
}

#[test]
fn same_seed_gives_the_same_world() {
    let mut a = World::new(SimConfig::default(), 99);
    let mut b = World::new(SimConfig::default(), 99);
    for _ in 0..300 {
        a.tick();
        b.tick();
    }
    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(a.stats.total_births, b.stats.total_births);
}

#[test]
fn energy_and_health_stay_within_limits() {
    let mut world = World::new(SimConfig::default(), 7);
    for _ in 0..600 {
        world.tick();
        for (_, e) in world.arena.iter_alive() {
            let m = e.metabolism.as_ref().unwrap();
            assert!(m.energy >= 0.0 && m.energy <= m.max_energy);
            assert!(m.health >= 0.0 && m.health <= m.max_health);
        }
    }
}

#[test]
fn population_never_exceeds_the_caps() {
    let cfg = SimConfig {
        initial_population: Some(45),
        reproduction: ReproductionConfig {
            max_population: 50,
            base_chance: 1.0,
            ..ReproductionConfig::default()
        },
        spawner: SpawnerConfig {
            max_entities: 50,
            interval: 0.0,
            spawn_rate: 5,
            ..SpawnerConfig::default()
        },
        ..SimConfig::default()
    };
    let mut world = World::new(cfg, 13);
    for _ in 0..400 {
        world.tick();
        assert!(world.arena.count <= 50, "population {}", world.arena.count);
    }
}

#[test]
fn starving_organism_dies_and_is_removed() {
    let mut world = World::new(empty_config(), 1);
    let id = world.spawn_genome(genome(0.5, 0.0, 0.0, 0.5), vec2(300.0, 300.0));
    {
        let m = world.arena.get_mut(id).unwrap().metabolism.as_mut().unwrap();
        m.energy = 0.0;
        m.health = 1.0;
    }
    for _ in 0..240 {
        world.tick();
    }
    assert!(world.arena.get(id).is_none());
    assert_eq!(world.stats.total_deaths, 1);
}

#[test]
fn eaten_prey_is_gone_by_the_end_of_the_tick() {
    let mut world = World::new(empty_config(), 3);
    let predator = world.spawn_genome(genome(0.5, 0.0, 0.0, 1.0), vec2(300.0, 300.0));
    let prey = world.spawn_genome(genome(0.2, 0.0, 0.0, 0.5), vec2(306.0, 300.0));
    {
        let m = world.arena.get_mut(predator).unwrap().metabolism.as_mut().unwrap();
        m.energy = m.max_energy * 0.5;
    }

    world.tick();

    assert!(world.arena.get(prey).is_none());
    assert_eq!(world.last_tick.consumed, 1);
    let m = world.arena.get(predator).unwrap().metabolism.as_ref().unwrap();
    assert!(m.energy > m.max_energy * 0.5);
    assert!(m.digest_cooldown > 0.0);
}

#[test]
fn plants_grow_a_population_on_sunlight_alone() {
    let cfg = SimConfig {
        reproduction: ReproductionConfig {
            base_chance: 1.0,
            max_cooldown: 1.0,
            ..ReproductionConfig::default()
        },
        ..empty_config()
    };
    let mut world = World::new(cfg, 17);
    for i in 0..4 {
        world.spawn_genome(genome(0.2, 0.0, 1.0, 0.5), vec2(100.0 + 200.0 * i as f32, 400.0));
    }
    for _ in 0..600 {
        world.tick();
    }
    assert!(world.stats.total_births > 0);
    assert!(world.arena.count > 4);
}

#[test]
fn settings_changes_reach_running_systems() {
    let mut world = World::new(empty_config(), 5);
    let id = world.spawn_genome(genome(0.5, 0.0, 0.0, 0.5), vec2(300.0, 300.0));
    world
        .apply_setting("Energy", "HealthToSizeMultiplier", SettingValue::Number(20.0))
        .unwrap();
    world.tick();
    let m = world.arena.get(id).unwrap().metabolism.as_ref().unwrap();
    assert_eq!(m.max_health, 200.0);

    world
        .apply_setting("Spawner", "Enabled", SettingValue::Flag(true))
        .unwrap();
    world
        .apply_setting("Spawner", "SpawnInterval", SettingValue::Number(0.1))
        .unwrap();
    for _ in 0..12 {
        world.tick();
    }
    assert!(world.stats.population.last().unwrap() > 1.0);
}
