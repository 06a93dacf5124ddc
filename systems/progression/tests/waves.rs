use std::time::Duration;

use hordefall_core::{Command, Event, Tuning};
use hordefall_system_progression::Progression;
use hordefall_world::{self as world, query, World};

const FRAME: Duration = Duration::from_millis(100);

struct Harness {
    world: World,
    progression: Progression,
    events: Vec<Event>,
}

impl Harness {
    fn new(tuning: Tuning) -> Self {
        let mut harness = Self {
            world: World::new(tuning.clone()),
            progression: Progression::new(&tuning),
            events: Vec::new(),
        };
        let mut commands = Vec::new();
        harness.progression.new_game(&mut commands);
        harness.submit(commands);
        harness
    }

    fn submit(&mut self, commands: Vec<Command>) {
        for command in commands {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    /// Runs one world step followed by the progression pass and returns its events.
    fn frame(&mut self) -> Vec<Event> {
        let start = self.events.len();
        self.submit(vec![
            Command::Tick { dt: FRAME },
            Command::MoveEnemies { dt: FRAME },
        ]);

        let mut commands = Vec::new();
        self.progression.handle(
            &query::progress(&self.world),
            &query::player(&self.world),
            &query::enemy_view(&self.world),
            &mut commands,
        );
        self.submit(commands);
        self.events[start..].to_vec()
    }

    fn frames(&mut self, count: usize) -> Vec<Event> {
        (0..count).flat_map(|_| self.frame()).collect()
    }
}

fn spawned(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::EnemySpawned { .. }))
        .count()
}

#[test]
fn first_wave_starts_when_the_opening_banner_ends() {
    let mut harness = Harness::new(Tuning::default());

    let opening = harness.frames(19);
    assert!(!opening
        .iter()
        .any(|event| matches!(event, Event::WaveStarted { .. })));

    let crossing = harness.frame();
    assert!(crossing.contains(&Event::WaveStarted { wave: 1, spawns: 4 }));
    assert_eq!(query::progress(&harness.world).wave, 1);
    assert_eq!(query::progress(&harness.world).remaining_spawns, 4);
}

#[test]
fn maze_walls_rise_after_installation() {
    let mut harness = Harness::new(Tuning::default());

    let _ = harness.frames(20);
    assert_eq!(query::wall_level(&harness.world), 0.0);

    let _ = harness.frames(10);
    assert!((query::wall_level(&harness.world) - 0.5).abs() < 1e-4);

    let _ = harness.frames(10);
    assert_eq!(query::wall_level(&harness.world), 1.0);
}

#[test]
fn first_wave_releases_its_spawns_after_the_delay() {
    let mut harness = Harness::new(Tuning::default());

    let before_delay = harness.frames(49);
    assert_eq!(spawned(&before_delay), 0);

    let released = harness.frames(51);
    assert_eq!(spawned(&released), 4);
    assert_eq!(query::progress(&harness.world).remaining_spawns, 0);
    assert!(!released
        .iter()
        .any(|event| matches!(event, Event::WaveCompleted { .. })));

    let player = query::player(&harness.world).position.truncate();
    for event in &released {
        if let Event::EnemySpawned { position, .. } = event {
            assert!(position.truncate().distance(player) > 5.0);
        }
    }
}

#[test]
fn same_seed_rolls_the_same_enemies() {
    let tuning = Tuning {
        seed: 0x5eed,
        ..Tuning::default()
    };
    let mut first = Harness::new(tuning.clone());
    let mut second = Harness::new(tuning);

    assert_eq!(first.frames(100), second.frames(100));
}

#[test]
fn new_game_replays_the_spawn_rolls() {
    let mut harness = Harness::new(Tuning::default());
    let first: Vec<Event> = harness.frames(100);

    let mut commands = Vec::new();
    harness.progression.new_game(&mut commands);
    harness.submit(commands);
    let second: Vec<Event> = harness.frames(100);

    assert_eq!(first, second);
}
