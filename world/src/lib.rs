#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Hordefall.

mod arena;
mod collision;

use std::time::Duration;

use glam::{Vec2, Vec3};
use hordefall_core::{
    AttackCadence, CollisionPartner, Command, EnemyId, EnemyKind, EnemyStats, Event, ThingKind,
    TileLayout, Tuning,
};
use tracing::{debug, info};

use crate::{
    arena::Arena,
    collision::{Body, Contact, Resolver},
};

/// Represents the authoritative Hordefall world state.
#[derive(Debug)]
pub struct World {
    tuning: Tuning,
    arena: Arena,
    player: Player,
    enemies: Vec<Enemy>,
    projectiles: Vec<Body>,
    progress: Progress,
    clock: Duration,
    previous_clock: Duration,
    next_enemy_id: u32,
    resolver: Resolver,
    contacts: Vec<Contact>,
}

impl World {
    /// Creates a world on an empty arena; nothing moves until a new game starts.
    #[must_use]
    pub fn new(tuning: Tuning) -> Self {
        let arena = Arena::empty(tuning.map.size);
        let player = Player::spawn(&tuning);
        Self {
            arena,
            player,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            progress: Progress::default(),
            clock: Duration::ZERO,
            previous_clock: Duration::ZERO,
            next_enemy_id: 0,
            resolver: Resolver::default(),
            contacts: Vec::new(),
            tuning,
        }
    }

    fn reset(&mut self, layout: TileLayout) {
        self.arena = Arena::from_layout(layout, 1.0);
        self.player = Player::spawn(&self.tuning);
        self.enemies.clear();
        self.projectiles.clear();
        self.progress = Progress::default();
        self.clock = Duration::ZERO;
        self.previous_clock = Duration::ZERO;
        self.next_enemy_id = 0;
    }

    fn launch_projectile(&mut self, position: Vec3, velocity: Vec3) {
        let mut body = Body::new(position, ThingKind::Projectile.radius(&self.tuning));
        body.velocity = velocity;
        self.projectiles.push(body);
    }

    fn step_player(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let seconds = dt.as_secs_f32();
        let tuning = &self.tuning.player;

        let shots = self.player.weapon.advance(
            dt,
            tuning.weapon_interval(),
            self.player.steering.trigger,
        );
        let muzzle = self.player.body.position
            + Vec3::Z * (tuning.view_height * self.tuning.projectile.muzzle_height_factor);
        let velocity =
            self.player.aim * self.tuning.projectile.speed + Vec3::Z * self.tuning.projectile.lift;
        for _ in 0..shots {
            self.launch_projectile(muzzle, velocity);
            out_events.push(Event::ProjectileFired { position: muzzle });
        }

        let tuning = &self.tuning.player;
        let player = &mut self.player;
        if std::mem::take(&mut player.steering.jump) && player.jumps > 0 {
            player.jumps -= 1;
            player.body.velocity.z = tuning.jump_strength;
            out_events.push(Event::PlayerJumped);
        }

        let rate = if player.body.velocity.z != 0.0 {
            tuning.air_acceleration
        } else {
            tuning.ground_acceleration
        };
        let blend = approach(rate, seconds);
        let horizontal = player.body.velocity.truncate();
        let horizontal = horizontal + (player.steering.intent - horizontal) * blend;
        player.body.velocity = horizontal.extend(player.body.velocity.z + tuning.gravity * seconds);

        let _ = self.resolver.advance(
            &mut player.body,
            seconds,
            tuning.step_height,
            self.arena.view(),
            &[],
            &self.tuning.physics,
        );
        if player.body.velocity.z == 0.0 {
            player.jumps = tuning.jump_charges;
        }
    }

    fn step_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let seconds = dt.as_secs_f32();
        let World {
            tuning,
            arena,
            enemies,
            projectiles,
            progress,
            resolver,
            ..
        } = self;
        let map = arena.view();

        projectiles.retain_mut(|projectile| {
            if resolver
                .advance(projectile, seconds, 0.0, map, &[], &tuning.physics)
                .is_some()
            {
                return false;
            }

            let Some(enemy) = enemies.iter_mut().find(|enemy| {
                enemy.is_alive() && {
                    let reach = enemy.body.radius + projectile.radius;
                    enemy.body.position.distance_squared(projectile.position) <= reach * reach
                }
            }) else {
                return true;
            };

            enemy.health -= tuning.projectile.damage;
            if enemy.is_alive() {
                let mut knockback =
                    projectile.velocity.normalize_or_zero() * tuning.projectile.knockback;
                knockback.z = knockback.z.max(0.0);
                enemy.body.velocity += knockback;
                out_events.push(Event::EnemyDamaged {
                    enemy: enemy.id,
                    kind: enemy.kind,
                    position: enemy.body.position,
                    health: enemy.health,
                });
            } else {
                progress.kills += 1;
                out_events.push(Event::EnemyKilled {
                    enemy: enemy.id,
                    kind: enemy.kind,
                    position: enemy.body.position,
                });
            }
            false
        });
        enemies.retain(Enemy::is_alive);
    }

    fn step_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let seconds = dt.as_secs_f32();
        let World {
            tuning,
            arena,
            player,
            enemies,
            projectiles,
            progress,
            clock,
            resolver,
            contacts,
            ..
        } = self;
        let map = arena.view();
        let physics = &tuning.physics;
        let blend = approach(physics.enemy_response_rate, seconds);

        for index in 0..enemies.len() {
            contacts.clear();
            if enemies[index].kind.is_ground() {
                contacts.extend(
                    enemies
                        .iter()
                        .enumerate()
                        .filter(|(other, _)| *other != index)
                        .map(|(_, other)| Contact {
                            partner: CollisionPartner::Enemy(other.id),
                            position: other.body.position,
                            radius: other.body.radius,
                        }),
                );
                contacts.push(Contact {
                    partner: CollisionPartner::Player,
                    position: player.body.position,
                    radius: player.body.radius,
                });
            }

            let enemy = &mut enemies[index];
            if enemy.kind.is_ground() {
                enemy.body.velocity.z = 0.0;
            }
            let target = enemy.heading * enemy.stats.move_speed;
            enemy.body.velocity += (target - enemy.body.velocity) * blend;
            let _ = resolver.advance(&mut enemy.body, seconds, 0.0, map, contacts.as_slice(), physics);

            let offset = enemy.body.position - player.body.position;
            let reach = enemy.body.radius + player.body.radius + physics.melee_margin;
            if offset.length_squared() >= reach * reach {
                continue;
            }
            if enemy
                .cadence
                .advance(dt, enemy.stats.attack_interval, true)
                == 0
            {
                continue;
            }

            player.last_hit = Some(*clock);
            player.health -= enemy.stats.attack_damage;
            out_events.push(Event::PlayerDamaged {
                damage: enemy.stats.attack_damage,
                health: player.health,
            });

            if player.health <= 0.0 {
                projectiles.clear();
                progress.game_over_at = Some(*clock);
                info!(
                    wave = progress.wave,
                    kills = progress.kills,
                    "player died"
                );
                out_events.push(Event::PlayerDied {
                    position: player.body.position,
                });
                return;
            }

            let push = offset.truncate().normalize_or_zero().extend(0.0) * physics.melee_knockback;
            player.body.velocity -= push;
            enemy.body.velocity += push;
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::NewGame { layout } => {
            debug_assert_eq!(layout.size(), world.tuning.map.size);
            world.reset(layout);
            info!(seed = world.tuning.seed, "new game started");
            out_events.push(Event::GameStarted);
        }
        Command::Tick { dt } => {
            if world.progress.game_over_at.is_some() {
                return;
            }

            world.previous_clock = world.clock;
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });

            world.step_player(dt, out_events);
            world.step_projectiles(dt, out_events);
        }
        Command::MoveEnemies { dt } => {
            if world.progress.game_over_at.is_none() {
                world.step_enemies(dt, out_events);
            }
        }
        Command::SteerPlayer {
            aim,
            intent,
            jump,
            trigger,
        } => {
            let player = &mut world.player;
            player.aim = aim.try_normalize().unwrap_or(player.aim);
            player.steering = Steering {
                intent,
                jump,
                trigger,
            };
        }
        Command::SteerEnemy {
            enemy,
            heading,
            nudge,
        } => {
            if let Some(enemy) = world.enemies.iter_mut().find(|candidate| candidate.id == enemy) {
                enemy.heading = heading;
                enemy.body.position += nudge;
            }
        }
        Command::StartWave { layout, spawns } => {
            debug_assert_eq!(layout.size(), world.tuning.map.size);
            world.arena = Arena::from_layout(layout, 0.0);
            world.progress.wave += 1;
            world.progress.remaining_spawns = spawns;
            info!(wave = world.progress.wave, spawns, "wave started");
            out_events.push(Event::WaveStarted {
                wave: world.progress.wave,
                spawns,
            });
        }
        Command::SpawnEnemy {
            kind,
            position,
            stats,
        } => {
            let id = EnemyId::new(world.next_enemy_id);
            world.next_enemy_id = world.next_enemy_id.wrapping_add(1);
            let radius = ThingKind::Enemy(kind).radius(&world.tuning);
            world.enemies.push(Enemy {
                id,
                kind,
                body: Body::new(position, radius),
                heading: Vec3::ZERO,
                health: stats.health,
                stats,
                cadence: AttackCadence::default(),
            });
            world.progress.remaining_spawns = world.progress.remaining_spawns.saturating_sub(1);
            debug!(enemy = id.get(), ?kind, ?position, "enemy spawned");
            out_events.push(Event::EnemySpawned {
                enemy: id,
                kind,
                position,
            });
        }
        Command::FadeWalls { level } => {
            world.arena.fade(level);
        }
        Command::CompleteWave => {
            world.progress.wave_started_at = world.clock;
            info!(
                wave = world.progress.wave,
                kills = world.progress.kills,
                "wave completed"
            );
            out_events.push(Event::WaveCompleted {
                wave: world.progress.wave,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use hordefall_core::{
        EnemySnapshot, EnemyView, PlayerSnapshot, ProgressSnapshot, ProjectileSnapshot,
        TileMapView, Tuning,
    };

    use super::World;

    /// Captures the player's current state.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        let player = &world.player;
        PlayerSnapshot {
            position: player.body.position,
            velocity: player.body.velocity,
            aim: player.aim,
            radius: player.body.radius,
            health: player.health,
            max_health: world.tuning.player.max_health,
            jumps: player.jumps,
            last_hit: player.last_hit,
        }
    }

    /// Captures a read-only view of the living enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|enemy| EnemySnapshot {
                    id: enemy.id,
                    kind: enemy.kind,
                    position: enemy.body.position,
                    velocity: enemy.body.velocity,
                    radius: enemy.body.radius,
                    health: enemy.health,
                })
                .collect(),
        )
    }

    /// Captures every projectile in flight, in launch order.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|body| ProjectileSnapshot {
                position: body.position,
                velocity: body.velocity,
            })
            .collect()
    }

    /// Read-only view of the installed tile map and its current wall heights.
    #[must_use]
    pub fn tile_map(world: &World) -> TileMapView<'_> {
        world.arena.view()
    }

    /// Rise level of interior walls, `0.0` sunk to `1.0` raised.
    #[must_use]
    pub fn wall_level(world: &World) -> f32 {
        world.arena.level()
    }

    /// Wave counters and timers.
    #[must_use]
    pub fn progress(world: &World) -> ProgressSnapshot {
        let progress = &world.progress;
        ProgressSnapshot {
            wave: progress.wave,
            remaining_spawns: progress.remaining_spawns,
            kills: progress.kills,
            wave_elapsed: world.clock.saturating_sub(progress.wave_started_at),
            previous_wave_elapsed: world
                .previous_clock
                .saturating_sub(progress.wave_started_at),
            game_over_at: progress.game_over_at,
        }
    }

    /// Simulation time elapsed since the current game started.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Tuning the world was created with.
    #[must_use]
    pub fn tuning(world: &World) -> &Tuning {
        &world.tuning
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Steering {
    intent: Vec2,
    jump: bool,
    trigger: bool,
}

#[derive(Clone, Debug)]
struct Player {
    body: Body,
    aim: Vec3,
    health: f32,
    jumps: u32,
    last_hit: Option<Duration>,
    weapon: AttackCadence,
    steering: Steering,
}

impl Player {
    fn spawn(tuning: &Tuning) -> Self {
        let center = tuning.map.size as f32 * 0.5 + 0.5;
        Self {
            body: Body::new(Vec3::new(center, center, 0.0), ThingKind::Player.radius(tuning)),
            aim: Vec3::Y,
            health: tuning.player.max_health,
            jumps: tuning.player.jump_charges,
            last_hit: None,
            weapon: AttackCadence::default(),
            steering: Steering::default(),
        }
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    body: Body,
    heading: Vec3,
    health: f32,
    stats: EnemyStats,
    cadence: AttackCadence,
}

impl Enemy {
    fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Progress {
    wave: u32,
    remaining_spawns: u32,
    kills: u32,
    wave_started_at: Duration,
    game_over_at: Option<Duration>,
}

/// Share of the remaining gap an exponential approach closes over `dt` seconds.
fn approach(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hordefall_core::{EnemyKind, Tile};

    fn open_layout(size: u32) -> TileLayout {
        let arena = Arena::empty(size);
        let view = arena.view();
        TileLayout::new(
            size,
            view.iter().collect(),
            (0..size * size).map(|_| 2.5).collect(),
        )
    }

    fn started_world() -> (World, Vec<Event>) {
        let tuning = Tuning::default();
        let size = tuning.map.size;
        let mut world = World::new(tuning);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::NewGame {
                layout: open_layout(size),
            },
            &mut events,
        );
        (world, events)
    }

    fn tick(world: &mut World, dt: Duration, events: &mut Vec<Event>) {
        apply(world, Command::Tick { dt }, events);
        apply(world, Command::MoveEnemies { dt }, events);
    }

    fn stats(health: f32) -> EnemyStats {
        EnemyStats {
            move_speed: 1.5,
            attack_damage: 10.0,
            attack_interval: Duration::from_millis(500),
            health,
        }
    }

    #[test]
    fn new_game_resets_to_wave_zero() {
        let (world, events) = started_world();
        let progress = query::progress(&world);

        assert_eq!(events, vec![Event::GameStarted]);
        assert_eq!(progress.wave, 0);
        assert_eq!(progress.remaining_spawns, 0);
        assert_eq!(progress.kills, 0);
        assert!(query::enemy_view(&world).is_empty());
        assert_eq!(query::player(&world).position, Vec3::new(9.0, 9.0, 0.0));
        assert_eq!(query::player(&world).jumps, 2);
    }

    #[test]
    fn open_layout_keeps_border_heights() {
        let layout = open_layout(7);
        assert_eq!(layout.tiles()[0], Tile::Wall);
        assert_eq!(layout.tiles()[8], Tile::Empty);
    }

    #[test]
    fn projectile_hit_damages_and_pushes_enemy() {
        let (mut world, mut events) = started_world();
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Crawler,
                position: Vec3::new(5.45, 9.0, 0.15),
                stats: stats(2.0),
            },
            &mut events,
        );
        world.launch_projectile(Vec3::new(5.0, 9.0, 0.15), Vec3::new(10.0, 0.0, 0.0));
        events.clear();

        tick(&mut world, Duration::from_millis(45), &mut events);

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::EnemyDamaged { health, .. } if (*health - 1.0).abs() < 1e-6)));
        assert!(query::projectiles(&world).is_empty());
        assert_eq!(query::progress(&world).kills, 0);

        let enemy = query::enemy_view(&world)
            .iter()
            .next()
            .copied()
            .expect("crawler survives");
        assert!(enemy.velocity.x > 0.4, "enemy {:?}", enemy.velocity);
        assert!(enemy.velocity.y.abs() < 1e-4);
    }

    #[test]
    fn lethal_hit_removes_enemy_and_counts_one_kill() {
        let (mut world, mut events) = started_world();
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Bat,
                position: Vec3::new(5.45, 9.0, 0.15),
                stats: stats(1.0),
            },
            &mut events,
        );
        for _ in 0..2 {
            world.launch_projectile(Vec3::new(5.0, 9.0, 0.15), Vec3::new(10.0, 0.0, 0.0));
        }
        events.clear();

        tick(&mut world, Duration::from_millis(45), &mut events);

        let kills = events
            .iter()
            .filter(|event| matches!(event, Event::EnemyKilled { .. }))
            .count();
        assert_eq!(kills, 1);
        assert_eq!(query::progress(&world).kills, 1);
        assert!(query::enemy_view(&world).is_empty());
        assert_eq!(query::projectiles(&world).len(), 1);
    }

    #[test]
    fn standing_player_keeps_jump_charges() {
        let (mut world, mut events) = started_world();
        tick(&mut world, Duration::from_millis(16), &mut events);
        let player = query::player(&world);
        assert_eq!(player.position.z, 0.0);
        assert_eq!(player.jumps, 2);
    }

    #[test]
    fn jump_spends_a_charge_until_landing() {
        let (mut world, mut events) = started_world();
        apply(
            &mut world,
            Command::SteerPlayer {
                aim: Vec3::Y,
                intent: Vec2::ZERO,
                jump: true,
                trigger: false,
            },
            &mut events,
        );
        tick(&mut world, Duration::from_millis(16), &mut events);

        assert!(events.contains(&Event::PlayerJumped));
        let player = query::player(&world);
        assert_eq!(player.jumps, 1);
        assert!(player.position.z > 0.0);

        for _ in 0..120 {
            tick(&mut world, Duration::from_millis(16), &mut events);
        }
        assert_eq!(query::player(&world).jumps, 2);
        assert_eq!(query::player(&world).position.z, 0.0);
    }

    #[test]
    fn held_trigger_fires_on_weapon_cadence() {
        let (mut world, mut events) = started_world();
        apply(
            &mut world,
            Command::SteerPlayer {
                aim: Vec3::Y,
                intent: Vec2::ZERO,
                jump: false,
                trigger: true,
            },
            &mut events,
        );
        events.clear();
        tick(&mut world, Duration::from_millis(300), &mut events);

        let shots = events
            .iter()
            .filter(|event| matches!(event, Event::ProjectileFired { .. }))
            .count();
        assert_eq!(shots, 3);
    }

    #[test]
    fn held_trigger_fire_rate_ignores_frame_length() {
        for frame in [10, 25, 50, 100, 150] {
            let (mut world, mut events) = started_world();
            apply(
                &mut world,
                Command::SteerPlayer {
                    aim: Vec3::Y,
                    intent: Vec2::ZERO,
                    jump: false,
                    trigger: true,
                },
                &mut events,
            );
            events.clear();
            for _ in 0..(1500 / frame) {
                tick(&mut world, Duration::from_millis(frame), &mut events);
            }

            let shots = events
                .iter()
                .filter(|event| matches!(event, Event::ProjectileFired { .. }))
                .count();
            assert_eq!(shots, 15, "{frame} ms frames");
        }
    }

    #[test]
    fn melee_strike_hurts_player_and_pushes_both_apart() {
        let (mut world, mut events) = started_world();
        let player = query::player(&world).position;
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Bat,
                position: player + Vec3::new(0.4, 0.0, 0.3),
                stats: stats(5.0),
            },
            &mut events,
        );
        events.clear();

        tick(&mut world, Duration::from_millis(16), &mut events);

        assert!(events.iter().any(|event| matches!(
            event,
            Event::PlayerDamaged { damage, health }
                if (*damage - 10.0).abs() < 1e-6 && (*health - 90.0).abs() < 1e-6
        )));
        let snapshot = query::player(&world);
        assert_eq!(snapshot.health, 90.0);
        assert_eq!(snapshot.last_hit, Some(query::clock(&world)));
        assert!(snapshot.velocity.x < -0.99, "player {:?}", snapshot.velocity);
        assert!(snapshot.velocity.y.abs() < 1e-4);

        let enemy = query::enemy_view(&world)
            .iter()
            .next()
            .copied()
            .expect("bat survives");
        assert!(enemy.velocity.x > 0.99, "enemy {:?}", enemy.velocity);
        assert!(enemy.velocity.y.abs() < 1e-4);
        assert!(!query::progress(&world).is_game_over());
    }

    #[test]
    fn knockback_never_points_downward() {
        let (mut world, mut events) = started_world();
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Bat,
                position: Vec3::new(5.3, 9.0, 0.9),
                stats: stats(3.0),
            },
            &mut events,
        );
        world.launch_projectile(Vec3::new(5.0, 9.0, 1.3), Vec3::new(6.0, 0.0, -8.0));
        events.clear();

        tick(&mut world, Duration::from_millis(16), &mut events);

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::EnemyDamaged { .. })));
        let enemy = query::enemy_view(&world)
            .iter()
            .next()
            .copied()
            .expect("bat survives");
        assert!(enemy.velocity.x > 0.25, "enemy {:?}", enemy.velocity);
        assert!(enemy.velocity.z.abs() < 1e-6, "enemy {:?}", enemy.velocity);
    }

    #[test]
    fn melee_kills_player_and_freezes_world() {
        let (mut world, mut events) = started_world();
        let player = query::player(&world).position;
        let mut lethal = stats(5.0);
        lethal.attack_damage = 150.0;
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Wraith,
                position: player + Vec3::new(0.3, 0.0, 0.0),
                stats: lethal,
            },
            &mut events,
        );
        world.launch_projectile(Vec3::new(2.0, 2.0, 1.0), Vec3::new(0.0, 1.0, 0.0));
        events.clear();

        tick(&mut world, Duration::from_millis(16), &mut events);

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::PlayerDied { .. })));
        assert!(query::progress(&world).is_game_over());
        assert!(query::projectiles(&world).is_empty());

        let clock = query::clock(&world);
        events.clear();
        tick(&mut world, Duration::from_millis(16), &mut events);
        assert!(events.is_empty());
        assert_eq!(query::clock(&world), clock);
    }

    #[test]
    fn complete_wave_restarts_wave_clock() {
        let (mut world, mut events) = started_world();
        tick(&mut world, Duration::from_millis(250), &mut events);
        assert_eq!(
            query::progress(&world).wave_elapsed,
            Duration::from_millis(250)
        );

        events.clear();
        apply(&mut world, Command::CompleteWave, &mut events);
        assert_eq!(events, vec![Event::WaveCompleted { wave: 0 }]);
        assert_eq!(query::progress(&world).wave_elapsed, Duration::ZERO);
    }
}
