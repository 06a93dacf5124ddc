#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave progression system that paces walls, waves and enemy spawns.
//!
//! Every wave follows the same clock. While the banner runs the walls of the
//! cleared maze sink; at the end of the banner the next maze is installed and
//! its walls rise. Once the spawn delay passes, enemies are released at a rate
//! that grows slowly with the wave number. The wave is complete when every
//! enemy was released and destroyed, which restarts the clock.

use glam::{Vec2, Vec3};
use hordefall_core::{
    derive_labeled_seed, Command, EnemyKind, EnemyStats, EnemyTuning, EnemyView, PlayerSnapshot,
    ProgressSnapshot, Tuning, WaveTuning, RNG_STREAM_SPAWNS,
};
use hordefall_system_map_generation::MapGeneration;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Roll thresholds separating crawlers, bats and wraiths.
const CRAWLER_CUTOFF: f32 = 0.6;
const BAT_CUTOFF: f32 = 0.9;
/// Waves it takes for the kind roll to drift by a whole unit.
const KIND_DRIFT_WAVES: f32 = 15.0;
/// Distance from the border flyers keep when they appear.
const FLYER_BORDER_GAP: f32 = 2.0;

/// Pure system that emits wave, wall fade and spawn commands.
#[derive(Debug)]
pub struct Progression {
    enemies: EnemyTuning,
    waves: WaveTuning,
    maps: MapGeneration,
    spawn_seed: u64,
    rng: ChaCha8Rng,
}

impl Progression {
    /// Creates the progression system for the provided tuning.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        let spawn_seed = derive_labeled_seed(tuning.seed, RNG_STREAM_SPAWNS);
        Self {
            enemies: tuning.enemies.clone(),
            waves: tuning.waves.clone(),
            maps: MapGeneration::new(tuning.map.clone(), tuning.seed),
            spawn_seed,
            rng: ChaCha8Rng::seed_from_u64(spawn_seed),
        }
    }

    /// Emits the command that starts a new game on the open arena.
    ///
    /// The spawn generator restarts as well, so every game of a run rolls the
    /// same enemies for the same inputs.
    pub fn new_game(&mut self, out: &mut Vec<Command>) {
        self.rng = ChaCha8Rng::seed_from_u64(self.spawn_seed);
        out.push(Command::NewGame {
            layout: self.maps.generate(0),
        });
    }

    /// Consumes the state after a tick and emits the commands it calls for.
    pub fn handle(
        &mut self,
        progress: &ProgressSnapshot,
        player: &PlayerSnapshot,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        if progress.is_game_over() {
            return;
        }

        let banner = self.waves.banner_length;
        let now = progress.wave_elapsed.as_secs_f32();
        let before = progress.previous_wave_elapsed.as_secs_f32();

        if before < banner {
            out.push(Command::FadeWalls {
                level: 1.0 - (now / banner).clamp(0.0, 1.0),
            });
            if now >= banner {
                let wave = progress.wave + 1;
                let spawns = self.waves.spawns_for(wave);
                debug!(wave, spawns, "requesting next wave");
                out.push(Command::StartWave {
                    layout: self.maps.generate(wave),
                    spawns,
                });
            }
        }
        if now >= banner && before < 2.0 * banner {
            out.push(Command::FadeWalls {
                level: ((now - banner) / banner).clamp(0.0, 1.0),
            });
        }

        if now < self.waves.spawn_start {
            return;
        }

        if progress.remaining_spawns == 0 {
            if enemies.is_empty() {
                out.push(Command::CompleteWave);
            }
            return;
        }

        let rate = self.waves.spawn_rate(progress.wave);
        let crossings = ((now * rate).floor() - (before * rate).floor()).max(0.0) as u32;
        let anchor = player.position.truncate();
        for _ in 0..crossings.min(progress.remaining_spawns) {
            let command = self.roll_spawn(progress.wave, anchor);
            out.push(command);
        }
    }

    fn roll_spawn(&mut self, wave: u32, player: Vec2) -> Command {
        let kind = self.roll_kind(wave);
        let position = self.place(kind, player);
        let profile = self.enemies.profile(kind);
        let stats = EnemyStats {
            move_speed: profile.speed.at(self.rng.gen()) + profile.speed_per_wave * wave as f32,
            attack_damage: profile.damage.at(self.rng.gen()),
            attack_interval: profile.attack_interval(),
            health: profile.health.at(self.rng.gen()),
        };
        Command::SpawnEnemy {
            kind,
            position,
            stats,
        }
    }

    fn roll_kind(&mut self, wave: u32) -> EnemyKind {
        let scale = match wave {
            0..=2 => CRAWLER_CUTOFF,
            3..=4 => BAT_CUTOFF,
            _ => 1.0,
        };
        let roll = self.rng.gen::<f32>() * scale + wave as f32 / KIND_DRIFT_WAVES;
        if roll < CRAWLER_CUTOFF {
            EnemyKind::Crawler
        } else if roll < BAT_CUTOFF {
            EnemyKind::Bat
        } else {
            EnemyKind::Wraith
        }
    }

    /// Rolls positions until one lies outside the keep-away circle around the
    /// player, falling back to the farthest candidate once retries run out.
    fn place(&mut self, kind: EnemyKind, player: Vec2) -> Vec3 {
        let keep_away = self.enemies.min_spawn_distance * self.enemies.min_spawn_distance;
        let mut best = self.candidate(kind);
        let mut best_distance = best.truncate().distance_squared(player);
        let mut retries = 0;
        while best_distance <= keep_away && retries < self.enemies.spawn_retry_limit {
            let candidate = self.candidate(kind);
            let distance = candidate.truncate().distance_squared(player);
            if distance > best_distance {
                best = candidate;
                best_distance = distance;
            }
            retries += 1;
        }
        if best_distance <= keep_away {
            debug!(?kind, ?best, "spawn placed inside keep-away circle");
        }
        best
    }

    fn candidate(&mut self, kind: EnemyKind) -> Vec3 {
        let size = self.maps.size();
        let height = self.enemies.profile(kind).spawn_height;
        if kind.is_ground() {
            let half = size / 2;
            let column = self.rng.gen_range(0..half);
            let row = self.rng.gen_range(0..half);
            return Vec3::new(
                1.5 + 2.0 * column as f32,
                1.5 + 2.0 * row as f32,
                height.at(self.rng.gen()),
            );
        }

        let plane = FLYER_BORDER_GAP..size as f32 - FLYER_BORDER_GAP;
        let x = self.rng.gen_range(plane.clone());
        let y = self.rng.gen_range(plane);
        Vec3::new(x, y, height.at(self.rng.gen()))
    }
}
