#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that steers enemies towards the player.
//!
//! Ground enemies follow the maze one tile at a time using the pathfinder.
//! Flyers pursue directly: they keep apart from their own kind, climb to a
//! cruise height while far away, and dive to the player's eye height once
//! close.

use glam::Vec3;
use hordefall_core::{
    Command, EnemySnapshot, EnemyView, PlayerSnapshot, TileMapView, Tuning,
};
use hordefall_system_pathfinding::Pathfinder;

/// Enemy steering system that emits [`Command::SteerEnemy`] for every enemy.
#[derive(Debug)]
pub struct EnemyAi {
    pathfinder: Pathfinder,
    view_height: f32,
    cruise_height: f32,
    swoop_distance: f32,
    min_separation_sq: f32,
}

impl EnemyAi {
    /// Creates the steering system for the provided tuning.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pathfinder: Pathfinder::new(),
            view_height: tuning.player.view_height,
            cruise_height: tuning.enemies.cruise_height,
            swoop_distance: tuning.enemies.swoop_distance,
            min_separation_sq: tuning.physics.min_separation_sq,
        }
    }

    /// Emits one steering command per enemy, in identifier order.
    pub fn handle(
        &mut self,
        enemies: &EnemyView,
        player: &PlayerSnapshot,
        map: TileMapView<'_>,
        out: &mut Vec<Command>,
    ) {
        if !player.is_alive() {
            return;
        }

        out.reserve(enemies.len());
        for enemy in enemies.iter() {
            let (heading, nudge) = if enemy.kind.is_ground() {
                let from = enemy.position.truncate();
                let target = self
                    .pathfinder
                    .next_step_target(map, from, player.position.truncate());
                ((target - from).normalize_or_zero().extend(0.0), Vec3::ZERO)
            } else {
                (self.pursuit(enemy, player), self.separation(enemy, enemies))
            };

            out.push(Command::SteerEnemy {
                enemy: enemy.id,
                heading,
                nudge,
            });
        }
    }

    fn pursuit(&self, enemy: &EnemySnapshot, player: &PlayerSnapshot) -> Vec3 {
        let distance = enemy
            .position
            .truncate()
            .distance(player.position.truncate());
        let height = if enemy.position.z < self.cruise_height && distance > self.swoop_distance {
            self.cruise_height
        } else {
            self.view_height
        };
        (player.position + Vec3::Z * height - enemy.position).normalize_or_zero()
    }

    fn separation(&self, enemy: &EnemySnapshot, enemies: &EnemyView) -> Vec3 {
        enemies
            .iter()
            .filter(|other| other.kind == enemy.kind)
            .fold(Vec3::ZERO, |nudge, other| {
                let offset = enemy.position - other.position;
                let distance_sq = offset.length_squared();
                let reach = enemy.radius + other.radius;
                if distance_sq < self.min_separation_sq || distance_sq > reach * reach {
                    return nudge;
                }
                nudge + offset.normalize() * (reach - distance_sq.sqrt())
            })
    }
}
