//! Tunable constants of the simulation, loadable from configuration files.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::EnemyKind;

/// Smallest supported edge length of the square map.
pub const MIN_MAP_SIZE: u32 = 7;
/// Largest supported edge length of the square map.
pub const MAX_MAP_SIZE: u32 = 65;

/// Errors reported when a tuning document describes an unusable simulation.
#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    /// The maze lattice needs an odd edge length within the supported bounds.
    #[error("map size {size} must be odd and within {min}..={max}")]
    MapSize {
        /// Rejected edge length.
        size: u32,
        /// Smallest accepted edge length.
        min: u32,
        /// Largest accepted edge length.
        max: u32,
    },
    /// A value that must be strictly positive was zero, negative or not finite.
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive {
        /// Dotted path of the offending key.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A value was NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NotFinite {
        /// Dotted path of the offending key.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A range had its lower bound above its upper bound.
    #[error("{field} range is inverted: {min} > {max}")]
    InvertedRange {
        /// Dotted path of the offending key.
        field: &'static str,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },
    /// A probability fell outside `0.0..=1.0`.
    #[error("{field} must be a probability in 0..=1, got {value}")]
    Probability {
        /// Dotted path of the offending key.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A count that drives a loop was zero.
    #[error("{field} must be at least one")]
    ZeroCount {
        /// Dotted path of the offending key.
        field: &'static str,
    },
}

/// Closed-open interval of floating point values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    /// Inclusive lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

impl FloatRange {
    /// Creates a new range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Interpolates the range at `unit`, expected within `0.0..1.0`.
    #[must_use]
    pub fn at(&self, unit: f32) -> f32 {
        self.min + (self.max - self.min) * unit
    }

    /// Reports whether `value` lies within the closed-open interval.
    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value < self.max
    }

    fn validate(&self, field: &'static str) -> Result<(), TuningError> {
        finite(field, self.min)?;
        finite(field, self.max)?;
        if self.min > self.max {
            return Err(TuningError::InvertedRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Complete tuning document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Run seed every random stream derives from.
    pub seed: u64,
    /// Map generation.
    pub map: MapTuning,
    /// Player movement and weapon.
    pub player: PlayerTuning,
    /// Player projectiles.
    pub projectile: ProjectileTuning,
    /// Collision resolution and shared motion constants.
    pub physics: PhysicsTuning,
    /// Enemy profiles and spawning.
    pub enemies: EnemyTuning,
    /// Wave timers and quotas.
    pub waves: WaveTuning,
}

impl Tuning {
    /// Checks every value the simulation relies on.
    pub fn validate(&self) -> Result<(), TuningError> {
        self.map.validate()?;
        self.player.validate()?;
        self.projectile.validate()?;
        self.physics.validate()?;
        self.enemies.validate()?;
        self.waves.validate()
    }
}

/// Map generation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapTuning {
    /// Edge length of the square grid; must be odd.
    pub size: u32,
    /// Random open cells punched before carving.
    pub seed_holes: u32,
    /// Random-walk steps per carve batch.
    pub carve_batch: u32,
    /// Carve batches attempted before the deterministic sweep takes over.
    pub carve_retry_limit: u32,
    /// Number of full carve passes over the lattice.
    pub carve_passes: u32,
    /// Chance an isolated pillar survives cleanup.
    pub pillar_keep_chance: f32,
    /// Base height of interior walls.
    pub wall_height: FloatRange,
    /// Height of the border ring.
    pub border_height: FloatRange,
}

impl Default for MapTuning {
    fn default() -> Self {
        Self {
            size: 17,
            seed_holes: 10,
            carve_batch: 100,
            carve_retry_limit: 256,
            carve_passes: 2,
            pillar_keep_chance: 0.1,
            wall_height: FloatRange::new(0.2, 0.8),
            border_height: FloatRange::new(2.2, 2.8),
        }
    }
}

impl MapTuning {
    fn validate(&self) -> Result<(), TuningError> {
        if self.size % 2 == 0 || !(MIN_MAP_SIZE..=MAX_MAP_SIZE).contains(&self.size) {
            return Err(TuningError::MapSize {
                size: self.size,
                min: MIN_MAP_SIZE,
                max: MAX_MAP_SIZE,
            });
        }
        count("map.carve_batch", self.carve_batch)?;
        count("map.carve_passes", self.carve_passes)?;
        probability("map.pillar_keep_chance", self.pillar_keep_chance)?;
        self.wall_height.validate("map.wall_height")?;
        self.border_height.validate("map.border_height")
    }
}

/// Player movement, health and weapon parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Collision radius.
    pub radius: f32,
    /// Eye height above the feet.
    pub view_height: f32,
    /// Tallest ledge the player walks onto.
    pub step_height: f32,
    /// Forward and backward speed.
    pub forward_speed: f32,
    /// Sideways speed.
    pub strafe_speed: f32,
    /// Velocity response rate while grounded.
    pub ground_acceleration: f32,
    /// Velocity response rate while airborne.
    pub air_acceleration: f32,
    /// Upward speed set by a jump.
    pub jump_strength: f32,
    /// Jumps available before landing again.
    pub jump_charges: u32,
    /// Vertical acceleration; negative pulls down.
    pub gravity: f32,
    /// Starting health.
    pub max_health: f32,
    /// Radians of rotation per pointer unit.
    pub look_sensitivity: f32,
    /// Seconds between two shots.
    pub weapon_interval: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 0.25,
            view_height: 0.42,
            step_height: 0.2,
            forward_speed: 3.0,
            strafe_speed: 3.0,
            ground_acceleration: 10.0,
            air_acceleration: 1.0,
            jump_strength: 3.0,
            jump_charges: 2,
            gravity: -7.0,
            max_health: 100.0,
            look_sensitivity: 0.01,
            weapon_interval: 0.1,
        }
    }
}

impl PlayerTuning {
    /// Time between two shots.
    #[must_use]
    pub fn weapon_interval(&self) -> Duration {
        seconds(self.weapon_interval)
    }

    fn validate(&self) -> Result<(), TuningError> {
        positive("player.radius", self.radius)?;
        positive("player.view_height", self.view_height)?;
        finite("player.step_height", self.step_height)?;
        positive("player.forward_speed", self.forward_speed)?;
        positive("player.strafe_speed", self.strafe_speed)?;
        positive("player.ground_acceleration", self.ground_acceleration)?;
        positive("player.air_acceleration", self.air_acceleration)?;
        finite("player.jump_strength", self.jump_strength)?;
        finite("player.gravity", self.gravity)?;
        positive("player.max_health", self.max_health)?;
        finite("player.look_sensitivity", self.look_sensitivity)?;
        positive("player.weapon_interval", self.weapon_interval)
    }
}

/// Projectile parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Collision radius.
    pub radius: f32,
    /// Launch speed along the aim direction.
    pub speed: f32,
    /// Extra upward speed added at launch.
    pub lift: f32,
    /// Muzzle height as a fraction of the player's view height.
    pub muzzle_height_factor: f32,
    /// Health removed from an enemy per hit.
    pub damage: f32,
    /// Knockback speed applied to a surviving enemy.
    pub knockback: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            radius: 0.1,
            speed: 10.0,
            lift: 0.1,
            muzzle_height_factor: 0.8,
            damage: 1.0,
            knockback: 0.5,
        }
    }
}

impl ProjectileTuning {
    fn validate(&self) -> Result<(), TuningError> {
        positive("projectile.radius", self.radius)?;
        positive("projectile.speed", self.speed)?;
        finite("projectile.lift", self.lift)?;
        finite("projectile.muzzle_height_factor", self.muzzle_height_factor)?;
        positive("projectile.damage", self.damage)?;
        finite("projectile.knockback", self.knockback)
    }
}

/// Collision resolution and shared motion constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Longest distance a body travels between two collision passes.
    pub max_substep: f32,
    /// Heights outside this band resolve immediately as a world hit.
    pub height_band: FloatRange,
    /// Extra distance added when pushing a body out of a wall face.
    pub push_epsilon: f32,
    /// Margin added to combined radii for crawler contact colliders.
    pub contact_margin: f32,
    /// Squared distance below which overlapping bodies are left alone.
    pub min_separation_sq: f32,
    /// Margin added to combined radii for melee reach.
    pub melee_margin: f32,
    /// Speed exchanged by player and enemy when a strike lands.
    pub melee_knockback: f32,
    /// Velocity response rate of enemies.
    pub enemy_response_rate: f32,
    /// Longest frame step the simulation accepts, in seconds.
    pub max_frame_step: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            max_substep: 0.2,
            height_band: FloatRange::new(-10.0, 20.0),
            push_epsilon: 0.001,
            contact_margin: 0.25,
            min_separation_sq: 0.01,
            melee_margin: 0.1,
            melee_knockback: 1.0,
            enemy_response_rate: 1.0,
            max_frame_step: 1.0 / 3.0,
        }
    }
}

impl PhysicsTuning {
    /// Longest frame step the simulation accepts.
    #[must_use]
    pub fn max_frame_step(&self) -> Duration {
        seconds(self.max_frame_step)
    }

    fn validate(&self) -> Result<(), TuningError> {
        positive("physics.max_substep", self.max_substep)?;
        self.height_band.validate("physics.height_band")?;
        finite("physics.push_epsilon", self.push_epsilon)?;
        finite("physics.contact_margin", self.contact_margin)?;
        finite("physics.min_separation_sq", self.min_separation_sq)?;
        finite("physics.melee_margin", self.melee_margin)?;
        finite("physics.melee_knockback", self.melee_knockback)?;
        positive("physics.enemy_response_rate", self.enemy_response_rate)?;
        positive("physics.max_frame_step", self.max_frame_step)
    }
}

/// Behaviour parameters of one enemy kind.
///
/// Profiles are replaced whole; a configuration table for one kind must list
/// every key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    /// Collision radius.
    pub radius: f32,
    /// Cruise speed roll.
    pub speed: FloatRange,
    /// Cruise speed added per wave.
    pub speed_per_wave: f32,
    /// Strike damage roll.
    pub damage: FloatRange,
    /// Seconds between two strikes.
    pub attack_interval: f32,
    /// Starting health roll.
    pub health: FloatRange,
    /// Spawn height roll; ignored by ground enemies.
    pub spawn_height: FloatRange,
}

impl EnemyProfile {
    fn crawler() -> Self {
        Self {
            radius: 0.25,
            speed: FloatRange::new(1.1, 1.9),
            speed_per_wave: 0.0,
            damage: FloatRange::new(8.0, 13.0),
            attack_interval: 0.5,
            health: FloatRange::new(0.1, 1.5),
            spawn_height: FloatRange::new(0.15, 0.15),
        }
    }

    fn bat() -> Self {
        Self {
            radius: 0.25,
            speed: FloatRange::new(1.5, 2.5),
            speed_per_wave: 0.0,
            damage: FloatRange::new(11.0, 15.0),
            attack_interval: 0.4,
            health: FloatRange::new(0.9, 2.5),
            spawn_height: FloatRange::new(1.5, 2.5),
        }
    }

    fn wraith() -> Self {
        Self {
            radius: 0.5,
            speed: FloatRange::new(2.1, 3.6),
            speed_per_wave: 0.05,
            damage: FloatRange::new(13.0, 20.0),
            attack_interval: 0.25,
            health: FloatRange::new(2.0, 9.0),
            spawn_height: FloatRange::new(1.7, 2.9),
        }
    }

    /// Time between two strikes.
    #[must_use]
    pub fn attack_interval(&self) -> Duration {
        seconds(self.attack_interval)
    }

    fn validate(&self, kind: &'static str) -> Result<(), TuningError> {
        positive(kind, self.radius)?;
        self.speed.validate(kind)?;
        finite(kind, self.speed_per_wave)?;
        self.damage.validate(kind)?;
        positive(kind, self.attack_interval)?;
        self.health.validate(kind)?;
        self.spawn_height.validate(kind)
    }
}

/// Enemy profiles and spawn placement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Ground melee enemy.
    pub crawler: EnemyProfile,
    /// Low-flying enemy.
    pub bat: EnemyProfile,
    /// High-flying enemy.
    pub wraith: EnemyProfile,
    /// Height flyers climb to while far from the player.
    pub cruise_height: f32,
    /// Horizontal distance beyond which low flyers climb to cruise height.
    pub swoop_distance: f32,
    /// Closest horizontal distance to the player a spawn may land at.
    pub min_spawn_distance: f32,
    /// Placement rolls attempted before settling on the farthest candidate.
    pub spawn_retry_limit: u32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            crawler: EnemyProfile::crawler(),
            bat: EnemyProfile::bat(),
            wraith: EnemyProfile::wraith(),
            cruise_height: 2.0,
            swoop_distance: 5.0,
            min_spawn_distance: 5.0,
            spawn_retry_limit: 64,
        }
    }
}

impl EnemyTuning {
    /// Profile of the provided kind.
    #[must_use]
    pub fn profile(&self, kind: EnemyKind) -> &EnemyProfile {
        match kind {
            EnemyKind::Crawler => &self.crawler,
            EnemyKind::Bat => &self.bat,
            EnemyKind::Wraith => &self.wraith,
        }
    }

    fn validate(&self) -> Result<(), TuningError> {
        self.crawler.validate("enemies.crawler")?;
        self.bat.validate("enemies.bat")?;
        self.wraith.validate("enemies.wraith")?;
        finite("enemies.cruise_height", self.cruise_height)?;
        finite("enemies.swoop_distance", self.swoop_distance)?;
        finite("enemies.min_spawn_distance", self.min_spawn_distance)?;
        count("enemies.spawn_retry_limit", self.spawn_retry_limit)
    }
}

/// Wave timers and quotas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Seconds each of the sink and rise transitions lasts.
    pub banner_length: f32,
    /// Wave time at which spawning begins.
    pub spawn_start: f32,
    /// Spawns released by the first maze wave.
    pub base_spawns: u32,
    /// Extra spawns per subsequent wave.
    pub spawns_per_wave: u32,
    /// Waves needed to add one spawn per second to the spawn rate.
    pub spawn_rate_divisor: f32,
    /// Seconds after death before a restart is accepted.
    pub restart_delay: f32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            banner_length: 2.0,
            spawn_start: 5.0,
            base_spawns: 4,
            spawns_per_wave: 3,
            spawn_rate_divisor: 30.0,
            restart_delay: 1.0,
        }
    }
}

impl WaveTuning {
    /// Enemies released by the provided maze wave; wave zero releases none.
    #[must_use]
    pub fn spawns_for(&self, wave: u32) -> u32 {
        match wave {
            0 => 0,
            _ => self.base_spawns + (wave - 1) * self.spawns_per_wave,
        }
    }

    /// Spawns per second during the provided wave.
    #[must_use]
    pub fn spawn_rate(&self, wave: u32) -> f32 {
        1.0 + wave as f32 / self.spawn_rate_divisor
    }

    /// Delay after death before a restart is accepted.
    #[must_use]
    pub fn restart_delay(&self) -> Duration {
        seconds(self.restart_delay)
    }

    fn validate(&self) -> Result<(), TuningError> {
        positive("waves.banner_length", self.banner_length)?;
        finite("waves.spawn_start", self.spawn_start)?;
        if self.spawn_start < 2.0 * self.banner_length {
            return Err(TuningError::InvertedRange {
                field: "waves.spawn_start",
                min: 2.0 * self.banner_length,
                max: self.spawn_start,
            });
        }
        positive("waves.spawn_rate_divisor", self.spawn_rate_divisor)?;
        finite("waves.restart_delay", self.restart_delay)?;
        if self.restart_delay < 0.0 {
            return Err(TuningError::NotPositive {
                field: "waves.restart_delay",
                value: self.restart_delay,
            });
        }
        Ok(())
    }
}

/// Converts a configured period to whole microseconds so decimal values such
/// as `0.1` land exactly on their intended duration.
fn seconds(value: f32) -> Duration {
    if !value.is_finite() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_micros((f64::from(value) * 1e6).round() as u64)
}

fn finite(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::NotFinite { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { field, value })
    }
}

fn probability(field: &'static str, value: f32) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::Probability { field, value })
    }
}

fn count(field: &'static str, value: u32) -> Result<(), TuningError> {
    if value == 0 {
        Err(TuningError::ZeroCount { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Tuning::default().validate(), Ok(()));
    }

    #[test]
    fn even_map_size_is_rejected() {
        let mut tuning = Tuning::default();
        tuning.map.size = 16;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::MapSize { size: 16, .. })
        ));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut tuning = Tuning::default();
        tuning.enemies.bat.health = FloatRange::new(3.0, 1.0);
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::InvertedRange {
                field: "enemies.bat",
                ..
            })
        ));
    }

    #[test]
    fn zero_substep_is_rejected() {
        let mut tuning = Tuning::default();
        tuning.physics.max_substep = 0.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::NotPositive {
                field: "physics.max_substep",
                ..
            })
        ));
    }

    #[test]
    fn configured_periods_are_exact() {
        let tuning = Tuning::default();
        assert_eq!(tuning.player.weapon_interval(), Duration::from_millis(100));
        assert_eq!(
            tuning.enemies.wraith.attack_interval(),
            Duration::from_millis(250)
        );
        assert_eq!(tuning.enemies.bat.attack_interval(), Duration::from_millis(400));
        assert_eq!(seconds(-1.0), Duration::ZERO);
        assert_eq!(seconds(f32::NAN), Duration::ZERO);
    }

    #[test]
    fn wave_quota_grows_by_three() {
        let waves = WaveTuning::default();
        assert_eq!(waves.spawns_for(0), 0);
        assert_eq!(waves.spawns_for(1), 4);
        assert_eq!(waves.spawns_for(2), 7);
        assert_eq!(waves.spawns_for(5), 16);
    }

    #[test]
    fn partial_documents_fall_back_to_defaults() {
        let tuning: Tuning = toml::from_str(
            r#"
                seed = 42

                [map]
                size = 21

                [enemies]
                cruise_height = 2.5
            "#,
        )
        .expect("document parses");

        assert_eq!(tuning.seed, 42);
        assert_eq!(tuning.map.size, 21);
        assert_eq!(tuning.map.seed_holes, 10);
        assert_eq!(tuning.enemies.cruise_height, 2.5);
        assert_eq!(tuning.enemies.wraith.speed, FloatRange::new(2.1, 3.6));
        assert_eq!(tuning.player, PlayerTuning::default());
    }
}
