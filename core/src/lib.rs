#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hordefall simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems read immutable snapshots
//! and views, submit [`Command`] values describing desired mutations, the
//! world executes those commands via its `apply` entry point, and then
//! broadcasts [`Event`] values that systems and adapters react to
//! deterministically.

mod seed;
mod tuning;

use std::time::Duration;

use glam::{Vec2, Vec3};

pub use seed::{
    derive_labeled_seed, derive_wave_seed, RNG_STREAM_BORDER, RNG_STREAM_EFFECTS,
    RNG_STREAM_SPAWNS, RNG_STREAM_WALL_HEIGHTS,
};
pub use tuning::{
    EnemyProfile, EnemyTuning, FloatRange, MapTuning, PhysicsTuning, PlayerTuning,
    ProjectileTuning, Tuning, TuningError, WaveTuning, MAX_MAP_SIZE, MIN_MAP_SIZE,
};

/// Canonical banner shown while the simulation waits on the title screen.
pub const TITLE_BANNER: &str = "Hordefall. Defeat the hordes, delay the inevitable.";

/// Top-level phase of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// No simulation runs; the session waits for the start input.
    Title,
    /// Full simulation: player, projectiles, enemies and waves advance.
    Active,
    /// The player died; simulation is frozen until the restart input.
    GameOver,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards every entity and starts wave zero on the provided layout.
    NewGame {
        /// Open arena the first wave is played on.
        layout: TileLayout,
    },
    /// Advances the simulation clock, the player and projectiles by `dt`.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Moves enemies along their current headings and resolves melee strikes.
    ///
    /// Issued after `Tick` so enemy steering sees the player where this frame
    /// left them.
    MoveEnemies {
        /// Same duration as the preceding tick.
        dt: Duration,
    },
    /// Replaces the player's steering intent for the next tick.
    SteerPlayer {
        /// Normalised aim direction.
        aim: Vec3,
        /// Desired horizontal velocity in world units per second.
        intent: Vec2,
        /// Whether a jump was requested this frame.
        jump: bool,
        /// Whether the trigger is held.
        trigger: bool,
    },
    /// Replaces an enemy's steering heading and nudges it out of overlaps.
    SteerEnemy {
        /// Enemy being steered.
        enemy: EnemyId,
        /// Unit direction the enemy wants to travel in.
        heading: Vec3,
        /// Positional correction applied immediately.
        nudge: Vec3,
    },
    /// Advances to the next wave on a freshly generated layout.
    StartWave {
        /// Layout the wave is played on.
        layout: TileLayout,
        /// Number of enemies the wave releases.
        spawns: u32,
    },
    /// Releases one enemy of the current wave.
    SpawnEnemy {
        /// Behavioural class of the enemy.
        kind: EnemyKind,
        /// Spawn position.
        position: Vec3,
        /// Rolled combat statistics.
        stats: EnemyStats,
    },
    /// Sets the rise level of interior walls, `0.0` sunk to `1.0` raised.
    FadeWalls {
        /// Rise level in `0.0..=1.0`.
        level: f32,
    },
    /// Marks the current wave as won and restarts the wave clock.
    CompleteWave,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A new game was set up on wave zero.
    GameStarted,
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// The player fired a projectile.
    ProjectileFired {
        /// Muzzle position of the projectile.
        position: Vec3,
    },
    /// The player spent a jump charge.
    PlayerJumped,
    /// A projectile hit an enemy that survived.
    EnemyDamaged {
        /// Enemy that absorbed the hit.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Enemy position at the time of the hit.
        position: Vec3,
        /// Health remaining after the hit.
        health: f32,
    },
    /// A projectile destroyed an enemy.
    EnemyKilled {
        /// Enemy that was destroyed.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Enemy position at the time of death.
        position: Vec3,
    },
    /// An enemy struck the player in melee.
    PlayerDamaged {
        /// Damage dealt by the strike.
        damage: f32,
        /// Player health after the strike.
        health: f32,
    },
    /// The player's health dropped to zero.
    PlayerDied {
        /// Player position at the time of death.
        position: Vec3,
    },
    /// A new wave began and its layout was installed.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Number of enemies the wave will release.
        spawns: u32,
    },
    /// An enemy entered the arena.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Spawn position.
        position: Vec3,
    },
    /// Every enemy of the wave was released and destroyed.
    WaveCompleted {
        /// Wave that was cleared.
        wave: u32,
    },
}

/// Content of a single grid tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tile {
    /// Traversable floor.
    Empty,
    /// Blocking wall with an associated height.
    Wall,
}

/// Behavioural class of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    /// Fast, weak ground melee enemy that follows the maze.
    Crawler,
    /// Low-flying enemy with direct pursuit.
    Bat,
    /// Strong high-flying enemy that swoops in from cruise height.
    Wraith,
}

impl EnemyKind {
    /// Reports whether the enemy walks the maze instead of flying over it.
    #[must_use]
    pub const fn is_ground(self) -> bool {
        matches!(self, Self::Crawler)
    }
}

/// Discriminates every body that takes part in collision resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThingKind {
    /// Player projectile.
    Projectile,
    /// The single local player.
    Player,
    /// An enemy of the given kind.
    Enemy(EnemyKind),
    /// Static geometry; a collision partner, never a simulated body.
    World,
}

impl ThingKind {
    /// Collision radius assigned to bodies of this kind.
    #[must_use]
    pub fn radius(self, tuning: &Tuning) -> f32 {
        match self {
            Self::Projectile => tuning.projectile.radius,
            Self::Player => tuning.player.radius,
            Self::Enemy(kind) => tuning.enemies.profile(kind).radius,
            Self::World => 0.0,
        }
    }
}

/// What a moving body touched during collision resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollisionPartner {
    /// Walls, ground, or the world bounds.
    World,
    /// Another enemy.
    Enemy(EnemyId),
    /// The player.
    Player,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Rolled combat statistics of a single enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Cruise speed in world units per second.
    pub move_speed: f32,
    /// Damage dealt per melee strike.
    pub attack_damage: f32,
    /// Minimum time between two strikes.
    pub attack_interval: Duration,
    /// Starting health.
    pub health: f32,
}

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// World-space centre of the cell.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.column as f32 + 0.5, self.row as f32 + 0.5)
    }
}

/// Square tile grid with a parallel per-cell wall height array.
///
/// Tiles are stored row-major. The outer ring is always [`Tile::Wall`] for
/// layouts produced by the map generator; empty cells carry a height of zero.
#[derive(Clone, Debug, PartialEq)]
pub struct TileLayout {
    size: u32,
    tiles: Vec<Tile>,
    heights: Vec<f32>,
}

impl TileLayout {
    /// Creates a layout from row-major tiles and heights.
    #[must_use]
    pub fn new(size: u32, tiles: Vec<Tile>, heights: Vec<f32>) -> Self {
        debug_assert_eq!(tiles.len(), (size * size) as usize);
        debug_assert_eq!(heights.len(), tiles.len());
        Self {
            size,
            tiles,
            heights,
        }
    }

    /// Number of tiles along each edge.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Row-major tiles.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Row-major wall heights.
    #[must_use]
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Read-only view over the layout.
    #[must_use]
    pub fn view(&self) -> TileMapView<'_> {
        TileMapView::new(self.size, &self.tiles, &self.heights)
    }
}

/// Read-only view into a square tile grid.
#[derive(Clone, Copy, Debug)]
pub struct TileMapView<'a> {
    size: u32,
    tiles: &'a [Tile],
    heights: &'a [f32],
}

impl<'a> TileMapView<'a> {
    /// Captures a new view backed by row-major tile and height slices.
    #[must_use]
    pub fn new(size: u32, tiles: &'a [Tile], heights: &'a [f32]) -> Self {
        Self {
            size,
            tiles,
            heights,
        }
    }

    /// Number of tiles along each edge.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Edge length of the grid in world units.
    #[must_use]
    pub fn extent(&self) -> f32 {
        self.size as f32
    }

    /// Tile stored at the provided cell, if it lies within the grid.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<Tile> {
        self.index(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Reports whether the cell blocks movement. Cells outside the grid block.
    #[must_use]
    pub fn is_wall(&self, cell: CellCoord) -> bool {
        self.tile(cell).map_or(true, |tile| tile == Tile::Wall)
    }

    /// Wall height stored at the provided cell.
    #[must_use]
    pub fn height(&self, cell: CellCoord) -> Option<f32> {
        self.index(cell)
            .and_then(|index| self.heights.get(index).copied())
    }

    /// Cell containing the point, clamped onto the grid.
    #[must_use]
    pub fn clamped_cell(&self, point: Vec2) -> CellCoord {
        let last = self.size.saturating_sub(1) as f32;
        let column = point.x.floor().clamp(0.0, last);
        let row = point.y.floor().clamp(0.0, last);
        CellCoord::new(column as u32, row as u32)
    }

    /// Row-major index of the cell, if it lies within the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.size && cell.row() < self.size {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.size).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    /// Cell stored at the provided row-major index.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> CellCoord {
        let width = self.size as usize;
        CellCoord::new((index % width) as u32, (index / width) as u32)
    }

    /// Iterator over all tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Tile> + 'a {
        self.tiles.iter().copied()
    }
}

/// Frame-rate independent cooldown that can yield several actions per frame.
///
/// While engaged, an action fires at every instant inside the frame where the
/// cooldown has run out, and each action arms a full interval. Time left over
/// after an action carries into the next one, so splitting a frame never
/// changes the count. While idle the cooldown only drains and never banks
/// more than one ready action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttackCadence {
    cooldown: Duration,
}

impl AttackCadence {
    /// Consumes `dt` and returns how many actions fire within it.
    pub fn advance(&mut self, dt: Duration, interval: Duration, engaged: bool) -> u32 {
        if interval.is_zero() || !engaged {
            self.cooldown = self.cooldown.saturating_sub(dt);
            return 0;
        }

        let mut actions = 0;
        let mut remaining = dt;
        while remaining > self.cooldown {
            remaining -= self.cooldown;
            self.cooldown = interval;
            actions += 1;
        }
        self.cooldown -= remaining;
        actions
    }

    /// Cooldown that must elapse before the next action may fire.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

/// Buttons the simulation reacts to, already mapped from physical devices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Buttons {
    /// Move forward along the aim heading.
    pub forward: bool,
    /// Move backward.
    pub back: bool,
    /// Strafe left.
    pub left: bool,
    /// Strafe right.
    pub right: bool,
    /// Fire the weapon.
    pub fire: bool,
    /// Jump, or double jump while airborne.
    pub jump: bool,
    /// Start a game or leave the game-over screen.
    pub confirm: bool,
    /// Leave to the title screen, or quit from it.
    pub escape: bool,
}

/// Input snapshot gathered by adapters before advancing a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Pointer motion since the previous frame; positive `y` looks up.
    pub pointer_delta: Vec2,
    /// Buttons currently held.
    pub held: Buttons,
    /// Buttons newly pressed this frame.
    pub pressed: Buttons,
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Feet position.
    pub position: Vec3,
    /// Velocity in world units per second.
    pub velocity: Vec3,
    /// Normalised aim direction.
    pub aim: Vec3,
    /// Collision radius.
    pub radius: f32,
    /// Current health.
    pub health: f32,
    /// Health at the start of a game.
    pub max_health: f32,
    /// Jump charges left before landing.
    pub jumps: u32,
    /// Simulation time of the last melee hit taken, if any.
    pub last_hit: Option<Duration>,
}

impl PlayerSnapshot {
    /// Reports whether the player still has health left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// Immutable representation of a single enemy used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Behavioural class.
    pub kind: EnemyKind,
    /// Centre position.
    pub position: Vec3,
    /// Velocity in world units per second.
    pub velocity: Vec3,
    /// Collision radius.
    pub radius: f32,
    /// Remaining health.
    pub health: f32,
}

/// Read-only snapshot describing all living enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemy is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Centre position.
    pub position: Vec3,
    /// Velocity in world units per second.
    pub velocity: Vec3,
}

/// Wave progression counters and timers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Current wave, zero for the opening arena.
    pub wave: u32,
    /// Enemies of the current wave not yet released.
    pub remaining_spawns: u32,
    /// Enemies destroyed since the game started.
    pub kills: u32,
    /// Time since the current wave started.
    pub wave_elapsed: Duration,
    /// Wave time at the start of the latest tick.
    pub previous_wave_elapsed: Duration,
    /// Simulation time the player died at, if the game is over.
    pub game_over_at: Option<Duration>,
}

impl ProgressSnapshot {
    /// Reports whether the game ended.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(100);

    #[test]
    fn thing_radii_follow_tuning() {
        let tuning = Tuning::default();
        assert_eq!(ThingKind::Player.radius(&tuning), 0.25);
        assert_eq!(ThingKind::Projectile.radius(&tuning), 0.1);
        assert_eq!(ThingKind::Enemy(EnemyKind::Wraith).radius(&tuning), 0.5);
        assert_eq!(ThingKind::World.radius(&tuning), 0.0);
    }

    #[test]
    fn enemy_view_is_sorted_by_identifier() {
        let snapshot = |id| EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Bat,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            radius: 0.25,
            health: 1.0,
        };
        let view = EnemyView::from_snapshots(vec![snapshot(4), snapshot(1), snapshot(2)]);
        let ids: Vec<u32> = view.iter().map(|enemy| enemy.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[test]
    fn cadence_fires_once_per_interval() {
        let mut cadence = AttackCadence::default();
        assert_eq!(cadence.advance(Duration::from_millis(400), INTERVAL, true), 4);
        assert_eq!(cadence.cooldown(), Duration::ZERO);
        assert_eq!(cadence.advance(Duration::from_millis(100), INTERVAL, true), 1);
    }

    #[test]
    fn cadence_is_frame_rate_independent() {
        let dt = Duration::from_millis(300);
        let mut whole = AttackCadence::default();
        let whole_shots = whole.advance(dt, INTERVAL, true);
        assert_eq!(whole_shots, 3);

        for parts in 2..=6 {
            let mut split = AttackCadence::default();
            let split_shots: u32 = (0..parts)
                .map(|_| split.advance(dt / parts, INTERVAL, true))
                .sum();
            assert_eq!(split_shots, whole_shots, "{parts} parts");
            assert_eq!(split, whole, "{parts} parts");
        }
    }

    #[test]
    fn cadence_carries_leftover_time_between_frames() {
        let mut cadence = AttackCadence::default();
        let shots: u32 = (0..40)
            .map(|_| cadence.advance(Duration::from_millis(25), INTERVAL, true))
            .sum();
        assert_eq!(shots, 10);

        let mut cadence = AttackCadence::default();
        let shots: u32 = (0..10)
            .map(|_| cadence.advance(Duration::from_millis(150), INTERVAL, true))
            .sum();
        assert_eq!(shots, 15);
    }

    #[test]
    fn cadence_does_not_bank_shots_while_idle() {
        let mut cadence = AttackCadence::default();
        assert_eq!(cadence.advance(Duration::from_secs(2), INTERVAL, false), 0);
        assert_eq!(cadence.advance(Duration::from_millis(50), INTERVAL, true), 1);
    }

    #[test]
    fn cadence_respects_pending_cooldown() {
        let mut cadence = AttackCadence::default();
        assert_eq!(cadence.advance(Duration::from_millis(10), INTERVAL, true), 1);
        assert_eq!(cadence.advance(Duration::from_millis(50), INTERVAL, true), 0);
        assert_eq!(cadence.advance(Duration::from_millis(50), INTERVAL, true), 1);
    }

    #[test]
    fn tile_map_view_treats_outside_as_wall() {
        let tiles = vec![Tile::Empty; 9];
        let heights = vec![0.0; 9];
        let view = TileMapView::new(3, &tiles, &heights);
        assert!(!view.is_wall(CellCoord::new(1, 1)));
        assert!(view.is_wall(CellCoord::new(3, 1)));
        assert_eq!(view.clamped_cell(Vec2::new(7.5, -2.0)), CellCoord::new(2, 0));
    }
}
