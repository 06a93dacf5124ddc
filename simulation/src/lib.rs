#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame orchestration for Hordefall.
//!
//! [`Simulation`] owns the world and every system, runs the title, active and
//! game-over phases, and pumps one frame at a time: systems read snapshots,
//! emit commands, the world applies them, and the resulting events are turned
//! into effects for an [`EffectSink`].

mod effects;

use std::time::Duration;

use hordefall_core::{
    derive_labeled_seed, Command, Event, FrameInput, GamePhase, Tuning, TuningError,
    RNG_STREAM_EFFECTS,
};
use hordefall_system_enemy_ai::EnemyAi;
use hordefall_system_player_control::PlayerControl;
use hordefall_system_progression::Progression;
use hordefall_world::{self as world, query, World};
use tracing::info;

pub use effects::{BurstStyle, EffectSink, NullEffects, Particle, ParticleBurst, SoundCue};

use crate::effects::EffectDispatch;

/// Result of advancing a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// The player asked to leave the program from the title screen.
    pub quit_requested: bool,
}

/// Owns the world and systems of one play session.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    phase: GamePhase,
    player_control: PlayerControl,
    enemy_ai: EnemyAi,
    progression: Progression,
    effects: EffectDispatch,
    commands: Vec<Command>,
    events: Vec<Event>,
    since_death: Duration,
    max_frame_step: Duration,
    restart_delay: Duration,
}

impl Simulation {
    /// Validates the tuning and builds a session waiting on the title screen.
    pub fn new(tuning: Tuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self {
            player_control: PlayerControl::new(tuning.player.clone()),
            enemy_ai: EnemyAi::new(&tuning),
            progression: Progression::new(&tuning),
            effects: EffectDispatch::new(derive_labeled_seed(tuning.seed, RNG_STREAM_EFFECTS)),
            commands: Vec::new(),
            events: Vec::new(),
            since_death: Duration::ZERO,
            max_frame_step: tuning.physics.max_frame_step(),
            restart_delay: tuning.waves.restart_delay(),
            phase: GamePhase::Title,
            world: World::new(tuning),
        })
    }

    /// Current phase of the session.
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Read-only access to the world, for use with [`hordefall_world::query`].
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Events the world raised during the latest frame.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Advances the session by `elapsed` wall time using this frame's input.
    ///
    /// `elapsed` is clamped to the maximum frame step before it reaches the
    /// world, so long stalls never turn into one huge tick.
    pub fn frame<S: EffectSink>(
        &mut self,
        input: &FrameInput,
        elapsed: Duration,
        effects: &mut S,
    ) -> FrameOutcome {
        let dt = elapsed.min(self.max_frame_step);
        self.events.clear();

        match self.phase {
            GamePhase::Title => {
                if input.pressed.escape {
                    return FrameOutcome {
                        quit_requested: true,
                    };
                }
                if input.pressed.confirm {
                    self.progression.new_game(&mut self.commands);
                    self.submit();
                    self.enter(GamePhase::Active);
                }
            }
            GamePhase::Active => {
                if input.pressed.escape {
                    self.enter(GamePhase::Title);
                    return FrameOutcome::default();
                }

                self.step(input, dt);
                self.effects
                    .dispatch(&self.events, query::tuning(&self.world), effects);
                if query::progress(&self.world).is_game_over() {
                    self.since_death = Duration::ZERO;
                    self.enter(GamePhase::GameOver);
                }
            }
            GamePhase::GameOver => {
                self.since_death = self.since_death.saturating_add(dt);
                if input.pressed.confirm && self.since_death >= self.restart_delay {
                    self.enter(GamePhase::Title);
                }
            }
        }

        FrameOutcome::default()
    }

    fn step(&mut self, input: &FrameInput, dt: Duration) {
        self.player_control
            .handle(input, &query::player(&self.world), &mut self.commands);
        self.commands.push(Command::Tick { dt });
        self.submit();

        self.enemy_ai.handle(
            &query::enemy_view(&self.world),
            &query::player(&self.world),
            query::tile_map(&self.world),
            &mut self.commands,
        );
        self.commands.push(Command::MoveEnemies { dt });
        self.submit();

        self.progression.handle(
            &query::progress(&self.world),
            &query::player(&self.world),
            &query::enemy_view(&self.world),
            &mut self.commands,
        );
        self.submit();
    }

    fn submit(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    fn enter(&mut self, phase: GamePhase) {
        info!(from = ?self.phase, to = ?phase, "phase changed");
        self.phase = phase;
    }
}
