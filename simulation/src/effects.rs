//! Fire-and-forget presentation effects raised while the simulation runs.

use glam::Vec3;
use hordefall_core::{Event, Tuning};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DAMAGE_PARTICLES: u32 = 50;
const DESTROY_PARTICLES: u32 = 200;

/// External collaborator that plays sounds and spawns particles.
///
/// Implementations must not fail visibly: an unavailable device is a silent
/// no-op, the simulation never observes the outcome.
pub trait EffectSink {
    /// Plays a one-shot sound cue.
    fn play(&mut self, cue: SoundCue);

    /// Spawns a burst of particles.
    fn burst(&mut self, burst: ParticleBurst);
}

/// Sink that discards every effect.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEffects;

impl EffectSink for NullEffects {
    fn play(&mut self, _cue: SoundCue) {}

    fn burst(&mut self, _burst: ParticleBurst) {}
}

/// One-shot sound cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// The player fired a projectile.
    Shot,
    /// The player jumped.
    Jump,
    /// An enemy survived a hit.
    Hit,
    /// An enemy was destroyed.
    Kill,
}

/// Particle emitter a burst is spawned from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BurstStyle {
    /// Short-lived sparks of a damaged enemy, drawn in the emitter's palette.
    Damage,
    /// Long-lived debris of a destroyed body, each particle tinted.
    Destroy,
}

/// A single particle of a burst.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Spawn position.
    pub position: Vec3,
    /// RGB tint in `0.0..1.0`, or `None` for the emitter's own palette.
    pub tint: Option<[f32; 3]>,
}

/// Particles spawned together around a body.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleBurst {
    /// Emitter the particles belong to.
    pub style: BurstStyle,
    /// Centre of the body that raised the burst.
    pub center: Vec3,
    /// Particles scattered within a cube around the centre.
    pub particles: Vec<Particle>,
}

/// Translates world events into effects, owning the particle generator.
#[derive(Debug)]
pub(crate) struct EffectDispatch {
    rng: ChaCha8Rng,
}

impl EffectDispatch {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub(crate) fn dispatch<S: EffectSink>(&mut self, events: &[Event], tuning: &Tuning, sink: &mut S) {
        for event in events {
            match event {
                Event::ProjectileFired { .. } => sink.play(SoundCue::Shot),
                Event::PlayerJumped => sink.play(SoundCue::Jump),
                Event::EnemyDamaged { kind, position, .. } => {
                    sink.play(SoundCue::Hit);
                    let spread = tuning.enemies.profile(*kind).radius * 0.5;
                    let burst = self.burst(BurstStyle::Damage, *position, spread, DAMAGE_PARTICLES);
                    sink.burst(burst);
                }
                Event::EnemyKilled { kind, position, .. } => {
                    sink.play(SoundCue::Kill);
                    let spread = tuning.enemies.profile(*kind).radius * 0.5;
                    let burst =
                        self.burst(BurstStyle::Destroy, *position, spread, DESTROY_PARTICLES);
                    sink.burst(burst);
                }
                Event::PlayerDied { position } => {
                    sink.play(SoundCue::Kill);
                    let spread = tuning.player.radius * 0.5;
                    let burst =
                        self.burst(BurstStyle::Destroy, *position, spread, DESTROY_PARTICLES);
                    sink.burst(burst);
                }
                _ => {}
            }
        }
    }

    fn burst(&mut self, style: BurstStyle, center: Vec3, spread: f32, count: u32) -> ParticleBurst {
        let particles = (0..count)
            .map(|_| {
                let tint = match style {
                    BurstStyle::Damage => None,
                    BurstStyle::Destroy => Some([self.rng.gen(), self.rng.gen(), self.rng.gen()]),
                };
                let offset = Vec3::new(
                    self.rng.gen_range(-1.0..=1.0),
                    self.rng.gen_range(-1.0..=1.0),
                    self.rng.gen_range(-1.0..=1.0),
                );
                Particle {
                    position: center + offset * spread,
                    tint,
                }
            })
            .collect();
        ParticleBurst {
            style,
            center,
            particles,
        }
    }
}

#[cfg(test)]
mod tests {
    use hordefall_core::{EnemyId, EnemyKind};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        cues: Vec<SoundCue>,
        bursts: Vec<ParticleBurst>,
    }

    impl EffectSink for Recorder {
        fn play(&mut self, cue: SoundCue) {
            self.cues.push(cue);
        }

        fn burst(&mut self, burst: ParticleBurst) {
            self.bursts.push(burst);
        }
    }

    #[test]
    fn kills_raise_tinted_debris_around_the_enemy() {
        let mut dispatch = EffectDispatch::new(7);
        let mut sink = Recorder::default();
        let position = Vec3::new(4.0, 5.0, 2.0);

        dispatch.dispatch(
            &[Event::EnemyKilled {
                enemy: EnemyId::new(3),
                kind: EnemyKind::Wraith,
                position,
            }],
            &Tuning::default(),
            &mut sink,
        );

        assert_eq!(sink.cues, vec![SoundCue::Kill]);
        let burst = &sink.bursts[0];
        assert_eq!(burst.style, BurstStyle::Destroy);
        assert_eq!(burst.particles.len(), 200);
        for particle in &burst.particles {
            assert!(particle.tint.is_some());
            let offset = particle.position - position;
            assert!(offset.abs().max_element() <= 0.25 + 1e-5);
        }
    }

    #[test]
    fn surviving_hits_use_the_emitter_palette() {
        let mut dispatch = EffectDispatch::new(7);
        let mut sink = Recorder::default();

        dispatch.dispatch(
            &[
                Event::ProjectileFired {
                    position: Vec3::ZERO,
                },
                Event::EnemyDamaged {
                    enemy: EnemyId::new(0),
                    kind: EnemyKind::Crawler,
                    position: Vec3::ONE,
                    health: 0.5,
                },
            ],
            &Tuning::default(),
            &mut sink,
        );

        assert_eq!(sink.cues, vec![SoundCue::Shot, SoundCue::Hit]);
        assert_eq!(sink.bursts[0].style, BurstStyle::Damage);
        assert_eq!(sink.bursts[0].particles.len(), 50);
        assert!(sink.bursts[0].particles.iter().all(|p| p.tint.is_none()));
    }

    #[test]
    fn player_death_plays_kill_cue_and_debris() {
        let mut dispatch = EffectDispatch::new(7);
        let mut sink = Recorder::default();

        dispatch.dispatch(
            &[Event::PlayerDied {
                position: Vec3::new(9.0, 9.0, 0.0),
            }],
            &Tuning::default(),
            &mut sink,
        );

        assert_eq!(sink.cues, vec![SoundCue::Kill]);
        assert_eq!(sink.bursts.len(), 1);
        assert_eq!(sink.bursts[0].style, BurstStyle::Destroy);
    }
}
