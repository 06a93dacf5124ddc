use hordefall_simulation::{EffectSink, ParticleBurst, SoundCue};
use tracing::trace;

/// Effect sink for headless runs: logs every effect and keeps a tally.
#[derive(Debug, Default)]
pub(crate) struct LogEffects {
    pub(crate) shots: u64,
    pub(crate) bursts: u64,
}

impl EffectSink for LogEffects {
    fn play(&mut self, cue: SoundCue) {
        match cue {
            SoundCue::Shot => self.shots += 1,
            SoundCue::Jump | SoundCue::Hit | SoundCue::Kill => {}
        }
        trace!(?cue, "sound cue");
    }

    fn burst(&mut self, burst: ParticleBurst) {
        self.bursts += 1;
        trace!(
            style = ?burst.style,
            center = ?burst.center,
            particles = burst.particles.len(),
            "particle burst"
        );
    }
}
