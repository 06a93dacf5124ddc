use glam::Vec2;
use hordefall_core::{Buttons, FrameInput, GamePhase};

/// Frames between direction changes of the strafe pattern.
const STRAFE_PERIOD: u64 = 120;
/// Frames between two jumps.
const JUMP_PERIOD: u64 = 90;
/// Pointer units turned every frame.
const TURN_RATE: f32 = 6.0;

/// Scripted stand-in for a player: starts a game, then circles and shoots.
#[derive(Debug, Default)]
pub(crate) struct Autopilot {
    frame: u64,
}

impl Autopilot {
    pub(crate) fn next_input(&mut self, phase: GamePhase) -> FrameInput {
        let frame = self.frame;
        self.frame += 1;

        match phase {
            GamePhase::Title => FrameInput {
                pressed: Buttons {
                    confirm: true,
                    ..Buttons::default()
                },
                ..FrameInput::default()
            },
            GamePhase::Active => {
                let strafe_left = (frame / STRAFE_PERIOD) % 2 == 0;
                FrameInput {
                    pointer_delta: Vec2::new(TURN_RATE, 0.0),
                    held: Buttons {
                        forward: true,
                        left: strafe_left,
                        right: !strafe_left,
                        fire: true,
                        ..Buttons::default()
                    },
                    pressed: Buttons {
                        jump: frame % JUMP_PERIOD == 0,
                        ..Buttons::default()
                    },
                }
            }
            GamePhase::GameOver => FrameInput::default(),
        }
    }
}
