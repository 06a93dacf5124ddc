#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns frame input into player steering commands.

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};
use hordefall_core::{Buttons, Command, FrameInput, PlayerSnapshot, PlayerTuning};

/// Largest pitch magnitude, kept just short of vertical.
const PITCH_LIMIT: f32 = FRAC_PI_2 * 0.99;

/// Player control system that emits [`Command::SteerPlayer`] each frame.
#[derive(Debug)]
pub struct PlayerControl {
    tuning: PlayerTuning,
}

impl PlayerControl {
    /// Creates a control system for the provided player tuning.
    #[must_use]
    pub fn new(tuning: PlayerTuning) -> Self {
        Self { tuning }
    }

    /// Emits the steering command derived from this frame's input.
    pub fn handle(&self, input: &FrameInput, player: &PlayerSnapshot, out: &mut Vec<Command>) {
        if !player.is_alive() {
            return;
        }

        let aim = self.look(player.aim, input.pointer_delta);
        let wasd = axes(&input.held);
        let forward = aim.truncate().normalize_or_zero();
        let right = Vec2::new(forward.y, -forward.x);
        let intent = forward * (wasd.y * self.tuning.forward_speed)
            + right * (wasd.x * self.tuning.strafe_speed);

        out.push(Command::SteerPlayer {
            aim,
            intent,
            jump: input.pressed.jump,
            trigger: input.held.fire,
        });
    }

    fn look(&self, aim: Vec3, pointer_delta: Vec2) -> Vec3 {
        let aim = aim.try_normalize().unwrap_or(Vec3::Y);
        if pointer_delta == Vec2::ZERO {
            return aim;
        }

        let pitch = aim.z.clamp(-1.0, 1.0).asin();
        let yaw = aim.y.atan2(aim.x);
        let pitch = (pitch + pointer_delta.y * self.tuning.look_sensitivity)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let yaw = yaw - pointer_delta.x * self.tuning.look_sensitivity;

        let level = pitch.cos();
        Vec3::new(level * yaw.cos(), level * yaw.sin(), pitch.sin())
    }
}

/// Strafe (`x`) and forward (`y`) axes, each in `-1.0..=1.0`.
fn axes(held: &Buttons) -> Vec2 {
    let x = if held.right {
        1.0
    } else if held.left {
        -1.0
    } else {
        0.0
    };
    let y = if held.forward {
        1.0
    } else if held.back {
        -1.0
    } else {
        0.0
    };
    Vec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(aim: Vec3) -> PlayerSnapshot {
        PlayerSnapshot {
            position: Vec3::new(8.5, 8.5, 0.0),
            velocity: Vec3::ZERO,
            aim,
            radius: 0.25,
            health: 100.0,
            max_health: 100.0,
            jumps: 2,
            last_hit: None,
        }
    }

    fn steer(input: FrameInput, aim: Vec3) -> (Vec3, Vec2, bool, bool) {
        let control = PlayerControl::new(PlayerTuning::default());
        let mut out = Vec::new();
        control.handle(&input, &player(aim), &mut out);
        match out.as_slice() {
            [Command::SteerPlayer {
                aim,
                intent,
                jump,
                trigger,
            }] => (*aim, *intent, *jump, *trigger),
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn forward_moves_along_aim_heading() {
        let input = FrameInput {
            held: Buttons {
                forward: true,
                ..Buttons::default()
            },
            ..FrameInput::default()
        };

        let (aim, intent, _, _) = steer(input, Vec3::Y);

        assert_eq!(aim, Vec3::Y);
        assert!((intent - Vec2::new(0.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn strafe_right_is_clockwise_from_heading() {
        let input = FrameInput {
            held: Buttons {
                right: true,
                ..Buttons::default()
            },
            ..FrameInput::default()
        };

        let (_, intent, _, _) = steer(input, Vec3::Y);

        assert!((intent - Vec2::new(3.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn pointer_right_turns_clockwise() {
        let input = FrameInput {
            pointer_delta: Vec2::new(100.0, 0.0),
            ..FrameInput::default()
        };

        let (aim, _, _, _) = steer(input, Vec3::Y);

        assert!(aim.x > 0.0);
        assert!((aim.length() - 1.0).abs() < 1e-5);
        assert!(aim.z.abs() < 1e-5);
    }

    #[test]
    fn pitch_stops_short_of_vertical() {
        let input = FrameInput {
            pointer_delta: Vec2::new(0.0, 10_000.0),
            ..FrameInput::default()
        };

        let (aim, _, _, _) = steer(input, Vec3::Y);

        assert!((aim.z - PITCH_LIMIT.sin()).abs() < 1e-5);
        assert!(aim.y > 0.0);
    }

    #[test]
    fn jump_is_edge_triggered_and_fire_is_held() {
        let input = FrameInput {
            held: Buttons {
                jump: true,
                fire: true,
                ..Buttons::default()
            },
            ..FrameInput::default()
        };

        let (_, _, jump, trigger) = steer(input, Vec3::Y);

        assert!(!jump);
        assert!(trigger);
    }

    #[test]
    fn dead_player_is_not_steered() {
        let control = PlayerControl::new(PlayerTuning::default());
        let mut dead = player(Vec3::Y);
        dead.health = 0.0;
        let mut out = Vec::new();

        control.handle(&FrameInput::default(), &dead, &mut out);

        assert!(out.is_empty());
    }
}
