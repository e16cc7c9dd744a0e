//! Behavior systems: моция, запросы атак, host-facing индикаторы

use bevy::prelude::*;

use crate::combat::{AttackCommand, AttackKind, AttackPhase, Attacker, Dead};
use crate::components::{
    ActionIndicator, Agent, AgentStatus, DesiredMotion, MoveStyle, MovementIndicator, StopBehavior,
};
use crate::perception::Awareness;

/// Система: расчёт DesiredMotion из MoveStyle + follow position.
///
/// Шаг — прямолинейный intent (pathfinding — зона host'а). Ориентация:
/// ground — yaw-only на цель или по движению, flight — полный look-at.
pub fn resolve_desired_motion(
    mut agents: Query<
        (
            &Agent,
            &Transform,
            &MoveStyle,
            Option<&Awareness>,
            &mut DesiredMotion,
        ),
        Without<Dead>,
    >,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    for (agent, transform, style, awareness, mut motion) in agents.iter_mut() {
        let own = transform.translation;

        if !agent.can_move {
            motion.step = Vec3::ZERO;
            motion.facing = transform.rotation;
            continue;
        }

        let target = awareness
            .map(|a| a.follow_position(own))
            .unwrap_or(own);

        let (step, facing) = match *style {
            MoveStyle::Hold => (Vec3::ZERO, transform.rotation),

            MoveStyle::Ground {
                stop_distance,
                face_target,
                stop_requires_sight,
            } => {
                let to_target = target - own;
                let distance = to_target.length();
                let sight_blocked = awareness.is_some_and(|a| !a.has_sight_line());

                // Двигаемся за stop distance, либо когда стоять нельзя —
                // цель в радиусе, но прямой видимости нет
                let should_move = distance > stop_distance
                    || (stop_requires_sight && awareness.is_some() && sight_blocked);

                let step = if should_move && distance > f32::EPSILON {
                    to_target / distance * agent.move_speed * dt
                } else {
                    Vec3::ZERO
                };

                let facing = if face_target {
                    // Разворот на цель только пока сенсорам есть чему верить
                    if awareness.is_some_and(|a| a.certainty > a.follow_threshold) {
                        let mut flat = to_target;
                        flat.y = 0.0;
                        look_rotation(flat, Vec3::Y).unwrap_or(transform.rotation)
                    } else {
                        transform.rotation
                    }
                } else {
                    look_rotation(step, Vec3::Y).unwrap_or(transform.rotation)
                };

                (step, facing)
            }

            MoveStyle::Flight {
                stop_distance,
                at_stop,
            } => {
                let to_target = target - own;
                let distance = to_target.length();

                let step = if distance > stop_distance {
                    to_target / distance * agent.move_speed * dt
                } else {
                    match at_stop {
                        StopBehavior::Halt => Vec3::ZERO,
                        StopBehavior::OrbitClockwise => {
                            to_target.cross(*transform.up()).normalize_or_zero()
                                * agent.move_speed
                                * dt
                        }
                        StopBehavior::OrbitAnticlockwise => {
                            -to_target.cross(*transform.up()).normalize_or_zero()
                                * agent.move_speed
                                * dt
                        }
                    }
                };

                let facing = look_rotation(to_target, Vec3::Y).unwrap_or(transform.rotation);
                (step, facing)
            }
        };

        motion.step = step;
        motion.facing = facing;
    }
}

/// Система: запрос атаки, когда цель в радиусе.
///
/// Line-of-sight условие: либо агенту он не нужен, либо awareness
/// подтверждает обнаружение (sees_target). Контракт из combat: команда по
/// занятому/отсутствующему Attacker — молчаливый no-op.
pub fn request_attacks(
    agents: Query<(Entity, &Agent, &Transform, Option<&Awareness>), Without<Dead>>,
    mut attack_commands: EventWriter<AttackCommand>,
) {
    for (entity, agent, transform, awareness) in agents.iter() {
        if !agent.does_attack {
            continue;
        }

        let own = transform.translation;
        let target = awareness.map(|a| a.follow_position(own)).unwrap_or(own);

        if (target - own).length() >= agent.max_attack_range {
            continue;
        }
        if agent.needs_sight_to_attack && !awareness.is_some_and(|a| a.sees_target()) {
            continue;
        }

        attack_commands.write(AttackCommand {
            agent: entity,
            aim: target,
        });
    }
}

/// Система: headless driver — применяет DesiredMotion к Transform.
///
/// Встаёт на место host frame driver'а: в embedded режиме host читает
/// DesiredMotion сам и эта система ему не нужна.
pub fn apply_desired_motion(mut agents: Query<(&mut Transform, &DesiredMotion), With<Agent>>) {
    for (mut transform, motion) in agents.iter_mut() {
        transform.translation += motion.step;
        transform.rotation = motion.facing;
    }
}

/// Система: host-facing индикаторы для анимации
pub fn update_agent_status(
    mut agents: Query<(&mut AgentStatus, &DesiredMotion, Option<&Attacker>)>,
) {
    for (mut status, motion, attacker) in agents.iter_mut() {
        let movement = if motion.step.length_squared() > 1e-8 {
            MovementIndicator::Moving
        } else {
            MovementIndicator::Idle
        };

        let action = match attacker {
            Some(attacker) if matches!(attacker.phase, AttackPhase::Striking { .. }) => {
                // Взрывной wind-up — телеграф, остальное — активный удар
                if matches!(attacker.kind, AttackKind::SelfDetonate { .. }) {
                    ActionIndicator::Preparing
                } else {
                    ActionIndicator::Striking
                }
            }
            _ => ActionIndicator::Idle,
        };

        let next = AgentStatus { movement, action };
        if *status != next {
            *status = next;
        }
    }
}

/// Ориентация "смотреть вдоль direction". None при вырожденном направлении.
fn look_rotation(direction: Vec3, up: Vec3) -> Option<Quat> {
    if direction.length_squared() <= f32::EPSILON {
        return None;
    }
    Some(Transform::default().looking_to(direction, up).rotation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_rotation_degenerate_direction() {
        assert!(look_rotation(Vec3::ZERO, Vec3::Y).is_none());
        assert!(look_rotation(Vec3::X, Vec3::Y).is_some());
    }

    #[test]
    fn test_look_rotation_faces_direction() {
        let rotation = look_rotation(Vec3::X, Vec3::Y).unwrap();
        let forward = rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::X).length() < 1e-5, "forward = {:?}", forward);
    }

    #[test]
    fn test_orbit_step_is_perpendicular() {
        // Орбитальный шаг перпендикулярен направлению на цель
        let to_target = Vec3::new(3.0, 0.0, 0.0);
        let step = to_target.cross(Vec3::Y).normalize_or_zero();
        assert!(step.dot(to_target).abs() < 1e-5);
        assert!((step.length() - 1.0).abs() < 1e-5);
    }
}
