//! Agent behavior shell — связывает perception, движение и attack decisions
//!
//! За тик: target из Awareness (follow position) → DesiredMotion по MoveStyle
//! → AttackCommand, если цель в радиусе и line-of-sight условие выполнено.
//!
//! Деградация: без Awareness target = собственная позиция (агент стоит);
//! без Attacker команды атаки молча дропаются в combat::start_attacks.

use bevy::prelude::*;

pub mod behavior;

pub use behavior::{
    apply_desired_motion, request_attacks, resolve_desired_motion, update_agent_status,
};

use crate::SimulationSet;

/// Agent Plugin
///
/// Decide: resolve_desired_motion → request_attacks → apply_desired_motion
/// Maintain: update_agent_status (после combat, чтобы индикаторы видели
/// фазу этого тика)
pub struct AgentPlugin;

impl Plugin for AgentPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                behavior::resolve_desired_motion,
                behavior::request_attacks,
                behavior::apply_desired_motion,
            )
                .chain()
                .in_set(SimulationSet::Decide),
        );

        app.add_systems(
            FixedUpdate,
            behavior::update_agent_status
                .in_set(SimulationSet::Maintain)
                .after(crate::combat::damage::handle_deaths),
        );
    }
}
