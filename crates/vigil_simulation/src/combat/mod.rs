//! Combat module — attack decisions и нанесение урона
//!
//! ECS ответственность:
//! - Attack FSM: Ready → Striking → Cooldown (явные таймеры)
//! - Урон и смерть: Health, DamageDealt/AgentDied события
//!
//! Host ответственность:
//! - Спавн и полёт снарядов (по ProjectileDischarged), репорт попаданий
//!   (ProjectileHit)
//! - Collision detection melee-оружия, если есть (иначе headless-свип)
//! - Взрывные эффекты (по Detonated), уборка трупов (Dead)

use bevy::prelude::*;

pub mod attacker;
pub mod damage;

// Re-export основных типов
pub use attacker::{
    AttackCommand, AttackKind, AttackPhase, AttackTransition, Attacker, BlastCharge, Detonated,
    HitVolumes, Launcher, ProjectileDischarged,
};
pub use damage::{AgentDied, DamageDealt, Dead, MeleeHit, ProjectileHit};

use crate::SimulationSet;

/// Combat Plugin
///
/// Порядок за тик:
/// 1. Act: start_attacks → tick_attack_phases (FSM)
/// 2. Maintain: sweep_hit_volumes → apply_hits → apply_blasts → handle_deaths
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<AttackCommand>()
            .add_event::<ProjectileDischarged>()
            .add_event::<Detonated>()
            .add_event::<MeleeHit>()
            .add_event::<ProjectileHit>()
            .add_event::<DamageDealt>()
            .add_event::<AgentDied>();

        app.add_systems(
            FixedUpdate,
            (attacker::start_attacks, attacker::tick_attack_phases)
                .chain()
                .in_set(SimulationSet::Act),
        );

        app.add_systems(
            FixedUpdate,
            (
                damage::sweep_hit_volumes,
                damage::apply_hits,
                damage::apply_blasts,
                damage::handle_deaths,
            )
                .chain()
                .in_set(SimulationSet::Maintain),
        );
    }
}
