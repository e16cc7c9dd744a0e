//! Damage application и смерть
//!
//! Источники урона:
//! - MeleeHit — headless-свип hit volumes (или host collision detection)
//! - ProjectileHit — host репортит попадание снаряда
//! - Detonated — радиальный урон от самоподрыва
//!
//! Смерть: маркер Dead + стоп моции. Teardown entity — зона host'а
//! (кроме самоподрыва, который despawn'ится сам в attacker).

use bevy::prelude::*;

use crate::combat::attacker::{Detonated, HitVolumes};
use crate::components::{DesiredMotion, Health};

// ============================================================================
// Events
// ============================================================================

/// Урон нанесён (для host: UI, звуки, эффекты)
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub amount: u32,
    pub target_died: bool,
}

/// Агент умер (health == 0)
#[derive(Event, Debug, Clone)]
pub struct AgentDied {
    pub agent: Entity,
    pub killer: Option<Entity>,
}

/// Melee hit volume задел цель (ядро-свип или host → ECS)
#[derive(Event, Debug, Clone)]
pub struct MeleeHit {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
}

/// Projectile попал в цель (host → ECS)
#[derive(Event, Debug, Clone)]
pub struct ProjectileHit {
    pub shooter: Entity,
    pub target: Entity,
    pub damage: u32,
}

/// Маркер: агент мертв. Решения ядра для него отключены;
/// трупы убирает host.
#[derive(Component, Debug)]
pub struct Dead;

// ============================================================================
// Systems
// ============================================================================

/// Система: headless-свип активных hit volumes.
///
/// Host с настоящими коллайдерами может слать MeleeHit сам — свип лишь
/// дистанционная замена для headless прогонов. Один swing бьёт цель один раз
/// (struck список).
pub fn sweep_hit_volumes(
    mut attackers: Query<(Entity, &Transform, &mut HitVolumes, Option<&Health>)>,
    targets: Query<(Entity, &Transform, &Health)>,
    mut hits: EventWriter<MeleeHit>,
) {
    for (attacker_entity, transform, mut volumes, attacker_health) in attackers.iter_mut() {
        if !volumes.enabled {
            continue;
        }
        let attacker_team = attacker_health.map(|h| h.team_id);

        for (target_entity, target_transform, target_health) in targets.iter() {
            if target_entity == attacker_entity {
                continue;
            }
            if !target_health.is_alive() {
                continue;
            }
            // Friendly fire фильтруется по команде
            if attacker_team == Some(target_health.team_id) {
                continue;
            }
            if volumes.struck.contains(&target_entity) {
                continue;
            }
            let distance = transform.translation.distance(target_transform.translation);
            if distance <= volumes.reach {
                volumes.struck.push(target_entity);
                hits.write(MeleeHit {
                    attacker: attacker_entity,
                    target: target_entity,
                    damage: volumes.damage,
                });
            }
        }
    }
}

/// Система: применение MeleeHit / ProjectileHit к Health
pub fn apply_hits(
    mut melee_hits: EventReader<MeleeHit>,
    mut projectile_hits: EventReader<ProjectileHit>,
    mut targets: Query<&mut Health>,
    time: Res<Time<Fixed>>,
    mut dealt: EventWriter<DamageDealt>,
    mut deaths: EventWriter<AgentDied>,
) {
    let now = time.elapsed_secs();

    for hit in melee_hits.read() {
        if hit.attacker == hit.target {
            continue;
        }
        deal_damage(
            &mut targets, &mut dealt, &mut deaths, now, hit.attacker, hit.target, hit.damage,
        );
    }

    for hit in projectile_hits.read() {
        if hit.shooter == hit.target {
            crate::log_warning(&format!("self-hit skipped: {:?}", hit.shooter));
            continue;
        }
        deal_damage(
            &mut targets, &mut dealt, &mut deaths, now, hit.shooter, hit.target, hit.damage,
        );
    }
}

/// Система: радиальный урон от Detonated
pub fn apply_blasts(
    mut detonations: EventReader<Detonated>,
    mut targets: Query<(Entity, &Transform, &mut Health)>,
    time: Res<Time<Fixed>>,
    mut dealt: EventWriter<DamageDealt>,
    mut deaths: EventWriter<AgentDied>,
) {
    let now = time.elapsed_secs();

    for blast in detonations.read() {
        for (entity, transform, mut health) in targets.iter_mut() {
            if entity == blast.agent {
                continue;
            }
            if health.team_id == blast.team_id {
                continue;
            }
            if transform.translation.distance(blast.position) > blast.radius {
                continue;
            }

            let was_alive = health.is_alive();
            let applied = health.take_damage(blast.damage, now);
            if applied == 0 {
                continue;
            }
            let died_now = was_alive && !health.is_alive();
            dealt.write(DamageDealt {
                attacker: blast.agent,
                target: entity,
                amount: applied,
                target_died: died_now,
            });
            if died_now {
                deaths.write(AgentDied {
                    agent: entity,
                    killer: Some(blast.agent),
                });
            }
        }
    }
}

/// Система: смерть — маркер Dead, стоп моции
pub fn handle_deaths(
    mut deaths: EventReader<AgentDied>,
    mut motions: Query<&mut DesiredMotion>,
    mut commands: Commands,
) {
    for death in deaths.read() {
        if let Ok(mut motion) = motions.get_mut(death.agent) {
            motion.step = Vec3::ZERO;
        }
        if let Ok(mut entity_commands) = commands.get_entity(death.agent) {
            entity_commands.insert(Dead);
            crate::log_info(&format!(
                "💀 {:?} died (killer: {:?})",
                death.agent, death.killer
            ));
        }
    }
}

fn deal_damage(
    targets: &mut Query<&mut Health>,
    dealt: &mut EventWriter<DamageDealt>,
    deaths: &mut EventWriter<AgentDied>,
    now: f32,
    attacker: Entity,
    target: Entity,
    amount: u32,
) {
    let Ok(mut health) = targets.get_mut(target) else {
        return;
    };
    let was_alive = health.is_alive();
    let applied = health.take_damage(amount, now);
    if applied == 0 {
        return;
    }
    let died_now = was_alive && !health.is_alive();

    dealt.write(DamageDealt {
        attacker,
        target,
        amount: applied,
        target_died: died_now,
    });
    if died_now {
        deaths.write(AgentDied {
            agent: target,
            killer: Some(attacker),
        });
    }
    crate::log(&format!(
        "💥 {:?} hit {:?} for {} (HP left: {})",
        attacker, target, applied, health.current
    ));
}
