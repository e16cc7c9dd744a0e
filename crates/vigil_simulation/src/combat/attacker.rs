//! Attack decision state machine
//!
//! Архитектура:
//! - `Attacker` — компонент с таймерной FSM: Ready → Striking → Cooldown → Ready
//! - `AttackKind` — sum type вариантов атаки (melee / ranged / self-detonate),
//!   один компонент вместо иерархии наследования
//! - Таймеры явные, тикаются в FixedUpdate. Никаких корутин/frame callbacks.
//!
//! Контракт attempt: атака не Ready или нет привязок (Launcher для ranged) —
//! тихий no-op, без изменения состояния и side effects. Одна атака в полёте
//! на агента.

use bevy::prelude::*;

use crate::components::Health;

// ============================================================================
// Components
// ============================================================================

/// Способность агента атаковать
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Attacker {
    /// Длительность активной фазы атаки (секунды).
    /// Melee: окно hit volumes. Ranged: recovery после выстрела.
    /// Self-detonate: wind-up до взрыва.
    pub attack_duration: f32,
    /// Минимальный интервал между атаками после завершения (секунды)
    pub cooldown_duration: f32,
    /// Вариант атаки
    pub kind: AttackKind,
    /// Текущая фаза FSM
    pub phase: AttackPhase,
}

/// Вариант атаки
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum AttackKind {
    /// Активация hit volumes на окно атаки
    Melee,
    /// Одиночный discharge снаряда (требует привязанный Launcher)
    Ranged,
    /// Заряд → взрыв; die_on_detonation убирает агента из симуляции
    SelfDetonate { die_on_detonation: bool },
}

/// Фаза attack FSM
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum AttackPhase {
    /// Готов к атаке
    Ready,
    /// Атака в процессе; aim — позиция, по которой атака была запрошена
    Striking { remaining: f32, aim: Vec3 },
    /// Пост-атаковый интервал
    Cooldown { remaining: f32 },
}

/// Фазовый переход, который должна обработать система
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttackTransition {
    StrikeFinished { aim: Vec3 },
    CooldownFinished,
}

impl Default for Attacker {
    fn default() -> Self {
        Self::melee()
    }
}

impl Attacker {
    pub fn new(kind: AttackKind, attack_duration: f32, cooldown_duration: f32) -> Self {
        Self {
            attack_duration,
            cooldown_duration,
            kind,
            phase: AttackPhase::Ready,
        }
    }

    pub fn melee() -> Self {
        Self::new(AttackKind::Melee, 0.5, 1.0)
    }

    pub fn ranged() -> Self {
        Self::new(AttackKind::Ranged, 0.5, 1.0)
    }

    pub fn self_detonating(die_on_detonation: bool) -> Self {
        Self::new(AttackKind::SelfDetonate { die_on_detonation }, 1.0, 1.0)
    }

    /// Разрешена ли атака сейчас
    pub fn can_attack(&self) -> bool {
        matches!(self.phase, AttackPhase::Ready)
    }

    pub fn is_striking(&self) -> bool {
        matches!(self.phase, AttackPhase::Striking { .. })
    }

    pub fn is_cooling_down(&self) -> bool {
        matches!(self.phase, AttackPhase::Cooldown { .. })
    }

    /// Перевод Ready → Striking. Возвращает false без side effects, если
    /// атака уже идёт или на cooldown.
    pub fn begin(&mut self, aim: Vec3) -> bool {
        if !self.can_attack() {
            return false;
        }
        self.phase = AttackPhase::Striking {
            remaining: self.attack_duration,
            aim,
        };
        true
    }

    /// Тик таймеров FSM. Возвращает фазовый переход, если он случился.
    pub fn tick(&mut self, dt: f32) -> Option<AttackTransition> {
        match self.phase {
            AttackPhase::Ready => None,
            AttackPhase::Striking { remaining, aim } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.phase = AttackPhase::Cooldown {
                        remaining: self.cooldown_duration,
                    };
                    Some(AttackTransition::StrikeFinished { aim })
                } else {
                    self.phase = AttackPhase::Striking { remaining, aim };
                    None
                }
            }
            AttackPhase::Cooldown { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.phase = AttackPhase::Ready;
                    Some(AttackTransition::CooldownFinished)
                } else {
                    self.phase = AttackPhase::Cooldown { remaining };
                    None
                }
            }
        }
    }
}

/// Привязка ranged-атаки: параметры снаряда.
///
/// Host спавнит projectile по `ProjectileDischarged` и репортит попадание
/// обратно через `ProjectileHit` — снаряды в ECS не живут.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Launcher {
    pub damage: u32,
    pub projectile_speed: f32,
    pub max_range: f32,
}

impl Default for Launcher {
    fn default() -> Self {
        Self {
            damage: 10,
            projectile_speed: 30.0,
            max_range: 20.0,
        }
    }
}

/// Melee hit volumes: включаются на окно атаки.
///
/// `struck` — уже поражённые за текущий swing: один swing бьёт каждую цель
/// не больше одного раза.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct HitVolumes {
    pub enabled: bool,
    pub damage: u32,
    pub reach: f32,
    pub struck: Vec<Entity>,
}

impl Default for HitVolumes {
    fn default() -> Self {
        Self {
            enabled: false,
            damage: 25,
            reach: 2.0,
            struck: Vec::new(),
        }
    }
}

/// Привязка self-detonate: параметры взрыва. Без неё подрыв — пустой хлопок
/// (смерть агента всё равно отрабатывает).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct BlastCharge {
    pub radius: f32,
    pub damage: u32,
}

impl Default for BlastCharge {
    fn default() -> Self {
        Self {
            radius: 4.0,
            damage: 50,
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Запрос атаки (attemptAttack). Idempotent no-op, если атака не разрешена.
#[derive(Event, Debug, Clone)]
pub struct AttackCommand {
    pub agent: Entity,
    /// Позиция, по которой запрошена атака
    pub aim: Vec3,
}

/// ECS → host: одиночный ranged discharge, host спавнит projectile
#[derive(Event, Debug, Clone)]
pub struct ProjectileDischarged {
    pub shooter: Entity,
    pub origin: Vec3,
    pub aim: Vec3,
    pub damage: u32,
    pub speed: f32,
    pub max_range: f32,
}

/// ECS → host + in-core blast: самоподрыв состоялся
#[derive(Event, Debug, Clone)]
pub struct Detonated {
    pub agent: Entity,
    pub position: Vec3,
    pub radius: f32,
    pub damage: u32,
    /// Команда подорвавшегося (взрыв не бьёт своих)
    pub team_id: u64,
}

// ============================================================================
// Systems
// ============================================================================

/// Система: обработка AttackCommand → запуск атаки.
///
/// Молчаливо дропает команду, если: агента нет / агент мертв / атака не
/// Ready / ranged без Launcher. Entity без Attacker — деградация без атак.
pub fn start_attacks(
    mut attack_commands: EventReader<AttackCommand>,
    mut attackers: Query<(
        &Transform,
        &mut Attacker,
        Option<&Launcher>,
        Option<&mut HitVolumes>,
        Option<&Health>,
    )>,
    mut discharges: EventWriter<ProjectileDischarged>,
) {
    for command in attack_commands.read() {
        let Ok((transform, mut attacker, launcher, hit_volumes, health)) =
            attackers.get_mut(command.agent)
        else {
            continue;
        };

        if health.is_some_and(|h| !h.is_alive()) {
            continue;
        }

        // Ranged без discharge-механизма — no-op ДО смены фазы
        if matches!(attacker.kind, AttackKind::Ranged) && launcher.is_none() {
            continue;
        }

        if !attacker.begin(command.aim) {
            continue;
        }

        match attacker.kind {
            AttackKind::Ranged => {
                if let Some(launcher) = launcher {
                    discharges.write(ProjectileDischarged {
                        shooter: command.agent,
                        origin: transform.translation,
                        aim: command.aim,
                        damage: launcher.damage,
                        speed: launcher.projectile_speed,
                        max_range: launcher.max_range,
                    });
                    crate::log(&format!(
                        "⚔️ {:?} discharged projectile at {:?}",
                        command.agent, command.aim
                    ));
                }
            }
            AttackKind::Melee => {
                // Без volumes swing идёт вхолостую (пустой набор волюмов)
                if let Some(mut volumes) = hit_volumes {
                    volumes.enabled = true;
                    volumes.struck.clear();
                }
                crate::log(&format!("⚔️ {:?} started melee swing", command.agent));
            }
            AttackKind::SelfDetonate { .. } => {
                // Wind-up телеграфируется наружу через AgentStatus::Preparing
                crate::log(&format!("💣 {:?} is priming detonation", command.agent));
            }
        }
    }
}

/// Система: тик фаз атаки.
///
/// Завершение Striking: melee гасит hit volumes, self-detonate взрывается
/// (и despawn'ится при die_on_detonation — cooldown для него не наступает).
pub fn tick_attack_phases(
    mut attackers: Query<(
        Entity,
        &Transform,
        &mut Attacker,
        Option<&mut HitVolumes>,
        Option<&BlastCharge>,
        Option<&Health>,
    )>,
    time: Res<Time<Fixed>>,
    mut detonations: EventWriter<Detonated>,
    mut commands: Commands,
) {
    let dt = time.delta_secs();

    for (entity, transform, mut attacker, hit_volumes, blast, health) in attackers.iter_mut() {
        let Some(transition) = attacker.tick(dt) else {
            continue;
        };

        let AttackTransition::StrikeFinished { .. } = transition else {
            continue;
        };

        match attacker.kind {
            AttackKind::Melee => {
                if let Some(mut volumes) = hit_volumes {
                    volumes.enabled = false;
                }
            }
            AttackKind::SelfDetonate { die_on_detonation } => {
                if let Some(blast) = blast {
                    detonations.write(Detonated {
                        agent: entity,
                        position: transform.translation,
                        radius: blast.radius,
                        damage: blast.damage,
                        team_id: health.map_or(0, |h| h.team_id),
                    });
                    crate::log(&format!("💥 {:?} detonated", entity));
                }
                if die_on_detonation {
                    // Teardown посреди цикла: entity уходит, дальше тиков не нужно
                    commands.entity(entity).despawn();
                }
            }
            AttackKind::Ranged => {
                // Discharge был на старте; окно было recovery
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_cycle_timings() {
        let mut attacker = Attacker::melee();
        assert!(attacker.can_attack());

        assert!(attacker.begin(Vec3::ZERO));
        assert!(attacker.is_striking());
        assert!(!attacker.can_attack());

        // Активное окно [0, 0.5): на 0.4 ещё striking
        assert_eq!(attacker.tick(0.4), None);
        assert!(attacker.is_striking());

        // 0.5 истекло → cooldown
        let transition = attacker.tick(0.1);
        assert!(matches!(transition, Some(AttackTransition::StrikeFinished { .. })));
        assert!(attacker.is_cooling_down());
        assert!(!attacker.can_attack());

        // Cooldown 1.0: на 0.9 ещё нельзя
        assert_eq!(attacker.tick(0.9), None);
        assert!(!attacker.can_attack());

        // t = 1.5 от старта → снова Ready
        assert_eq!(attacker.tick(0.1), Some(AttackTransition::CooldownFinished));
        assert!(attacker.can_attack());
    }

    #[test]
    fn test_begin_is_noop_while_busy() {
        let mut attacker = Attacker::melee();
        let aim = Vec3::new(1.0, 0.0, 0.0);
        assert!(attacker.begin(aim));
        let phase_during_strike = attacker.phase;

        // Повторный attempt во время Striking — без изменений
        assert!(!attacker.begin(Vec3::new(9.0, 9.0, 9.0)));
        assert_eq!(attacker.phase, phase_during_strike);

        // И во время Cooldown
        attacker.tick(0.5);
        let phase_during_cooldown = attacker.phase;
        assert!(!attacker.begin(aim));
        assert_eq!(attacker.phase, phase_during_cooldown);
    }

    #[test]
    fn test_strike_carries_aim() {
        let mut attacker = Attacker::ranged();
        let aim = Vec3::new(3.0, 0.0, -2.0);
        attacker.begin(aim);

        let transition = attacker.tick(0.5);
        assert_eq!(transition, Some(AttackTransition::StrikeFinished { aim }));
    }

    #[test]
    fn test_detonator_defaults() {
        let attacker = Attacker::self_detonating(true);
        assert_eq!(attacker.attack_duration, 1.0);
        assert!(matches!(
            attacker.kind,
            AttackKind::SelfDetonate { die_on_detonation: true }
        ));
    }
}
