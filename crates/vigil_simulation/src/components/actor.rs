//! Базовые компоненты агентов: Agent, Health, AgentStatus

use bevy::prelude::*;

use crate::components::movement::DesiredMotion;

/// Агент — AI-управляемый актор с движением, восприятием и (опционально) атакой.
///
/// `Awareness` и `Attacker` — отдельные компоненты на той же entity. Их
/// отсутствие — не ошибка: агент без awareness держит позицию, агент без
/// attacker никогда не атакует.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(Health, DesiredMotion, AgentStatus)]
pub struct Agent {
    /// Базовая скорость движения (м/с)
    pub move_speed: f32,
    /// Может ли агент двигаться
    pub can_move: bool,
    /// Пытается ли агент атаковать вообще (false = декоративный агент)
    pub does_attack: bool,
    /// Дистанция до цели, ближе которой агент начинает атаковать (метры)
    pub max_attack_range: f32,
    /// Требуется ли line of sight к цели для атаки
    pub needs_sight_to_attack: bool,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            can_move: true,
            does_attack: false,
            max_attack_range: 5.0,
            needs_sight_to_attack: true,
        }
    }
}

/// Здоровье актора с пост-хитовым окном неуязвимости
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
    /// Команда (friendly fire фильтруется по team_id)
    pub team_id: u64,
    /// Окно неуязвимости после полученного урона (секунды, 0 = нет окна)
    pub invulnerability: f32,
    /// Момент (elapsed секунды), начиная с которого урон снова проходит
    pub damageable_at: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self {
            current: max,
            max,
            team_id: 0,
            invulnerability: 0.0,
            damageable_at: 0.0,
        }
    }

    pub fn with_team(max: u32, team_id: u64) -> Self {
        Self {
            team_id,
            ..Self::new(max)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn is_invulnerable(&self, now: f32) -> bool {
        now < self.damageable_at
    }

    /// Применяет урон. Возвращает фактически снятое здоровье
    /// (0 если мертв или в окне неуязвимости).
    pub fn take_damage(&mut self, amount: u32, now: f32) -> u32 {
        if !self.is_alive() || self.is_invulnerable(now) {
            return 0;
        }
        let applied = amount.min(self.current);
        self.current -= applied;
        self.damageable_at = now + self.invulnerability;
        applied
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.max);
    }
}

/// Host-facing индикаторы состояния (для анимации).
///
/// Ядро их только пишет, собственные решения на них не строит.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct AgentStatus {
    pub movement: MovementIndicator,
    pub action: ActionIndicator,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub enum MovementIndicator {
    #[default]
    Idle,
    Moving,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub enum ActionIndicator {
    #[default]
    Idle,
    /// Wind-up/telegraph (самоподрыв заряжается)
    Preparing,
    /// Атака активна
    Striking,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(100);
        assert_eq!(health.current, 100);

        let applied = health.take_damage(30, 0.0);
        assert_eq!(applied, 30);
        assert_eq!(health.current, 70);
        assert!(health.is_alive());

        // Урон больше остатка снимает только остаток
        let applied = health.take_damage(200, 1.0);
        assert_eq!(applied, 70);
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());

        // Мертвому урон не проходит
        assert_eq!(health.take_damage(10, 2.0), 0);
    }

    #[test]
    fn test_health_invulnerability_window() {
        let mut health = Health {
            invulnerability: 3.0,
            ..Health::new(100)
        };

        assert_eq!(health.take_damage(10, 1.0), 10);
        // Внутри окна (1.0 + 3.0) урон игнорируется
        assert_eq!(health.take_damage(10, 2.0), 0);
        assert_eq!(health.current, 90);
        // После окна снова проходит
        assert_eq!(health.take_damage(10, 4.5), 10);
        assert_eq!(health.current, 80);
    }

    #[test]
    fn test_health_heal_clamped() {
        let mut health = Health::new(100);
        health.take_damage(50, 0.0);
        health.heal(30);
        assert_eq!(health.current, 80);

        health.heal(100);
        assert_eq!(health.current, 100);
    }
}
