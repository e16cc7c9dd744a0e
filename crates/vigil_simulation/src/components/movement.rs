//! Movement компоненты: стратегия перемещения и желаемая моция
//!
//! Архитектура:
//! - ECS решает КУДА двигаться (`DesiredMotion` — смещение за тик + ориентация)
//! - Host применяет моцию к своему transform/физике (или headless driver
//!   в `agent::apply_desired_motion`)

use bevy::prelude::*;

/// Стратегия перемещения агента.
///
/// Sum type вместо иерархии наследования: один resolver диспатчит по варианту.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub enum MoveStyle {
    /// Держать позицию и ориентацию
    Hold,
    /// Наземное преследование: прямой шаг к цели до stop distance.
    /// Pathfinding — зона host'а; ядро выдаёт только intent-шаг.
    Ground {
        stop_distance: f32,
        /// Смотреть на цель (yaw-only), иначе — по направлению движения
        face_target: bool,
        /// Не останавливаться на stop distance, пока нет line of sight к цели
        stop_requires_sight: bool,
    },
    /// Полёт к цели; на дистанции остановки — поведение at_stop
    Flight {
        stop_distance: f32,
        at_stop: StopBehavior,
    },
}

impl Default for MoveStyle {
    fn default() -> Self {
        Self::Hold
    }
}

/// Поведение летающего агента на дистанции остановки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum StopBehavior {
    /// Зависнуть на месте
    Halt,
    /// Кружить вокруг цели по часовой
    OrbitClockwise,
    /// Кружить против часовой
    OrbitAnticlockwise,
}

/// Желаемая моция за тик — read-only выход ядра.
///
/// `step` — смещение (метры за тик), `facing` — желаемая ориентация.
/// Host читает и применяет; ядро никогда не читает обратно.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct DesiredMotion {
    pub step: Vec3,
    pub facing: Quat,
}

impl Default for DesiredMotion {
    fn default() -> Self {
        Self {
            step: Vec3::ZERO,
            facing: Quat::IDENTITY,
        }
    }
}
