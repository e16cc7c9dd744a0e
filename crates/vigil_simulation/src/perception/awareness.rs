//! Awareness model — скалярная certainty присутствия цели
//!
//! Два канала восприятия за тик:
//! - vision: свободная прямая + цель в конусе зрения
//! - hearing: цель в радиусе слышимости движется быстрее порога
//!
//! Если оба канала дали ровно ноль — certainty распадается со скоростью
//! decay_rate. Выше follow_threshold агент запоминает позицию цели
//! (expected_position); ниже порога она замораживается как "last known".

use bevy::prelude::*;

use crate::perception::sight::SightService;

/// Защита от деления на почти нулевой интервал в оценке скорости
const MIN_HEARING_INTERVAL: f32 = 1e-4;
/// Защита от деления на почти нулевую дистанцию в hearing-усилении
const MIN_HEARING_DISTANCE: f32 = 1e-3;

/// Последний hearing-сэмпл (позиция + момент времени)
#[derive(Debug, Clone, Copy, Reflect)]
pub struct HeardSample {
    pub position: Vec3,
    pub at: f32,
}

/// Способность агента видеть и слышать цель.
///
/// Компонент опционален: агент без Awareness следует за собственной позицией
/// и (при требовании line of sight) никогда не атакует.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Awareness {
    /// Цель наблюдения
    pub target: Option<Entity>,

    /// Полуширина конуса зрения (градусы)
    pub sight_half_angle: f32,
    /// Максимальная дистанция зрения (и длина sight-луча)
    pub sight_distance: f32,
    /// Радиус слышимости движения цели
    pub hearing_distance: f32,
    /// Скорость цели, ниже которой движение не слышно (м/с)
    pub hearing_speed_threshold: f32,
    /// Порог certainty, выше которого агент следует за сенсорами
    pub follow_threshold: f32,
    /// Порог certainty, выше которого цель считается обнаруженной
    pub detection_threshold: f32,
    /// Скорость распада certainty без стимулов (1/с)
    pub decay_rate: f32,
    /// Позиция возврата при потере цели (None = стоять где стоит)
    pub home: Option<Vec3>,

    /// Уверенность в присутствии/позиции цели. Инвариант: [0, 1]
    pub certainty: f32,
    /// Последняя известная позиция цели (пишется только выше follow_threshold)
    pub expected_position: Vec3,

    last_heard: Option<HeardSample>,
    sight_line: bool,
}

impl Default for Awareness {
    fn default() -> Self {
        Self {
            target: None,
            sight_half_angle: 90.0,
            sight_distance: 20.0,
            hearing_distance: 10.0,
            hearing_speed_threshold: 5.0,
            follow_threshold: 0.2,
            detection_threshold: 0.5,
            decay_rate: 2.0,
            home: None,
            certainty: 0.0,
            expected_position: Vec3::ZERO,
            last_heard: None,
            sight_line: false,
        }
    }
}

impl Awareness {
    pub fn new(target: Entity) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn with_home(mut self, home: Vec3) -> Self {
        self.home = Some(home);
        self
    }

    /// Точка, к которой агент сейчас стремится: expected_position пока
    /// certainty выше follow-порога, иначе home (или собственная позиция).
    pub fn follow_position(&self, own_position: Vec3) -> Vec3 {
        if self.certainty > self.follow_threshold {
            self.expected_position
        } else {
            self.home.unwrap_or(own_position)
        }
    }

    /// Обнаружена ли цель: certainty выше порога И прямая видимость
    /// держится на этом тике.
    pub fn sees_target(&self) -> bool {
        self.certainty > self.detection_threshold && self.sight_line
    }

    /// Результат line-of-sight запроса этого тика
    pub fn has_sight_line(&self) -> bool {
        self.sight_line
    }

    pub fn add_certainty(&mut self, amount: f32) {
        self.certainty = (self.certainty + amount).clamp(0.0, 1.0);
    }

    /// Чистый распад (цель недоступна для восприятия целиком)
    pub fn decay(&mut self, dt: f32) {
        self.sight_line = false;
        self.add_certainty(-self.decay_rate * dt);
    }

    /// Один perception tick.
    ///
    /// `sight` — результат line-of-sight запроса этим тиком (луч ограничен
    /// sight_distance). `now` — elapsed секунды fixed-часов.
    pub fn observe(
        &mut self,
        dt: f32,
        now: f32,
        own_position: Vec3,
        own_forward: Vec3,
        target_position: Vec3,
        sight: bool,
    ) {
        self.sight_line = sight;

        let vision = self.vision_certainty(dt, own_position, own_forward, target_position, sight);
        let hearing = self.hearing_certainty(dt, now, own_position, target_position, sight);

        let mut total = vision + hearing;
        if total == 0.0 {
            // Ни один канал не дал сигнала — распад
            total = -self.decay_rate * dt;
        }
        self.add_certainty(total);

        if self.certainty > self.follow_threshold {
            self.expected_position = target_position;
        }
    }

    /// Прирост certainty от зрения.
    ///
    /// Прирост пропорционален distance/sight_distance: дальняя цель в
    /// пределах видимости набирает certainty быстрее ближней. Контринтуитивно,
    /// но это живая балансировочная характеристика — сохранена как есть.
    fn vision_certainty(
        &self,
        dt: f32,
        own_position: Vec3,
        own_forward: Vec3,
        target_position: Vec3,
        sight: bool,
    ) -> f32 {
        if !sight {
            return 0.0;
        }
        let to_target = target_position - own_position;
        if to_target.length_squared() <= f32::EPSILON {
            // Цель в нашей точке — конус тривиально накрывает
            return 0.0;
        }
        let angle = own_forward.angle_between(to_target).to_degrees();
        if angle < self.sight_half_angle {
            to_target.length() / self.sight_distance * dt
        } else {
            0.0
        }
    }

    /// Прирост certainty от слуха.
    ///
    /// Сэмпл (позиция, время) обновляется каждый тик в радиусе слышимости,
    /// независимо от порога скорости. Оценка скорости защищена от деления
    /// на почти нулевой интервал (первый сэмпл / два тика в один момент).
    fn hearing_certainty(
        &mut self,
        dt: f32,
        now: f32,
        own_position: Vec3,
        target_position: Vec3,
        sight: bool,
    ) -> f32 {
        let distance = (target_position - own_position).length();
        if distance >= self.hearing_distance {
            return 0.0;
        }

        let speed = match self.last_heard {
            Some(prev) => {
                let elapsed = now - prev.at;
                if elapsed > MIN_HEARING_INTERVAL {
                    (target_position - prev.position).length() / elapsed
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        let obstruction_modifier = if sight { 1.0 } else { 0.25 };

        self.last_heard = Some(HeardSample {
            position: target_position,
            at: now,
        });

        if speed > self.hearing_speed_threshold {
            speed * obstruction_modifier * (self.hearing_distance / distance.max(MIN_HEARING_DISTANCE)) * dt
        } else {
            0.0
        }
    }
}

/// Система: perception tick каждого агента.
///
/// Line-of-sight берётся из SightService (host probe), позиция цели — из
/// её Transform. Цель пропала из мира — чистый распад.
pub fn update_awareness(
    mut observers: Query<(&Transform, &mut Awareness)>,
    targets: Query<&Transform>,
    sight: Res<SightService>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();
    let now = time.elapsed_secs();

    for (transform, mut awareness) in observers.iter_mut() {
        let Some(target) = awareness.target else {
            continue;
        };
        let Ok(target_transform) = targets.get(target) else {
            awareness.decay(dt);
            continue;
        };

        let own_position = transform.translation;
        let target_position = target_transform.translation;
        let sight_line =
            sight.line_of_sight(own_position, target_position, awareness.sight_distance);

        awareness.observe(
            dt,
            now,
            own_position,
            *transform.forward(),
            target_position,
            sight_line,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watcher() -> Awareness {
        Awareness::new(Entity::PLACEHOLDER)
    }

    #[test]
    fn test_vision_accrual_exact() {
        let mut awareness = watcher();
        let own = Vec3::ZERO;
        let forward = Vec3::X;
        // Дистанция 10 — вне hearing (10 < 10 ложь), слышимость не вмешивается
        let target = Vec3::new(10.0, 0.0, 0.0);

        awareness.observe(0.1, 0.0, own, forward, target, true);

        // (d / S) * dt = (10 / 20) * 0.1 = 0.05
        assert!((awareness.certainty - 0.05).abs() < 1e-6, "certainty = {}", awareness.certainty);

        // Второй тик — аддитивно
        awareness.observe(0.1, 0.1, own, forward, target, true);
        assert!((awareness.certainty - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_vision_requires_cone_and_sight() {
        let own = Vec3::ZERO;
        let target = Vec3::new(10.0, 0.0, 0.0);

        // Цель за спиной (181° > 90°) — только распад
        let mut awareness = watcher();
        awareness.observe(0.1, 0.0, own, Vec3::NEG_X, target, true);
        assert_eq!(awareness.certainty, 0.0);

        // Прямая перекрыта — только распад
        let mut awareness = watcher();
        awareness.observe(0.1, 0.0, own, Vec3::X, target, false);
        assert_eq!(awareness.certainty, 0.0);
    }

    #[test]
    fn test_certainty_clamped_above() {
        let mut awareness = watcher();
        // Огромный dt — прирост далеко за 1.0
        awareness.observe(100.0, 0.0, Vec3::ZERO, Vec3::X, Vec3::new(15.0, 0.0, 0.0), true);
        assert_eq!(awareness.certainty, 1.0);
    }

    #[test]
    fn test_decay_to_zero() {
        let mut awareness = watcher();
        awareness.certainty = 1.0;
        let far = Vec3::new(50.0, 0.0, 0.0);

        // decay_rate = 2.0: за 0.25с уходит 0.5
        for i in 0..5 {
            awareness.observe(0.05, i as f32 * 0.05, Vec3::ZERO, Vec3::X, far, false);
        }
        assert!((awareness.certainty - 0.5).abs() < 1e-5, "certainty = {}", awareness.certainty);

        // Ещё 0.3с — ниже нуля не уходит
        for i in 5..11 {
            awareness.observe(0.05, i as f32 * 0.05, Vec3::ZERO, Vec3::X, far, false);
        }
        assert_eq!(awareness.certainty, 0.0);
    }

    #[test]
    fn test_expected_position_freezes_below_follow_threshold() {
        let mut awareness = watcher();
        let own = Vec3::ZERO;
        let seen_at = Vec3::new(10.0, 0.0, 0.0);

        // Набираем certainty выше follow_threshold (0.2): 5 тиков по 0.05
        for i in 0..5 {
            awareness.observe(0.1, i as f32 * 0.1, own, Vec3::X, seen_at, true);
        }
        assert!(awareness.certainty > awareness.follow_threshold);
        assert_eq!(awareness.expected_position, seen_at);
        assert_eq!(awareness.follow_position(own), seen_at);

        // Цель ушла и пропала из восприятия — распад ниже порога
        let gone_to = Vec3::new(-30.0, 0.0, 0.0);
        for i in 0..10 {
            awareness.observe(0.1, 0.5 + i as f32 * 0.1, own, Vec3::X, gone_to, false);
        }
        assert!(awareness.certainty < awareness.follow_threshold);

        // Last known заморожена, follow уходит на own (home не задан)
        assert_eq!(awareness.expected_position, seen_at);
        assert_eq!(awareness.follow_position(own), own);

        // С home — возврат домой
        let home = Vec3::new(1.0, 2.0, 3.0);
        awareness.home = Some(home);
        assert_eq!(awareness.follow_position(own), home);
    }

    #[test]
    fn test_hearing_zero_elapsed_is_guarded() {
        let mut awareness = watcher();
        let own = Vec3::ZERO;
        let near = Vec3::new(4.0, 0.0, 0.0);

        // Два тика в один и тот же момент времени — скорость обязана быть 0,
        // не inf/NaN
        awareness.observe(0.1, 1.0, own, Vec3::X, near, false);
        awareness.observe(0.1, 1.0, own, Vec3::X, Vec3::new(4.5, 0.0, 0.0), false);
        assert!(awareness.certainty.is_finite());
        assert!((0.0..=1.0).contains(&awareness.certainty));
    }

    #[test]
    fn test_hearing_accrual_on_fast_movement() {
        let mut awareness = watcher();
        let own = Vec3::ZERO;

        // Первый тик только ставит сэмпл (скорости ещё нет)
        awareness.observe(0.1, 0.0, own, Vec3::X, Vec3::new(4.0, 0.0, 0.0), false);
        assert_eq!(awareness.certainty, 0.0);

        // Цель рванула: 0.6м за 0.1с → 6 м/с > порога 5
        let moved = Vec3::new(4.6, 0.0, 0.0);
        awareness.observe(0.1, 0.1, own, Vec3::X, moved, false);

        let distance = (moved - own).length();
        let expected = 6.0 * 0.25 * (10.0 / distance) * 0.1;
        assert!(
            (awareness.certainty - expected.min(1.0)).abs() < 1e-4,
            "certainty = {}, expected = {}",
            awareness.certainty,
            expected
        );
    }

    #[test]
    fn test_slow_movement_in_hearing_range_decays() {
        let mut awareness = watcher();
        awareness.certainty = 0.3;
        let own = Vec3::ZERO;

        awareness.observe(0.1, 0.0, own, Vec3::NEG_X, Vec3::new(4.0, 0.0, 0.0), false);
        // Медленный дрейф 1 м/с < порога — каналы по нулям, идёт распад
        awareness.observe(0.1, 0.1, own, Vec3::NEG_X, Vec3::new(4.1, 0.0, 0.0), false);
        assert!(awareness.certainty < 0.3);
    }

    #[test]
    fn test_sees_target_needs_threshold_and_sight() {
        let mut awareness = watcher();
        let own = Vec3::ZERO;
        let target = Vec3::new(15.0, 0.0, 0.0);

        // Ниже detection_threshold — не видит
        awareness.observe(0.1, 0.0, own, Vec3::X, target, true);
        assert!(!awareness.sees_target());

        // Выше порога и прямая держится — видит
        awareness.certainty = 0.9;
        awareness.observe(0.1, 0.1, own, Vec3::X, target, true);
        assert!(awareness.sees_target());

        // Прямая потеряна — certainty ещё высокая, но не видит
        awareness.observe(0.1, 0.2, own, Vec3::X, target, false);
        assert!(awareness.certainty > awareness.detection_threshold);
        assert!(!awareness.sees_target());
    }
}
