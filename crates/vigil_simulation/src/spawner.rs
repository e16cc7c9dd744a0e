//! Спавнер агентов — периодический спавн из архетипа
//!
//! Интервалы: Fixed (каждые interval секунд) или Random (до interval,
//! равномерно). Случайность — из seeded DeterministicRng, прогоны
//! воспроизводимы.

use bevy::prelude::*;
use rand::Rng;

use crate::config::{self, AgentArchetype};
use crate::{DeterministicRng, SimulationSet};

/// Режим интервалов спавна
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnMethod {
    /// Каждые interval секунд
    Fixed,
    /// Полуслучайные интервалы, не больше interval
    Random,
}

/// Точка спавна агентов
#[derive(Component, Debug, Clone)]
pub struct Spawner {
    /// Что спавнить
    pub archetype: AgentArchetype,
    pub method: SpawnMethod,
    /// Максимальное время между спавнами (секунды)
    pub interval: f32,
    /// Полуразмеры области спавна вокруг позиции спавнера
    pub area_half_extents: Vec3,
    /// Цель awareness для заспавненных агентов
    pub target: Option<Entity>,
    /// Дедлайн следующего спавна (elapsed секунды); 0 = спавн на первом тике
    pub next_spawn_at: f32,
}

impl Spawner {
    pub fn new(archetype: AgentArchetype, interval: f32) -> Self {
        Self {
            archetype,
            method: SpawnMethod::Fixed,
            interval,
            area_half_extents: Vec3::ZERO,
            target: None,
            next_spawn_at: 0.0,
        }
    }

    pub fn with_method(mut self, method: SpawnMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_area(mut self, half_extents: Vec3) -> Self {
        self.area_half_extents = half_extents;
        self
    }

    pub fn with_target(mut self, target: Entity) -> Self {
        self.target = Some(target);
        self
    }
}

/// Система: тик спавнеров
pub fn run_spawners(
    mut spawners: Query<(&Transform, &mut Spawner)>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
) {
    let now = time.elapsed_secs();

    for (transform, mut spawner) in spawners.iter_mut() {
        if now <= spawner.next_spawn_at {
            continue;
        }

        spawner.next_spawn_at = match spawner.method {
            SpawnMethod::Fixed => now + spawner.interval,
            SpawnMethod::Random => now + spawner.interval * rng.rng.gen::<f32>(),
        };

        let half = spawner.area_half_extents;
        let offset = Vec3::new(
            rng.rng.gen_range(-half.x..=half.x),
            rng.rng.gen_range(-half.y..=half.y),
            rng.rng.gen_range(-half.z..=half.z),
        );
        let position = transform.translation + offset;

        let agent = config::spawn_agent(&mut commands, &spawner.archetype, position, spawner.target);
        crate::log(&format!(
            "✨ spawned '{}' {:?} at {:?}",
            spawner.archetype.name, agent, position
        ));
    }
}

/// Spawner Plugin
pub struct SpawnerPlugin;

impl Plugin for SpawnerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            run_spawners.in_set(SimulationSet::Maintain),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawner_deadline_progression() {
        let mut spawner = Spawner::new(AgentArchetype::default(), 5.0);
        assert_eq!(spawner.next_spawn_at, 0.0);

        // Fixed: дедлайн уезжает ровно на interval
        let now = 0.5;
        spawner.next_spawn_at = now + spawner.interval;
        assert_eq!(spawner.next_spawn_at, 5.5);
    }

    #[test]
    fn test_random_interval_bounded() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);

        let interval = 5.0f32;
        for _ in 0..100 {
            let wait = interval * rng.gen::<f32>();
            assert!((0.0..=interval).contains(&wait));
        }
    }
}
