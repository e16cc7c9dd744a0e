//! VIGIL Simulation Core
//!
//! Headless агентная симуляция на Bevy 0.16: восприятие (vision + hearing
//! certainty), attack decision state machine, behavior shell.
//!
//! HYBRID ARCHITECTURE:
//! - ECS = strategic layer (awareness, attack decisions, movement intent)
//! - Host engine = tactical layer (physics, rendering, collision, pathfinding)
//!
//! Граница с host'ом:
//! - `SightService` — host ставит свой line-of-sight probe (resource)
//! - `DesiredMotion` — read-only выход ядра, host применяет к своему transform
//! - Events: `ProjectileDischarged`/`Detonated` наружу, `MeleeHit`/`ProjectileHit` внутрь

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod agent;
pub mod combat;
pub mod components;
pub mod config;
pub mod logger;
pub mod perception;
pub mod spawner;

// Re-export базовых типов для удобства
pub use agent::AgentPlugin;
pub use combat::{
    AgentDied, AttackCommand, AttackKind, AttackPhase, Attacker, BlastCharge, CombatPlugin,
    DamageDealt, Dead, Detonated, HitVolumes, Launcher, MeleeHit, ProjectileDischarged,
    ProjectileHit,
};
pub use components::*;
pub use config::{AgentArchetype, ConfigError};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_logger, LogLevel, LogPrinter};
pub use perception::{Awareness, BlockWorld, PerceptionPlugin, SightBlocker, SightProbe, SightService};
pub use spawner::{SpawnMethod, Spawner, SpawnerPlugin};

/// Частота simulation tick (фиксированный шаг)
pub const TICK_HZ: f64 = 60.0;

/// Фазы simulation tick. Жёсткий порядок — детерминизм между подсистемами.
///
/// Perceive → Decide → Act → Maintain:
/// 1. Perceive — awareness update (vision/hearing certainty)
/// 2. Decide — behavior shell (desired motion, attack requests)
/// 3. Act — attack state machine (start, phase timers)
/// 4. Maintain — damage, смерть, спавн, индикаторы
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    Perceive,
    Decide,
    Act,
    Maintain,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick (легче считать интервалы)
            .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
            // Детерминистичный RNG (seed по умолчанию)
            .insert_resource(DeterministicRng::new(42))
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Perceive,
                    SimulationSet::Decide,
                    SimulationSet::Act,
                    SimulationSet::Maintain,
                )
                    .chain(),
            )
            // Подсистемы (ECS strategic layer)
            .add_plugins((PerceptionPlugin, AgentPlugin, CombatPlugin, SpawnerPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции.
///
/// Часы переводятся вручную ровно на один fixed период за `app.update()`
/// (`TimeUpdateStrategy::ManualDuration`) — каждый update это ровно один
/// simulation tick, независимо от wall clock.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / TICK_HZ,
        )));

    app
}

/// Snapshot мира для сравнения детерминизма
/// (Debug-байты компонентов, отсортированные по Entity ID)
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
