//! Perception module — awareness model + line-of-sight сервис
//!
//! Архитектура:
//! - `SightService` — host-заменяемый line-of-sight probe (Box<dyn SightProbe>)
//! - `Awareness` — per-agent certainty аккумулятор (vision + hearing + decay)
//! - `update_awareness` — один perception tick на агента в FixedUpdate

use bevy::prelude::*;

pub mod awareness;
pub mod sight;

// Re-export основных типов
pub use awareness::Awareness;
pub use sight::{BlockWorld, SightBlocker, SightProbe, SightService};

use crate::SimulationSet;

/// Perception Plugin
///
/// Ставит дефолтный `SightService` (пустой BlockWorld — всё видно) и
/// регистрирует awareness update первым в simulation tick.
pub struct PerceptionPlugin;

impl Plugin for PerceptionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SightService>().add_systems(
            FixedUpdate,
            awareness::update_awareness.in_set(SimulationSet::Perceive),
        );
    }
}
