//! ECS Components для агентов
//!
//! Организация по доменам:
//! - actor: базовые характеристики (Agent, Health, AgentStatus)
//! - movement: стратегия перемещения и желаемая моция (MoveStyle, DesiredMotion)
//!
//! Awareness/Attacker живут в perception/combat модулях — это опциональные
//! capability-компоненты, агент без них деградирует молча.

pub mod actor;
pub mod movement;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
