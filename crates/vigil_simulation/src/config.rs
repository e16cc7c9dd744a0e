//! Архетипы агентов — статическая конфигурация per agent type
//!
//! Host поставляет тюнинг (скорости, пороги, тайминги) данными, не кодом:
//! serde-записи, загружаемые из TOML. `spawn_agent` собирает полный bundle
//! компонентов из записи.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::combat::{AttackKind, Attacker, BlastCharge, HitVolumes, Launcher};
use crate::components::{Agent, AgentStatus, DesiredMotion, Health, MoveStyle, StopBehavior};
use crate::perception::Awareness;

/// Ошибки загрузки архетипов
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read archetype file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse archetype file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Статическая запись одного типа агента
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentArchetype {
    pub name: String,
    pub move_speed: f32,
    pub can_move: bool,
    pub does_attack: bool,
    pub max_attack_range: f32,
    pub needs_sight_to_attack: bool,
    pub health: u32,
    pub team_id: u64,
    /// Окно неуязвимости после урона (секунды)
    pub invulnerability: f32,
    pub move_style: MoveStyleConfig,
    pub awareness: Option<AwarenessConfig>,
    pub attack: Option<AttackConfig>,
}

impl Default for AgentArchetype {
    fn default() -> Self {
        Self {
            name: "agent".to_string(),
            move_speed: 2.0,
            can_move: true,
            does_attack: false,
            max_attack_range: 5.0,
            needs_sight_to_attack: true,
            health: 100,
            team_id: 0,
            invulnerability: 0.0,
            move_style: MoveStyleConfig::Hold,
            awareness: None,
            attack: None,
        }
    }
}

/// Конфиг стратегии перемещения
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveStyleConfig {
    Hold,
    Ground {
        stop_distance: f32,
        face_target: bool,
        stop_requires_sight: bool,
    },
    Flight {
        stop_distance: f32,
        orbit: OrbitConfig,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrbitConfig {
    Halt,
    Clockwise,
    Anticlockwise,
}

impl From<MoveStyleConfig> for MoveStyle {
    fn from(config: MoveStyleConfig) -> Self {
        match config {
            MoveStyleConfig::Hold => MoveStyle::Hold,
            MoveStyleConfig::Ground {
                stop_distance,
                face_target,
                stop_requires_sight,
            } => MoveStyle::Ground {
                stop_distance,
                face_target,
                stop_requires_sight,
            },
            MoveStyleConfig::Flight {
                stop_distance,
                orbit,
            } => MoveStyle::Flight {
                stop_distance,
                at_stop: orbit.into(),
            },
        }
    }
}

impl From<OrbitConfig> for StopBehavior {
    fn from(config: OrbitConfig) -> Self {
        match config {
            OrbitConfig::Halt => StopBehavior::Halt,
            OrbitConfig::Clockwise => StopBehavior::OrbitClockwise,
            OrbitConfig::Anticlockwise => StopBehavior::OrbitAnticlockwise,
        }
    }
}

/// Тюнинг awareness (пороги/дистанции — см. perception::Awareness)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AwarenessConfig {
    pub sight_half_angle: f32,
    pub sight_distance: f32,
    pub hearing_distance: f32,
    pub hearing_speed_threshold: f32,
    pub follow_threshold: f32,
    pub detection_threshold: f32,
    pub decay_rate: f32,
    pub home: Option<[f32; 3]>,
}

impl Default for AwarenessConfig {
    fn default() -> Self {
        Self {
            sight_half_angle: 90.0,
            sight_distance: 20.0,
            hearing_distance: 10.0,
            hearing_speed_threshold: 5.0,
            follow_threshold: 0.2,
            detection_threshold: 0.5,
            decay_rate: 2.0,
            home: None,
        }
    }
}

impl AwarenessConfig {
    fn build(&self, target: Entity) -> Awareness {
        let mut awareness = Awareness::new(target);
        awareness.sight_half_angle = self.sight_half_angle;
        awareness.sight_distance = self.sight_distance;
        awareness.hearing_distance = self.hearing_distance;
        awareness.hearing_speed_threshold = self.hearing_speed_threshold;
        awareness.follow_threshold = self.follow_threshold;
        awareness.detection_threshold = self.detection_threshold;
        awareness.decay_rate = self.decay_rate;
        awareness.home = self.home.map(Vec3::from);
        awareness
    }
}

/// Конфиг варианта атаки
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttackConfig {
    Melee {
        attack_duration: f32,
        cooldown_duration: f32,
        damage: u32,
        reach: f32,
    },
    Ranged {
        attack_duration: f32,
        cooldown_duration: f32,
        damage: u32,
        projectile_speed: f32,
        max_range: f32,
    },
    SelfDetonate {
        attack_duration: f32,
        cooldown_duration: f32,
        die_on_detonation: bool,
        blast_radius: f32,
        damage: u32,
    },
}

#[derive(Debug, Deserialize)]
struct ArchetypeFile {
    #[serde(default)]
    archetypes: Vec<AgentArchetype>,
}

/// Загрузка архетипов из TOML файла (таблицы `[[archetypes]]`)
pub fn load_archetypes(path: impl AsRef<Path>) -> Result<Vec<AgentArchetype>, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ArchetypeFile = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.archetypes)
}

/// Собирает entity агента из архетипа.
///
/// `target` — цель awareness (None или архетип без awareness-секции →
/// агент без восприятия, деградирует до стояния на месте).
pub fn spawn_agent(
    commands: &mut Commands,
    archetype: &AgentArchetype,
    position: Vec3,
    target: Option<Entity>,
) -> Entity {
    let mut health = Health::with_team(archetype.health, archetype.team_id);
    health.invulnerability = archetype.invulnerability;

    let mut entity = commands.spawn((
        Transform::from_translation(position),
        Agent {
            move_speed: archetype.move_speed,
            can_move: archetype.can_move,
            does_attack: archetype.does_attack,
            max_attack_range: archetype.max_attack_range,
            needs_sight_to_attack: archetype.needs_sight_to_attack,
        },
        health,
        MoveStyle::from(archetype.move_style),
        DesiredMotion::default(),
        AgentStatus::default(),
    ));

    if let (Some(awareness), Some(target)) = (&archetype.awareness, target) {
        entity.insert(awareness.build(target));
    }

    match archetype.attack {
        Some(AttackConfig::Melee {
            attack_duration,
            cooldown_duration,
            damage,
            reach,
        }) => {
            entity.insert((
                Attacker::new(AttackKind::Melee, attack_duration, cooldown_duration),
                HitVolumes {
                    damage,
                    reach,
                    ..default()
                },
            ));
        }
        Some(AttackConfig::Ranged {
            attack_duration,
            cooldown_duration,
            damage,
            projectile_speed,
            max_range,
        }) => {
            entity.insert((
                Attacker::new(AttackKind::Ranged, attack_duration, cooldown_duration),
                Launcher {
                    damage,
                    projectile_speed,
                    max_range,
                },
            ));
        }
        Some(AttackConfig::SelfDetonate {
            attack_duration,
            cooldown_duration,
            die_on_detonation,
            blast_radius,
            damage,
        }) => {
            entity.insert((
                Attacker::new(
                    AttackKind::SelfDetonate { die_on_detonation },
                    attack_duration,
                    cooldown_duration,
                ),
                BlastCharge {
                    radius: blast_radius,
                    damage,
                },
            ));
        }
        None => {}
    }

    entity.id()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [[archetypes]]
        name = "sentry"
        move_speed = 3.5
        does_attack = true
        team_id = 1

        [archetypes.move_style]
        kind = "ground"
        stop_distance = 2.0
        face_target = true
        stop_requires_sight = true

        [archetypes.awareness]
        sight_distance = 25.0
        decay_rate = 1.0

        [archetypes.attack]
        kind = "melee"
        attack_duration = 0.5
        cooldown_duration = 1.0
        damage = 25
        reach = 2.0

        [[archetypes]]
        name = "drone"
        team_id = 1

        [archetypes.move_style]
        kind = "flight"
        stop_distance = 5.0
        orbit = "clockwise"
    "#;

    #[test]
    fn test_parse_archetypes() {
        let file: ArchetypeFile = toml::from_str(SAMPLE).unwrap();
        assert_eq!(file.archetypes.len(), 2);

        let sentry = &file.archetypes[0];
        assert_eq!(sentry.name, "sentry");
        assert_eq!(sentry.move_speed, 3.5);
        assert!(sentry.does_attack);
        // Незаполненные поля берут дефолты
        assert_eq!(sentry.health, 100);
        assert_eq!(sentry.max_attack_range, 5.0);

        let awareness = sentry.awareness.unwrap();
        assert_eq!(awareness.sight_distance, 25.0);
        assert_eq!(awareness.decay_rate, 1.0);
        assert_eq!(awareness.follow_threshold, 0.2);

        assert!(matches!(
            sentry.attack,
            Some(AttackConfig::Melee { damage: 25, .. })
        ));

        let drone = &file.archetypes[1];
        assert!(drone.awareness.is_none());
        assert_eq!(
            MoveStyle::from(drone.move_style),
            MoveStyle::Flight {
                stop_distance: 5.0,
                at_stop: StopBehavior::OrbitClockwise,
            }
        );
    }

    #[test]
    fn test_parse_error_on_bad_toml() {
        let result: Result<ArchetypeFile, _> = toml::from_str("[[archetypes]]\nkind = ");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_archetypes("/definitely/not/a/real/path.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
