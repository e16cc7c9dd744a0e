//! Headless симуляция VIGIL
//!
//! Запускает Bevy App без рендера: один патруль (melee + ranged + подрывник)
//! против дрейфующего нарушителя, 1000 тиков

use bevy::prelude::*;
use vigil_simulation::{
    create_headless_app, Awareness, Health, SimulationPlugin, TICK_HZ,
};

/// Маркер нарушителя (цель патруля)
#[derive(Component)]
struct Intruder;

/// Нарушитель нарезает круги — даёт сенсорам что слышать
fn drift_intruder(mut query: Query<&mut Transform, With<Intruder>>, time: Res<Time<Fixed>>) {
    let t = time.elapsed_secs();
    for mut transform in query.iter_mut() {
        transform.translation = Vec3::new(8.0 * t.cos(), 0.0, 8.0 * t.sin());
    }
}

fn main() {
    let seed = 42;
    println!("Starting VIGIL headless simulation (seed: {seed}, tick: {TICK_HZ} Hz)");

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.add_systems(FixedUpdate, drift_intruder);

    let intruder = app
        .world_mut()
        .spawn((
            Intruder,
            Transform::from_translation(Vec3::new(8.0, 0.0, 0.0)),
            Health::with_team(100, 0),
        ))
        .id();

    {
        let mut commands = app.world_mut().commands();
        let melee = vigil_simulation::config::AgentArchetype {
            name: "sentry".to_string(),
            does_attack: true,
            team_id: 1,
            move_style: vigil_simulation::config::MoveStyleConfig::Ground {
                stop_distance: 2.0,
                face_target: true,
                stop_requires_sight: true,
            },
            awareness: Some(Default::default()),
            attack: Some(vigil_simulation::config::AttackConfig::Melee {
                attack_duration: 0.5,
                cooldown_duration: 1.0,
                damage: 25,
                reach: 2.0,
            }),
            ..Default::default()
        };
        vigil_simulation::config::spawn_agent(
            &mut commands,
            &melee,
            Vec3::new(-5.0, 0.0, 0.0),
            Some(intruder),
        );
    }

    // Прогоняем 1000 тиков симуляции
    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            let entity_count = app.world().entities().len();
            let mut certainty = 0.0;
            let mut query = app.world_mut().query::<&Awareness>();
            if let Some(awareness) = query.iter(app.world()).next() {
                certainty = awareness.certainty;
            }
            println!("Tick {tick}: {entity_count} entities, sentry certainty {certainty:.2}");
        }
    }

    println!("Simulation complete!");
}
