use std::path::Path;

use approx::assert_relative_eq;
use nalgebra::point;

use billiard_tables::boundary::{Boundary, BoundaryFeature, RectangleBoundary, Side};
use billiard_tables::config::{ConfigLoader, SimulationConfig};
use billiard_tables::math::Vector;
use billiard_tables::physics::BallState;
use billiard_tables::sampling::SampleSet;
use billiard_tables::simulation::TrajectorySimulator;

fn run(raw: &str) -> (TrajectorySimulator, SampleSet) {
    let config = SimulationConfig::from_toml_str(raw).unwrap();
    let simulator = TrajectorySimulator::from_config(&config).unwrap();
    let output = simulator.run(&config.run).unwrap();
    (simulator, output.samples)
}

#[test]
fn shipped_configs_load() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
    for name in ["default.toml", "sweep.toml", "divergence.toml"] {
        let app = ConfigLoader::load_from_path(&root.join(name)).unwrap();
        assert!(app.resolved_output_dir.starts_with("output"));
        assert!(!app.summary_lines().is_empty());
    }
}

#[test]
fn single_run_in_unit_circle() {
    let (_, samples) = run(r#"
        [boundary]
        type = "circle"
        radius = 1.0

        [run]
        mode = "single"
        steps = 40

        [run.initial]
        kind = "explicit"
        position = [0.0, 0.5]
        velocity = [1.0, 1.0]
    "#);
    let SampleSet::Trajectory(samples) = samples else {
        panic!("expected trajectory samples");
    };
    assert_eq!(samples.len(), 40);
    assert_relative_eq!(samples[1].position.x, 0.411_437_827_766_148, epsilon = 1e-12);
    assert_relative_eq!(samples[1].position.y, 0.911_437_827_766_148, epsilon = 1e-12);
    for sample in &samples[1..] {
        assert!((sample.radius - 1.0).abs() < 1e-9);
        assert_relative_eq!(sample.speed, 2.0_f64.sqrt(), epsilon = 1e-9);
    }
}

#[test]
fn sweep_produces_thirty_samples_per_direction() {
    let (_, samples) = run(r#"
        [boundary]
        type = "rectangle"
        half_width = 1.5
        half_height = 1.0

        [run]
        mode = "sweep"
        position = [0.2, -0.3]
        direction_count = 90
    "#);
    let SampleSet::Sweep(samples) = samples else {
        panic!("expected sweep samples");
    };
    assert_eq!(samples.len(), 90 * 30);
    for (direction, chunk) in samples.chunks(30).enumerate() {
        assert!(chunk.iter().all(|s| s.direction_index == direction));
        assert_eq!(chunk[0].step, 0);
        let first_leg = chunk[0].abs_dx.hypot(chunk[0].abs_dy);
        assert_relative_eq!(chunk[0].path_length, first_leg, epsilon = 1e-9);
    }
}

#[test]
fn divergence_from_random_states_stays_non_negative() {
    let (_, samples) = run(r#"
        [boundary]
        type = "stadium"
        half_length = 1.0
        half_width = 0.6

        [run]
        mode = "divergence"
        steps = 120
        first = { kind = "random", seed = 9 }
        second = { kind = "random", seed = 10 }
    "#);
    let SampleSet::Divergence(samples) = samples else {
        panic!("expected divergence samples");
    };
    assert_eq!(samples.len(), 120);
    assert!(samples.iter().all(|s| s.divergence >= 0.0));
    assert!(samples[0].divergence > 0.0);
}

#[test]
fn rectangle_corner_reverses_the_ball() {
    let simulator = TrajectorySimulator::new(Boundary::Rectangle(
        RectangleBoundary::new(1.0, 1.0).unwrap(),
    ));
    let mut ball = BallState::new(point![0.0, 0.0], Vector::new(1.0, 1.0));
    let bounce = ball.bounce(simulator.boundary()).unwrap();
    assert_eq!(bounce.collision.point, point![1.0, 1.0]);
    assert_eq!(bounce.collision.feature, BoundaryFeature::Corner(Side::Right, Side::Top));
    assert_relative_eq!(ball.velocity.x, -1.0, epsilon = 1e-12);
    assert_relative_eq!(ball.velocity.y, -1.0, epsilon = 1e-12);

    // straight back through the centre into the opposite corner
    let bounce = ball.bounce(simulator.boundary()).unwrap();
    assert_eq!(bounce.collision.point, point![-1.0, -1.0]);
}

#[test]
fn ball_outside_table_aborts_the_run() {
    let config = SimulationConfig::from_toml_str(
        r#"
        [boundary]
        type = "ellipse"
        radius = 1.0
        x_coef = 2.0
        y_coef = 1.0

        [run]
        mode = "single"
        steps = 5

        [run.initial]
        kind = "explicit"
        position = [0.0, 1.5]
        velocity = [1.0, 0.0]
    "#,
    )
    .unwrap();
    let simulator = TrajectorySimulator::from_config(&config).unwrap();
    let err = simulator.run(&config.run).unwrap_err();
    assert!(format!("{err:#}").contains("outside the table"));
}
