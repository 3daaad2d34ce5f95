#![allow(
    clippy::indexing_slicing,
    reason = "fixed-size body arrays indexed by bounded loops"
)]
#![allow(
    clippy::excessive_precision,
    reason = "orbital elements are kept exactly as published"
)]

use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

use energy_harness::{ExecuteError, Payload, PrepareError};

use crate::{Result, require_positive};

const SOLAR_MASS: f64 = 4.0 * PI * PI;
const DAYS_PER_YEAR: f64 = 365.24;
const TIME_STEP: f64 = 0.01;
const BODY_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Vec3(f64, f64, f64);

impl Vec3 {
    const ZERO: Self = Self(0.0, 0.0, 0.0);

    fn squared_norm(self) -> f64 {
        self.0 * self.0 + self.1 * self.1 + self.2 * self.2
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0, self.1 - rhs.1, self.2 - rhs.2)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs, self.1 * rhs, self.2 * rhs)
    }
}

#[derive(Clone, Copy, Debug)]
struct Body {
    position: Vec3,
    velocity: Vec3,
    mass: f64,
}

/// The sun and the four gas giants, positions in AU and velocities in AU per year.
const JOVIAN_SYSTEM: [Body; BODY_COUNT] = [
    Body {
        position: Vec3::ZERO,
        velocity: Vec3::ZERO,
        mass: SOLAR_MASS,
    },
    // Jupiter
    Body {
        position: Vec3(
            4.84143144246472090e+00,
            -1.16032004402742839e+00,
            -1.03622044471123109e-01,
        ),
        velocity: Vec3(
            1.66007664274403694e-03 * DAYS_PER_YEAR,
            7.69901118419740425e-03 * DAYS_PER_YEAR,
            -6.90460016972063023e-05 * DAYS_PER_YEAR,
        ),
        mass: 9.54791938424326609e-04 * SOLAR_MASS,
    },
    // Saturn
    Body {
        position: Vec3(
            8.34336671824457987e+00,
            4.12479856412430479e+00,
            -4.03523417114321381e-01,
        ),
        velocity: Vec3(
            -2.76742510726862411e-03 * DAYS_PER_YEAR,
            4.99852801234917238e-03 * DAYS_PER_YEAR,
            2.30417297573763929e-05 * DAYS_PER_YEAR,
        ),
        mass: 2.85885980666130812e-04 * SOLAR_MASS,
    },
    // Uranus
    Body {
        position: Vec3(
            1.28943695621391310e+01,
            -1.51111514016986312e+01,
            -2.23307578892655734e-01,
        ),
        velocity: Vec3(
            2.96460137564761618e-03 * DAYS_PER_YEAR,
            2.37847173959480950e-03 * DAYS_PER_YEAR,
            -2.96589568540237556e-05 * DAYS_PER_YEAR,
        ),
        mass: 4.36624404335156298e-05 * SOLAR_MASS,
    },
    // Neptune
    Body {
        position: Vec3(
            1.53796971148509165e+01,
            -2.59193146099879641e+01,
            1.79258772950371181e-01,
        ),
        velocity: Vec3(
            2.68067772490389322e-03 * DAYS_PER_YEAR,
            1.62824170038242295e-03 * DAYS_PER_YEAR,
            -9.51592254519715870e-05 * DAYS_PER_YEAR,
        ),
        mass: 5.15138902046611451e-05 * SOLAR_MASS,
    },
];

/// The state of the simulated planetary system.
#[derive(Clone, Debug)]
pub struct PlanetarySystem {
    bodies: [Body; BODY_COUNT],
}

impl PlanetarySystem {
    /// The Jovian planets around the sun, with the sun's velocity chosen so that the total
    /// momentum of the system is zero.
    fn jovian() -> Self {
        let mut bodies = JOVIAN_SYSTEM;

        let momentum = bodies
            .iter()
            .fold(Vec3::ZERO, |sum, body| sum + body.velocity * body.mass);
        bodies[0].velocity = momentum * (-1.0 / SOLAR_MASS);

        Self { bodies }
    }

    fn advance(&mut self, dt: f64) {
        for i in 0..BODY_COUNT {
            let (head, tail) = self.bodies.split_at_mut(i + 1);
            let current = &mut head[i];

            for other in tail {
                let delta = current.position - other.position;
                let squared = delta.squared_norm();
                let magnitude = dt / (squared * squared.sqrt());

                current.velocity = current.velocity - delta * (other.mass * magnitude);
                other.velocity = other.velocity + delta * (current.mass * magnitude);
            }
        }

        for body in &mut self.bodies {
            body.position = body.position + body.velocity * dt;
        }
    }

    /// Total kinetic plus potential energy.
    fn energy(&self) -> f64 {
        let mut energy = 0.0;

        for (i, body) in self.bodies.iter().enumerate() {
            energy += 0.5 * body.mass * body.velocity.squared_norm();

            for other in &self.bodies[i + 1..] {
                let distance = (body.position - other.position).squared_norm().sqrt();
                energy -= body.mass * other.mass / distance;
            }
        }

        energy
    }
}

/// Simulates the orbits of the Jovian planets with a simple symplectic integrator.
///
/// One execution advances the system by `steps` time steps of 0.01 years and returns the total
/// energy afterwards. The simulation continues from where the previous execution left off
/// unless the state is reinitialized between iterations.
#[derive(Debug)]
pub struct NBody {
    steps: usize,
}

impl NBody {
    /// Name of the kernel.
    pub const NAME: &str = "n-body";

    /// Default number of time steps per execution.
    pub const DEFAULT_STEPS: usize = 1000;

    /// Creates the kernel for `steps` time steps per execution.
    ///
    /// # Errors
    ///
    /// Fails if `steps` is zero.
    pub fn new(steps: usize) -> Result<Self> {
        Ok(Self {
            steps: require_positive(Self::NAME, "steps", steps)?,
        })
    }
}

impl Payload for NBody {
    type State = PlanetarySystem;
    type Output = f64;

    fn prepare(&mut self) -> std::result::Result<PlanetarySystem, PrepareError> {
        Ok(PlanetarySystem::jovian())
    }

    fn execute(&mut self, system: &mut PlanetarySystem) -> std::result::Result<f64, ExecuteError> {
        for _ in 0..self.steps {
            system.advance(TIME_STEP);
        }

        Ok(system.energy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_energy() {
        let energy = PlanetarySystem::jovian().energy();

        assert!((energy - -0.169_075_164).abs() < 1e-9, "{energy}");
    }

    #[test]
    fn energy_after_default_steps() {
        let mut kernel = NBody::new(NBody::DEFAULT_STEPS).unwrap();
        let mut system = kernel.prepare().unwrap();

        let energy = kernel.execute(&mut system).unwrap();

        assert!((energy - -0.169_087_605).abs() < 1e-9, "{energy}");
    }

    #[test]
    fn shared_state_keeps_advancing() {
        let mut kernel = NBody::new(500).unwrap();
        let mut system = kernel.prepare().unwrap();

        _ = kernel.execute(&mut system).unwrap();
        let after_two = kernel.execute(&mut system).unwrap();

        let mut fresh = NBody::new(1000).unwrap();
        let mut fresh_system = fresh.prepare().unwrap();
        let after_one = fresh.execute(&mut fresh_system).unwrap();

        assert!((after_two - after_one).abs() < 1e-12);
    }

    #[test]
    fn zero_steps_is_rejected() {
        assert!(NBody::new(0).is_err());
    }
}
