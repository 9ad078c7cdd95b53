use glam::{Vec2, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Maximum number of live particles
pub const MAX_PARTICLES: usize = 120;

const JITTER: f32 = 8.0;
const MAX_SPEED: f32 = 0.6;
const DAMPING: f32 = 0.99;
const MIN_LIFE: i32 = 40;
const MAX_LIFE: i32 = 110;
const MIN_RADIUS: f32 = 1.0;
const MAX_RADIUS: f32 = 3.0;
const MIN_OPACITY: f32 = 0.04;
/// Lifetime that maps to full opacity
const OPACITY_LIFE: f32 = 120.0;

/// Trail palette, RGBA in 0..1
pub const PALETTE: [Vec4; 3] = [
    Vec4::new(141.0 / 255.0, 106.0 / 255.0, 1.0, 0.9),  // Violet
    Vec4::new(58.0 / 255.0, 224.0 / 255.0, 1.0, 0.85),  // Cyan
    Vec4::new(1.0, 138.0 / 255.0, 91.0 / 255.0, 0.85),  // Coral
];

/// Drawing capability the simulation renders through
pub trait Surface {
    fn clear_surface(&mut self);

    /// Filled circle; `alpha` multiplies the colour's own alpha
    fn draw_circle(&mut self, x: f32, y: f32, radius: f32, color: Vec4, alpha: f32);
}

/// Latest known pointer position in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    position: Vec2,
}

impl Pointer {
    /// Pointer resting at the centre of a `width` x `height` surface
    pub fn centered(width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(width / 2.0, height / 2.0),
        }
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub life: i32,    // Remaining ticks
    pub radius: f32,
    pub color: Vec4,
}

impl Particle {
    pub fn opacity(&self) -> f32 {
        (self.life as f32 / OPACITY_LIFE).max(MIN_OPACITY)
    }
}

/// Cursor trail: short-lived particles spawned at the pointer every tick
pub struct ParticleSystem {
    particles: VecDeque<Particle>,
    capacity: usize,
    rng: StdRng,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::with_rng(MAX_PARTICLES, StdRng::from_entropy())
    }

    /// System with an explicit capacity and random source (seeded in tests)
    pub fn with_rng(capacity: usize, rng: StdRng) -> Self {
        Self {
            particles: VecDeque::with_capacity(capacity),
            capacity,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Live particles, oldest first
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// One frame: spawn at the pointer, then advance and draw everything
    pub fn tick<S: Surface>(&mut self, pointer: &Pointer, surface: &mut S) {
        let jitter = Vec2::new(
            self.rng.gen_range(-JITTER..=JITTER),
            self.rng.gen_range(-JITTER..=JITTER),
        );
        self.spawn(pointer.position() + jitter);
        self.step(surface);
    }

    /// Create a randomized particle at `position`
    pub fn spawn(&mut self, position: Vec2) {
        let particle = Particle {
            position,
            velocity: Vec2::new(
                self.rng.gen_range(-MAX_SPEED..=MAX_SPEED),
                self.rng.gen_range(-MAX_SPEED..=MAX_SPEED),
            ),
            life: self.rng.gen_range(MIN_LIFE..=MAX_LIFE),
            radius: self.rng.gen_range(MIN_RADIUS..=MAX_RADIUS),
            color: PALETTE[self.rng.gen_range(0..PALETTE.len())],
        };
        self.push(particle);
    }

    /// Append a particle, evicting the oldest first when full
    pub fn push(&mut self, particle: Particle) {
        if self.capacity == 0 {
            return;
        }
        while self.particles.len() >= self.capacity {
            self.particles.pop_front();
        }
        self.particles.push_back(particle);
    }

    /// Clear the surface, integrate every particle and draw the survivors
    pub fn step<S: Surface>(&mut self, surface: &mut S) {
        surface.clear_surface();

        self.particles.retain_mut(|p| {
            p.position += p.velocity;
            p.velocity *= DAMPING;
            p.life -= 1;

            if p.life <= 0 {
                return false;
            }

            surface.draw_circle(p.position.x, p.position.y, p.radius, p.color, p.opacity());
            true
        });
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}
