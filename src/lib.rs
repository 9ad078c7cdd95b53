// Library exports for the folio binary and tests
pub mod config;
pub mod github;
pub mod navigation;
pub mod page;
pub mod particle_system;
pub mod renderer;
pub mod repo_loader;
pub mod sections;

// Re-export main types
pub use config::Config;
pub use github::{FetchError, FetchOutcome, GitHubClient, Repository};
pub use navigation::SectionNav;
pub use page::{Card, Page, RenderTarget};
pub use particle_system::{Particle, ParticleSystem, Pointer, Surface};
pub use renderer::Renderer;
pub use sections::{Section, SectionMap, SectionName};
