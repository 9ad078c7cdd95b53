use folio::config::Config;
use folio::github::GitHubClient;
use folio::navigation::SectionNav;
use folio::page::Page;
use folio::particle_system::{ParticleSystem, Pointer, MAX_PARTICLES};
use folio::renderer::Renderer;
use folio::repo_loader;
use folio::sections::SectionName;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{Key, KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

#[derive(Debug, Clone)]
enum UserEvent {
    /// Page written; cards shown per section
    PageReady(HashMap<SectionName, usize>),
}

struct App {
    renderer: Option<Renderer>,
    particle_system: ParticleSystem,
    pointer: Pointer,
    nav: SectionNav,
    card_counts: Option<HashMap<SectionName, usize>>,
    window: Option<Arc<Window>>,
}

impl App {
    fn new(nav: SectionNav) -> Self {
        Self {
            renderer: None,
            particle_system: ParticleSystem::new(),
            pointer: Pointer::centered(800.0, 600.0),
            nav,
            card_counts: None,
            window: None,
        }
    }

    fn update_title(&self) {
        let Some(window) = &self.window else {
            return;
        };
        let title = match (self.nav.active(), &self.card_counts) {
            (Some(section), Some(counts)) => format!(
                "folio · {} ({} repos)",
                section.title(),
                counts.get(&section).copied().unwrap_or(0)
            ),
            (Some(section), None) => format!("folio · {} (loading…)", section.title()),
            (None, _) => "folio".to_string(),
        };
        window.set_title(&title);
    }

    fn render(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(renderer) = &mut self.renderer {
            self.particle_system.tick(&self.pointer, renderer);

            match renderer.present() {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    let size = renderer.size();
                    renderer.resize(size);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("GPU out of memory, closing");
                    event_loop.exit();
                }
                Err(e) => log::warn!("render error: {:?}", e),
            }
        }
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::PageReady(counts) => {
                self.card_counts = Some(counts);
                self.update_title();
            }
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attributes = Window::default_attributes()
                .with_title("folio")
                .with_inner_size(winit::dpi::LogicalSize::new(1024, 640));

            let window = Arc::new(
                event_loop
                    .create_window(window_attributes)
                    .expect("failed to create window"),
            );
            self.window = Some(window.clone());

            let size = window.inner_size();
            self.pointer = Pointer::centered(size.width as f32, size.height as f32);
            self.renderer = Some(pollster::block_on(Renderer::new(window.clone(), MAX_PARTICLES)));

            self.update_title();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Character(text),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Some(key) = text.chars().next() {
                    if self.nav.select_key(key) {
                        self.update_title();
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.move_to(position.x as f32, position.y as f32);
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size);
                }
            }

            WindowEvent::RedrawRequested => {
                self.render(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("usage: folio [--no-window] [--out <path>] [--sections <file>] [account]");
            std::process::exit(1);
        }
    };

    println!("\n📁 folio - portfolio of github.com/{}", config.account);

    if config.window {
        run_window_mode(config);
    } else {
        build_and_write(&config);
    }
}

/// Fetch on a background thread while the particle window runs
fn run_window_mode(config: Config) {
    let event_loop = match EventLoop::<UserEvent>::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("cannot open event loop ({}), building page only", e);
            build_and_write(&config);
            return;
        }
    };
    let proxy = event_loop.create_proxy();
    event_loop.set_control_flow(ControlFlow::Poll);

    let nav = SectionNav::new(config.sections.iter().map(|s| s.name));

    thread::spawn(move || {
        fetch_in_background(config, proxy);
    });

    let mut app = App::new(nav);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("event loop error: {}", e);
    }
}

/// Background thread: build the page once and report to the event loop
fn fetch_in_background(config: Config, proxy: EventLoopProxy<UserEvent>) {
    if let Some(page) = build_and_write(&config) {
        let counts = page
            .grids()
            .iter()
            .map(|g| (g.section, g.repo_count()))
            .collect();
        // Window may already be closed
        let _ = proxy.send_event(UserEvent::PageReady(counts));
    }
}

fn build_and_write(config: &Config) -> Option<Page> {
    use tokio::runtime::Runtime;

    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("failed to start async runtime: {}", e);
            return None;
        }
    };

    let mut page = Page::new(&config.account, &config.sections);
    if let Some(link) = &config.pdf_link {
        page.set_pdf_link(link);
    }

    match GitHubClient::new(&config.api_base) {
        Ok(client) => rt.block_on(repo_loader::load_and_render(
            &client,
            &config.account,
            &config.sections,
            &mut page,
        )),
        Err(e) => repo_loader::render_outcome(&Err(e), &config.sections, &mut page),
    }

    match page.write_to(&config.output) {
        Ok(()) => println!("✅ Page written to {}", config.output.display()),
        Err(e) => log::error!("failed to write {}: {}", config.output.display(), e),
    }

    Some(page)
}
