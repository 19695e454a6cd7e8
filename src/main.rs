use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{info, warn};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton as WinitMouseButton, MouseScrollDelta,
    WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::{CursorGrabMode, WindowBuilder};

use lightbox::{App, Demo, InputState, KeyCode, NamedKey, Renderer, Scene};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let (scene, assets_root) = load_scene(&options)?;

    print_summary(&scene);

    if options.summary_only {
        return Ok(());
    }

    match run_interactive(scene, assets_root, &options) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<WindowInitError>().is_some() {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                );
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

fn load_scene(options: &CliOptions) -> Result<(Scene, PathBuf)> {
    if let Some(path) = &options.scene_path {
        if options.demo.is_some() {
            return Err(anyhow!("give either a scene file or --demo, not both"));
        }
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene file {path}"))?;
        let scene = Scene::from_xml(&xml).with_context(|| format!("failed to parse {path}"))?;
        let root = PathBuf::from(path)
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        return Ok((scene, root));
    }

    let demo = match &options.demo {
        Some(name) => Demo::from_name(name)?,
        None => Demo::Phong,
    };
    Ok((demo.scene(), PathBuf::from(".")))
}

fn print_summary(scene: &Scene) {
    println!(
        "Loaded scene \"{}\" with {} objects ({} light)",
        scene.name,
        scene.objects.len(),
        scene.light.kind.name()
    );
    for object in &scene.objects {
        match object.mesh.as_deref() {
            Some(mesh) => println!(" - {} ({mesh})", object.name),
            None => println!(" - {} (cube)", object.name),
        }
    }
}

fn run_interactive(scene: Scene, assets_root: PathBuf, options: &CliOptions) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop =
        event_loop.map_err(|panic| WindowInitError::from_panic("event loop", panic))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Lightbox")
            .with_inner_size(LogicalSize::new(800.0, 600.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    // Capture the mouse for the fly camera; not every platform allows it.
    if window.set_cursor_grab(CursorGrabMode::Confined).is_err() {
        warn!("unable to confine the cursor; mouse look may escape the window");
    }
    window.set_cursor_visible(false);

    let renderer = block_on(Renderer::new(Arc::clone(&window), assets_root))?;
    let input = Arc::new(InputState::new());
    let mut app = App::new(scene, Arc::clone(&input));
    if options.wireframe {
        app.toggle_wireframe();
    }

    let mut state = AppState {
        renderer,
        app,
        input,
        last_error: None,
    };

    let mut event_loop = event_loop;
    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        if let Err(err) = state.process_event(&event, control_flow) {
            state.last_error = Some(err);
            control_flow.set_exit();
        }
    });

    if let Some(err) = state.last_error {
        return Err(err);
    }

    Ok(())
}

struct AppState {
    renderer: Renderer,
    app: App,
    input: Arc<InputState>,
    last_error: Option<anyhow::Error>,
}

impl AppState {
    fn process_event(&mut self, event: &Event<()>, control_flow: &mut ControlFlow) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        control_flow.set_exit();
                    }
                    WindowEvent::Resized(size) => {
                        self.renderer.resize(*size);
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        self.renderer.resize(**new_inner_size);
                    }
                    WindowEvent::KeyboardInput { input, .. } => {
                        self.handle_keyboard(input, control_flow);
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        self.handle_mouse_button(*state, *button);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        self.input
                            .observe_cursor(Vec2::new(position.x as f32, position.y as f32));
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => *y,
                            MouseScrollDelta::PixelDelta(position) => position.y as f32 / 20.0,
                        };
                        self.input.add_scroll(scroll);
                    }
                    _ => {}
                }
            }
            Event::RedrawRequested(window_id) if *window_id == self.renderer.window_id() => {
                let frame = self.app.advance(self.renderer.aspect());
                self.renderer
                    .update_globals(&frame.camera, &frame.light, frame.shaded);
                if let Err(err) = self.renderer.render(
                    &self.app.scene.objects,
                    frame.lamp.as_ref(),
                    frame.wireframe,
                ) {
                    match err {
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                            let size = self.renderer.window().inner_size();
                            self.renderer.resize(size);
                        }
                        wgpu::SurfaceError::OutOfMemory => {
                            return Err(anyhow!("GPU is out of memory"));
                        }
                        wgpu::SurfaceError::Timeout => {
                            info!("Surface timeout; retrying next frame");
                        }
                    }
                }
            }
            Event::MainEventsCleared => {
                self.renderer.window().request_redraw();
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_keyboard(&mut self, input: &KeyboardInput, control_flow: &mut ControlFlow) {
        use winit::event::VirtualKeyCode as Key;
        let Some(code) = input.virtual_keycode else {
            return;
        };
        if code == Key::Escape {
            control_flow.set_exit();
            return;
        }
        let Some(keycode) = map_keycode(code) else {
            return;
        };
        match input.state {
            ElementState::Pressed => {
                // Edge-trigger the wireframe toggle; OS key repeat delivers
                // Pressed again while the key is held.
                if keycode == KeyCode::Character('F') && !self.input.is_key_down(keycode) {
                    self.app.toggle_wireframe();
                }
                self.input.set_key_down(keycode);
            }
            ElementState::Released => self.input.set_key_up(keycode),
        }
    }

    fn handle_mouse_button(&self, state: ElementState, button: WinitMouseButton) {
        let index = match button {
            WinitMouseButton::Left => 0,
            WinitMouseButton::Right => 1,
            WinitMouseButton::Middle => 2,
            WinitMouseButton::Other(value) => value,
        } as u8;
        let button = lightbox::MouseButton::new(index);
        match state {
            ElementState::Pressed => self.input.set_mouse_button_down(button),
            ElementState::Released => self.input.set_mouse_button_up(button),
        }
    }
}

fn map_keycode(code: winit::event::VirtualKeyCode) -> Option<KeyCode> {
    use winit::event::VirtualKeyCode as Key;
    Some(match code {
        Key::W => KeyCode::Character('W'),
        Key::A => KeyCode::Character('A'),
        Key::S => KeyCode::Character('S'),
        Key::D => KeyCode::Character('D'),
        Key::F => KeyCode::Character('F'),
        Key::Space => KeyCode::Named(NamedKey::Space),
        Key::LShift => KeyCode::Named(NamedKey::LeftShift),
        Key::RShift => KeyCode::Named(NamedKey::RightShift),
        _ => return None,
    })
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

struct CliOptions {
    scene_path: Option<String>,
    demo: Option<String>,
    summary_only: bool,
    wireframe: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut options = Self {
            scene_path: None,
            demo: None,
            summary_only: false,
            wireframe: false,
        };
        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--demo" => {
                    let name = args
                        .next()
                        .ok_or_else(|| anyhow!("--demo requires a name"))?;
                    options.demo = Some(name);
                }
                "--summary-only" => options.summary_only = true,
                "--wireframe" => options.wireframe = true,
                other if other.starts_with("--") => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Usage: lightbox [scene.xml] [--demo <name>] [--summary-only] [--wireframe]"
                    ));
                }
                path => {
                    if options.scene_path.replace(path.to_string()).is_some() {
                        return Err(anyhow!("only one scene file may be given"));
                    }
                }
            }
        }
        Ok(options)
    }
}
