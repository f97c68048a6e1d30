//! Terminal viewer for pyramid-instanced meshes
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use facet3d_core::{
    align_mesh, IndexedMesh, InstanceTransform, InstancingConfig, PyramidTemplate, TriangleAligner,
};
use log::info;
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod camera;
pub mod renderer;

pub use camera::{Camera, ProjectionMode};
pub use renderer::{AsciiRenderer, Layer};

/// Apex growth cycles per second
const PULSE_RATE: f64 = 0.25;

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RotationState {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Applies rotations in order: X, then Y, then Z
    pub fn matrix(&self) -> Matrix4<f64> {
        let rx = Matrix4::new_rotation(Vector3::new(self.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, self.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, self.z));
        rz * ry * rx
    }
}

/// The mesh and its pyramid instances, computed once at load time
pub struct Scene {
    pub mesh: IndexedMesh,
    pub instances: Vec<InstanceTransform>,
    pub template: PyramidTemplate,
    pub failed: usize,
    centre: Point3<f64>,
    radius: f64,
}

impl Scene {
    pub fn new(mesh: IndexedMesh, aligner: &TriangleAligner, instancing: &InstancingConfig) -> Self {
        let report = align_mesh(&mesh, aligner);
        let template = PyramidTemplate::new(aligner.reference(), instancing);
        let (centre, radius) = bounding_sphere(&mesh);
        info!(
            "scene: {} faces, {} instances substituted, radius {:.3}",
            mesh.face_count(),
            report.failures.len(),
            radius
        );
        Self {
            mesh,
            failed: report.failures.len(),
            instances: report.transforms,
            template,
            centre,
            radius,
        }
    }

    /// Radius of a sphere around the mesh, pyramids excluded
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Model matrix that centres the mesh and applies `rotation`
    pub fn model_matrix(&self, rotation: &RotationState) -> Matrix4<f64> {
        rotation.matrix() * Matrix4::new_translation(&-self.centre.coords)
    }

    pub fn render(&self, renderer: &mut AsciiRenderer, model: &Matrix4<f64>, camera: &Camera, mix: f64) {
        for face in 0..self.mesh.face_count() {
            if let Some(triangle) = self.mesh.triangle(face) {
                renderer.render_triangle(&triangle.vertices, Layer::Surface, model, camera);
            }
        }
        for transform in &self.instances {
            for side in self.template.instance_triangles(transform, mix) {
                renderer.render_triangle(&side, Layer::Instance, model, camera);
            }
        }
    }
}

fn bounding_sphere(mesh: &IndexedMesh) -> (Point3<f64>, f64) {
    if mesh.vertices.is_empty() {
        return (Point3::origin(), 1.0);
    }
    let mut min = mesh.vertices[0];
    let mut max = mesh.vertices[0];
    for v in &mesh.vertices {
        min = min.inf(v);
        max = max.sup(v);
    }
    let centre = nalgebra::center(&min, &max);
    let radius = mesh
        .vertices
        .iter()
        .map(|v| (*v - centre).norm())
        .fold(0.0, f64::max);
    (centre, radius.max(1e-6))
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    scene: Scene,
    rotation: RotationState,
    camera: Camera,
    renderer: AsciiRenderer,
    running: bool,
    started: Instant,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(scene: Scene, pyramid_height: f64) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        // Leave the top row for the status line
        let height = height.saturating_sub(1).max(1);

        let mut camera = Camera::new(width as u32, height as u32);
        camera.frame_radius(scene.radius() + pyramid_height);

        Ok(Self {
            scene,
            rotation: RotationState::new(0.3, 0.3, 0.0),
            camera,
            renderer: AsciiRenderer::new(width as usize, height as usize),
            running: true,
            started: Instant::now(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            if event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            self.update();
            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        if let Event::Key(KeyEvent { code, .. }) = event::read()? {
            match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.running = false;
                }
                KeyCode::Char('w') | KeyCode::Up => {
                    self.rotation.rotate(0.1, 0.0, 0.0);
                }
                KeyCode::Char('s') | KeyCode::Down => {
                    self.rotation.rotate(-0.1, 0.0, 0.0);
                }
                KeyCode::Char('a') | KeyCode::Left => {
                    self.rotation.rotate(0.0, -0.1, 0.0);
                }
                KeyCode::Char('d') | KeyCode::Right => {
                    self.rotation.rotate(0.0, 0.1, 0.0);
                }
                KeyCode::Char('o') => {
                    self.camera.mode = match self.camera.mode {
                        ProjectionMode::Perspective => ProjectionMode::Orthographic,
                        ProjectionMode::Orthographic => ProjectionMode::Perspective,
                    };
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn update(&mut self) {
        // Continuous slow rotation for demo effect
        self.rotation.rotate(0.0, 0.01, 0.0);
    }

    fn render(&mut self) -> io::Result<()> {
        let model = self.scene.model_matrix(&self.rotation);
        let mix = pulse(self.started.elapsed().as_secs_f64());

        self.renderer.clear();
        self.scene.render(&mut self.renderer, &model, &self.camera, mix);

        let mut stdout = stdout();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "facet3d | {} faces ({} substituted) | FPS: {:.1} | WASD/Arrows=Rotate O=Projection Q=Quit",
                self.scene.mesh.face_count(),
                self.scene.failed,
                self.fps
            )),
            ResetColor,
            cursor::MoveTo(0, 1)
        )?;
        self.renderer.draw(&mut stdout)?;

        stdout.flush()?;
        Ok(())
    }
}

/// Apex blend factor in `[0, 1]` at time `t` seconds
pub fn pulse(t: f64) -> f64 {
    0.5 - 0.5 * (t * PULSE_RATE * std::f64::consts::TAU).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::default();
        state.rotate(0.1, 0.2, 0.3);
        assert_relative_eq!(state.x, 0.1);
        assert_relative_eq!(state.y, 0.2);
        assert_relative_eq!(state.z, 0.3);
    }

    #[test]
    fn test_identity_rotation() {
        let matrix = RotationState::default().matrix();
        assert_relative_eq!(matrix, Matrix4::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_pulse_range() {
        assert_relative_eq!(pulse(0.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(pulse(0.5 / PULSE_RATE), 1.0, epsilon = 1e-12);
        for i in 0..100 {
            let m = pulse(i as f64 * 0.37);
            assert!((0.0..=1.0).contains(&m));
        }
    }

    #[test]
    fn test_scene_centres_mesh() {
        let mut mesh = IndexedMesh::cube(2.0);
        for v in &mut mesh.vertices {
            v.x += 10.0;
        }
        let scene = Scene::new(mesh, &TriangleAligner::default(), &InstancingConfig { height: 0.5 });
        assert_eq!(scene.instances.len(), 12);
        assert_eq!(scene.failed, 0);
        assert_relative_eq!(scene.radius(), 3.0_f64.sqrt(), epsilon = 1e-12);

        let model = scene.model_matrix(&RotationState::default());
        let moved = model.transform_point(&Point3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(moved, Point3::origin(), epsilon = 1e-12);
    }

    #[test]
    fn test_scene_renders_something() {
        let scene = Scene::new(
            IndexedMesh::octahedron(1.0),
            &TriangleAligner::default(),
            &InstancingConfig { height: 0.3 },
        );
        let mut camera = Camera::new(60, 30);
        camera.frame_radius(1.3);
        let mut renderer = AsciiRenderer::new(60, 30);
        let model = scene.model_matrix(&RotationState::new(0.3, 0.3, 0.0));
        scene.render(&mut renderer, &model, &camera, 1.0);

        let drawn = (0..30)
            .flat_map(|y| (0..60).map(move |x| (x, y)))
            .filter(|&(x, y)| renderer.cell(x, y) != Some(' '))
            .count();
        assert!(drawn > 0);
    }
}
