//! Terminal front end for the glasses viewer
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tryon_core::{Axis, PassMode, Viewer};

pub mod assets;
pub mod cli;
pub mod config;
pub mod renderer;

pub use config::TerminalConfig;
pub use renderer::AsciiRenderer;

/// Which picture is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Free orbit, driven by drag and arrow keys
    Interactive,
    /// Calibrated pose over the backdrop
    Result,
}

/// Main application struct for the terminal viewer
pub struct TerminalApp {
    viewer: Viewer,
    renderer: AsciiRenderer,
    config: TerminalConfig,
    mode: ViewMode,
    axis: Axis,
    notice: Option<String>,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Terminal cells are roughly twice as tall as they are wide, so the
    /// projection sees twice the row count.
    pub fn new(mut viewer: Viewer, config: TerminalConfig, width: u16, height: u16) -> Self {
        viewer.resize(width as u32, height as u32 * 2);
        Self {
            viewer,
            renderer: AsciiRenderer::new(width as usize, height as usize),
            config,
            mode: ViewMode::Interactive,
            axis: Axis::Y,
            notice: None,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / u64::from(self.config.fps.max(1)));

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => {
                self.renderer.resize(width as usize, height as usize);
                self.viewer.resize(width as u32, height as u32 * 2);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if kind == KeyEventKind::Release {
            return;
        }
        let step = self.config.key_step;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('w') | KeyCode::Up => self.viewer.nudge(0.0, -step),
            KeyCode::Char('s') | KeyCode::Down => self.viewer.nudge(0.0, step),
            KeyCode::Char('a') | KeyCode::Left => self.viewer.nudge(-step, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.viewer.nudge(step, 0.0),
            KeyCode::Char('x') => self.axis = Axis::X,
            KeyCode::Char('y') => self.axis = Axis::Y,
            KeyCode::Char('z') => self.axis = Axis::Z,
            KeyCode::Char('+') | KeyCode::Char('=') => self.step_offset(self.config.offset_step),
            KeyCode::Char('-') => self.step_offset(-self.config.offset_step),
            KeyCode::Char('c') | KeyCode::Tab => self.toggle_mode(),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.select_index(index);
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, MouseEvent { kind, column, row, .. }: MouseEvent) {
        // Rows count double to match the projection.
        let (x, y) = (column as f32, row as f32 * 2.0);
        match kind {
            MouseEventKind::Down(MouseButton::Left) => self.viewer.pointer_down(x, y),
            MouseEventKind::Drag(MouseButton::Left) => {
                self.viewer.pointer_move(x, y);
            }
            MouseEventKind::Up(MouseButton::Left) => self.viewer.pointer_up(),
            _ => {}
        }
    }

    fn step_offset(&mut self, delta: f32) {
        let value = self.viewer.glasses_offset().axis(self.axis) + delta;
        self.viewer.set_glasses_axis(self.axis, value);
    }

    fn select_index(&mut self, index: usize) {
        let name = self
            .viewer
            .manager()
            .glasses_names()
            .get(index)
            .map(|name| name.to_string());
        if let Some(name) = name {
            if let Err(err) = self.viewer.select_glasses(&name) {
                log::warn!("select {name:?}: {err}");
            }
        }
    }

    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            ViewMode::Interactive => ViewMode::Result,
            ViewMode::Result => ViewMode::Interactive,
        };
    }

    /// Advance one frame into the character buffer without touching the
    /// terminal.
    pub fn draw_frame(&mut self) {
        let frame = match self.viewer.frame() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("frame skipped: {err}");
                return;
            }
        };
        if let Some(notice) = frame.notices.last() {
            self.notice = Some(format!("{:?}: {}", notice.slot, notice.message));
        }

        match self.mode {
            ViewMode::Interactive => {
                self.renderer.clear();
                for item in &frame.items {
                    self.renderer
                        .render_mesh(&item.mesh, &item.world, &frame.projection, PassMode::Color);
                }
            }
            ViewMode::Result => {
                self.renderer.clear_backdrop();
                match self.viewer.result_frame() {
                    Ok(Some(result)) => {
                        for pass in &result.passes {
                            self.renderer
                                .render_mesh(&pass.mesh, &pass.model, &result.projection, pass.mode);
                        }
                    }
                    Ok(None) => {
                        self.notice = Some("no calibration for this head".to_owned());
                    }
                    Err(err) => log::warn!("result view skipped: {err}"),
                }
            }
        }
    }

    pub fn renderer(&self) -> &AsciiRenderer {
        &self.renderer
    }

    fn render(&mut self) -> io::Result<()> {
        self.draw_frame();

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let manager = self.viewer.manager();
        let offset = self.viewer.glasses_offset();
        let names = manager.glasses_names();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Tryon | FPS: {:.1} | {:?} | glasses: {} [{}] | offset ({:.2}, {:.2}, {:.2}) axis {:?}",
                self.fps,
                self.mode,
                manager.active_glasses().unwrap_or("-"),
                names.join(" "),
                offset.x,
                offset.y,
                offset.z,
                self.axis,
            )),
            terminal::Clear(ClearType::UntilNewLine),
            cursor::MoveTo(0, 1),
            Print("WASD/Arrows/drag=Rotate 1-9=Glasses X/Y/Z +/-=Offset C=View Q=Quit"),
            terminal::Clear(ClearType::UntilNewLine),
        )?;
        if let Some(notice) = &self.notice {
            queue!(
                stdout,
                cursor::MoveTo(0, 2),
                SetForegroundColor(Color::Red),
                Print(notice),
                terminal::Clear(ClearType::UntilNewLine),
            )?;
        }
        queue!(stdout, ResetColor)?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use tryon_core::{LoadSlot, MeshData, TextureId};

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn app() -> TerminalApp {
        let mut viewer = Viewer::default();
        assets::post_fixture(&mut viewer, LoadSlot::Head, MeshData::cube(2.0), TextureId(0));
        assets::post_fixture(
            &mut viewer,
            LoadSlot::Glasses("a".into()),
            MeshData::glasses_frame(2.0),
            TextureId(1),
        );
        assets::post_fixture(
            &mut viewer,
            LoadSlot::Glasses("b".into()),
            MeshData::glasses_frame(2.4),
            TextureId(2),
        );
        TerminalApp::new(viewer, TerminalConfig::default(), 60, 30)
    }

    #[test]
    fn test_quit_key() {
        let mut app = app();
        app.handle_event(key('q'));
        assert!(!app.is_running());
    }

    #[test]
    fn test_number_keys_select_glasses() {
        let mut app = app();
        app.draw_frame();
        assert_eq!(app.viewer().manager().active_glasses(), Some("a"));

        app.handle_event(key('2'));
        assert_eq!(app.viewer().manager().active_glasses(), Some("b"));
        app.handle_event(key('9'));
        assert_eq!(app.viewer().manager().active_glasses(), Some("b"));
    }

    #[test]
    fn test_offset_keys_step_selected_axis() {
        let mut app = app();
        app.handle_event(key('z'));
        app.handle_event(key('+'));
        app.handle_event(key('+'));
        let offset = app.viewer().glasses_offset();
        assert!((offset.z - 0.7).abs() < 1e-5);
        assert_eq!(offset.y, 0.3);
    }

    #[test]
    fn test_arrow_keys_rotate_head() {
        let mut app = app();
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE)));
        let (ax, ay) = app.viewer().head_angles();
        assert_eq!(ax, 0.0);
        assert!((ay - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_interactive_frame_draws_head() {
        let mut app = app();
        app.draw_frame();
        let (w, h) = app.renderer().size();
        assert_ne!(app.renderer().char_at(w / 2, h / 2), ' ');
    }

    #[test]
    fn test_result_view_without_pose_shows_backdrop() {
        let mut app = app();
        app.handle_event(key('c'));
        assert_eq!(app.mode(), ViewMode::Result);
        app.draw_frame();
        let (w, h) = app.renderer().size();
        assert_eq!(app.renderer().char_at(w / 2, h / 2), '`');
    }
}
