//! Glue between winit and the scene: pointer, touch and keyboard routing,
//! frame timing, scene event handling, and the keyboard color picker.

use std::collections::BTreeMap;
use std::time::Instant;

use glam::Vec2;
use printfolio_scene::{COLOR_OPTIONS, CursorHint, PointerButton, PortfolioScene, SceneEvent};
use wgpu::SurfaceError;
use winit::{
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent},
    keyboard::{Key, NamedKey},
    window::CursorIcon,
};

use crate::renderer::Renderer;

/// Pixels per wheel "line"; browsers report roughly this for one notch.
const LINE_DELTA_PIXELS: f32 = 100.0;
/// Longest frame step fed to the scene, so a stalled window does not jump.
const MAX_FRAME_DT: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Exit,
    Home,
    Zoom(usize),
    Reset,
    ResetColors,
    PickColor(usize),
    ClosePicker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    Continue,
    Exit,
}

pub fn map_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Browser convention: positive means scrolling down, which zooms out.
pub fn wheel_delta(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * LINE_DELTA_PIXELS,
        MouseScrollDelta::PixelDelta(position) => -position.y as f32,
    }
}

pub fn cursor_icon(hint: CursorHint) -> CursorIcon {
    match hint {
        CursorHint::Grab => CursorIcon::Grab,
        CursorHint::Grabbing => CursorIcon::Grabbing,
        CursorHint::Pointer => CursorIcon::Pointer,
        CursorHint::Move => CursorIcon::Move,
    }
}

pub fn key_command(key: &Key, picker_open: bool, focused: bool) -> Option<KeyCommand> {
    match key {
        Key::Named(NamedKey::Escape) if picker_open => Some(KeyCommand::ClosePicker),
        Key::Named(NamedKey::Escape) if focused => Some(KeyCommand::Home),
        Key::Named(NamedKey::Escape) => Some(KeyCommand::Exit),
        Key::Named(NamedKey::Home) => Some(KeyCommand::Home),
        Key::Character(text) => {
            let mut chars = text.chars();
            let ch = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            if let Some(digit) = ch.to_digit(10).filter(|d| *d >= 1) {
                let index = digit as usize - 1;
                return Some(if picker_open {
                    KeyCommand::PickColor(index)
                } else {
                    KeyCommand::Zoom(index)
                });
            }
            match ch.to_ascii_lowercase() {
                'h' => Some(KeyCommand::Home),
                'r' => Some(KeyCommand::Reset),
                'c' => Some(KeyCommand::ResetColors),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Moves a requested zoom one step forward. A different focused printer is
/// left first, so the caller keeps calling until this returns true.
pub fn advance_zoom(scene: &mut PortfolioScene, index: usize) -> bool {
    if index >= scene.printers().len() {
        log::debug!("[printfolio] dropping zoom to unknown section {index}");
        return true;
    }
    if !scene.snapshot().loaded {
        return false;
    }
    match scene.current_view() {
        Some(view) if view == index => true,
        Some(_) => {
            scene.zoom_to_home();
            false
        }
        None => scene.zoom_to_printer(index),
    }
}

pub struct ViewerHost {
    renderer: Renderer,
    scene: PortfolioScene,
    cursor: Vec2,
    shift: bool,
    touches: BTreeMap<u64, Vec2>,
    picker: Option<usize>,
    queued_zoom: Option<usize>,
    cursor_hint: Option<CursorHint>,
    last_frame: Instant,
}

impl ViewerHost {
    pub fn new(renderer: Renderer, scene: PortfolioScene) -> Self {
        Self {
            renderer,
            scene,
            cursor: Vec2::ZERO,
            shift: false,
            touches: BTreeMap::new(),
            picker: None,
            queued_zoom: None,
            cursor_hint: None,
            last_frame: Instant::now(),
        }
    }

    pub fn window(&self) -> &winit::window::Window {
        self.renderer.window()
    }

    pub fn queue_zoom(&mut self, index: usize) {
        self.queued_zoom = Some(index);
        self.advance_queued_zoom();
    }

    fn advance_queued_zoom(&mut self) {
        if let Some(index) = self.queued_zoom {
            if advance_zoom(&mut self.scene, index) {
                self.queued_zoom = None;
            }
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> HostAction {
        match event {
            WindowEvent::CloseRequested => {
                self.scene.unmount();
                return HostAction::Exit;
            }
            WindowEvent::Resized(size) => {
                self.renderer.resize(*size);
                self.scene.resize(size.width as f32, size.height as f32);
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift = modifiers.state().shift_key();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                self.scene.pointer_move(self.cursor.x, self.cursor.y, self.shift);
            }
            WindowEvent::CursorLeft { .. } => self.scene.pointer_leave(),
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = map_button(*button) else {
                    return HostAction::Continue;
                };
                match state {
                    ElementState::Pressed => {
                        self.scene
                            .pointer_down(self.cursor.x, self.cursor.y, button, self.shift)
                    }
                    ElementState::Released => self.scene.pointer_up(self.cursor.x, self.cursor.y),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => self.scene.wheel(wheel_delta(*delta)),
            WindowEvent::Touch(touch) => self.handle_touch(touch),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                let focused = self.scene.current_view().is_some();
                if let Some(command) = key_command(logical_key, self.picker.is_some(), focused) {
                    return self.apply_command(command);
                }
            }
            WindowEvent::RedrawRequested => return self.frame(),
            _ => {}
        }
        HostAction::Continue
    }

    fn handle_touch(&mut self, touch: &Touch) {
        let location = Vec2::new(touch.location.x as f32, touch.location.y as f32);
        match touch.phase {
            TouchPhase::Started => {
                self.touches.insert(touch.id, location);
                let active: Vec<Vec2> = self.touches.values().copied().collect();
                self.scene.touch_start(&active);
            }
            TouchPhase::Moved => {
                self.touches.insert(touch.id, location);
                let active: Vec<Vec2> = self.touches.values().copied().collect();
                self.scene.touch_move(&active);
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.touches.remove(&touch.id);
                self.scene.touch_end(&[location]);
            }
        }
    }

    pub fn apply_command(&mut self, command: KeyCommand) -> HostAction {
        match command {
            KeyCommand::Exit => {
                self.scene.unmount();
                return HostAction::Exit;
            }
            KeyCommand::Home => {
                self.queued_zoom = None;
                self.scene.zoom_to_home();
            }
            KeyCommand::Zoom(index) => self.queue_zoom(index),
            KeyCommand::Reset => self.scene.reset_view(),
            KeyCommand::ResetColors => self.scene.reset_colors(),
            KeyCommand::PickColor(option) => {
                let (Some(printer), Some(choice)) = (self.picker, COLOR_OPTIONS.get(option)) else {
                    return HostAction::Continue;
                };
                if self.scene.change_printer_color(printer, choice.colors) {
                    println!("[printfolio] printer {printer} is now {}", choice.name);
                }
            }
            KeyCommand::ClosePicker => self.picker = None,
        }
        HostAction::Continue
    }

    fn frame(&mut self) -> HostAction {
        let now = Instant::now();
        let dt = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        self.last_frame = now;

        self.scene.tick(dt);
        self.handle_scene_events();
        self.advance_queued_zoom();
        self.sync_cursor();

        match self.renderer.render(&self.scene) {
            Ok(()) => HostAction::Continue,
            Err(SurfaceError::Lost) => {
                self.renderer.resize(self.renderer.size());
                HostAction::Continue
            }
            Err(SurfaceError::OutOfMemory) => {
                self.scene.unmount();
                HostAction::Exit
            }
            Err(err) => {
                eprintln!("[printfolio] render error: {err:?}");
                HostAction::Continue
            }
        }
    }

    fn handle_scene_events(&mut self) {
        for event in self.scene.drain_events() {
            match event {
                SceneEvent::Navigated { path } => {
                    self.renderer
                        .window()
                        .set_title(&format!("Printfolio - {path}"));
                }
                SceneEvent::ColorPickerRequested { printer } => {
                    self.picker = Some(printer);
                    println!("[printfolio] pick a filament color for printer {printer}:");
                    for (index, option) in COLOR_OPTIONS.iter().enumerate() {
                        println!("[printfolio]   {}: {}", index + 1, option.name);
                    }
                }
                SceneEvent::ColorPickerClosed => self.picker = None,
                other => log::debug!("[printfolio] scene event {other:?}"),
            }
        }
    }

    fn sync_cursor(&mut self) {
        let hint = self.scene.snapshot().cursor;
        if self.cursor_hint != Some(hint) {
            self.renderer.window().set_cursor_icon(cursor_icon(hint));
            self.cursor_hint = Some(hint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printfolio_scene::{SceneConfig, Viewport};
    use winit::dpi::PhysicalPosition;

    fn scene(path: &str) -> PortfolioScene {
        PortfolioScene::new(SceneConfig::default(), path, Viewport::new(1280.0, 720.0))
            .expect("default scene builds")
    }

    fn settle(scene: &mut PortfolioScene, index: usize) {
        for _ in 0..600 {
            if advance_zoom(scene, index) {
                return;
            }
            scene.tick(1.0 / 60.0);
        }
        panic!("zoom to {index} never settled");
    }

    fn character(text: &str) -> Key {
        Key::Character(text.into())
    }

    #[test]
    fn digits_zoom_unless_the_picker_is_open() {
        assert_eq!(
            key_command(&character("2"), false, false),
            Some(KeyCommand::Zoom(1))
        );
        assert_eq!(
            key_command(&character("2"), true, false),
            Some(KeyCommand::PickColor(1))
        );
        assert_eq!(key_command(&character("0"), false, false), None);
    }

    #[test]
    fn escape_closes_picker_then_zooms_out_then_exits() {
        let escape = Key::Named(NamedKey::Escape);
        assert_eq!(
            key_command(&escape, true, true),
            Some(KeyCommand::ClosePicker)
        );
        assert_eq!(key_command(&escape, false, true), Some(KeyCommand::Home));
        assert_eq!(key_command(&escape, false, false), Some(KeyCommand::Exit));
    }

    #[test]
    fn letter_shortcuts_ignore_case() {
        assert_eq!(
            key_command(&character("R"), false, false),
            Some(KeyCommand::Reset)
        );
        assert_eq!(
            key_command(&character("c"), false, true),
            Some(KeyCommand::ResetColors)
        );
        assert_eq!(key_command(&character("xy"), false, false), None);
    }

    #[test]
    fn wheel_follows_browser_sign_convention() {
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(0.0, 1.0)), -100.0);
        assert_eq!(
            wheel_delta(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -40.0))),
            40.0
        );
    }

    #[test]
    fn buttons_and_cursor_hints_map_one_to_one() {
        assert_eq!(map_button(MouseButton::Left), Some(PointerButton::Primary));
        assert_eq!(map_button(MouseButton::Back), None);
        assert_eq!(cursor_icon(CursorHint::Pointer), CursorIcon::Pointer);
        assert_eq!(cursor_icon(CursorHint::Grabbing), CursorIcon::Grabbing);
    }

    #[test]
    fn zoom_from_another_section_goes_home_first() {
        let mut scene = scene("/about");
        scene.tick(0.1);
        assert_eq!(scene.current_view(), Some(0));

        settle(&mut scene, 2);
        while scene.is_transitioning() {
            scene.tick(1.0 / 60.0);
        }
        assert_eq!(scene.current_view(), Some(2));
        let events = scene.drain_events();
        let started: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, SceneEvent::TransitionStarted { .. }))
            .collect();
        assert_eq!(started.len(), 2);
        assert!(matches!(
            started[1],
            SceneEvent::TransitionStarted {
                target: Some(2),
                ..
            }
        ));
        let printer = scene.printers()[2].root;
        assert!(scene.graph()[printer].visible);
    }

    #[test]
    fn zoom_to_focused_or_unknown_section_settles_immediately() {
        let mut scene = scene("/contact");
        assert!(!advance_zoom(&mut scene, 2));
        for _ in 0..3 {
            scene.tick(0.1);
        }
        assert!(advance_zoom(&mut scene, 2));
        assert!(advance_zoom(&mut scene, 9));
        assert!(!scene.is_transitioning());
        assert_eq!(scene.current_view(), Some(2));
    }
}
