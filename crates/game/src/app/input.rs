use cellsim::{ButtonMask, GridDims, Pointer};
use glam::DVec2;
use winit::event::{ElementState, MouseButton};

/// Pointer state accumulated from window events.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputState {
    /// Cursor position in physical window pixels.
    pub cursor: DVec2,
    pub buttons: ButtonMask,
}

impl InputState {
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        self.cursor = DVec2::new(x, y);
    }

    pub fn on_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.buttons.primary = pressed,
            MouseButton::Right => self.buttons.secondary = pressed,
            MouseButton::Middle => self.buttons.tertiary = pressed,
            _ => {}
        }
    }

    /// Release everything, e.g. when the cursor leaves the window.
    pub fn release_all(&mut self) {
        self.buttons = ButtonMask::NONE;
    }

    /// The pointer in grid coordinates for a window of `window` pixels.
    pub fn pointer(&self, window: (u32, u32), dims: GridDims) -> Pointer {
        let position = window_to_grid(self.cursor, window, dims);
        Pointer::new(position.x, position.y, self.buttons)
    }
}

/// Map a window-space position onto the grid, which fills the window.
pub fn window_to_grid(cursor: DVec2, window: (u32, u32), dims: GridDims) -> glam::IVec2 {
    let scale = DVec2::new(
        dims.width() as f64 / window.0.max(1) as f64,
        dims.height() as f64 / window.1.max(1) as f64,
    );
    (cursor * scale).floor().as_ivec2()
}
