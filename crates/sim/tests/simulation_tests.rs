//! Integration tests for the host pipeline
//! Run with: cargo test -p cellsim
//!
//! These tests verify the grid contract end to end:
//! - Initialization lays down the wall band and the seed region
//! - Step + swap exposes exactly what the step wrote
//! - Rendering is idempotent and sized `height * pitch`
//! - A full 256x256 session with a primary-button stroke

use cellsim::update;
use cellsim::{
    BrushConfig, ButtonMask, Cell, FrameDriver, FrameSink, GridBackend, GridDims, HostBackend,
    HostGrid, InputEvent, InputSource, Material, PixelFormat, PixelLayout, Pointer, SimConfig,
    SimResult, BOUNDARY_MARGIN, SEED_EXTENT,
};

/// Row alignment required by buffer-to-texture copies.
const PITCH_ALIGN: u32 = 256;

fn backend(width: u32, height: u32) -> HostBackend {
    let dims = GridDims::new(width, height).unwrap();
    HostBackend::new(dims, PixelLayout::aligned(dims, PITCH_ALIGN, PixelFormat::Rgba8)).unwrap()
}

#[test]
fn test_boundary_band_is_wall_for_many_sizes() {
    for (w, h) in [(40, 40), (42, 64), (100, 40), (256, 256), (302, 118)] {
        let grid = HostGrid::new(GridDims::new(w, h).unwrap());
        for y in 0..h {
            for x in 0..w {
                let near_edge = x < BOUNDARY_MARGIN
                    || y < BOUNDARY_MARGIN
                    || x >= w - BOUNDARY_MARGIN
                    || y >= h - BOUNDARY_MARGIN;
                if near_edge {
                    let cell = grid.get(x as i64, y as i64).unwrap();
                    assert_eq!(cell.material(), Material::Wall, "{w}x{h} at ({x}, {y})");
                }
            }
        }
    }
}

#[test]
fn test_seed_region_is_full_fluid() {
    let dims = GridDims::new(96, 80).unwrap();
    let grid = HostGrid::new(dims);
    let mut seeded = 0;
    for y in 0..SEED_EXTENT {
        for x in 0..SEED_EXTENT {
            if dims.in_boundary(x, y) {
                continue;
            }
            let cell = grid.get(x as i64, y as i64).unwrap();
            assert_eq!(cell.material(), Material::Fluid);
            assert_eq!(cell.intensity, 255);
            seeded += 1;
        }
    }
    assert_eq!(seeded, 30 * 30);
}

#[test]
fn test_step_is_deterministic() {
    let dims = GridDims::new(128, 64).unwrap();
    let mut current = dims.initial_cells();
    BrushConfig::default().apply(&mut current, dims, &Pointer::new(80, 30, ButtonMask::PRIMARY));

    let mut a = vec![Cell::EMPTY; dims.cell_count()];
    let mut b = vec![Cell::SOURCE; dims.cell_count()];
    update::step(&current, &mut a, dims);
    update::step(&current, &mut b, dims);
    assert_eq!(bytemuck::cast_slice::<Cell, u8>(&a), bytemuck::cast_slice::<Cell, u8>(&b));
}

#[test]
fn test_swap_exposes_step_output() {
    let mut backend = backend(64, 64);
    backend.step().unwrap();
    let written = backend.grid().next().to_vec();
    backend.swap();
    assert_eq!(backend.grid().current(), &written[..]);
}

#[test]
fn test_walls_survive_many_steps() {
    let mut backend = backend(64, 64);
    let dims = backend.dims();
    for _ in 0..200 {
        backend.step().unwrap();
        backend.swap();
    }
    for y in 0..64 {
        for x in 0..64 {
            if dims.in_boundary(x, y) {
                assert!(backend.grid().get(x as i64, y as i64).unwrap().is_wall());
            }
        }
    }
}

#[test]
fn test_render_is_idempotent() {
    let mut backend = backend(100, 60);
    backend.render().unwrap();
    let first = backend.pixels().bytes().to_vec();
    backend.render().unwrap();
    assert_eq!(backend.pixels().bytes(), &first[..]);
    assert_eq!(first.len(), 60 * 512);
}

#[test]
fn test_injection_at_corners_is_safe() {
    let mut backend = backend(64, 48);
    let brush = BrushConfig::default();
    let corners = [(0, 0), (63, 0), (0, 47), (63, 47), (-1000, -1000), (5000, 20)];
    for (x, y) in corners {
        for buttons in [ButtonMask::PRIMARY, ButtonMask::SECONDARY, ButtonMask::TERTIARY] {
            backend.inject(&Pointer::new(x, y, buttons), &brush).unwrap();
        }
    }
    assert_eq!(backend.grid().current().len(), 64 * 48);
}

/// End-to-end scenario on the reference 256x256 session.
#[test]
fn test_end_to_end_session() {
    let config = SimConfig::default();
    let dims = config.dims().unwrap();
    let layout = PixelLayout::aligned(dims, PITCH_ALIGN, config.pixel_format);
    let mut driver = FrameDriver::from_config(HostBackend::new(dims, layout).unwrap(), &config).unwrap();

    // Inject only, so the stroke can be checked before stepping
    let pointer = Pointer::new(128, 128, ButtonMask::PRIMARY);
    driver.backend_mut().inject(&pointer, &config.brush).unwrap();
    for y in 118..138 {
        for x in 118..138 {
            let cell = driver.backend().grid().get(x, y).unwrap();
            assert_eq!(cell.intensity, 255, "({x}, {y})");
        }
    }

    for _ in 0..8 {
        driver.backend_mut().step().unwrap();
        driver.backend_mut().swap();
    }
    let grid = driver.backend().grid();
    assert_eq!(grid.dims(), dims);
    assert_eq!(grid.current().len(), 256 * 256);
    assert_eq!(grid.next().len(), 256 * 256);

    driver.backend_mut().render().unwrap();
    let pixels = driver.backend().pixels();
    assert_eq!(pixels.bytes().len(), 256 * layout.pitch as usize);

    // The stroke is spreading but the centre is still bright
    let grid = driver.backend().grid();
    let centre = grid.get(128, 128).unwrap();
    assert!(centre.intensity > 200);
    assert!(grid.get(140, 128).unwrap().intensity > 0);
}

struct Strokes {
    remaining: u32,
}

impl InputSource for Strokes {
    fn poll(&mut self) -> InputEvent {
        if self.remaining == 0 {
            return InputEvent::Quit;
        }
        self.remaining -= 1;
        InputEvent::Frame(Pointer::new(100 + self.remaining as i32, 100, ButtonMask::SECONDARY))
    }
}

struct Checksum(u64);

impl FrameSink<HostBackend> for Checksum {
    fn present(&mut self, backend: &HostBackend) -> SimResult<()> {
        self.0 = backend
            .pixels()
            .bytes()
            .iter()
            .fold(self.0, |acc, b| acc.wrapping_mul(31).wrapping_add(*b as u64));
        Ok(())
    }
}

#[test]
fn test_driver_run_draws_walls() {
    let mut driver = FrameDriver::new(backend(256, 256), BrushConfig::default(), 8).unwrap();
    let mut sink = Checksum(0);
    let frames = driver.run(&mut Strokes { remaining: 5 }, &mut sink).unwrap();
    assert_eq!(frames, 5);
    assert_ne!(sink.0, 0);
    // The last stroke centred on (100, 100) drew a wall there
    assert!(driver.backend().grid().get(100, 100).unwrap().is_wall());
    let px = driver.backend().pixels().pixel(100, 100).unwrap();
    assert_eq!(px, [128, 128, 128, 255]);
}
