//! Display subsystem owner
//!
//! Holds the five mapped regions (two controllers, two pixel buffers, the
//! character buffer) and the swap controller, and exposes the operations of
//! the command surface. Geometry is re-read from the controllers before
//! every operation that depends on it.
//!
//! # Lifecycle
//! ```text
//! open() ──► attach back buffer ──► clear ──► draw / sync ... ──► close()
//! ```

use alloc::vec;
use alloc::vec::Vec;

use crate::command::Command;
use crate::config::{BoundsMode, DisplayConfig};
use crate::constants::{
    pixel_region, BACKGROUND, CHAR_BUF_REGION, CHAR_CTRL_REGION, PIXEL_CTRL_REGION,
};
use crate::device::{MapError, RegionMapper, RegisterWindow};
use crate::error::VideoError;
use crate::geometry::DisplayGeometry;
use crate::raster::{pixel_offset, Rasterizer};
use crate::regs::ControlBlock;
use crate::swap::{BufferId, SpinWait, SwapController, SwapState, VsyncWait};
use crate::text::{cell_offset, TextOverlay};

/// Mapped windows, handed back on close so the owner can unmap them
pub struct Regions<C, B> {
    pub pixel_ctrl: C,
    pub char_ctrl: C,
    pub primary: B,
    pub secondary: B,
    pub chars: B,
}

impl<C, B> Regions<C, B> {
    /// Map every region the display needs
    ///
    /// On the first failure, everything mapped so far is handed back to the
    /// mapper before the error is returned.
    pub fn map<M>(mapper: &mut M, config: &DisplayConfig) -> Result<Self, VideoError>
    where
        M: RegionMapper<Control = C, Buffer = B>,
    {
        let pixel_ctrl = mapper.map_control(PIXEL_CTRL_REGION)?;
        let char_ctrl = match mapper.map_control(CHAR_CTRL_REGION) {
            Ok(window) => window,
            Err(e) => return Err(unwind(mapper, e, vec![pixel_ctrl], Vec::new())),
        };
        let primary = match mapper.map_buffer(pixel_region(config.primary_base as usize)) {
            Ok(window) => window,
            Err(e) => return Err(unwind(mapper, e, vec![pixel_ctrl, char_ctrl], Vec::new())),
        };
        let secondary = match mapper.map_buffer(pixel_region(config.secondary_base as usize)) {
            Ok(window) => window,
            Err(e) => return Err(unwind(mapper, e, vec![pixel_ctrl, char_ctrl], vec![primary])),
        };
        let chars = match mapper.map_buffer(CHAR_BUF_REGION) {
            Ok(window) => window,
            Err(e) => {
                return Err(unwind(
                    mapper,
                    e,
                    vec![pixel_ctrl, char_ctrl],
                    vec![primary, secondary],
                ))
            }
        };
        Ok(Self {
            pixel_ctrl,
            char_ctrl,
            primary,
            secondary,
            chars,
        })
    }

    /// Give every window back to the mapper
    pub fn unmap<M>(self, mapper: &mut M)
    where
        M: RegionMapper<Control = C, Buffer = B>,
    {
        mapper.unmap_control(self.pixel_ctrl);
        mapper.unmap_control(self.char_ctrl);
        mapper.unmap_buffer(self.primary);
        mapper.unmap_buffer(self.secondary);
        mapper.unmap_buffer(self.chars);
    }
}

/// Release a partial mapping after `error`
fn unwind<M: RegionMapper>(
    mapper: &mut M,
    error: MapError,
    controls: Vec<M::Control>,
    buffers: Vec<M::Buffer>,
) -> VideoError {
    log::warn!(
        "video: {}, releasing {} mapped regions",
        error,
        controls.len() + buffers.len()
    );
    for window in controls {
        mapper.unmap_control(window);
    }
    for window in buffers {
        mapper.unmap_buffer(window);
    }
    VideoError::Map(error)
}

pub struct Display<C, B, V = SpinWait> {
    config: DisplayConfig,
    pixel_ctrl: ControlBlock<C>,
    char_ctrl: ControlBlock<C>,
    primary: B,
    secondary: B,
    chars: B,
    swap: SwapController<V>,
}

impl<C: RegisterWindow, B: RegisterWindow> Display<C, B, SpinWait> {
    /// Map the hardware and bring the display up with a spinning vsync wait
    pub fn open<M>(mapper: &mut M, config: DisplayConfig) -> Result<Self, VideoError>
    where
        M: RegionMapper<Control = C, Buffer = B>,
    {
        let wait = SpinWait {
            limit: config.swap_poll_limit,
        };
        Self::open_with_wait(mapper, config, wait)
    }
}

impl<C: RegisterWindow, B: RegisterWindow, V: VsyncWait> Display<C, B, V> {
    pub fn open_with_wait<M>(mapper: &mut M, config: DisplayConfig, wait: V) -> Result<Self, VideoError>
    where
        M: RegionMapper<Control = C, Buffer = B>,
    {
        let regions = Regions::map(mapper, &config).map_err(|e| {
            log::error!("video: {}", e);
            e
        })?;
        Self::from_regions(regions, config, wait)
    }

    /// Take ownership of already-mapped regions, select the back buffer and
    /// clear both the back buffer and the character overlay
    pub fn from_regions(regions: Regions<C, B>, config: DisplayConfig, wait: V) -> Result<Self, VideoError> {
        let mut display = Self {
            config,
            pixel_ctrl: ControlBlock::new(regions.pixel_ctrl),
            char_ctrl: ControlBlock::new(regions.char_ctrl),
            primary: regions.primary,
            secondary: regions.secondary,
            chars: regions.chars,
            swap: SwapController::new(config.primary_base, config.secondary_base, wait),
        };
        display.swap.attach(&mut display.pixel_ctrl)?;
        display.clear_pixels()?;
        display.clear_text()?;

        log::info!(
            "video: {} pixels, {} cells, drawing to {:?}, {:?} bounds",
            display.geometry()?,
            display.text_geometry()?,
            display.swap.active(),
            display.config.bounds
        );
        Ok(display)
    }

    /// Shut down, returning the windows to be unmapped
    pub fn close(self) -> Regions<C, B> {
        log::info!("video: closing");
        Regions {
            pixel_ctrl: self.pixel_ctrl.into_inner(),
            char_ctrl: self.char_ctrl.into_inner(),
            primary: self.primary,
            secondary: self.secondary,
            chars: self.chars,
        }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Pixel resolution, read fresh from the controller
    pub fn geometry(&self) -> Result<DisplayGeometry, VideoError> {
        Ok(self.pixel_ctrl.geometry()?)
    }

    /// Character grid size, read fresh from the character controller
    pub fn text_geometry(&self) -> Result<DisplayGeometry, VideoError> {
        Ok(self.char_ctrl.geometry()?)
    }

    pub fn active_buffer(&self) -> BufferId {
        self.swap.active()
    }

    /// Buffer the controller currently scans out
    pub fn visible_buffer(&self) -> Result<BufferId, VideoError> {
        let front = self.pixel_ctrl.front_buffer()?;
        Ok(self.swap.back_for(front).other())
    }

    pub fn swap_state(&self) -> SwapState {
        self.swap.state()
    }

    pub fn pixel_control(&self) -> &ControlBlock<C> {
        &self.pixel_ctrl
    }

    pub fn buffer(&self, id: BufferId) -> &B {
        match id {
            BufferId::Primary => &self.primary,
            BufferId::Secondary => &self.secondary,
        }
    }

    pub fn char_buffer(&self) -> &B {
        &self.chars
    }

    fn ensure_idle(&self) -> Result<(), VideoError> {
        match self.swap.state() {
            SwapState::Idle => Ok(()),
            SwapState::SwapPending => Err(VideoError::SwapPending),
        }
    }

    /// Drawing primitives bound to the active buffer and current geometry
    pub fn raster(&mut self) -> Result<Rasterizer<'_, B>, VideoError> {
        self.ensure_idle()?;
        let geometry = self.pixel_ctrl.geometry()?;
        let (row_shift, bounds) = (self.config.row_shift, self.config.bounds);
        let buffer = match self.swap.active() {
            BufferId::Primary => &mut self.primary,
            BufferId::Secondary => &mut self.secondary,
        };
        Ok(Rasterizer::new(buffer, geometry, row_shift, bounds))
    }

    /// Character overlay bound to the current grid geometry
    pub fn text(&mut self) -> Result<TextOverlay<'_, B>, VideoError> {
        let geometry = self.char_ctrl.geometry()?;
        Ok(TextOverlay::new(
            &mut self.chars,
            geometry,
            self.config.col_shift,
            self.config.bounds,
        ))
    }

    // =========================================================================
    // Command surface
    // =========================================================================

    /// Fill the active buffer with the background color
    pub fn clear_pixels(&mut self) -> Result<(), VideoError> {
        self.raster()?.clear(BACKGROUND)
    }

    /// Blank every cell of the character overlay
    pub fn clear_text(&mut self) -> Result<(), VideoError> {
        self.text()?.clear_all()
    }

    /// Swap at the next vertical blank and wait for it
    ///
    /// Returns the new active buffer. After a timeout the swap stays in
    /// flight and the next call resumes waiting for it.
    pub fn sync(&mut self) -> Result<BufferId, VideoError> {
        self.swap.sync(&mut self.pixel_ctrl)
    }

    pub fn plot_pixel(&mut self, x: i32, y: i32, color: u16) -> Result<(), VideoError> {
        self.raster()?.plot_pixel(x, y, color)
    }

    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u16) -> Result<(), VideoError> {
        self.raster()?.draw_line(x0, y0, x1, y1, color)
    }

    pub fn draw_box(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u16) -> Result<(), VideoError> {
        self.raster()?.draw_box(x0, y0, x1, y1, color)
    }

    pub fn plot_text(&mut self, x: i32, y: i32, text: &str) -> Result<(), VideoError> {
        self.text()?.plot_text(x, y, text)
    }

    /// Run one parsed command
    pub fn execute(&mut self, command: &Command) -> Result<(), VideoError> {
        log::trace!("video: {:?}", command);
        match *command {
            Command::Clear => self.clear_pixels(),
            Command::Erase => self.clear_text(),
            Command::Sync => self.sync().map(|_| ()),
            Command::Pixel { x, y, color } => self.plot_pixel(x, y, color),
            Command::Line { x0, y0, x1, y1, color } => self.draw_line(x0, y0, x1, y1, color),
            Command::Box { x0, y0, x1, y1, color } => self.draw_box(x0, y0, x1, y1, color),
            Command::Text { x, y, ref text } => self.plot_text(x, y, text),
        }
    }

    // =========================================================================
    // Read-back
    // =========================================================================

    /// Pixel `(x, y)` of buffer `id`
    pub fn pixel(&self, id: BufferId, x: i32, y: i32) -> Result<u16, VideoError> {
        if self.config.bounds == BoundsMode::Checked && !self.geometry()?.contains(x, y) {
            return Err(VideoError::OutOfBounds { x, y });
        }
        let offset = pixel_offset(x, y, self.config.row_shift).ok_or(VideoError::OutOfBounds { x, y })?;
        Ok(self.buffer(id).read_u16(offset)?)
    }

    /// Character cell `(x, y)`
    pub fn cell(&self, x: i32, y: i32) -> Result<u8, VideoError> {
        if self.config.bounds == BoundsMode::Checked && !self.text_geometry()?.contains(x, y) {
            return Err(VideoError::OutOfBounds { x, y });
        }
        let offset = cell_offset(x, y, self.config.col_shift).ok_or(VideoError::OutOfBounds { x, y })?;
        Ok(self.chars.read_u8(offset)?)
    }

    /// Visible cells of overlay row `y`
    pub fn text_row(&self, y: i32) -> Result<Vec<u8>, VideoError> {
        let width = self.text_geometry()?.width as i32;
        (0..width).map(|x| self.cell(x, y)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::sim::{SimControl, SimMapper, SwapLatency};
    use crate::device::{MemWindow, RegisterWindow};

    type SimDisplay = Display<SimControl, MemWindow>;

    fn open(mapper: SimMapper, config: DisplayConfig) -> SimDisplay {
        let mut mapper = mapper;
        Display::open(&mut mapper, config).unwrap()
    }

    fn de1() -> SimDisplay {
        open(SimMapper::de1_soc(), DisplayConfig::default())
    }

    #[test]
    fn test_open_selects_hidden_buffer_and_clears() {
        let display = de1();
        assert_eq!(display.geometry().unwrap(), DisplayGeometry::new(320, 240));
        assert_eq!(display.text_geometry().unwrap(), DisplayGeometry::new(80, 60));
        assert_eq!(display.active_buffer(), BufferId::Secondary);
        assert_eq!(display.visible_buffer().unwrap(), BufferId::Primary);
        assert_eq!(display.pixel_control().back_buffer().unwrap(), 0xC000_0000);
        assert_eq!(display.cell(0, 0).unwrap(), b' ');
        assert_eq!(display.cell(79, 59).unwrap(), b' ');
    }

    #[test]
    fn test_mapping_failure_aborts_open() {
        for name in ["pixel-ctrl", "char-ctrl", "pixel-buffer", "char-buffer"] {
            let mut mapper = SimMapper {
                fail_region: Some(name),
                ..SimMapper::de1_soc()
            };
            match Display::open(&mut mapper, DisplayConfig::default()) {
                Err(VideoError::Map(e)) => assert_eq!(e.region.name, name),
                Err(e) => panic!("unexpected error {:?}", e),
                Ok(_) => panic!("open succeeded with {} unmapped", name),
            }
            // Regions mapped before the failure were released
            assert_eq!(mapper.live, 0, "leaked mappings after {} failed", name);
        }
    }

    #[test]
    fn test_drawing_targets_active_buffer_only() {
        let mut display = de1();
        display.plot_pixel(10, 10, 0xF800).unwrap();
        assert_eq!(display.pixel(BufferId::Secondary, 10, 10).unwrap(), 0xF800);
        assert_eq!(display.pixel(BufferId::Primary, 10, 10).unwrap(), 0);
    }

    #[test]
    fn test_sync_makes_drawn_frame_visible() {
        let mut display = de1();
        display.draw_line(0, 5, 10, 5, 0x07E0).unwrap();
        let drawn = display.active_buffer();

        assert_eq!(display.sync().unwrap(), drawn.other());
        assert_eq!(display.visible_buffer().unwrap(), drawn);
        assert_eq!(display.pixel(display.visible_buffer().unwrap(), 7, 5).unwrap(), 0x07E0);

        display.sync().unwrap();
        assert_eq!(display.active_buffer(), drawn);
        assert_eq!(display.visible_buffer().unwrap(), drawn.other());
    }

    #[test]
    fn test_clear_only_touches_active_buffer() {
        let mut display = de1();
        display.plot_pixel(1, 1, 0xFFFF).unwrap();
        display.sync().unwrap();
        display.plot_pixel(2, 2, 0xFFFF).unwrap();
        display.clear_pixels().unwrap();
        assert_eq!(display.pixel(BufferId::Primary, 2, 2).unwrap(), 0);
        assert_eq!(display.pixel(BufferId::Secondary, 1, 1).unwrap(), 0xFFFF);
    }

    #[test]
    fn test_timed_out_swap_blocks_drawing() {
        let mapper = SimMapper {
            latency: SwapLatency::Never,
            ..SimMapper::de1_soc()
        };
        let mut display = open(mapper, DisplayConfig::default().with_swap_poll_limit(Some(8)));
        assert_eq!(display.sync(), Err(VideoError::SwapTimeout { polls: 8 }));
        assert_eq!(display.swap_state(), SwapState::SwapPending);
        assert_eq!(display.plot_pixel(0, 0, 1), Err(VideoError::SwapPending));
        assert_eq!(display.clear_pixels(), Err(VideoError::SwapPending));
        // The overlay is not double buffered
        display.plot_text(0, 0, "OK").unwrap();
    }

    #[test]
    fn test_text_overlay_through_display() {
        let mut display = de1();
        display.plot_text(3, 2, "HI").unwrap();
        assert_eq!(display.cell(3, 2).unwrap(), b'H');
        assert_eq!(display.cell(4, 2).unwrap(), b'I');
        assert_eq!(display.cell(5, 2).unwrap(), b' ');
        display.clear_text().unwrap();
        assert_eq!(display.cell(3, 2).unwrap(), b' ');
        assert_eq!(&display.text_row(2).unwrap()[..6], b"      ");
    }

    #[test]
    fn test_zero_geometry_display() {
        let mapper = SimMapper {
            pixel_geometry: DisplayGeometry::default(),
            char_geometry: DisplayGeometry::default(),
            ..SimMapper::de1_soc()
        };
        let mut display = open(mapper, DisplayConfig::default());
        assert_eq!(display.geometry().unwrap(), DisplayGeometry::new(0, 0));
        display.clear_pixels().unwrap();
        display.clear_text().unwrap();
        assert!(display.plot_pixel(0, 0, 0xFFFF).is_err());
        assert!(display.draw_line(0, 0, 5, 5, 0xFFFF).is_err());
        assert!(display.draw_box(0, 0, 9, 9, 0xFFFF).is_err());
        assert!(display.plot_text(0, 0, "X").is_err());

        let regions = display.close();
        for buf in [&regions.primary, &regions.secondary, &regions.chars] {
            assert!(buf.as_bytes().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_execute_dispatches_commands() {
        let mut display = de1();
        for line in ["pixel 4,4 1234", "box 0,0 20,20 ffff", "text 1,1 READY"] {
            display.execute(&Command::parse(line).unwrap()).unwrap();
        }
        let active = display.active_buffer();
        assert_eq!(display.pixel(active, 4, 4).unwrap(), 0x1234);
        assert_eq!(display.pixel(active, 0, 0).unwrap(), 0xFFFF);
        assert_eq!(display.pixel(active, 18, 18).unwrap(), 0xFFFF);
        assert_eq!(display.cell(1, 1).unwrap(), b'R');

        display.execute(&Command::Sync).unwrap();
        assert_eq!(display.visible_buffer().unwrap(), active);
        display.execute(&Command::Erase).unwrap();
        assert_eq!(display.cell(1, 1).unwrap(), b' ');
    }

    #[test]
    fn test_unchecked_mode_writes_past_geometry() {
        let mut display = open(
            SimMapper::de1_soc(),
            DisplayConfig::default().with_bounds(BoundsMode::Unchecked),
        );
        display.plot_pixel(500, 0, 0xABCD).unwrap();
        let regions = display.close();
        assert_eq!(regions.secondary.read_u16(1000).unwrap(), 0xABCD);
    }

    #[test]
    fn test_close_then_unmap_releases_everything() {
        let mut mapper = SimMapper::de1_soc();
        let display = Display::open(&mut mapper, DisplayConfig::default()).unwrap();
        assert_eq!(mapper.live, 5);
        display.close().unmap(&mut mapper);
        assert_eq!(mapper.live, 0);
    }

    #[test]
    fn test_close_returns_windows() {
        let mut display = de1();
        display.plot_text(0, 0, "Z").unwrap();
        let regions = display.close();
        assert_eq!(regions.chars.read_u8(0).unwrap(), b'Z');
        assert_eq!(regions.pixel_ctrl.len(), 16);
        assert_eq!(regions.primary.len(), crate::constants::PIXEL_BUF_SPAN);
    }
}
