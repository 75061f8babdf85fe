//! Buffer swap controller
//!
//! Two states: `Idle` and `SwapPending`. A swap is requested by writing 1 to
//! the controller's Buffer register; the controller raises the status S bit
//! and clears it during the next vertical blank, after exchanging the front
//! and back addresses. Once S is clear, the buffer that is *not* visible
//! becomes the active (draw) buffer.
//!
//! The wait is isolated behind [`VsyncWait`] so a platform with a vsync
//! interrupt can block on it instead of spinning.

use crate::device::RegisterWindow;
use crate::error::VideoError;
use crate::regs::{ControlBlock, Status};

/// Physical pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferId {
    Primary,
    Secondary,
}

impl BufferId {
    pub fn other(self) -> Self {
        match self {
            BufferId::Primary => BufferId::Secondary,
            BufferId::Secondary => BufferId::Primary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    /// No swap in flight
    Idle,
    /// Swap requested, waiting for the controller to acknowledge
    SwapPending,
}

/// Blocking wait for the vertical-blank acknowledgment
pub trait VsyncWait {
    /// Return once `done` yields `true`, or fail
    fn wait_until(&mut self, done: &mut dyn FnMut() -> Result<bool, VideoError>) -> Result<(), VideoError>;
}

/// Busy-wait on the status register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpinWait {
    /// Give up after this many polls; `None` spins until acknowledged
    pub limit: Option<u32>,
}

impl SpinWait {
    pub const fn unbounded() -> Self {
        Self { limit: None }
    }

    pub const fn bounded(polls: u32) -> Self {
        Self { limit: Some(polls) }
    }
}

impl VsyncWait for SpinWait {
    fn wait_until(&mut self, done: &mut dyn FnMut() -> Result<bool, VideoError>) -> Result<(), VideoError> {
        let mut polls: u32 = 0;
        loop {
            if done()? {
                return Ok(());
            }
            polls = polls.saturating_add(1);
            if let Some(limit) = self.limit {
                if polls >= limit {
                    return Err(VideoError::SwapTimeout { polls });
                }
            }
            core::hint::spin_loop();
        }
    }
}

/// Tracks which physical buffer receives drawing and drives the handshake
#[derive(Debug)]
pub struct SwapController<V = SpinWait> {
    state: SwapState,
    active: BufferId,
    primary_base: u32,
    secondary_base: u32,
    wait: V,
}

impl<V: VsyncWait> SwapController<V> {
    pub fn new(primary_base: u32, secondary_base: u32, wait: V) -> Self {
        Self {
            state: SwapState::Idle,
            active: BufferId::Secondary,
            primary_base,
            secondary_base,
            wait,
        }
    }

    pub fn state(&self) -> SwapState {
        self.state
    }

    /// Buffer that drawing primitives write to
    pub fn active(&self) -> BufferId {
        self.active
    }

    pub fn base_of(&self, id: BufferId) -> u32 {
        match id {
            BufferId::Primary => self.primary_base,
            BufferId::Secondary => self.secondary_base,
        }
    }

    /// Back buffer implied by the visible buffer's base address
    pub fn back_for(&self, visible_base: u32) -> BufferId {
        if visible_base == self.primary_base {
            BufferId::Secondary
        } else {
            BufferId::Primary
        }
    }

    /// Point the controller's back buffer at whichever buffer is hidden
    pub fn attach<C: RegisterWindow>(&mut self, ctrl: &mut ControlBlock<C>) -> Result<BufferId, VideoError> {
        let visible = ctrl.front_buffer()?;
        self.active = self.back_for(visible);
        ctrl.set_back_buffer(self.base_of(self.active))?;
        self.state = SwapState::Idle;
        log::debug!(
            "swap: front {:#010x}, drawing to {:?} ({:#010x})",
            visible,
            self.active,
            self.base_of(self.active)
        );
        Ok(self.active)
    }

    /// Write the swap request; the caller must then wait for completion
    pub fn request_swap<C: RegisterWindow>(&mut self, ctrl: &mut ControlBlock<C>) -> Result<(), VideoError> {
        if self.state == SwapState::SwapPending {
            return Err(VideoError::SwapPending);
        }
        ctrl.request_swap()?;
        self.state = SwapState::SwapPending;
        log::debug!("swap: requested, {:?} goes visible at next vblank", self.active);
        Ok(())
    }

    /// Block until the controller clears S, then select the new back buffer
    ///
    /// On timeout the swap stays pending; calling this again resumes the wait.
    pub fn await_completion<C: RegisterWindow>(&mut self, ctrl: &mut ControlBlock<C>) -> Result<BufferId, VideoError> {
        if self.state == SwapState::Idle {
            return Ok(self.active);
        }

        let ctrl_ref = &*ctrl;
        let mut acknowledged = || -> Result<bool, VideoError> {
            Ok(!ctrl_ref.status()?.contains(Status::SWAP_PENDING))
        };
        if let Err(e) = self.wait.wait_until(&mut acknowledged) {
            log::warn!("swap: {}", e);
            return Err(e);
        }

        self.state = SwapState::Idle;
        let visible = ctrl.front_buffer()?;
        self.active = self.back_for(visible);
        log::debug!("swap: done, front {:#010x}, drawing to {:?}", visible, self.active);
        Ok(self.active)
    }

    /// Request a swap (unless one is already in flight) and wait for it
    pub fn sync<C: RegisterWindow>(&mut self, ctrl: &mut ControlBlock<C>) -> Result<BufferId, VideoError> {
        if self.state == SwapState::Idle {
            self.request_swap(ctrl)?;
        }
        self.await_completion(ctrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::sim::{SimControl, SwapLatency};
    use crate::geometry::DisplayGeometry;

    const PRIMARY: u32 = 0xC800_0000;
    const SECONDARY: u32 = 0xC000_0000;

    fn setup(latency: SwapLatency, wait: SpinWait) -> (SwapController, ControlBlock<SimControl>) {
        let mut ctrl = ControlBlock::new(SimControl::pixel(DisplayGeometry::new(320, 240), latency));
        let mut swap = SwapController::new(PRIMARY, SECONDARY, wait);
        swap.attach(&mut ctrl).unwrap();
        (swap, ctrl)
    }

    #[test]
    fn test_attach_draws_to_hidden_buffer() {
        let (swap, ctrl) = setup(SwapLatency::Polls(1), SpinWait::unbounded());
        assert_eq!(swap.active(), BufferId::Secondary);
        assert_eq!(ctrl.back_buffer().unwrap(), SECONDARY);
        assert_eq!(swap.state(), SwapState::Idle);
    }

    #[test]
    fn test_sync_shows_previous_active_buffer() {
        let (mut swap, mut ctrl) = setup(SwapLatency::Polls(3), SpinWait::unbounded());
        let before = swap.active();
        let after = swap.sync(&mut ctrl).unwrap();
        assert_eq!(ctrl.front_buffer().unwrap(), swap.base_of(before));
        assert_eq!(after, before.other());
        assert_eq!(swap.state(), SwapState::Idle);
        assert_eq!(ctrl.window().swaps(), 1);
    }

    #[test]
    fn test_double_sync_restores_assignment() {
        let (mut swap, mut ctrl) = setup(SwapLatency::Polls(0), SpinWait::unbounded());
        let original = swap.active();
        swap.sync(&mut ctrl).unwrap();
        assert_eq!(swap.active(), BufferId::Primary);
        swap.sync(&mut ctrl).unwrap();
        assert_eq!(swap.active(), original);
        assert_eq!(ctrl.front_buffer().unwrap(), PRIMARY);
    }

    #[test]
    fn test_bounded_wait_times_out_and_stays_pending() {
        let (mut swap, mut ctrl) = setup(SwapLatency::Never, SpinWait::bounded(16));
        assert_eq!(swap.sync(&mut ctrl), Err(VideoError::SwapTimeout { polls: 16 }));
        assert_eq!(swap.state(), SwapState::SwapPending);
        assert_eq!(swap.active(), BufferId::Secondary);
        assert_eq!(swap.request_swap(&mut ctrl), Err(VideoError::SwapPending));
    }

    #[test]
    fn test_resumed_wait_completes_pending_swap() {
        let (mut swap, mut ctrl) = setup(SwapLatency::Polls(20), SpinWait::bounded(5));
        assert!(swap.sync(&mut ctrl).is_err());
        assert!(swap.sync(&mut ctrl).is_err());
        assert!(swap.sync(&mut ctrl).is_err());
        assert!(swap.sync(&mut ctrl).is_err());
        assert_eq!(swap.sync(&mut ctrl), Ok(BufferId::Primary));
        // Only one request ever reached the controller
        assert_eq!(ctrl.window().swaps(), 1);
    }

    #[test]
    fn test_custom_wait_strategy() {
        struct Interrupt {
            wakeups: u32,
        }
        impl VsyncWait for Interrupt {
            fn wait_until(&mut self, done: &mut dyn FnMut() -> Result<bool, VideoError>) -> Result<(), VideoError> {
                while !done()? {
                    self.wakeups += 1;
                }
                Ok(())
            }
        }

        let mut ctrl = ControlBlock::new(SimControl::pixel(DisplayGeometry::new(320, 240), SwapLatency::Polls(2)));
        let mut swap = SwapController::new(PRIMARY, SECONDARY, Interrupt { wakeups: 0 });
        swap.attach(&mut ctrl).unwrap();
        assert_eq!(swap.sync(&mut ctrl), Ok(BufferId::Primary));
        assert_eq!(swap.wait.wakeups, 2);
    }
}
