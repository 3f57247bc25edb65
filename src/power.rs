//! Keep-awake implementations

use crate::audio::KeepAwake;
use crate::error::Result;
use tracing::debug;

/// Keep-awake for hosts with no suspend concern (desktops, tests).
#[derive(Debug, Default)]
pub struct NoKeepAwake;

impl KeepAwake for NoKeepAwake {
    fn acquire(&mut self) -> Result<()> {
        debug!("No keep-awake facility on this host; continuing without one");
        Ok(())
    }

    fn release(&mut self) {}
}
