//! Display side: drains deliveries and keeps the image currently shown.

use retouch_core::{Delivery, DeliveryReceiver, PixelBuffer, RunId};

/// What the user currently sees.
///
/// Only completed runs reach the receiver, so a cancelled run leaves the
/// shown image untouched.
pub struct Viewer {
    receiver: DeliveryReceiver,
    shown: PixelBuffer,
    shown_run: Option<RunId>,
}

impl Viewer {
    /// Start out showing the unadjusted source.
    pub fn new(receiver: DeliveryReceiver, initial: PixelBuffer) -> Self {
        Self {
            receiver,
            shown: initial,
            shown_run: None,
        }
    }

    /// Non-blocking: show every delivery that has arrived. Returns how many
    /// were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(delivery) = self.receiver.try_recv() {
            self.show(delivery);
            applied += 1;
        }
        applied
    }

    /// Block until `run` has been shown, or every sender is gone.
    pub fn wait_for(&mut self, run: RunId) -> bool {
        while self.shown_run.is_none_or(|shown| shown < run) {
            match self.receiver.blocking_recv() {
                Some(delivery) => self.show(delivery),
                None => return false,
            }
        }
        true
    }

    pub fn shown(&self) -> &PixelBuffer {
        &self.shown
    }

    pub fn shown_run(&self) -> Option<RunId> {
        self.shown_run
    }

    fn show(&mut self, delivery: Delivery) {
        tracing::info!(
            run = delivery.run,
            average_brightness = delivery.average_brightness,
            params = ?delivery.params,
            "displaying result"
        );
        self.shown_run = Some(delivery.run);
        self.shown = delivery.image;
    }
}
