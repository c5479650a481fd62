pub mod events;

use self::events::DrumHit;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Multi-producer queue from input polling threads to the judgment loop.
pub struct InputQueue {
    sender: Sender<DrumHit>,
    receiver: Receiver<DrumHit>,
}

impl InputQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Can be called from any thread.
    pub fn push(&self, hit: DrumHit) {
        let _ = self.sender.send(hit);
    }

    /// Non-blocking.
    pub fn pop(&self) -> Option<DrumHit> {
        self.receiver.try_recv().ok()
    }

    pub fn sender(&self) -> Sender<DrumHit> {
        self.sender.clone()
    }

    /// Takes everything captured so far as this frame's sample, oldest
    /// first. Hits arriving after the call belong to the next frame.
    pub fn drain_frame(&self) -> Vec<DrumHit> {
        let mut hits: Vec<DrumHit> = self.receiver.try_iter().collect();
        hits.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        hits
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
