//! The long-lived task that moves playback on when a track ends.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::event::{EVENT_SHUTDOWN, EVENT_SKIP, EVENT_TRACK_FINISHED};
use crate::stream::Worker;

use super::engine::Engine;

pub(super) fn spawn(engine: Arc<Engine>) -> Result<Worker> {
    Worker::spawn("media-advance", move || run(&engine))
}

fn run(engine: &Arc<Engine>) {
    loop {
        let bits = engine.events.wait_any(
            EVENT_TRACK_FINISHED | EVENT_SKIP | EVENT_SHUTDOWN,
            None,
        );
        if bits & EVENT_SHUTDOWN != 0 {
            debug!("advance task exiting");
            return;
        }
        if bits & EVENT_TRACK_FINISHED != 0 {
            engine.on_track_finished();
        }
        if bits & EVENT_SKIP != 0 {
            if let Err(e) = engine.next() {
                warn!("skip failed: {e}");
            }
        }
    }
}
