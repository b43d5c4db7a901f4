//! Twin runtime record

use serde::Serialize;
use twinfeed_core::{Envelope, ReadingSet, SignalModel, ThingId, Timestamp};
use twinfeed_transport::TransportError;

use crate::publisher::TwinPublisher;

/// One simulated twin: identity, signal state and broker session
pub struct Twin {
    thing_id: ThingId,
    model: SignalModel,
    publisher: TwinPublisher,
    published: u64,
    failed: u64,
}

/// Outcome of one twin's tick
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub readings: ReadingSet,
    pub result: Result<(), TransportError>,
}

impl Twin {
    pub fn new(model: SignalModel, publisher: TwinPublisher) -> Self {
        Self {
            thing_id: publisher.thing_id().clone(),
            model,
            publisher,
            published: 0,
            failed: 0,
        }
    }

    pub fn thing_id(&self) -> &ThingId {
        &self.thing_id
    }

    pub fn publisher(&self) -> &TwinPublisher {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut TwinPublisher {
        &mut self.publisher
    }

    /// Generate, build and publish one envelope stamped with `timestamp`
    pub async fn tick(&mut self, timestamp: Timestamp) -> TickOutcome {
        let readings = self.model.generate();
        let envelope = Envelope::for_thing(&self.thing_id, &readings, timestamp);
        let result = self.publisher.publish(&envelope).await;

        match result {
            Ok(()) => self.published += 1,
            Err(_) => self.failed += 1,
        }
        TickOutcome { readings, result }
    }

    pub fn report(&self) -> TwinReport {
        TwinReport {
            thing_id: self.thing_id.to_string(),
            client_id: self.publisher.client_id().to_string(),
            published: self.published,
            failed: self.failed,
        }
    }
}

/// Per-twin publish counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TwinReport {
    pub thing_id: String,
    pub client_id: String,
    pub published: u64,
    pub failed: u64,
}
