//! The synchronous receive / step / send loop.

use crate::dispatcher::{Dispatcher, TravelTimeSource};
use crate::error::{DispatchError, Result};
use crate::fleet::FleetStatistics;
use crate::protocol::{InboundMessage, OutboundMessage, TravelTimeQuery, TravelTimeResponse};
use crate::transport::Transport;

/// What a finished session saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub messages: usize,
    pub iterations: usize,
    pub travel_time_queries: usize,
    /// Counters of the last iteration at finalization.
    pub statistics: FleetStatistics,
}

#[derive(Debug)]
pub struct Session<T> {
    transport: T,
    dispatcher: Dispatcher,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, dispatcher: Dispatcher) -> Self {
        Self {
            transport,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_parts(self) -> (T, Dispatcher) {
        (self.transport, self.dispatcher)
    }

    /// Open the conversation and serve messages until `finalization`.
    ///
    /// Every message except `finalization` gets exactly one assignment reply.
    /// Any error ends the session.
    pub fn run(&mut self) -> Result<SessionSummary> {
        self.transport.send(&OutboundMessage::Initialization)?;
        let mut summary = SessionSummary::default();

        loop {
            let message = self.transport.recv()?;
            summary.messages += 1;
            if matches!(message, InboundMessage::Iteration(_)) {
                summary.iterations += 1;
            }
            tracing::trace!(kind = message.kind(), "message received");

            let mut channel = SideChannel {
                transport: &mut self.transport,
                queries: 0,
            };
            let reply = self.dispatcher.handle(&message, &mut channel)?;
            summary.travel_time_queries += channel.queries;

            match reply {
                Some(assignment) => self
                    .transport
                    .send(&OutboundMessage::Assignment(assignment))?,
                None => break,
            }
        }

        summary.statistics = self.dispatcher.fleet().statistics();
        tracing::info!(
            messages = summary.messages,
            iterations = summary.iterations,
            "session finished"
        );
        Ok(summary)
    }
}

/// Travel-time queries answered in-band on the session transport.
struct SideChannel<'a, T> {
    transport: &'a mut T,
    queries: usize,
}

impl<T: Transport> TravelTimeSource for SideChannel<'_, T> {
    fn query_travel_times(&mut self, query: TravelTimeQuery) -> Result<TravelTimeResponse> {
        self.transport
            .send(&OutboundMessage::TravelTimeQuery(query))?;
        self.queries += 1;
        match self.transport.recv()? {
            InboundMessage::TravelTimeResponse(response) => Ok(response),
            other => Err(DispatchError::Protocol(format!(
                "expected travel_time_response, got {}",
                other.kind()
            ))),
        }
    }
}
