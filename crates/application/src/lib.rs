//! Application services and ports.

#![forbid(unsafe_code)]

mod list_state;
mod optimistic;
mod record_events;
mod record_list_service;
mod record_ports;
mod single_flight;

pub use list_state::{ItemsSetter, ListState};
pub use optimistic::{ErrorCallback, Keyed, MutationOutcome, OptimisticMutator};
pub use record_events::{DEFAULT_EVENT_CAPACITY, RecordEvent, RecordEventBus, RecordSubscription};
pub use record_list_service::RecordListService;
pub use record_ports::{DEFAULT_LIST_LIMIT, RecordListQuery, RecordRepository};
pub use single_flight::{CancelReason, CancelSignal, DEFAULT_REQUEST_TIMEOUT, SingleFlightRunner};
