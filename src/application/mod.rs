//! Application layer containing the dispatch orchestration.
//!
//! [`engine::RideEngine`] is the facade external callers use. It owns the
//! [`queue::DispatchQueue`] of pending trips and the
//! [`registry::DriverRegistry`] of driver availability, and delegates the
//! compound dequeue-claim-bind step to [`dispatcher::Dispatcher`]. Each of
//! these guards its state with its own `tokio` lock rather than one global
//! lock, so unrelated trips and drivers are processed concurrently.

pub mod dispatcher;
pub mod engine;
pub mod queue;
pub mod registry;
