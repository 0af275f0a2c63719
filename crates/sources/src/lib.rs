//! sens-capture-sources: Sensor discovery and sampling for sens-capture.
//!
//! Discovery finds thermal zones, voltage regulators and CPU frequency
//! domains under a sysfs root; the parsers turn their raw attributes into
//! Celsius, millivolt-scaled "volts" and Hertz; the [`Sampler`] reads them
//! all once per tick into the time-series store.

mod discovery;
mod parsers;
mod resolver;
mod sampler;

pub use discovery::{discover, discover_kind, enumerate_candidates};
pub use parsers::{parse_celsius, parse_for, parse_hertz, parse_volts};
pub use resolver::{caption, read_first_line};
pub use sampler::{ErrorSink, LogSink, Sampler, TickSummary};
