/*!
 * Monitoring
 * Tracing subscriber setup for hosts of the synchronization primitives
 */

pub mod tracer;

pub use tracer::{init_tracing, try_init_tracing, TRACE_JSON_ENV};
