//! Operations exposed by csrmm
//!
//! One operation is exported: [`spmm_accumulate`]. The `dispatch` module
//! provides the runtime-to-static element type bridge it is built on.

pub mod dispatch;
mod spmm;

pub use spmm::spmm_accumulate;
