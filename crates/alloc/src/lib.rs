//! A growable array built in two layers.
//!
//! [`RawBuffer`] owns an uninitialized block of memory sized for a number of values and
//! knows nothing about which of its slots are live. [`Vector`] owns one `RawBuffer` plus
//! a count of live leading slots, and does all construction, relocation, and dropping
//! of values itself.
mod containers;
mod raw;

pub use containers::{into_iter::IntoIter, vec::Vector};
pub use raw::{AllocError, RawBuffer};
