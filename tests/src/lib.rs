//! End-to-end runs of the bundled fixtures against the in-memory target.
#![cfg(test)]

mod support;
mod sync;
