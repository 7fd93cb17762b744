//! Host-based tests for the grbl port layer
//!
//! Every test runs the port layer on the simulated back-end in virtual
//! CPU cycles, so timings are exact and reproducible.

#[cfg(test)]
mod step_cycle_tests;
#[cfg(test)]
mod limit_debounce_tests;
#[cfg(test)]
mod pin_tests;
#[cfg(test)]
mod property_tests;
