//! Reusable test suites, shared with the companion crates.
