//! Scenario-based tests for conveyor

mod middleware;
