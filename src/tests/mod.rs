//! Integration tests for the weather animator binary.
