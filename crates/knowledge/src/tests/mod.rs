//! Cross-module tests: end-to-end answering and property checks.
