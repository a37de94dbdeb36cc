//! Test suites for the integration server.

mod support;
