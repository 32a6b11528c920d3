//! Shared fixtures for the MCP server integration tests

pub mod mcp_harness;
