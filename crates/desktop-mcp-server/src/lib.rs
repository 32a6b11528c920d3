//! desktop-mcp-server: MCP server for desktop automation
//!
//! Thin protocol layer that wraps desktop-core with MCP tool routing,
//! command-line configuration and response formatting.

pub mod args;
pub mod mcp;
pub mod mcp_content;
