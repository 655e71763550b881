//! Shared helpers for the workspace's end-to-end suites: each service is
//! started in-process on an ephemeral port and driven over real HTTP.

pub mod test_support;
