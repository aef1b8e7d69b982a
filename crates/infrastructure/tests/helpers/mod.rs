#![allow(dead_code)]
pub mod builders;
pub mod dns_server_mock;
pub mod recording_sink;
