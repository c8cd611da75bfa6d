pub mod charts;
pub mod domain;
pub mod model;
pub mod report;
pub mod server;
