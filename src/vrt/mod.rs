pub mod nav;
pub mod parser;
pub mod service;
