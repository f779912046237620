//! Command line and web front end for the phishlens URL phishing detector.

pub mod cli;
pub mod server;
pub mod settings;
pub mod validate;
pub mod verdict;
