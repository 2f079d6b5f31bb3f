//! likecap - capture a profile's liked posts from a browser session and
//! flatten them into plain records.

pub mod browser;
pub mod capture;
pub mod cli;
pub mod config;
pub mod normalize;
