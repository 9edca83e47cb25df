mod common;

mod content;
mod maintenance;
