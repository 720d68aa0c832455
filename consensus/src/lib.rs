pub mod consensus;
pub mod errors;
pub mod model;
pub mod pipeline;
pub mod processes;
pub mod testutils;
