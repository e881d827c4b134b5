pub mod utils;

mod stats;
mod users;
