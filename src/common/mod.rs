pub mod client {
    pub mod client;
    pub mod error;
    pub mod models;
}

pub mod logger;
pub mod naming;
pub mod task_board;
pub mod utils;
