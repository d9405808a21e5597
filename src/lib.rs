pub mod config;

pub mod dispatch;

pub mod game;

pub mod notification;

pub mod outcome;

pub mod schedule;

pub mod session;

pub mod store;

pub mod test_helpers;

pub use game::{
    GameState,
    Side,
};
pub use session::Session;
