//! Authenticated-session and user-record service.
//!
//! Sessions carry two clocks: a movable idle expiry and a fixed end of life.
//! A session is gone once either passes, either by explicit logout or by the
//! periodic [`services::reaper::Reaper`] sweep.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

pub mod models {
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod memory;
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod reaper;
    pub mod session;
}

pub mod handlers {
    pub mod session;
    pub mod users;
}

pub mod middleware_layer {
    pub mod auth;
}

pub mod validation {
    pub mod credentials;
}
