pub mod server;

pub use server::{router, serve, AppState, API_KEY_HEADER};
