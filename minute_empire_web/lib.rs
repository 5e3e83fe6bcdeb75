mod handlers;
mod http;

pub use http::{AppState, WebRouter};
