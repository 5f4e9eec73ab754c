pub mod handlers;
pub mod server;
pub mod views;

pub use handlers::AppState;
pub use server::{build_router, TallyServer};
