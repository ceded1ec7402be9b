mod index;
mod not_found;

pub use index::index_handler;
pub use not_found::not_found_handler;
