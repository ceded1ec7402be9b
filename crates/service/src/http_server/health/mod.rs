mod liveness;

pub use liveness::handler;
