mod cache;
mod resolver;
mod scanner;
mod signature;

pub use cache::*;
pub use resolver::*;
pub use scanner::*;
pub use signature::*;
