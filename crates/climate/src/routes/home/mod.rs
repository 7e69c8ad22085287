mod index;

pub use index::{welcome, WELCOME};
