pub mod did;

mod key;

pub use key::*;
