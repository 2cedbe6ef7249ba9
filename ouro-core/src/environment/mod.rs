pub mod environment;
pub mod heap;
pub mod value;

pub mod prelude {
    pub use super::{
        environment::*,
        heap::*,
        value::*
    };
}
