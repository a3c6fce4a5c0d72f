//! Testing utilities and harness for the panzoom controller

pub mod gestures;
pub mod recorders;
pub mod testing;

pub use gestures::*;
pub use recorders::*;
pub use testing::*;

pub mod prelude {
    pub use crate::gestures::*;
    pub use crate::recorders::*;
    pub use crate::testing::*;
}
