pub mod active_set;
pub mod agg;
pub mod store;

pub use gaslab_api::core::{
    entities::{Dir, EdgeRef, EID, VID},
    Direction,
};

pub trait StateType: PartialEq + Clone + std::fmt::Debug + Send + Sync + 'static {}

impl<T: PartialEq + Clone + std::fmt::Debug + Send + Sync + 'static> StateType for T {}
