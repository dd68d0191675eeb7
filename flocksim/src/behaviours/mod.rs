pub mod behaviour;
pub mod flock;
pub mod no_behaviour;
pub mod wander;

pub use behaviour::{Behaviour, Forces};
pub use flock::{FlockBehaviour, FlockWeights};
pub use no_behaviour::NoBehaviour;
pub use wander::WanderBehaviour;
