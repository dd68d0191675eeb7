use crate::behaviours::behaviour::{Behaviour, Forces};
use crate::Agent;

use rand::RngCore;

/// Keeps every agent on its current heading.
pub struct NoBehaviour {}

impl Behaviour for NoBehaviour {
    fn steering(&self, _agent: &Agent, _neighbours: &[Agent], _rng: &mut dyn RngCore) -> Forces {
        Forces::default()
    }
}
