//! Joint-action indexing

use crate::{Error, Result};

/// Largest joint-action axis an environment may have.
///
/// Tensors grow with `M^N`, so anything beyond this would not fit a
/// reasonable amount of memory anyway.
pub const MAX_JOINT_ACTIONS: usize = 1 << 16;

/// Layout of the flattened joint-action axis.
///
/// Joint actions are enumerated in row-major order with agent 0 as the most
/// significant digit, so for two agents with two actions each the joint
/// index `j = 2 * a_0 + a_1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointActions {
    n_agents: usize,
    n_actions: usize,
    count: usize,
}

impl JointActions {
    /// Layout for `n_agents` agents with `n_actions` actions each.
    ///
    /// Fails if `n_actions^n_agents` overflows or exceeds
    /// [`MAX_JOINT_ACTIONS`].
    pub fn new(n_agents: usize, n_actions: usize) -> Result<Self> {
        let count = u32::try_from(n_agents)
            .ok()
            .and_then(|exp| n_actions.checked_pow(exp))
            .filter(|&count| count <= MAX_JOINT_ACTIONS)
            .ok_or_else(|| Error::InvalidConfiguration {
                message: format!(
                    "{n_actions}^{n_agents} joint actions exceed the limit of {MAX_JOINT_ACTIONS}"
                ),
            })?;
        Ok(Self {
            n_agents,
            n_actions,
            count,
        })
    }

    /// Two agents with two actions each.
    pub(crate) fn pairwise_binary() -> Self {
        Self {
            n_agents: 2,
            n_actions: 2,
            count: 4,
        }
    }

    pub fn n_agents(&self) -> usize {
        self.n_agents
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Number of joint actions, `M^N`.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Action taken by `agent` in joint action `joint`.
    pub fn action_of(&self, joint: usize, agent: usize) -> usize {
        let stride = self
            .n_actions
            .pow((self.n_agents - 1 - agent) as u32);
        (joint / stride) % self.n_actions
    }

    /// Decode a joint index into one action per agent.
    pub fn decode(&self, joint: usize) -> Vec<usize> {
        (0..self.n_agents)
            .map(|agent| self.action_of(joint, agent))
            .collect()
    }

    /// Iterate over all joint actions as decoded action profiles.
    pub fn profiles(&self) -> impl Iterator<Item = (usize, Vec<usize>)> + '_ {
        (0..self.count).map(move |joint| (joint, self.decode(joint)))
    }
}
