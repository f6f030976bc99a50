//! MCTS configuration parameters.

use serde::{Deserialize, Serialize};

/// Order in which a node's untried actions are expanded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionOrder {
    /// Last filtered action first.
    #[default]
    Lifo,
    /// Filtered order.
    Fifo,
    /// Shuffled once, with the search RNG, when the node is created.
    Shuffled,
}

/// Whose win a playout credits to each node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardMode {
    /// Every node scores "did the searching agent win", whoever moves there.
    #[default]
    FixedAgent,
    /// A node scores "did the player who chose the move into it win".
    MoverRelative,
}

/// MCTS configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MctsConfig {
    /// UCB1 exploration constant (default: 1.4).
    /// Higher values favor exploration over exploitation.
    pub exploration_constant: f64,

    /// Random seed for expansion, outcome sampling and rollouts.
    /// Same seed produces deterministic searches.
    pub seed: u64,

    pub expansion_order: ExpansionOrder,

    pub reward_mode: RewardMode,

    /// Maximum rollout length (0 = unlimited). A rollout cut short counts
    /// as a draw.
    pub rollout_limit: u32,

    /// Skip search when only one action, or only forced actions, are legal.
    pub fast_forward: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration_constant: 1.4,
            seed: 42,
            expansion_order: ExpansionOrder::Lifo,
            reward_mode: RewardMode::FixedAgent,
            rollout_limit: 0,
            fast_forward: true,
        }
    }
}

impl MctsConfig {
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration_constant = c;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_expansion_order(mut self, order: ExpansionOrder) -> Self {
        self.expansion_order = order;
        self
    }

    pub fn with_reward_mode(mut self, mode: RewardMode) -> Self {
        self.reward_mode = mode;
        self
    }

    pub fn with_rollout_limit(mut self, limit: u32) -> Self {
        self.rollout_limit = limit;
        self
    }

    pub fn with_fast_forward(mut self, enabled: bool) -> Self {
        self.fast_forward = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.exploration_constant, 1.4);
        assert_eq!(config.expansion_order, ExpansionOrder::Lifo);
        assert_eq!(config.reward_mode, RewardMode::FixedAgent);
        assert_eq!(config.rollout_limit, 0);
        assert!(config.fast_forward);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MctsConfig::default()
            .with_exploration(2.0)
            .with_seed(123)
            .with_expansion_order(ExpansionOrder::Shuffled)
            .with_reward_mode(RewardMode::MoverRelative)
            .with_rollout_limit(500);

        assert_eq!(config.exploration_constant, 2.0);
        assert_eq!(config.seed, 123);
        assert_eq!(config.expansion_order, ExpansionOrder::Shuffled);
        assert_eq!(config.reward_mode, RewardMode::MoverRelative);
        assert_eq!(config.rollout_limit, 500);
    }

    #[test]
    fn test_serialization() {
        let config = MctsConfig::default().with_reward_mode(RewardMode::MoverRelative);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"mover_relative\""));
        let restored: MctsConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
