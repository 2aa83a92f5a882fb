//! CART decision tree classifier
//!
//! Gini impurity, binary splits `value <= threshold`, thresholds at midpoints
//! between consecutive distinct values. Training is fully deterministic:
//! features are scanned in index order and ties keep the first best split.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Classifier, ClassifierError, Trainer};

/// Tree growth limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeConfig {
    /// Maximum depth (root is depth 0); `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs to be split
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// A node in the flattened tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: usize,
        samples: usize,
    },
}

/// Fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    config: DecisionTreeConfig,
    n_features: usize,
    classes: Vec<String>,
    nodes: Vec<TreeNode>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Most frequent class; ties go to the lowest class index
fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

impl DecisionTreeConfig {
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn class_counts(&self, targets: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
        let mut counts = vec![0; n_classes];
        for &i in indices {
            counts[targets[i]] += 1;
        }
        counts
    }

    fn best_split(
        &self,
        rows: &[Vec<f64>],
        targets: &[usize],
        indices: &[usize],
        n_classes: usize,
        n_features: usize,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.min_samples_leaf.max(1);
        let mut best: Option<SplitCandidate> = None;
        let mut order = indices.to_vec();

        for feature in 0..n_features {
            order.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

            let mut left = vec![0usize; n_classes];
            let mut right = self.class_counts(targets, &order, n_classes);

            for pos in 1..n {
                let moved = order[pos - 1];
                left[targets[moved]] += 1;
                right[targets[moved]] -= 1;

                let prev = rows[moved][feature];
                let next = rows[order[pos]][feature];
                if prev >= next || pos < min_leaf || n - pos < min_leaf {
                    continue;
                }

                let impurity = (pos as f64 * gini(&left, pos)
                    + (n - pos) as f64 * gini(&right, n - pos))
                    / n as f64;

                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    // Adjacent floats can round the midpoint up to `next`
                    let mid = prev + (next - prev) / 2.0;
                    let threshold = if mid < next { mid } else { prev };
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

impl Trainer for DecisionTreeConfig {
    type Model = DecisionTree;

    fn fit(&self, rows: &[Vec<f64>], labels: &[String]) -> Result<DecisionTree, ClassifierError> {
        if rows.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }
        if rows.len() != labels.len() {
            return Err(ClassifierError::LabelCountMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }

        let n_features = rows[0].len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_features) {
            return Err(ClassifierError::RaggedMatrix {
                row,
                expected: n_features,
                actual: r.len(),
            });
        }

        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let targets: Vec<usize> = labels
            .iter()
            .filter_map(|l| classes.binary_search(l).ok())
            .collect();
        let n_classes = classes.len();

        let mut nodes: Vec<TreeNode> = Vec::new();
        // (node id, sample indices, depth)
        let mut pending: Vec<(usize, Vec<usize>, usize)> = Vec::new();

        nodes.push(TreeNode::Leaf { class: 0, samples: 0 });
        pending.push((0, (0..rows.len()).collect(), 0));

        while let Some((id, indices, depth)) = pending.pop() {
            let counts = self.class_counts(&targets, &indices, n_classes);
            let leaf = TreeNode::Leaf {
                class: majority(&counts),
                samples: indices.len(),
            };

            let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
            let depth_reached = self.max_depth.is_some_and(|max| depth >= max);
            if pure || depth_reached || indices.len() < self.min_samples_split.max(2) {
                nodes[id] = leaf;
                continue;
            }

            let Some(split) = self.best_split(rows, &targets, &indices, n_classes, n_features) else {
                nodes[id] = leaf;
                continue;
            };

            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                .into_iter()
                .partition(|&i| rows[i][split.feature] <= split.threshold);
            if left_idx.is_empty() || right_idx.is_empty() {
                nodes[id] = leaf;
                continue;
            }

            let left = nodes.len();
            nodes.push(TreeNode::Leaf { class: 0, samples: 0 });
            let right = nodes.len();
            nodes.push(TreeNode::Leaf { class: 0, samples: 0 });

            nodes[id] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            pending.push((right, right_idx, depth + 1));
            pending.push((left, left_idx, depth + 1));
        }

        Ok(DecisionTree {
            config: *self,
            n_features,
            classes,
            nodes,
        })
    }
}

impl DecisionTree {
    pub fn config(&self) -> &DecisionTreeConfig {
        &self.config
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    /// Longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            match self.nodes.get(id) {
                Some(TreeNode::Split { left, right, .. }) => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
                Some(TreeNode::Leaf { .. }) => max_depth = max_depth.max(depth),
                None => {}
            }
        }
        max_depth
    }

    /// Structural checks for a deserialized tree
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.nodes.is_empty() {
            return Err(ClassifierError::CorruptModel("tree has no nodes".to_string()));
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if feature >= self.n_features {
                        return Err(ClassifierError::CorruptModel(format!(
                            "node {} splits on feature {} of {}",
                            id, feature, self.n_features
                        )));
                    }
                    // Children are always allocated after their parent
                    if left <= id || right <= id || left >= self.nodes.len() || right >= self.nodes.len() {
                        return Err(ClassifierError::CorruptModel(format!(
                            "node {} has invalid children {}/{}",
                            id, left, right
                        )));
                    }
                }
                TreeNode::Leaf { class, .. } => {
                    if class >= self.classes.len() {
                        return Err(ClassifierError::CorruptModel(format!(
                            "leaf {} predicts unknown class {}",
                            id, class
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Classifier for DecisionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn labels(&self) -> &[String] {
        &self.classes
    }

    fn predict_row(&self, row: &[f64]) -> Result<String, ClassifierError> {
        if row.len() != self.n_features {
            return Err(ClassifierError::FeatureMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }

        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { class, .. }) => {
                    return self
                        .classes
                        .get(*class)
                        .cloned()
                        .ok_or_else(|| ClassifierError::CorruptModel(format!("unknown class {}", class)));
                }
                None => return Err(ClassifierError::CorruptModel(format!("missing node {}", id))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fit_separable_data() {
        let rows = vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![8.0, 1.0], vec![9.0, 1.0]];
        let y = labels(&["USA", "USA", "AUS", "AUS"]);

        let tree = DecisionTreeConfig::default().fit(&rows, &y).unwrap();

        assert_eq!(tree.predict(&rows).unwrap(), y);
        assert_eq!(tree.predict_row(&[0.5, 0.0]).unwrap(), "USA");
        assert_eq!(tree.predict_row(&[10.0, 1.0]).unwrap(), "AUS");
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn test_threshold_at_midpoint() {
        let rows = vec![vec![1.0], vec![3.0]];
        let tree = DecisionTreeConfig::default()
            .fit(&rows, &labels(&["A", "B"]))
            .unwrap();
        assert_eq!(tree.predict_row(&[2.0]).unwrap(), "A");
        assert_eq!(tree.predict_row(&[2.01]).unwrap(), "B");
    }

    #[test]
    fn test_adjacent_floats_split_cleanly() {
        let low = f64::from_bits(1.0f64.to_bits() + 1);
        let high = f64::from_bits(1.0f64.to_bits() + 2);
        let rows = vec![vec![low], vec![high]];

        let tree = DecisionTreeConfig::default()
            .fit(&rows, &labels(&["A", "B"]))
            .unwrap();

        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.predict_row(&[low]).unwrap(), "A");
        assert_eq!(tree.predict_row(&[high]).unwrap(), "B");
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_xor_needs_two_levels() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let y = labels(&["A", "B", "B", "A"]);
        let tree = DecisionTreeConfig::default().fit(&rows, &y).unwrap();
        assert_eq!(tree.predict(&rows).unwrap(), y);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let y = labels(&["A", "B", "B", "A"]);
        let tree = DecisionTreeConfig::default()
            .with_max_depth(Some(0))
            .fit(&rows, &y)
            .unwrap();
        assert_eq!(tree.node_count(), 1);
        // Tie between A and B resolves to the first sorted label
        assert_eq!(tree.predict_row(&[1.0, 1.0]).unwrap(), "A");
    }

    #[test]
    fn test_constant_features_make_majority_leaf() {
        let rows = vec![vec![1.0], vec![1.0], vec![1.0]];
        let tree = DecisionTreeConfig::default()
            .fit(&rows, &labels(&["B", "C", "C"]))
            .unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_row(&[5.0]).unwrap(), "C");
    }

    #[test]
    fn test_min_samples_leaf() {
        let rows = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let y = labels(&["A", "B", "B", "B"]);
        let config = DecisionTreeConfig {
            min_samples_leaf: 2,
            ..Default::default()
        };
        let tree = config.fit(&rows, &y).unwrap();
        // The pure split would isolate a single sample
        for node in &tree.nodes {
            if let TreeNode::Leaf { samples, .. } = node {
                assert!(*samples >= 2);
            }
        }
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 7) as f64, (i % 3) as f64, (i / 10) as f64])
            .collect();
        let y: Vec<String> = (0..40).map(|i| format!("T{}", (i * 7 + i / 5) % 4)).collect();

        let a = DecisionTreeConfig::default().fit(&rows, &y).unwrap();
        let b = DecisionTreeConfig::default().fit(&rows, &y).unwrap();
        assert_eq!(a, b);
        a.validate().unwrap();
    }

    #[test]
    fn test_fit_errors() {
        let config = DecisionTreeConfig::default();
        assert!(matches!(config.fit(&[], &[]), Err(ClassifierError::EmptyTrainingSet)));
        assert!(matches!(
            config.fit(&[vec![1.0]], &labels(&["A", "B"])),
            Err(ClassifierError::LabelCountMismatch { rows: 1, labels: 2 })
        ));
        assert!(matches!(
            config.fit(&[vec![1.0], vec![1.0, 2.0]], &labels(&["A", "B"])),
            Err(ClassifierError::RaggedMatrix { row: 1, .. })
        ));
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let tree = DecisionTreeConfig::default()
            .fit(&[vec![1.0, 2.0], vec![2.0, 1.0]], &labels(&["A", "B"]))
            .unwrap();
        assert!(matches!(
            tree.predict_row(&[1.0]),
            Err(ClassifierError::FeatureMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_serde_roundtrip_predicts_identically() {
        let rows = vec![vec![1.0, 0.0], vec![2.0, 1.0], vec![8.0, 1.0], vec![9.0, 0.0]];
        let y = labels(&["USA", "GBR", "AUS", "AUS"]);
        let tree = DecisionTreeConfig::default().fit(&rows, &y).unwrap();

        let json = serde_json::to_string(&tree).unwrap();
        let restored: DecisionTree = serde_json::from_str(&json).unwrap();

        restored.validate().unwrap();
        assert_eq!(restored.predict(&rows).unwrap(), tree.predict(&rows).unwrap());
        assert_eq!(restored.labels(), &["AUS", "GBR", "USA"]);
    }

    #[test]
    fn test_validate_rejects_corrupt_tree() {
        let tree = DecisionTree {
            config: DecisionTreeConfig::default(),
            n_features: 1,
            classes: labels(&["A"]),
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.5,
                left: 1,
                right: 2,
            }],
        };
        assert!(tree.validate().is_err());
        assert!(tree.predict_row(&[0.0]).is_err());
    }
}
