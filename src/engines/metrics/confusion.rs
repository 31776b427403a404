use crate::types::ClassLabel;
use std::collections::BTreeMap;

/// Confusion counts over the labels seen in one fold.
///
/// `matrix[t][p]` counts samples with true label index `t` predicted as `p`.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    classes: Vec<ClassLabel>,
    index: BTreeMap<ClassLabel, usize>,
    matrix: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ClassLabel, ClassLabel)>,
    {
        let pairs: Vec<(ClassLabel, ClassLabel)> = pairs.into_iter().collect();

        let mut index = BTreeMap::new();
        for &(t, p) in &pairs {
            index.entry(t).or_insert(0);
            index.entry(p).or_insert(0);
        }
        let classes: Vec<ClassLabel> = index.keys().copied().collect();
        for (i, class) in classes.iter().enumerate() {
            index.insert(*class, i);
        }

        let n = classes.len();
        let mut matrix = vec![vec![0; n]; n];
        for (t, p) in pairs {
            matrix[index[&t]][index[&p]] += 1;
        }

        Self {
            classes,
            index,
            matrix,
        }
    }

    pub fn classes(&self) -> &[ClassLabel] {
        &self.classes
    }

    pub fn true_positives(&self, class: ClassLabel) -> usize {
        self.index.get(&class).map_or(0, |&i| self.matrix[i][i])
    }

    /// Predicted as `class` but was something else
    pub fn false_positives(&self, class: ClassLabel) -> usize {
        self.index.get(&class).map_or(0, |&c| {
            (0..self.classes.len())
                .filter(|&t| t != c)
                .map(|t| self.matrix[t][c])
                .sum()
        })
    }

    /// Was `class` but predicted as something else
    pub fn false_negatives(&self, class: ClassLabel) -> usize {
        self.index.get(&class).map_or(0, |&c| {
            (0..self.classes.len())
                .filter(|&p| p != c)
                .map(|p| self.matrix[c][p])
                .sum()
        })
    }

    pub fn support(&self, class: ClassLabel) -> usize {
        self.index
            .get(&class)
            .map_or(0, |&c| self.matrix[c].iter().sum())
    }

    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.classes.len()).map(|i| self.matrix[i][i]).sum()
    }
}
