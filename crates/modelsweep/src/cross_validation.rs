//! Cross-validation fold splitting.
//!
//! All splitters are deterministic for a given seed so that a sweep over
//! several models evaluates every model on the same folds.
use std::collections::{BTreeMap, HashMap};

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A single train/test split
#[derive(Debug, Clone, PartialEq)]
pub struct CvSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
    pub fold: usize,
}

fn check_folds(n_samples: usize, folds: usize) -> Result<()> {
    if folds < 2 {
        bail!("Cross-validation needs at least 2 folds, got {}", folds);
    }
    if n_samples < folds {
        bail!("Only {} rows for {} folds", n_samples, folds);
    }
    Ok(())
}

fn splits_from_assignment(assignment: &[usize], folds: usize) -> Vec<CvSplit> {
    (0..folds)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..assignment.len()).partition(|&i| assignment[i] == fold);
            CvSplit { train, test, fold }
        })
        .collect()
}

/// Shuffled k-fold; fold sizes differ by at most one.
pub fn kfold(n_samples: usize, folds: usize, seed: u64) -> Result<Vec<CvSplit>> {
    check_folds(n_samples, folds)?;
    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut assignment = vec![0usize; n_samples];
    for (pos, &idx) in indices.iter().enumerate() {
        assignment[idx] = pos % folds;
    }
    Ok(splits_from_assignment(&assignment, folds))
}

/// K-fold keeping each class's share roughly equal across folds.
pub fn stratified_kfold(labels: &[usize], folds: usize, seed: u64) -> Result<Vec<CvSplit>> {
    check_folds(labels.len(), folds)?;
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(idx);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut assignment = vec![0usize; labels.len()];
    let mut next = 0usize;
    for indices in by_class.values_mut() {
        indices.shuffle(&mut rng);
        for &idx in indices.iter() {
            assignment[idx] = next % folds;
            next += 1;
        }
    }
    Ok(splits_from_assignment(&assignment, folds))
}

/// K-fold where rows sharing a group key always land in the same fold.
///
/// Groups are placed largest first into the currently smallest fold.
pub fn group_kfold(keys: &[String], folds: usize) -> Result<Vec<CvSplit>> {
    check_folds(keys.len(), folds)?;
    let mut sizes: HashMap<&str, usize> = HashMap::new();
    for key in keys {
        *sizes.entry(key.as_str()).or_default() += 1;
    }
    if sizes.len() < folds {
        bail!("Only {} groups for {} folds", sizes.len(), folds);
    }

    let mut groups: Vec<(&str, usize)> = sizes.into_iter().collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut fold_sizes = vec![0usize; folds];
    let mut group_fold: HashMap<&str, usize> = HashMap::new();
    for (key, size) in groups {
        let fold = (0..folds)
            .min_by_key(|&f| (fold_sizes[f], f))
            .unwrap_or(0);
        fold_sizes[fold] += size;
        group_fold.insert(key, fold);
    }

    let assignment: Vec<usize> = keys.iter().map(|k| group_fold[k.as_str()]).collect();
    Ok(splits_from_assignment(&assignment, folds))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(splits: &[CvSplit], n: usize) {
        let mut seen = vec![0usize; n];
        for split in splits {
            assert_eq!(split.train.len() + split.test.len(), n);
            for &i in &split.test {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1), "every row tested exactly once");
    }

    #[test]
    fn kfold_partitions_rows() {
        let splits = kfold(10, 3, 7).unwrap();
        assert_eq!(splits.len(), 3);
        assert_partition(&splits, 10);
        let mut sizes: Vec<usize> = splits.iter().map(|s| s.test.len()).collect();
        sizes.sort();
        assert_eq!(sizes, vec![3, 3, 4]);
    }

    #[test]
    fn kfold_is_reproducible() {
        assert_eq!(kfold(20, 4, 1).unwrap(), kfold(20, 4, 1).unwrap());
    }

    #[test]
    fn rejects_too_few_rows() {
        assert!(kfold(2, 3, 0).is_err());
        assert!(kfold(10, 1, 0).is_err());
    }

    #[test]
    fn stratified_spreads_each_class() {
        let labels = vec![0, 0, 0, 1, 1, 1, 0, 1, 0, 1, 0, 1];
        let splits = stratified_kfold(&labels, 3, 3).unwrap();
        assert_partition(&splits, labels.len());
        for split in &splits {
            let ones = split.test.iter().filter(|&&i| labels[i] == 1).count();
            assert_eq!(ones, 2);
        }
    }

    #[test]
    fn groups_never_straddle_folds() {
        let keys: Vec<String> = ["a", "a", "b", "b", "b", "c", "d", "d"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let splits = group_kfold(&keys, 2).unwrap();
        assert_partition(&splits, keys.len());
        for split in &splits {
            for &i in &split.test {
                for &j in &split.train {
                    assert_ne!(keys[i], keys[j]);
                }
            }
        }
    }

    #[test]
    fn group_kfold_needs_enough_groups() {
        let keys = vec!["a".to_string(); 5];
        assert!(group_kfold(&keys, 2).is_err());
    }
}
