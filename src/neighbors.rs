use anyhow::{ensure, Result};
use itertools::Itertools;
use ndarray::ArrayView1;

use crate::knowledge_base::{KnowledgeBase, KnowledgeBaseEntry};

/// Fails on vectors of different length.
pub fn euclidean_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<f64> {
    ensure!(
        a.len() == b.len(),
        "cannot compare feature vectors of length {} and {}",
        a.len(),
        b.len()
    );
    Ok((&a - &b).mapv(|d| d * d).sum().sqrt())
}

/// The `k` entries closest to `query`, nearest first. Entries at equal
/// distance keep their knowledge base order; `k` is clamped to the size of
/// the knowledge base.
pub fn find_neighbors<'a>(
    query: &[f64],
    kb: &'a KnowledgeBase,
    k: usize,
) -> Result<Vec<&'a KnowledgeBaseEntry>> {
    let query = ArrayView1::from(query);
    let distances = kb
        .entries
        .iter()
        .map(|entry| {
            Ok((
                euclidean_distance(query, ArrayView1::from(&entry.features))?,
                entry,
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(distances
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.total_cmp(b))
        .take(k)
        .map(|(_, entry)| entry)
        .collect())
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::{datastructures::TrainConfig, test_utils::*};

    #[test]
    fn test_euclidean_distance() {
        let a = array![0.0, 3.0];
        let b = array![4.0, 0.0];
        assert_eq!(euclidean_distance(a.view(), b.view()).unwrap(), 5.0);
        assert!(euclidean_distance(a.view(), array![1.0].view()).is_err());
    }

    fn toy_kb() -> KnowledgeBase {
        KnowledgeBase::build(&toy_scenario(), &TrainConfig::default()).unwrap()
    }

    fn names(neighbors: &[&KnowledgeBaseEntry]) -> Vec<String> {
        neighbors.iter().map(|entry| entry.instance.clone()).collect()
    }

    #[test]
    fn test_nearest_first() {
        let kb = toy_kb();
        let neighbors = find_neighbors(&[1.0, 1.0], &kb, 3).unwrap();
        assert_eq!(names(&neighbors), vec!["i6", "i5", "i4"]);
        let neighbors = find_neighbors(&[-1.0, -1.0], &kb, 2).unwrap();
        assert_eq!(names(&neighbors), vec!["i1", "i2"]);
    }

    #[test]
    fn test_ties_keep_knowledge_base_order() {
        let mut kb = toy_kb();
        for entry in kb.entries.iter_mut() {
            entry.features = vec![0.0, 0.0];
        }
        let neighbors = find_neighbors(&[0.5, 0.5], &kb, 4).unwrap();
        assert_eq!(names(&neighbors), vec!["i1", "i2", "i3", "i4"]);
    }

    #[test]
    fn test_k_is_clamped() {
        let kb = toy_kb();
        assert_eq!(find_neighbors(&[0.0, 0.0], &kb, 100).unwrap().len(), 7);
        assert!(find_neighbors(&[0.0, 0.0], &kb, 0).unwrap().is_empty());
    }

    #[test]
    fn test_query_length_mismatch() {
        let kb = toy_kb();
        assert!(find_neighbors(&[0.0, 0.0, 0.0], &kb, 3).is_err());
    }
}
