use super::LanguageTable;
use crate::{Entity, EntityId};
use ndarray::Array2;
use std::collections::{BTreeSet, HashMap};

/// Bag-of-languages vectors per repository.
///
/// Columns are the languages seen anywhere in the table, sorted by name; rows
/// follow the table's ids in sorted order. With `normalize`, each row is
/// L1-normalized so it reads as a language distribution.
#[derive(Debug, Clone)]
pub struct LanguageVector {
    languages: Vec<String>,
    samples: HashMap<EntityId, usize>,
    features: Array2<f64>,
}

impl LanguageVector {
    pub fn new(table: &LanguageTable, normalize: bool) -> Self {
        let languages: Vec<String> = table
            .values()
            .flat_map(|langs| langs.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns: HashMap<&str, usize> = languages
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let mut ids: Vec<&EntityId> = table.keys().collect();
        ids.sort();

        let mut features = Array2::zeros((ids.len(), languages.len()));
        let mut samples = HashMap::with_capacity(ids.len());
        for (row, id) in ids.into_iter().enumerate() {
            samples.insert(id.clone(), row);
            for (lang, &bytes) in &table[id] {
                features[[row, columns[lang.as_str()]]] = bytes;
            }
            if normalize {
                let total: f64 = features.row(row).iter().map(|v| v.abs()).sum();
                if total > 0.0 {
                    features.row_mut(row).mapv_inplace(|v| v / total);
                }
            }
        }

        Self {
            languages,
            samples,
            features,
        }
    }

    /// Column names.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn feature_count(&self) -> usize {
        self.languages.len()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn sample_index(&self, id: &EntityId) -> Option<usize> {
        self.samples.get(id).copied()
    }

    /// Rows for `entities` in order; repositories without languages are zero.
    pub fn features_for(&self, entities: &[Entity]) -> Array2<f64> {
        let mut out = Array2::zeros((entities.len(), self.feature_count()));
        for (i, entity) in entities.iter().enumerate() {
            if let Some(row) = self.sample_index(&entity.id) {
                out.row_mut(i).assign(&self.features.row(row));
            }
        }
        out
    }
}
