use std::path::Path;

use super::{read_json, write_json};
use crate::core::keyword::{KeywordPair, KeywordPairList};
use crate::error::StorageError;

/// Load saved keyword pairs, or `None` when there is no usable file yet.
pub fn load_keywords(path: &Path) -> Option<KeywordPairList> {
    match read_json::<Vec<KeywordPair>>(path) {
        Ok(pairs) => pairs.map(KeywordPairList::new),
        Err(e) => {
            log::error!("Failed to load keywords from {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save_keywords(path: &Path, keywords: &KeywordPairList) -> Result<(), StorageError> {
    write_json(path, &keywords.to_vec())
}
