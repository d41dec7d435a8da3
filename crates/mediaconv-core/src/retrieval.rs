//! Partial retrieval of a media item's payloads.
//!
//! Selection is all-or-nothing: one out-of-range index rejects the whole request.

use crate::constants::ALL_VARIANTS_SENTINEL;
use crate::error::AppError;
use crate::models::{MediaItem, MediaSource, MediaView};

/// True when `indices` asks for every stored variant.
pub fn is_all_variants(indices: &[i64]) -> bool {
    indices.is_empty() || indices == [ALL_VARIANTS_SENTINEL]
}

/// Build the view of `item` requested by `source` and `indices`.
///
/// An empty index list is read as `[-1]`. Explicit selections keep the caller's order and
/// duplicates; `-1` inside an explicit selection refers to the last variant. Indices are
/// ignored when `source` excludes processed variants.
pub fn select_view(
    item: &MediaItem,
    source: MediaSource,
    indices: &[i64],
) -> Result<MediaView, AppError> {
    let indices = if indices.is_empty() {
        vec![ALL_VARIANTS_SENTINEL]
    } else {
        indices.to_vec()
    };
    let total = item.processed_variants.len();

    let processed_variants = if source.includes_processed() {
        Some(select_variants(item, &indices)?)
    } else {
        None
    };

    Ok(MediaView {
        id: item.id,
        file_name: item.file_name.clone(),
        file_type: item.file_type,
        processed_total_count: total,
        processed_count: processed_variants.as_ref().map(Vec::len).unwrap_or(0),
        indices,
        raw_payload: source
            .includes_raw()
            .then(|| item.raw_payload.clone()),
        processed_variants,
    })
}

fn select_variants(item: &MediaItem, indices: &[i64]) -> Result<Vec<bytes::Bytes>, AppError> {
    let variants = &item.processed_variants;
    if is_all_variants(indices) {
        return Ok(variants.clone());
    }

    let total = variants.len() as i64;
    if let Some(bad) = indices.iter().find(|&&i| i < ALL_VARIANTS_SENTINEL || i >= total) {
        return Err(AppError::BadRequest(format!(
            "Invalid indexes selected: index {} is out of range for {} processed variants",
            bad, total
        )));
    }

    indices
        .iter()
        .map(|&i| {
            let position = if i == ALL_VARIANTS_SENTINEL { total - 1 } else { i };
            // total == 0 leaves -1 unresolvable
            usize::try_from(position)
                .ok()
                .and_then(|p| variants.get(p).cloned())
                .ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "Invalid indexes selected: item has no processed variants to select {}",
                        i
                    ))
                })
        })
        .collect()
}
