use crate::{Entry, SeenSet};

/// Returns the candidates not yet in `seen`, in page order, without duplicates.
///
/// Each new entry is inserted into `seen` as soon as it is found, so a heading
/// repeated on the same page is reported once.
pub fn compute_delta(
    candidates: impl IntoIterator<Item = Entry>,
    seen: &mut SeenSet,
) -> Vec<Entry> {
    candidates
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}
