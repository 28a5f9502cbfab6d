use uuid::Uuid;

/// Order two participant ids into the canonical `(one, two)` form used by the
/// conversations table. `Uuid` ordering compares the raw bytes, which agrees
/// with lexicographic order on the hyphenated lowercase text stored in SQLite,
/// so the `participant_one_id < participant_two_id` CHECK sees the same order.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}
