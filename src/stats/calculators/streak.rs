/// Signed run length after one more result: positive counts consecutive
/// wins, negative counts consecutive losses. A result that breaks a run
/// restarts it at 1 or -1.
pub fn next_streak(current: i32, won: bool) -> i32 {
    match (won, current) {
        (true, c) if c >= 0 => c + 1,
        (true, _) => 1,
        (false, c) if c <= 0 => c - 1,
        (false, _) => -1,
    }
}

/// Value that is actually persisted. Negative runs are stored as zero, so a
/// loss streak is never visible on a snapshot.
// TODO: persist the signed value once readers of `streak` handle negatives.
pub fn persisted_streak(current: i32, won: bool) -> i32 {
    next_streak(current, won).max(0)
}
