/// Whether usage accumulated under `stored_hour` must be discarded now that
/// the clock reads `current_hour`.
///
/// `None` means nothing has been stored yet: start fresh without a reset.
pub fn should_reset(stored_hour: Option<u32>, current_hour: u32) -> bool {
    matches!(stored_hour, Some(hour) if hour != current_hour)
}
