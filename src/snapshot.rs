/// Capture-and-rollback contract for digests built on the accumulation
/// engine.
///
/// A snapshot is an independent deep copy of the entire mutable state:
/// the engine's word buffer, offset, and byte count together with the
/// algorithm's registers. Once captured it is never affected by further
/// mutation of the originating instance, which makes cheap in-process
/// branching possible ("checkpoint, hash a few more chunks speculatively,
/// roll back") without going through the portable byte-serialised state.
///
/// Both methods are typed over `Self`, so restoring from a snapshot of a
/// different concrete digest is impossible by construction rather than a
/// runtime failure.
pub trait Snapshot: Sized {
    /// Returns an independent copy of the current state.
    #[must_use]
    fn capture(&self) -> Self;

    /// Overwrites this instance's entire mutable state with a previously
    /// captured snapshot.
    ///
    /// Implementations reuse existing storage; for the digests in this
    /// crate all state is inline fixed-size arrays and scalars, so no
    /// allocation takes place.
    fn restore(&mut self, snapshot: &Self);
}
