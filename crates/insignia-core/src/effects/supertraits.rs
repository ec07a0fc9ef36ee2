//! Composite effect bound for a badge session.

use super::{ClockEffects, PoseEffects, ReplicationEffects, RosterEffects, UiEffects, VisualEffects};

/// Everything a `BadgeSession` needs from its host.
pub trait BadgeEffects:
    RosterEffects + ReplicationEffects + VisualEffects + PoseEffects + ClockEffects + UiEffects
{
}

impl<T> BadgeEffects for T where
    T: RosterEffects + ReplicationEffects + VisualEffects + PoseEffects + ClockEffects + UiEffects
{
}
