/// Fire-and-forget confirmation-stage collaborators.
///
/// The wizard invokes these on the terminal stage and never consumes a
/// return value: a failed celebration must not affect wizard state.
pub trait ConfirmationHooks: Send + Sync {
    /// Celebration effect shown when the team lands on the success stage.
    fn celebrate(&self);

    /// Outbound community invitation (chat group link and the like).
    fn invite_community(&self);

    /// Return-to-home navigation once the success stage is acknowledged.
    fn return_home(&self);
}

/// Hooks that do nothing, for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl ConfirmationHooks for NoopHooks {
    fn celebrate(&self) {}

    fn invite_community(&self) {}

    fn return_home(&self) {}
}
