use anyhow::Result;

/// Capability interface over one automated meeting participant.
///
/// Concrete implementations own the underlying automation resource (for the
/// production driver, a headless browser process). `close` must be safe to
/// call after a partial `join` and must release everything that was acquired.
#[async_trait::async_trait]
pub trait MeetingDriver: Send {
    /// Acquire the automation resource and enter the room at `join_url`.
    async fn join(&mut self, join_url: &str) -> Result<()>;

    /// Apply the participant display name. Implementations may reload or
    /// reconnect internally for the name to take effect.
    async fn set_display_name(&mut self, name: &str) -> Result<()>;

    /// Apply mute preferences for audio and video.
    async fn set_mute(&mut self, audio: bool, video: bool) -> Result<()>;

    /// Cheap liveness probe issued periodically while holding the room.
    async fn keepalive(&mut self) -> Result<()>;

    /// Release the automation resource. Idempotent.
    async fn close(&mut self) -> Result<()>;

    /// Driver name for logging.
    fn name(&self) -> &str;
}

/// Hands one fresh driver per bot session.
pub trait MeetingDriverFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn MeetingDriver>>;
}
