use std::sync::atomic::{AtomicU32, Ordering};

use serde::Serialize;

/// Mute defaults applied to every room the orchestrator provisions.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MuteDefaults {
    pub audio: bool,
    pub video: bool,
}

impl Default for MuteDefaults {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// An ephemeral meeting room: collision-resistant id plus join URL.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingRoom {
    pub room_id: String,
    pub join_url: String,
    pub mute: MuteDefaults,
}

/// Derives room identities from incident ids.
///
/// The incident id stays as a readable prefix; the 8-hex-char suffix walks a
/// Weyl sequence from a random seed, so repeated builds for the same incident
/// can never collide within a process while staying unpredictable across
/// processes.
pub struct RoomBuilder {
    base_url: String,
    mute: MuteDefaults,
    seq: AtomicU32,
}

const SUFFIX_STEP: u32 = 0x9E37_79B9;

impl RoomBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            mute: MuteDefaults::default(),
            seq: AtomicU32::new(rand::random()),
        }
    }

    pub fn build(&self, incident_id: &str) -> MeetingRoom {
        let suffix = self
            .seq
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_mul(SUFFIX_STEP);
        let room_id = format!("{incident_id}-{suffix:08x}");
        let join_url = format!(
            "{}/{}?config.startWithAudioMuted={}&config.startWithVideoMuted={}",
            self.base_url,
            urlencoding::encode(&room_id),
            self.mute.audio,
            self.mute.video,
        );
        MeetingRoom {
            room_id,
            join_url,
            mute: self.mute,
        }
    }
}
