use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

/// The session's local capture tracks.
///
/// Created once per session and shared as one `Arc` across every link, so
/// all remote peers receive the same tracks. Capture itself (devices,
/// encoding, writing samples into the tracks) lives outside this crate; the
/// enable flags below let that writer honor mute toggles without
/// renegotiating anything.
pub struct LocalMedia {
    audio: Arc<TrackLocalStaticSample>,
    video: Arc<TrackLocalStaticSample>,
    audio_enabled: AtomicBool,
    video_enabled: AtomicBool,
}

impl LocalMedia {
    pub fn new(stream_id: &str) -> Self {
        let audio = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                ..Default::default()
            },
            "audio".to_owned(),
            stream_id.to_owned(),
        ));
        let video = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "video".to_owned(),
            stream_id.to_owned(),
        ));
        Self {
            audio,
            video,
            audio_enabled: AtomicBool::new(true),
            video_enabled: AtomicBool::new(true),
        }
    }

    pub fn audio_track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.audio)
    }

    pub fn video_track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.video)
    }

    pub fn tracks(&self) -> Vec<(MediaKind, Arc<TrackLocalStaticSample>)> {
        vec![
            (MediaKind::Audio, Arc::clone(&self.audio)),
            (MediaKind::Video, Arc::clone(&self.video)),
        ]
    }

    pub fn set_audio_enabled(&self, enabled: bool) {
        self.audio_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_audio_enabled(&self) -> bool {
        self.audio_enabled.load(Ordering::Relaxed)
    }

    pub fn set_video_enabled(&self, enabled: bool) {
        self.video_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_video_enabled(&self) -> bool {
        self.video_enabled.load(Ordering::Relaxed)
    }
}

/// One incoming track from a remote peer, delivered when its link's
/// transport starts receiving media. Dropped (with the link) when the peer
/// leaves.
#[derive(Clone)]
pub struct RemoteMedia {
    id: String,
    kind: MediaKind,
    track: Option<Arc<TrackRemote>>,
}

impl RemoteMedia {
    pub fn new(id: String, kind: MediaKind, track: Arc<TrackRemote>) -> Self {
        Self {
            id,
            kind,
            track: Some(track),
        }
    }

    /// A handle without an underlying track, for transports that hand media
    /// to the application some other way.
    pub fn detached(id: String, kind: MediaKind) -> Self {
        Self {
            id,
            kind,
            track: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn track(&self) -> Option<&Arc<TrackRemote>> {
        self.track.as_ref()
    }
}

impl fmt::Debug for RemoteMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMedia")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}
