//! Video source classification
//!
//! Maps an arbitrary URL to a [`SourceDescriptor`] by walking three ordered
//! rule tiers (supported, extended, unsupported); the first matching rule wins.
//! [`to_playable_reference`] turns a classifiable URL into something the player
//! can load: the URL itself, a rewritten direct-download link, or an embed tag
//! for platforms that can only play inside their own player.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportTier {
    /// Known to play
    Supported,
    /// Matched but unverified; may need extra processing
    Extended,
    /// DRM-protected, unknown, or invalid
    Unsupported,
}

impl fmt::Display for SupportTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportTier::Supported => write!(f, "supported"),
            SupportTier::Extended => write!(f, "extended"),
            SupportTier::Unsupported => write!(f, "unsupported"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDescriptor {
    pub platform: &'static str,
    pub tier: SupportTier,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_id: Option<String>,
}

impl SourceDescriptor {
    pub fn is_supported(&self) -> bool {
        self.tier != SupportTier::Unsupported
    }

    fn invalid() -> Self {
        Self {
            platform: UNKNOWN_PLATFORM,
            tier: SupportTier::Unsupported,
            description: "Invalid URL provided".to_string(),
            extracted_id: None,
        }
    }

    fn unknown() -> Self {
        Self {
            platform: UNKNOWN_PLATFORM,
            tier: SupportTier::Unsupported,
            description: "Unknown video source or format not supported".to_string(),
            extracted_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmbedPlatform {
    YouTube,
    Vimeo,
}

/// What the video control surface should load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlayableReference {
    /// Loadable as-is by the native player
    Direct { url: String },
    /// Must be routed to the platform's embedded player; direct playback fails
    Embed {
        platform: EmbedPlatform,
        url: String,
        video_id: String,
    },
}

impl PlayableReference {
    pub fn url(&self) -> &str {
        match self {
            PlayableReference::Direct { url } | PlayableReference::Embed { url, .. } => url,
        }
    }

    pub fn needs_embed(&self) -> bool {
        matches!(self, PlayableReference::Embed { .. })
    }

    /// Player URL for embed references
    pub fn embed_url(&self) -> Option<String> {
        match self {
            PlayableReference::Direct { .. } => None,
            PlayableReference::Embed {
                platform: EmbedPlatform::YouTube,
                video_id,
                ..
            } => Some(format!(
                "https://www.youtube.com/embed/{}?autoplay=0&controls=1&rel=0&modestbranding=1&playsinline=1",
                video_id
            )),
            PlayableReference::Embed {
                platform: EmbedPlatform::Vimeo,
                video_id,
                ..
            } => Some(format!(
                "https://player.vimeo.com/video/{}?autoplay=0&playsinline=1&api=1",
                video_id
            )),
        }
    }
}

// ============================================================================
// Rule tables
// ============================================================================

const UNKNOWN_PLATFORM: &str = "Unknown";
const DIRECT_VIDEO: &str = "Direct Video";
const YOUTUBE: &str = "YouTube";
const VIMEO: &str = "Vimeo";
const GOOGLE_DRIVE: &str = "Google Drive";
const DROPBOX: &str = "Dropbox";

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "webm", "ogg", "ogv", "mov", "avi", "mkv", "flv", "wmv", "m4v",
];
const STREAMING_EXTENSIONS: &[&str] = &["m3u8", "mpd"];
const SPECIAL_HANDLING: &[&str] = &[YOUTUBE, VIMEO, "Twitch", "Facebook", "Instagram", "TikTok"];

const SUPPORTED_RULES: &[(&str, &str)] = &[
    // Direct files, bare or with a query string
    (r"(?i).*\.(mp4|webm|ogg|ogv|mov|avi|mkv|flv|wmv|m4v)$", DIRECT_VIDEO),
    (r"(?i).*\.mp4(\?.*)?$", DIRECT_VIDEO),
    (r"(?i).*/(video|media)/.*\.(mp4|webm|ogg|ogv|mov|avi|mkv|flv|wmv|m4v)", DIRECT_VIDEO),
    // Streaming
    (r"(?i).*\.m3u8$", "HLS Stream"),
    (r"(?i).*\.mpd$", "DASH Stream"),
    (r"^rtmp://.*", "RTMP Stream"),
    // YouTube
    (r"(?i)(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)([\w-]+)", YOUTUBE),
    (r"(?i)youtube\.com/watch\?.*[&?]v=([\w-]+)", YOUTUBE),
    // Platforms
    (r"vimeo\.com/\d+", VIMEO),
    (r"vimeo\.com/video/\d+", VIMEO),
    (r"twitch\.tv/videos/\d+", "Twitch"),
    (r"twitch\.tv/\w+", "Twitch"),
    (r"facebook\.com/watch/\?v=\d+", "Facebook"),
    (r"fb\.watch/[\w-]+", "Facebook"),
    // Cloud storage
    (r"drive\.google\.com/file/d/[\w-]+/view", GOOGLE_DRIVE),
    (r"drive\.google\.com/open\?id=[\w-]+", GOOGLE_DRIVE),
    (r"dropbox\.com/s/[\w-]+/.*\.(mp4|webm|ogg|ogv)", DROPBOX),
    (r"dropbox\.com/scl/fi/[\w-]+/.*\.(mp4|webm|ogg|ogv)", DROPBOX),
    // CDNs and sample hosts
    (r".*\.cloudfront\.net/.*\.(mp4|webm|ogg|ogv)", "CloudFront CDN"),
    (r".*\.amazonaws\.com/.*\.(mp4|webm|ogg|ogv)", "AWS S3"),
    (r".*\.googleapis\.com/.*\.(mp4|webm|ogg|ogv)", "Google Cloud"),
    (r"sample-videos\.com/.*\.(mp4|webm|ogg|ogv)", "Sample Videos"),
    (r"learningcontainer\.com/.*\.(mp4|webm|ogg|ogv)", "Learning Container"),
];

const EXTENDED_RULES: &[(&str, &str)] = &[
    // Social
    (r"twitter\.com/.*/status/\d+", "Twitter"),
    (r"x\.com/.*/status/\d+", "X (Twitter)"),
    (r"instagram\.com/(reel|p|tv)/[\w-]+", "Instagram"),
    (r"instagram\.com/stories/[\w.-]+/\d+", "Instagram Stories"),
    (r"tiktok\.com/@[\w.-]+/video/\d+", "TikTok"),
    (r"reddit\.com/r/\w+/comments/[\w-]+", "Reddit"),
    (r"v\.redd\.it/[\w-]+", "Reddit Video"),
    (r"gfycat\.com/[\w-]+", "Gfycat"),
    // International
    (r"bilibili\.com/video/[A-Za-z0-9]+", "Bilibili"),
    (r"youku\.com/v_show/id_[\w=]+", "Youku"),
    (r"tudou\.com/programs/view/[\w-]+", "Tudou"),
    (r"iqiyi\.com/v_[\w-]+", "iQiyi"),
    (r"qq\.com/x/cover/[\w-]+", "Tencent Video"),
    (r"weibo\.com/tv/show/\d+", "Weibo Video"),
    (r"douyin\.com/video/\d+", "Douyin"),
    // Live
    (r"twitch\.tv/\w+/clip/[\w-]+", "Twitch Clip"),
    (r"youtube\.com/live/[\w-]+", "YouTube Live"),
    (r"kick\.com/[\w-]+", "Kick"),
    // File hosting
    (r"mediafire\.com/file/[\w-]+", "MediaFire"),
    (r"mega\.nz/(file|embed)/[\w-]+", "MEGA"),
    (r"4shared\.com/video/[\w-]+", "4shared"),
    (r"sendvid\.com/[\w-]+", "SendVid"),
    (r"streamable\.com/[\w-]+", "Streamable"),
];

const UNSUPPORTED_RULES: &[(&str, &str)] = &[
    // DRM streaming
    (r"netflix\.com", "Netflix"),
    (r"disneyplus\.com", "Disney+"),
    (r"hbomax\.com", "HBO Max"),
    (r"hbo\.com", "HBO"),
    (r"primevideo\.com", "Amazon Prime Video"),
    (r"amazon\.com/gp/video", "Amazon Prime Video"),
    (r"apple\.com/tv", "Apple TV+"),
    (r"tv\.apple\.com", "Apple TV+"),
    (r"hulu\.com", "Hulu"),
    (r"peacocktv\.com", "Peacock"),
    (r"paramountplus\.com", "Paramount+"),
    (r"crunchyroll\.com", "Crunchyroll"),
    // Regional
    (r"bbc\.co\.uk/iplayer", "BBC iPlayer"),
    (r"itv\.com/hub", "ITV Hub"),
    (r"cbc\.ca/player", "CBC Gem"),
    // Music, education, live TV
    (r"spotify\.com", "Spotify"),
    (r"music\.apple\.com", "Apple Music"),
    (r"coursera\.org", "Coursera"),
    (r"udemy\.com", "Udemy"),
    (r"linkedin\.com/learning", "LinkedIn Learning"),
    (r"sling\.com", "Sling TV"),
    (r"youtubetv\.com", "YouTube TV"),
    (r"fubo\.tv", "fuboTV"),
];

struct Rule {
    regex: Regex,
    platform: &'static str,
}

fn compile(table: &[(&str, &'static str)]) -> Vec<Rule> {
    table
        .iter()
        .map(|(pattern, platform)| Rule {
            regex: Regex::new(pattern).expect("source rule pattern"),
            platform,
        })
        .collect()
}

static TIERS: Lazy<[(SupportTier, Vec<Rule>); 3]> = Lazy::new(|| {
    [
        (SupportTier::Supported, compile(SUPPORTED_RULES)),
        (SupportTier::Extended, compile(EXTENDED_RULES)),
        (SupportTier::Unsupported, compile(UNSUPPORTED_RULES)),
    ]
});

static YOUTUBE_ID: Lazy<[Regex; 4]> = Lazy::new(|| {
    // Short form first: a youtu.be link can carry a `v=` parameter of its own
    [
        r"(?i)youtu\.be/([\w-]+)",
        r"(?i)(?:youtube\.com/watch\?.*[&?]v=|youtube\.com/watch\?v=)([\w-]+)",
        r"(?i)youtube\.com/embed/([\w-]+)",
        r"(?i)youtube\.com/v/([\w-]+)",
    ]
    .map(|p| Regex::new(p).expect("youtube id pattern"))
});

static VIMEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"vimeo\.com/(?:.*/)?(\d+)").expect("vimeo id pattern"));

static DRIVE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:/d/|[?&]id=)([a-zA-Z0-9_-]+)").expect("drive id pattern")
});

static EXTENSION_AT_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.([a-zA-Z0-9]+)(?:[?#].*)?$").expect("extension pattern"));

static EXTENSION_IN_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/[^/]*\.([a-zA-Z0-9]+)(?:[?#/].*)?").expect("extension pattern"));

static FORMAT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(mp4|webm|ogg|ogv|mov|avi|mkv|flv|wmv|m4v)\b").expect("format pattern")
});

// ============================================================================
// Classification
// ============================================================================

/// Classify a URL. Never fails: blank input and unknown URLs come back as
/// `Unsupported` with platform "Unknown".
pub fn classify(url: &str) -> SourceDescriptor {
    let url = url.trim();
    if url.is_empty() {
        return SourceDescriptor::invalid();
    }

    for (tier, rules) in TIERS.iter() {
        let Some(rule) = rules.iter().find(|rule| rule.regex.is_match(url)) else {
            continue;
        };
        let platform = rule.platform;
        return match tier {
            SupportTier::Supported => SourceDescriptor {
                platform,
                tier: *tier,
                description: format!("Supported {} video source - Ready to play", platform),
                extracted_id: match platform {
                    YOUTUBE => youtube_video_id(url),
                    VIMEO => vimeo_video_id(url),
                    _ => None,
                },
            },
            SupportTier::Extended => SourceDescriptor {
                platform,
                tier: *tier,
                description: format!(
                    "Extended {} support - May require additional processing or have limitations",
                    platform
                ),
                extracted_id: None,
            },
            SupportTier::Unsupported => SourceDescriptor {
                platform,
                tier: *tier,
                description: format!(
                    "{} is not supported due to DRM/copyright restrictions",
                    platform
                ),
                extracted_id: None,
            },
        };
    }

    SourceDescriptor::unknown()
}

/// Normalize a URL into something the player can load.
///
/// Unsupported sources are a hard failure; callers must not attempt playback.
pub fn to_playable_reference(url: &str) -> Result<PlayableReference, SourceError> {
    let url = url.trim();
    let descriptor = classify(url);
    if !descriptor.is_supported() {
        return Err(SourceError::Unsupported {
            platform: descriptor.platform.to_string(),
            description: descriptor.description,
        });
    }

    let embed = match descriptor.platform {
        YOUTUBE => Some(EmbedPlatform::YouTube),
        VIMEO => Some(EmbedPlatform::Vimeo),
        _ => None,
    };
    if let Some(platform) = embed {
        let video_id = descriptor
            .extracted_id
            .ok_or_else(|| SourceError::MissingVideoId {
                platform: descriptor.platform.to_string(),
            })?;
        return Ok(PlayableReference::Embed {
            platform,
            url: url.to_string(),
            video_id,
        });
    }

    // Dropbox links ending in .mp4 classify as direct files first but still
    // need the download flag
    let url = if descriptor.platform == GOOGLE_DRIVE {
        drive_direct_url(url).unwrap_or_else(|| url.to_string())
    } else if descriptor.platform == DROPBOX || url.to_ascii_lowercase().contains("dropbox.com/") {
        dropbox_direct_url(url)
    } else {
        url.to_string()
    };
    Ok(PlayableReference::Direct { url })
}

fn drive_direct_url(url: &str) -> Option<String> {
    let id = DRIVE_ID.captures(url)?.get(1)?.as_str();
    Some(format!("https://drive.google.com/uc?export=download&id={}", id))
}

fn dropbox_direct_url(url: &str) -> String {
    if url.contains("dl=1") {
        url.to_string()
    } else if url.contains("dl=0") {
        url.replacen("dl=0", "dl=1", 1)
    } else {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}dl=1", url, separator)
    }
}

/// Video id from any YouTube URL form, with trailing parameters stripped
pub fn youtube_video_id(url: &str) -> Option<String> {
    YOUTUBE_ID
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Numeric Vimeo id from any path form
pub fn vimeo_video_id(url: &str) -> Option<String> {
    VIMEO_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

// ============================================================================
// URL helpers
// ============================================================================

/// Everything after the authority: path, query and fragment. Input without a
/// scheme is taken as a path already.
fn path_part(url: &str) -> &str {
    let Some(at) = url.find("://") else {
        return url;
    };
    let rest = &url[at + 3..];
    match rest.find(['/', '?', '#']) {
        Some(start) => &rest[start..],
        None => "",
    }
}

/// Lowercased file extension, looking at the end of the path first, then
/// anywhere in the path, then for a bare format token. The host never counts.
pub fn file_extension(url: &str) -> Option<String> {
    let path = path_part(url.trim());
    if path.is_empty() {
        return None;
    }
    [&*EXTENSION_AT_END, &*EXTENSION_IN_PATH, &*FORMAT_TOKEN]
        .iter()
        .find_map(|re| re.captures(path))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

pub fn is_direct_video_file(url: &str) -> bool {
    file_extension(url).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_streaming_format(url: &str) -> bool {
    if url.trim().to_ascii_lowercase().starts_with("rtmp://") {
        return true;
    }
    file_extension(url).is_some_and(|ext| STREAMING_EXTENSIONS.contains(&ext.as_str()))
}

/// Platforms that need their own player or extra handling
pub fn requires_special_handling(url: &str) -> bool {
    SPECIAL_HANDLING.contains(&classify(url).platform)
}

/// An http(s) URL the native player can load: supported or extended, and not
/// an embed-only platform
pub fn is_valid_video_url(url: &str) -> bool {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return false;
    }
    let descriptor = classify(url);
    descriptor.is_supported() && descriptor.platform != YOUTUBE
}

pub fn describe(url: &str) -> String {
    classify(url).description
}

pub fn platform(url: &str) -> &'static str {
    classify(url).platform
}

/// Resolution hint for direct files, from tokens in the URL
pub fn optimal_quality(url: &str) -> &'static str {
    if classify(url).platform != DIRECT_VIDEO {
        return "Auto";
    }
    const HINTS: &[(&[&str], &str)] = &[
        (&["4k", "2160p"], "4K (2160p)"),
        (&["1440p", "2k"], "2K (1440p)"),
        (&["1080p", "fhd"], "Full HD (1080p)"),
        (&["720p", "hd"], "HD (720p)"),
        (&["480p"], "SD (480p)"),
        (&["360p"], "Low (360p)"),
    ];
    HINTS
        .iter()
        .find(|(tokens, _)| tokens.iter().any(|t| url.contains(t)))
        .map(|(_, label)| *label)
        .unwrap_or("Auto")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        assert!(TIERS.iter().all(|(_, rules)| !rules.is_empty()));
        assert_eq!(YOUTUBE_ID.len(), 4);
        Lazy::force(&VIMEO_ID);
        Lazy::force(&DRIVE_ID);
        Lazy::force(&EXTENSION_AT_END);
        Lazy::force(&EXTENSION_IN_PATH);
        Lazy::force(&FORMAT_TOKEN);
    }

    #[test]
    fn test_direct_files() {
        for url in [
            "https://example.com/movie.mp4",
            "https://example.com/movie.MP4",
            "https://example.com/movie.mp4?token=abc",
            "https://example.com/clip.webm",
            "https://example.com/media/clip.mkv?x=1",
        ] {
            let d = classify(url);
            assert_eq!(d.tier, SupportTier::Supported, "{}", url);
            assert_eq!(d.platform, "Direct Video", "{}", url);
            assert_eq!(
                to_playable_reference(url).unwrap(),
                PlayableReference::Direct { url: url.to_string() }
            );
        }
    }

    #[test]
    fn test_streams() {
        assert_eq!(classify("https://cdn.example.com/live/index.m3u8").platform, "HLS Stream");
        assert_eq!(classify("https://cdn.example.com/manifest.mpd").platform, "DASH Stream");
        assert_eq!(classify("rtmp://live.example.com/app/key").platform, "RTMP Stream");
    }

    #[test]
    fn test_youtube_forms_share_id() {
        let forms = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abc123",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "HTTPS://WWW.YOUTUBE.COM/watch?v=dQw4w9WgXcQ",
        ];
        for url in forms {
            let d = classify(url);
            assert_eq!(d.platform, "YouTube", "{}", url);
            assert_eq!(d.extracted_id.as_deref(), Some("dQw4w9WgXcQ"), "{}", url);
        }
    }

    #[test]
    fn test_youtube_is_embed_reference() {
        let url = "https://youtu.be/dQw4w9WgXcQ";
        let reference = to_playable_reference(url).unwrap();
        assert!(reference.needs_embed());
        assert_eq!(reference.url(), url);
        assert_eq!(
            reference.embed_url().unwrap(),
            "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=0&controls=1&rel=0&modestbranding=1&playsinline=1"
        );
    }

    #[test]
    fn test_vimeo() {
        for url in [
            "https://vimeo.com/76979871",
            "https://player.vimeo.com/video/76979871",
        ] {
            let d = classify(url);
            assert_eq!(d.platform, "Vimeo", "{}", url);
            assert_eq!(d.extracted_id.as_deref(), Some("76979871"), "{}", url);
        }
        assert_eq!(
            vimeo_video_id("https://vimeo.com/channels/staffpicks/76979871").as_deref(),
            Some("76979871")
        );
        let reference = to_playable_reference("https://vimeo.com/76979871").unwrap();
        assert_eq!(
            reference.embed_url().unwrap(),
            "https://player.vimeo.com/video/76979871?autoplay=0&playsinline=1&api=1"
        );
    }

    #[test]
    fn test_google_drive_rewrite() {
        let expected = "https://drive.google.com/uc?export=download&id=1AbC-d_EF";
        for url in [
            "https://drive.google.com/file/d/1AbC-d_EF/view",
            "https://drive.google.com/file/d/1AbC-d_EF/view?usp=sharing",
            "https://drive.google.com/open?id=1AbC-d_EF",
        ] {
            assert_eq!(classify(url).platform, "Google Drive", "{}", url);
            assert_eq!(to_playable_reference(url).unwrap().url(), expected, "{}", url);
        }
    }

    #[test]
    fn test_dropbox_rewrite() {
        let r = |u: &str| to_playable_reference(u).unwrap().url().to_string();
        assert_eq!(
            r("https://www.dropbox.com/s/abc123/clip.mp4?dl=0"),
            "https://www.dropbox.com/s/abc123/clip.mp4?dl=1"
        );
        assert_eq!(
            r("https://www.dropbox.com/scl/fi/xyz/clip.webm?rlkey=k"),
            "https://www.dropbox.com/scl/fi/xyz/clip.webm?rlkey=k&dl=1"
        );
        assert_eq!(
            r("https://www.dropbox.com/s/abc123/clip.mp4?dl=1"),
            "https://www.dropbox.com/s/abc123/clip.mp4?dl=1"
        );
    }

    #[test]
    fn test_extended_tier() {
        let d = classify("https://www.bilibili.com/video/BV1xx411c7mD");
        assert_eq!(d.tier, SupportTier::Extended);
        assert_eq!(d.platform, "Bilibili");
        assert!(d.extracted_id.is_none());
        assert!(!to_playable_reference("https://streamable.com/abc12").unwrap().needs_embed());
    }

    #[test]
    fn test_drm_platforms() {
        let d = classify("https://www.netflix.com/watch/80100172");
        assert_eq!(d.tier, SupportTier::Unsupported);
        assert_eq!(d.platform, "Netflix");
        assert_eq!(d.description, "Netflix is not supported due to DRM/copyright restrictions");
        assert_ne!(d.description, SourceDescriptor::unknown().description);

        let err = to_playable_reference("https://www.netflix.com/watch/80100172").unwrap_err();
        assert!(matches!(err, SourceError::Unsupported { ref platform, .. } if platform == "Netflix"));
    }

    #[test]
    fn test_invalid_and_unknown() {
        for url in ["", "   "] {
            let d = classify(url);
            assert_eq!(d.tier, SupportTier::Unsupported);
            assert_eq!(d.platform, "Unknown");
            assert_eq!(d.description, "Invalid URL provided");
        }
        let d = classify("https://example.com/about");
        assert_eq!(d.platform, "Unknown");
        assert_eq!(d.description, "Unknown video source or format not supported");
        assert!(to_playable_reference("https://example.com/about").is_err());
        assert!(to_playable_reference("").is_err());
    }

    #[test]
    fn test_supported_checked_before_extended() {
        // The supported Twitch channel rule shadows the extended clip rule
        assert_eq!(classify("https://www.twitch.tv/someone/clip/Abc-123").platform, "Twitch");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("https://a.com/v.MP4").as_deref(), Some("mp4"));
        assert_eq!(file_extension("https://a.com/v.mp4?x=1#t=3").as_deref(), Some("mp4"));
        assert_eq!(file_extension(""), None);
        assert!(is_direct_video_file("https://a.com/v.mov"));
        assert!(!is_direct_video_file("https://a.com/live.m3u8"));
        assert!(is_streaming_format("https://a.com/live.m3u8"));
        assert!(is_streaming_format("https://a.com/manifest.mpd?token=1"));
    }

    #[test]
    fn test_url_helpers() {
        assert!(requires_special_handling("https://youtu.be/abc"));
        assert!(requires_special_handling("https://fb.watch/xyz"));
        assert!(!requires_special_handling("https://a.com/v.mp4"));

        assert!(is_valid_video_url("https://a.com/v.mp4"));
        assert!(is_valid_video_url("https://streamable.com/abc12"));
        assert!(!is_valid_video_url("https://youtu.be/abc"));
        assert!(!is_valid_video_url("rtmp://live.example.com/app"));
        assert!(!is_valid_video_url("https://www.netflix.com/title/1"));

        assert_eq!(platform("https://a.com/hls/index.m3u8"), "HLS Stream");
        assert_eq!(describe("https://a.com/v.mp4"), "Supported Direct Video video source - Ready to play");
    }

    #[test]
    fn test_optimal_quality() {
        assert_eq!(optimal_quality("https://a.com/movie_1080p.mp4"), "Full HD (1080p)");
        assert_eq!(optimal_quality("https://a.com/movie-4k.mp4"), "4K (2160p)");
        assert_eq!(optimal_quality("https://a.com/movie.mp4"), "Auto");
        assert_eq!(optimal_quality("https://youtu.be/1080p"), "Auto");
    }
}
