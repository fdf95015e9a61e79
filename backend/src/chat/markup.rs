//! Attachment markup embedded in message content.
//!
//! Stored messages carry attachments as inline HTML appended to the text, one
//! tag per line. This keeps rows readable by the web client that renders
//! `content` directly. Only the trailing tag lines written by
//! [`compose_content`] count as attachments; a typed line that looks like a
//! tag is stored with its `<` escaped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::services::media::MediaKind;

static IMAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<img src='([^']*)' class='message-image' />$").unwrap());

static VIDEO_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<video controls class='message-video'><source src='([^']*)' type='video/mp4'></video>$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub kind: MediaKind,
    pub path: String,
}

pub fn image_tag(path: &str) -> String {
    format!("<img src='{}' class='message-image' />", path)
}

pub fn video_tag(path: &str) -> String {
    format!(
        "<video controls class='message-video'><source src='{}' type='video/mp4'></video>",
        path
    )
}

/// Text followed by the image tag, then the video tag, newline separated.
pub fn compose_content(text: &str, image: Option<&str>, video: Option<&str>) -> String {
    let mut content = text
        .split('\n')
        .map(neutralize_line)
        .collect::<Vec<_>>()
        .join("\n");
    if let Some(path) = image {
        content.push('\n');
        content.push_str(&image_tag(path));
    }
    if let Some(path) = video {
        content.push('\n');
        content.push_str(&video_tag(path));
    }
    content
}

fn is_tag(line: &str) -> bool {
    IMAGE_TAG.is_match(line) || VIDEO_TAG.is_match(line)
}

fn tag_path(tag: &Regex, line: &str) -> Option<String> {
    tag.captures(line).map(|caps| caps[1].to_string())
}

fn neutralize_line(line: &str) -> String {
    if is_tag(line) {
        line.replace('<', "&lt;")
    } else {
        line.to_string()
    }
}

/// Splits stored content back into its text and attachments.
///
/// Reads at most one video tag on the last line and one image tag right
/// before it; everything above is text.
pub fn split_content(content: &str) -> (String, Vec<Attachment>) {
    let mut lines: Vec<&str> = content.split('\n').collect();

    let video = lines.last().and_then(|line| tag_path(&VIDEO_TAG, line));
    if video.is_some() {
        lines.pop();
    }
    let image = lines.last().and_then(|line| tag_path(&IMAGE_TAG, line));
    if image.is_some() {
        lines.pop();
    }

    let attachments = image
        .map(|path| Attachment { kind: MediaKind::Image, path })
        .into_iter()
        .chain(video.map(|path| Attachment { kind: MediaKind::Video, path }))
        .collect();

    (lines.join("\n"), attachments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_matches_stored_layout() {
        let content = compose_content(
            "fresh tomatoes",
            Some("assets/images/1/images_1.png"),
            Some("assets/videos/1/videos_1.mp4"),
        );
        assert_eq!(
            content,
            "fresh tomatoes\n<img src='assets/images/1/images_1.png' class='message-image' />\n\
             <video controls class='message-video'><source src='assets/videos/1/videos_1.mp4' type='video/mp4'></video>"
        );
    }

    #[test]
    fn test_split_recovers_text_and_attachments() {
        let content = compose_content("line one\nline two", None, Some("v.mp4"));
        let (text, attachments) = split_content(&content);
        assert_eq!(text, "line one\nline two");
        assert_eq!(
            attachments,
            vec![Attachment { kind: MediaKind::Video, path: "v.mp4".to_string() }]
        );
    }

    #[test]
    fn test_attachment_only_message_has_empty_text() {
        let content = compose_content("", Some("a.jpg"), None);
        let (text, attachments) = split_content(&content);
        assert_eq!(text, "");
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].kind, MediaKind::Image);
    }

    #[test]
    fn test_typed_tags_are_not_attachments() {
        let typed = "look\n<img src='/etc/passwd' class='message-image' />";
        let content = compose_content(typed, None, None);
        assert_eq!(content, "look\n&lt;img src='/etc/passwd' class='message-image' />");

        let (text, attachments) = split_content(&content);
        assert!(attachments.is_empty());
        assert_eq!(text, content);
    }

    #[test]
    fn test_typed_tag_before_real_attachment() {
        let forged = "<video controls class='message-video'><source src='/x.mp4' type='video/mp4'></video>";
        let content = compose_content(forged, Some("real.png"), None);
        let (text, attachments) = split_content(&content);
        assert_eq!(attachments, vec![Attachment { kind: MediaKind::Image, path: "real.png".to_string() }]);
        assert!(text.starts_with("&lt;video"));
    }

    #[test]
    fn test_only_trailing_tags_are_parsed() {
        let content = "<img src='a.png' class='message-image' />\nsee above";
        let (text, attachments) = split_content(content);
        assert!(attachments.is_empty());
        assert_eq!(text, content);

        // Tags must be whole lines
        let (_, attachments) = split_content("x\nsee <img src='a.png' class='message-image' />");
        assert!(attachments.is_empty());
    }

    #[test]
    fn test_plain_text_untouched() {
        let (text, attachments) = split_content("no <b>media</b> here");
        assert_eq!(text, "no <b>media</b> here");
        assert!(attachments.is_empty());
    }
}
