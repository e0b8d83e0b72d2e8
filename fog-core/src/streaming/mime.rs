//! MIME type resolution for audio references.

use std::path::Path;

/// Served when nothing more specific can be determined.
pub const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// Known audio extensions, lowercase, without the dot.
const AUDIO_MIME_TYPES: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("m4a", "audio/mp4"),
    ("mp4", "audio/mp4"),
    ("aac", "audio/aac"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("opus", "audio/opus"),
    ("flac", "audio/flac"),
    ("webm", "audio/webm"),
    ("weba", "audio/webm"),
];

/// Looks the reference's extension up in the audio table.
///
/// Query strings and fragments are ignored so URLs resolve like paths.
pub fn mime_for_extension(reference: &str) -> Option<&'static str> {
    let extension = reference_extension(reference)?;
    AUDIO_MIME_TYPES
        .iter()
        .find(|(known, _)| *known == extension)
        .map(|(_, mime)| *mime)
}

/// Determines the Content-Type to serve for an audio reference.
///
/// Tries, in order: the extension table, the recorded hint, `mime_guess`
/// restricted to audio types, the first concrete audio type the client
/// accepts, and finally [`DEFAULT_AUDIO_MIME`].
pub fn resolve_mime_type(reference: &str, hint: Option<&str>, accept: Option<&str>) -> String {
    if let Some(mime) = mime_for_extension(reference) {
        return mime.to_string();
    }

    if let Some(hint) = hint.map(str::trim).filter(|hint| is_concrete_audio(hint)) {
        return hint.to_string();
    }

    if let Some(guess) = mime_guess::from_path(strip_query(reference))
        .iter()
        .find(|guess| guess.type_() == mime_guess::mime::AUDIO)
    {
        return guess.essence_str().to_string();
    }

    if let Some(accepted) = accept.and_then(first_accepted_audio) {
        return accepted;
    }

    DEFAULT_AUDIO_MIME.to_string()
}

/// File extension (without the dot) to give a download of type `mime`.
///
/// Prefers the audio table, so `audio/mpeg` names an `.mp3`, then asks
/// `mime_guess`.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or(mime).trim();
    AUDIO_MIME_TYPES
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(essence))
        .map(|(extension, _)| *extension)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(essence)
                .and_then(|extensions| extensions.first().copied())
        })
}

fn reference_extension(reference: &str) -> Option<String> {
    Path::new(strip_query(reference))
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn strip_query(reference: &str) -> &str {
    reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference)
}

fn is_concrete_audio(mime: &str) -> bool {
    mime.strip_prefix("audio/")
        .is_some_and(|subtype| !subtype.is_empty() && subtype != "*")
}

fn first_accepted_audio(accept: &str) -> Option<String> {
    accept
        .split(',')
        .map(|entry| entry.split(';').next().unwrap_or("").trim())
        .find(|mime| is_concrete_audio(mime))
        .map(str::to_string)
}
