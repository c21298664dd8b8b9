//! NFO description file parsing
//!
//! Jellyfin/Kodi sidecar files are small XML documents. Movies carry a
//! `fileinfo/streamdetails` block with per-stream `audio` and `subtitle`
//! entries; shows usually only have title/year/plot. Parsing is
//! event-driven so a single pass collects everything.

use crate::error::ExtractionError;
use crate::model::AudioTrack;
use quick_xml::Reader;
use quick_xml::events::Event;

/// Fields extracted from one description file
///
/// Every field is optional or defaultable: a missing tag is a normal
/// outcome, not an error. Only structurally malformed XML fails.
#[derive(Debug, Default, Clone)]
pub struct NfoData {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub plot: String,
    pub audio_tracks: Vec<AudioTrack>,
    pub subtitle_languages: Vec<String>,
}

#[derive(Debug, Default)]
struct AudioBuilder {
    codec: Option<String>,
    language: Option<String>,
    channels: Option<u32>,
}

/// Read the root element name of an NFO document without a full parse.
///
/// Used by the scanner to sniff whether an arbitrary `.nfo` file is a
/// movie, a show or an episode description.
pub fn sniff_root_tag(contents: &str) -> Option<String> {
    let mut reader = Reader::from_str(contents);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                return Some(String::from_utf8_lossy(e.name().as_ref()).to_string());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Parse one description file into normalized fields.
///
/// Plot falls back through `plot`, `outline` and `overview` in that
/// priority. Audio tracks keep document order; subtitle languages are
/// deduplicated but also keep first-seen order. A non-numeric `year` is
/// treated as absent.
pub fn extract(contents: &str) -> Result<NfoData, ExtractionError> {
    let mut reader = Reader::from_str(contents);
    reader.config_mut().trim_text(true);

    let mut data = NfoData::default();
    let mut outline: Option<String> = None;
    let mut overview: Option<String> = None;
    let mut plot: Option<String> = None;

    // Element path from the root down to the current node
    let mut stack: Vec<String> = Vec::new();
    let mut current_audio: Option<AudioBuilder> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "audio" && in_streamdetails(&stack) {
                    current_audio = Some(AudioBuilder::default());
                }
                stack.push(tag);
            }
            Ok(Event::End(_)) => {
                if stack.last().map(String::as_str) == Some("audio")
                    && let Some(builder) = current_audio.take()
                {
                    data.audio_tracks.push(AudioTrack {
                        language: builder.language,
                        codec: builder.codec,
                        channels: builder.channels,
                    });
                }
                stack.pop();
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().trim().to_string();
                if text.is_empty() {
                    continue;
                }
                match stack.as_slice() {
                    // Top-level fields directly under the root element
                    [_, tag] => match tag.as_str() {
                        "title" => data.title = Some(text),
                        "year" => data.year = text.parse::<i32>().ok(),
                        "plot" => plot = Some(text),
                        "outline" => outline = Some(text),
                        "overview" => overview = Some(text),
                        _ => {}
                    },
                    [.., parent, tag] if parent == "audio" => {
                        if let Some(ref mut builder) = current_audio {
                            match tag.as_str() {
                                "codec" => builder.codec = Some(text.to_uppercase()),
                                "language" => builder.language = Some(language_name(&text)),
                                "channels" => builder.channels = text.parse::<u32>().ok(),
                                _ => {}
                            }
                        }
                    }
                    [.., parent, tag] if parent == "subtitle" && tag == "language" => {
                        let lang = language_name(&text);
                        if !data.subtitle_languages.contains(&lang) {
                            data.subtitle_languages.push(lang);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError {
                    message: e.to_string(),
                    recovered_title: data.title,
                });
            }
            _ => {}
        }
    }

    data.plot = plot.or(outline).or(overview).unwrap_or_default();
    Ok(data)
}

fn in_streamdetails(stack: &[String]) -> bool {
    matches!(stack, [.., a, b] if a == "fileinfo" && b == "streamdetails")
}

/// Map an ISO-ish language code to a readable name.
///
/// Unknown codes are passed through capitalized.
pub fn language_name(code: &str) -> String {
    let name = match code.to_lowercase().as_str() {
        "ger" | "deu" | "de" => "German",
        "eng" | "en" => "English",
        "fra" | "fre" | "fr" => "French",
        "spa" | "es" => "Spanish",
        "ita" | "it" => "Italian",
        "jpn" | "ja" => "Japanese",
        "rus" | "ru" => "Russian",
        "chi" | "zh" => "Chinese",
        "por" | "pt" => "Portuguese",
        "pol" | "pl" => "Polish",
        "tur" | "tr" => "Turkish",
        "ara" | "ar" => "Arabic",
        _ => return capitalize(code),
    };
    name.to_string()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
