use crate::types::{Episode, RawCatalogEntry, SourceResult, Title};

const SCHEME_SEPARATOR: &str = "$$$";
const EPISODE_SEPARATOR: char = '#';
const PAIR_SEPARATOR: char = '$';
const UNKNOWN_NAME: &str = "Unknown";

/// Normalize one source's raw catalog list. Never fails; bad entries are skipped.
pub fn parse(source_name: &str, entries: &[RawCatalogEntry]) -> SourceResult {
    SourceResult {
        source_name: source_name.to_string(),
        titles: entries.iter().filter_map(title_from_entry).collect(),
    }
}

/// Build a title from an entry, or `None` if it carries no playable episode.
pub fn title_from_entry(entry: &RawCatalogEntry) -> Option<Title> {
    let episodes = episodes_from_play_url(entry.vod_play_url.as_deref().unwrap_or_default());
    if episodes.is_empty() { return None; }
    Some(Title {
        name: entry.vod_name.clone().unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        cover_image_url: entry.vod_pic.clone().unwrap_or_default(),
        episodes,
        vod_id: entry.vod_id.clone().unwrap_or_default(),
        douban_id: entry.vod_douban_id.clone().unwrap_or_default(),
    })
}

/// Episodes of the first play scheme only; later schemes are ignored.
pub fn episodes_from_play_url(play_url: &str) -> Vec<Episode> {
    let first_scheme = play_url.split(SCHEME_SEPARATOR).next().unwrap_or_default();
    first_scheme.split(EPISODE_SEPARATOR).filter_map(episode_from_token).collect()
}

fn episode_from_token(token: &str) -> Option<Episode> {
    let mut parts = token.split(PAIR_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(url), None) if !name.is_empty() && !url.is_empty() => {
            Some(Episode { name: name.to_string(), video_url: url.to_string() })
        }
        _ => None,
    }
}
