//! Playback queues built from Quran content.

use core_content::SurahDetail;
use core_playback::PlaybackItem;

/// Identifier of a verse in a playback queue: `"{surah}:{verse}"`.
pub fn verse_identifier(surah: u16, verse: u16) -> String {
    format!("{}:{}", surah, verse)
}

/// One item per verse that has a recitation by `qari`, in verse order.
///
/// Verses without audio for `qari` are skipped; playback moves straight on
/// to the next one.
pub fn verse_queue(detail: &SurahDetail, qari: &str) -> Vec<PlaybackItem> {
    verse_queue_from(detail, qari, 1)
}

/// [`verse_queue`] without the verses numbered below `from_verse`.
///
/// When `from_verse` itself has no recitation the queue starts at the next
/// verse that does.
pub fn verse_queue_from(detail: &SurahDetail, qari: &str, from_verse: u16) -> Vec<PlaybackItem> {
    let mut verses: Vec<_> = detail
        .verses
        .iter()
        .filter(|verse| verse.number >= from_verse)
        .collect();
    verses.sort_by_key(|v| v.number);

    verses
        .into_iter()
        .filter_map(|verse| {
            verse.audio_for(qari).map(|uri| {
                PlaybackItem::new(uri, verse_identifier(detail.number(), verse.number))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_content::{SurahSummary, VerseEntry};

    fn verse(number: u16, qaris: &[&str]) -> VerseEntry {
        VerseEntry {
            number,
            arabic: String::new(),
            latin: String::new(),
            translation: String::new(),
            audio: qaris
                .iter()
                .map(|q| {
                    (
                        q.to_string(),
                        format!("https://cdn.equran.id/audio-partial/{}/112{:03}.mp3", q, number),
                    )
                })
                .collect(),
        }
    }

    fn ikhlas() -> SurahDetail {
        SurahDetail {
            summary: SurahSummary {
                number: 112,
                name_arabic: "الإخلاص".to_string(),
                name_latin: "Al-Ikhlas".to_string(),
                verse_count: 4,
                revelation_place: "Mekah".to_string(),
                meaning: "Ikhlas".to_string(),
                description: String::new(),
                audio_full: Default::default(),
            },
            verses: vec![
                verse(2, &["01", "05"]),
                verse(1, &["01", "05"]),
                verse(3, &["01"]),
                verse(4, &["01", "05"]),
            ],
        }
    }

    #[test]
    fn test_queue_is_in_verse_order_and_skips_missing_audio() {
        let ids: Vec<String> = verse_queue(&ikhlas(), "05")
            .into_iter()
            .map(|item| item.identifier)
            .collect();
        assert_eq!(ids, vec!["112:1", "112:2", "112:4"]);

        let first = &verse_queue(&ikhlas(), "01")[0];
        assert_eq!(first.uri, "https://cdn.equran.id/audio-partial/01/112001.mp3");
    }

    #[test]
    fn test_queue_from_verse() {
        let ids: Vec<String> = verse_queue_from(&ikhlas(), "01", 3)
            .into_iter()
            .map(|item| item.identifier)
            .collect();
        assert_eq!(ids, vec!["112:3", "112:4"]);

        // Verse 3 has no recitation by "05"; the queue picks up at verse 4.
        let ids: Vec<String> = verse_queue_from(&ikhlas(), "05", 3)
            .into_iter()
            .map(|item| item.identifier)
            .collect();
        assert_eq!(ids, vec!["112:4"]);

        assert!(verse_queue_from(&ikhlas(), "05", 5).is_empty());
        assert!(verse_queue(&ikhlas(), "02").is_empty());
    }
}
