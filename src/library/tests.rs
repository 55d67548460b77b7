use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::tempdir;

use super::scan::is_audio_file;
use super::*;
use crate::config::{LibrarySettings, SearchSettings};

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"not a real mp3").unwrap();
}

#[test]
fn is_audio_file_matches_configured_extensions_case_insensitive() {
    let settings = LibrarySettings::default();
    for name in ["a.mp3", "a.MP3", "a.flac", "a.wav", "a.aac", "a.m4a", "a.ogg", "a.wma"] {
        assert!(is_audio_file(Path::new(name), &settings), "{name}");
    }
    assert!(!is_audio_file(Path::new("/tmp/a.txt"), &settings));
    assert!(!is_audio_file(Path::new("/tmp/a"), &settings));
}

#[test]
fn scan_extracts_artist_title_and_size() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("周杰伦-晴天.mp3"), vec![0u8; 2 * 1024 * 1024]).unwrap();
    touch(dir.path(), "cover.jpg");

    let lib = MusicLibrary::new(LibrarySettings::default());
    assert_eq!(lib.scan(dir.path()).unwrap(), 1);

    let index = lib.snapshot();
    let e = index.get(0).unwrap();
    assert_eq!(e.artist, "周杰伦");
    assert_eq!(e.song_name, "晴天");
    assert_eq!(e.file_size, 2 * 1024 * 1024);
    assert_eq!(e.file_path, dir.path().join("周杰伦-晴天.mp3"));
    assert_eq!(index.search("晴天", &SearchSettings::default()), Some(0));
}

#[test]
fn scan_walks_subdirectories_and_skips_hidden() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("华语").join("2003");
    fs::create_dir_all(&sub).unwrap();
    touch(dir.path(), "root.mp3");
    touch(&sub, "deep.flac");
    touch(dir.path(), ".hidden.mp3");

    let lib = MusicLibrary::new(LibrarySettings::default());
    assert_eq!(lib.scan(dir.path()).unwrap(), 2);

    let index = lib.snapshot();
    let mut names: Vec<&str> = index.entries().iter().map(|e| e.song_name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["deep", "root"]);
}

#[test]
fn views_reference_live_entries_with_matching_keys() {
    let dir = tempdir().unwrap();
    for name in [
        "周杰伦-晴天.mp3",
        "周杰伦-稻香.mp3",
        "林俊杰-江南.mp3",
        "Beyond-海阔天空.mp3",
        "晴天.mp3",
        "01-Intro.mp3",
    ] {
        touch(dir.path(), name);
    }

    let lib = MusicLibrary::new(LibrarySettings::default());
    lib.scan(dir.path()).unwrap();
    let index = lib.snapshot();

    let by_title = index.view(View::ByTitle);
    assert_eq!(by_title.len(), index.len());
    for pair in by_title.windows(2) {
        let a = &index.get(pair[0]).unwrap().song_normalized;
        let b = &index.get(pair[1]).unwrap().song_normalized;
        assert!(a <= b);
    }
    for &i in by_title {
        let e = index.get(i).expect("view entry must be live");
        let found = index.find_by_title(&e.song_name).unwrap();
        assert_eq!(index.get(found).unwrap().song_normalized, e.song_normalized);
    }
    for &i in index.view(View::ByArtist) {
        assert!(!index.get(i).unwrap().artist.is_empty());
    }
    assert_eq!(index.view(View::ByArtistTitle).len(), index.len());

    let jay = index.find_by_artist_title("周杰伦", "稻香").unwrap();
    assert_eq!(index.get(jay).unwrap().song_name, "稻香");
    assert!(index.find_by_artist_title("林俊杰", "稻香").is_none());
}

#[test]
fn duplicate_titles_prefer_shorter_file_name() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "周杰伦-晴天.mp3");
    touch(dir.path(), "晴天.mp3");

    let lib = MusicLibrary::new(LibrarySettings::default());
    lib.scan(dir.path()).unwrap();
    let index = lib.snapshot();
    let hit = index.find_by_title("晴天").unwrap();
    assert_eq!(index.get(hit).unwrap().file_name, "晴天.mp3");
}

#[test]
fn fuzzy_search_falls_back_when_exact_title_misses() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "孙燕姿-晴天娃娃.mp3");
    touch(dir.path(), "Beyond-海阔天空.mp3");

    let lib = MusicLibrary::new(LibrarySettings::default());
    lib.scan(dir.path()).unwrap();
    let index = lib.snapshot();
    let settings = SearchSettings::default();

    let hit = index.search("晴天娃", &settings).unwrap();
    assert_eq!(index.get(hit).unwrap().song_name, "晴天娃娃");
    assert!(index.search("完全不相关的歌", &settings).is_none());

    let ranked = index.search_ranked("beyond 海阔", 3, &settings);
    assert_eq!(ranked.first().map(|r| index.get(r.index).unwrap().song_name.as_str()), Some("海阔天空"));
}

#[test]
fn find_by_artist_samples_when_more_than_limit() {
    let dir = tempdir().unwrap();
    for i in 0..7 {
        touch(dir.path(), &format!("周杰伦-歌{i}.mp3"));
    }
    touch(dir.path(), "林俊杰-江南.mp3");

    let lib = MusicLibrary::new(LibrarySettings::default());
    lib.scan(dir.path()).unwrap();
    let index = lib.snapshot();
    let mut rng = StdRng::seed_from_u64(7);

    let picks = index.find_by_artist("周杰伦", &SearchSettings::default(), &mut rng);
    assert_eq!(picks.len(), 5);
    let mut unique = picks.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5);
    assert!(picks.iter().all(|&i| index.get(i).unwrap().artist == "周杰伦"));
}

#[test]
fn find_by_artist_ranks_exact_matches_first_when_few() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "周杰伦-晴天.mp3");
    touch(dir.path(), "周杰伦-稻香.mp3");
    touch(dir.path(), "林俊杰-江南.mp3");

    let lib = MusicLibrary::new(LibrarySettings::default());
    lib.scan(dir.path()).unwrap();
    let index = lib.snapshot();
    let mut rng = StdRng::seed_from_u64(1);

    let picks = index.find_by_artist("周杰伦", &SearchSettings::default(), &mut rng);
    assert!(picks.len() >= 2);
    assert!(picks[..2].iter().all(|&i| index.get(i).unwrap().artist == "周杰伦"));
    assert!(index.find_by_artist("", &SearchSettings::default(), &mut rng).is_empty());
}

#[test]
fn failed_rescan_keeps_previous_generation() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "a.mp3");
    touch(dir.path(), "b.mp3");

    let lib = MusicLibrary::new(LibrarySettings::default());
    lib.scan(dir.path()).unwrap();
    let before = lib.snapshot();

    assert!(lib.scan(&dir.path().join("missing")).is_err());
    let after = lib.snapshot();
    assert_eq!(after.len(), 2);
    assert_eq!(after.generation(), before.generation());
}

#[test]
fn old_snapshot_survives_rescan() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "a.mp3");

    let lib = MusicLibrary::new(LibrarySettings::default());
    lib.scan(dir.path()).unwrap();
    let old = lib.snapshot();

    touch(dir.path(), "b.mp3");
    lib.scan(dir.path()).unwrap();
    let new = lib.snapshot();

    assert_eq!(old.len(), 1);
    assert_eq!(new.len(), 2);
    assert!(new.generation() > old.generation());
}

#[test]
fn story_scan_builds_categories_and_skips_empty_stories() {
    let dir = tempdir().unwrap();
    let pigs = dir.path().join("童话").join("三只小猪");
    let empty = dir.path().join("童话").join("空故事");
    let tortoise = dir.path().join("寓言").join("龟兔赛跑");
    for d in [&pigs, &empty, &tortoise] {
        fs::create_dir_all(d).unwrap();
    }
    touch(&pigs, "chapter 2.mp3");
    touch(&pigs, "chapter 10.mp3");
    touch(&pigs, "chapter 1.mp3");
    touch(&pigs, "notes.txt");
    touch(&tortoise, "01.mp3");

    let lib = StoryLibrary::new(LibrarySettings::default());
    assert_eq!(lib.scan(dir.path()).unwrap(), 2);
    let index = lib.snapshot();

    assert_eq!(index.categories().len(), 2);
    let settings = SearchSettings::default();
    let s = index.find_story("三只小猪", &settings).unwrap();
    let story = index.get(s).unwrap();
    assert_eq!(story.category, "童话");
    let names: Vec<String> = story
        .chapters
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["chapter 1.mp3", "chapter 10.mp3", "chapter 2.mp3"]);

    let c = index.find_category("童话", &settings).unwrap();
    assert_eq!(index.category(c).unwrap().stories, vec![s]);
    assert_eq!(index.locate("寓言", "龟兔赛跑").map(|i| index.get(i).unwrap().chapters.len()), Some(1));
    assert!(index.locate("童话", "空故事").is_none());
}

#[test]
fn story_lookup_can_be_scoped_to_a_category() {
    let dir = tempdir().unwrap();
    for (cat, story) in [("童话", "小红帽"), ("睡前", "小红帽"), ("睡前", "月亮")] {
        let d = dir.path().join(cat).join(story);
        fs::create_dir_all(&d).unwrap();
        touch(&d, "1.mp3");
    }

    let lib = StoryLibrary::new(LibrarySettings::default());
    lib.scan(dir.path()).unwrap();
    let index = lib.snapshot();
    let settings = SearchSettings::default();

    let bedtime = index.find_category("睡前", &settings).unwrap();
    let hit = index.find_story_in_category(bedtime, "小红帽", &settings).unwrap();
    assert_eq!(index.get(hit).unwrap().category, "睡前");
    assert_eq!(index.position_in_category(hit), Some(0));
}
