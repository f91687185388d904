#![allow(dead_code)]

use dumpfilter::{Counters, Day, FileJob, LineFault, Observer};
use serde_json::json;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Write a compressed `.zst` file containing the provided lines, each `\n`-terminated.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Compress arbitrary bytes in memory.
pub fn zst_bytes(content: &[u8]) -> Vec<u8> {
    zstd::stream::encode_all(content, 3).unwrap()
}

/// Decompress a `.zst` file and collect non-empty lines.
pub fn decompress_zst_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let dec = zstd::stream::read::Decoder::new(f).unwrap();
    let r = BufReader::new(dec);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}

/// Read a text file line-by-line, keeping empty lines.
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    BufReader::new(f).lines().map(|l| l.unwrap()).collect()
}

/// Unix seconds at midnight UTC.
pub fn ts(year: i32, month: u8, day: u8) -> i64 {
    Day::new(year, month, day).unwrap().unix_timestamp()
}

pub fn day(year: i32, month: u8, day: u8) -> Day {
    Day::new(year, month, day).unwrap()
}

/// A self-post submission in the Pushshift shape.
pub fn submission(id: &str, created_utc: i64, author: &str, title: &str, selftext: &str) -> String {
    json!({
        "id": id, "created_utc": created_utc, "author": author, "title": title,
        "selftext": selftext, "is_self": true, "score": 7,
        "permalink": format!("/r/test/comments/{id}/x/"), "url": format!("https://www.reddit.com/r/test/comments/{id}/x/"),
        "subreddit": "test"
    })
    .to_string()
}

/// A comment in the Pushshift shape.
pub fn comment(id: &str, created_utc: i64, author: &str, body: &str, link_id: &str) -> String {
    json!({
        "id": id, "created_utc": created_utc, "author": author, "body": body,
        "link_id": link_id, "parent_id": link_id, "score": 2,
        "permalink": format!("/r/test/comments/x/y/{id}/"), "subreddit": "test"
    })
    .to_string()
}

/// Observer that records everything for assertions.
#[derive(Default)]
pub struct CaptureObserver {
    pub started: Vec<String>,
    pub progress: Vec<Counters>,
    pub bad: Vec<(String, LineFault)>,
    pub notices: Vec<String>,
    pub finished: Vec<Counters>,
    pub last_offset: u64,
}

impl Observer for CaptureObserver {
    fn file_started(&mut self, job: &FileJob, _output: &Path, _total_bytes: u64) {
        self.started.push(job.input.file_name().unwrap().to_string_lossy().into_owned());
        self.last_offset = 0;
    }
    fn bytes_consumed(&mut self, offset: u64) {
        assert!(offset >= self.last_offset, "offsets must not go backwards");
        self.last_offset = offset;
    }
    fn progress(&mut self, counters: &Counters) {
        self.progress.push(*counters);
    }
    fn bad_line(&mut self, line: &str, fault: &LineFault) {
        self.bad.push((line.to_string(), fault.clone()));
    }
    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
    fn file_finished(&mut self, _job: &FileJob, counters: &Counters) {
        self.finished.push(*counters);
    }
}
