use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

/// Membership test for a candidate word. Lookups must be in-memory; anything
/// slower is loaded up front.
pub trait WordOracle: Send + Sync + std::fmt::Debug {
    fn contains(&self, word: &str) -> bool;
}

#[derive(Default, Debug)]
pub struct Dictionary {
    words: HashSet<String>,
}

impl Dictionary {
    pub fn new(file_path: &str) -> io::Result<Self> {
        let mut dictionary = Dictionary::default();
        dictionary.load_from_file(file_path)?;
        Ok(dictionary)
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = Dictionary::default();
        for word in words {
            if let Some(word) = Self::parse_line(word.as_ref()) {
                dictionary.insert(word);
            }
        }
        dictionary
    }

    pub fn insert(&mut self, word: String) {
        self.words.insert(word);
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn load_from_file(&mut self, file_path: &str) -> io::Result<()> {
        let path = Path::new(file_path);
        let file = File::open(path)?;
        let reader = io::BufReader::new(file);

        for line in reader.lines() {
            let line = line?;
            if let Some(word) = Self::parse_line(&line) {
                self.insert(word);
            }
        }
        tracing::info!(words = self.words.len(), path = file_path, "word list loaded");
        Ok(())
    }

    // One word per line, optional tab-separated trailing data, '#' comments.
    fn parse_line(line: &str) -> Option<String> {
        let word = line.split('\t').next()?.trim();
        if word.is_empty() || word.starts_with('#') || word.chars().count() < 2 {
            None
        } else {
            Some(word.to_string())
        }
    }
}

impl WordOracle for Dictionary {
    fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}
