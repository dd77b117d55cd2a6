//! Input collection
//!
//! Every driver concatenates its inputs in command-line order. The
//! [`SourceSet`] remembers where each file starts so positions in the
//! combined text can be reported against the original file.

use anyhow::Context;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
    /// Byte offset in the combined text
    start: usize,
    /// 0-based line of the first line in the combined text
    first_line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    files: Vec<SourceFile>,
    text: String,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and concatenate `paths` in order.
    pub fn read<P: AsRef<Path>>(paths: &[P]) -> anyhow::Result<Self> {
        let mut set = Self::new();
        for path in paths {
            let path = path.as_ref();
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            set.add(path.display().to_string(), text);
        }
        Ok(set)
    }

    /// Append one file. A newline is inserted first if the combined text
    /// does not already end with one.
    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        let text = text.into();
        let first_line = self.text.matches('\n').count();
        let start = self.text.len();
        self.text.push_str(&text);
        self.files.push(SourceFile {
            name: name.into(),
            text,
            start,
            first_line,
        });
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Name used for the combined unit: the first file's name.
    pub fn unit_name(&self) -> &str {
        self.files.first().map_or("<empty>", |file| file.name.as_str())
    }

    /// File index and local byte offset of a combined-text offset.
    pub fn locate_offset(&self, offset: usize) -> Option<(usize, usize)> {
        let index = self.files.iter().rposition(|file| file.start <= offset)?;
        let file = &self.files[index];
        Some((index, (offset - file.start).min(file.text.len())))
    }

    /// File index and local byte range of a 0-based combined-text line.
    pub fn locate_line(&self, line: usize) -> Option<(usize, std::ops::Range<usize>)> {
        let index = self.files.iter().rposition(|file| file.first_line <= line)?;
        let file = &self.files[index];
        let local = line - file.first_line;

        let mut start = 0;
        for _ in 0..local {
            start += file.text[start..].find('\n')? + 1;
        }
        let end = file.text[start..]
            .find('\n')
            .map_or(file.text.len(), |n| start + n);
        Some((index, start..end.max(start)))
    }
}
