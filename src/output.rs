use std::fmt;
use std::io::{Error as IOError, Write};

/// Sink for rendered text.
pub trait Output {
    fn write(&mut self, seg: &str) -> Result<(), IOError>;
}

pub struct WriteOutput<'a, W: 'a + Write> {
    write: &'a mut W,
}

impl<'a, W: 'a + Write> Output for WriteOutput<'a, W> {
    fn write(&mut self, seg: &str) -> Result<(), IOError> {
        self.write.write_all(seg.as_bytes())
    }
}

impl<'a, W: 'a + Write> WriteOutput<'a, W> {
    pub fn new(write: &'a mut W) -> WriteOutput<'a, W> {
        WriteOutput { write }
    }
}

/// Rendered text that is exempt from HTML escaping.
///
/// The buffer is an ordered list of fragments. Growing it with another
/// `SafeString` moves that buffer's fragments over instead of nesting it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SafeString {
    fragments: Vec<String>,
}

impl SafeString {
    pub fn new() -> SafeString {
        SafeString::default()
    }

    pub fn push_str(&mut self, s: &str) {
        if !s.is_empty() {
            self.fragments.push(s.to_owned());
        }
    }

    pub fn grow(&mut self, other: SafeString) {
        self.fragments.extend(other.fragments);
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(|f| f.is_empty())
    }

    pub fn len(&self) -> usize {
        self.fragments.iter().map(|f| f.len()).sum()
    }

    pub fn into_string(self) -> String {
        self.fragments.concat()
    }

    pub(crate) fn write_to(&self, out: &mut dyn Output) -> Result<(), IOError> {
        for f in &self.fragments {
            out.write(f)?;
        }
        Ok(())
    }
}

impl Output for SafeString {
    fn write(&mut self, seg: &str) -> Result<(), IOError> {
        self.push_str(seg);
        Ok(())
    }
}

impl fmt::Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for frag in &self.fragments {
            f.write_str(frag)?;
        }
        Ok(())
    }
}

impl<'a> From<&'a str> for SafeString {
    fn from(s: &'a str) -> SafeString {
        let mut buf = SafeString::new();
        buf.push_str(s);
        buf
    }
}

impl From<String> for SafeString {
    fn from(s: String) -> SafeString {
        let mut buf = SafeString::new();
        if !s.is_empty() {
            buf.fragments.push(s);
        }
        buf
    }
}

impl PartialEq<str> for SafeString {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl<'a> PartialEq<&'a str> for SafeString {
    fn eq(&self, other: &&'a str) -> bool {
        self.to_string() == *other
    }
}
