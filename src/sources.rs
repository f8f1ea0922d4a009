use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use crate::error::{TemplateError, TemplateErrorReason};

pub(crate) trait Source {
    type Item;
    type Error;

    fn load(&self) -> Result<Self::Item, Self::Error>;
}

/// Template text stored in a file. Content must be UTF-8.
pub(crate) struct FileSource {
    name: String,
    path: PathBuf,
}

impl FileSource {
    pub(crate) fn new(path: PathBuf, name: String) -> FileSource {
        FileSource { path, name }
    }
}

impl Source for FileSource {
    type Item = String;
    type Error = TemplateError;

    fn load(&self) -> Result<Self::Item, Self::Error> {
        let mut reader = BufReader::new(File::open(&self.path).map_err(|e| {
            TemplateError::of(TemplateErrorReason::Io(e.to_string())).in_template(self.name.clone())
        })?);

        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(|e| {
            TemplateError::of(TemplateErrorReason::Io(e.to_string())).in_template(self.name.clone())
        })?;

        String::from_utf8(buf).map_err(|_| {
            TemplateError::of(TemplateErrorReason::InvalidSource).in_template(self.name.clone())
        })
    }
}
