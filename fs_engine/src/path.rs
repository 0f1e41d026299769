//! Volume-qualified path parsing
//!
//! Paths take the form `<volume>:/<component>/...`. Lookups are
//! ASCII case-insensitive, as on FAT.

use crate::FsError;

/// Longest single name a directory entry may carry
pub const NAME_MAX: usize = 255;

/// A path split into its volume and normalized components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumePath {
    pub volume: String,
    pub components: Vec<String>,
}

impl VolumePath {
    pub fn parse(path: &str) -> Result<Self, FsError> {
        let (volume, rest) = path.split_once(':').ok_or(FsError::NoDevice)?;
        if volume.is_empty() {
            return Err(FsError::NoDevice);
        }

        let mut components: Vec<String> = Vec::new();
        for part in rest.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    components.pop().ok_or(FsError::NotFound)?;
                }
                name if name.len() > NAME_MAX => return Err(FsError::NameTooLong),
                name => components.push(name.to_string()),
            }
        }

        Ok(Self {
            volume: volume.to_string(),
            components,
        })
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Splits off the final component
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.components
            .split_last()
            .map(|(last, parent)| (parent, last.as_str()))
    }
}

/// Compares two entry names the way FAT does
pub fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

const SHORT_NAME_SPECIALS: &str = "!#$%&'()-@^_`{}~";

/// Derives the 8.3 alias FAT stores alongside a long name
///
/// Characters that are not legal in a short name are dropped; a name that
/// does not fit gets the `~1` numeric tail.
pub fn short_name(name: &str) -> String {
    let (base, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot + 1..]),
        _ => (name, ""),
    };

    let clean = |part: &str| -> String {
        part.chars()
            .filter(|c| c.is_ascii_alphanumeric() || SHORT_NAME_SPECIALS.contains(*c))
            .map(|c| c.to_ascii_uppercase())
            .collect()
    };
    let mut short_base = clean(base);
    let mut short_ext = clean(ext);

    let lossy = short_base.len() != base.len()
        || short_ext.len() != ext.len()
        || short_base.len() > 8
        || short_ext.len() > 3;
    if lossy {
        short_base.truncate(6);
        short_base.push_str("~1");
    }
    short_ext.truncate(3);

    if short_ext.is_empty() {
        short_base
    } else {
        format!("{}.{}", short_base, short_ext)
    }
}
