use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::str;

use crate::key::FromKeyView;

const INLINE_CAPACITY: usize = 12;

/// An immutable string for map keys that stores up to 12 bytes inline.
///
/// Longer strings take exactly one heap allocation of their byte length.
/// `TinyString` hashes, compares and orders exactly like `str`, so a
/// `HashMap<TinyString, V>` is queried with plain `&str`.
///
/// ```
/// use flat_hashmap::{HashMap, TinyString};
///
/// let mut map: HashMap<TinyString, u32> = HashMap::new();
/// map.insert("short".into(), 1);
/// map.insert("a much longer key".into(), 2);
/// assert_eq!(map["short"], 1);
/// assert_eq!(map.get("a much longer key"), Some(&2));
/// ```
#[derive(Clone)]
pub struct TinyString(Repr);

#[derive(Clone)]
enum Repr {
    Inline { len: u8, buf: [u8; INLINE_CAPACITY] },
    Heap(Box<str>),
}

impl TinyString {
    /// The empty string. Does not allocate.
    pub const fn new() -> TinyString {
        TinyString(Repr::Inline {
            len: 0,
            buf: [0; INLINE_CAPACITY],
        })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        match &self.0 {
            Repr::Inline { len, buf } => {
                // SAFETY: `buf[..len]` was copied from a `&str` in `From<&str>`.
                unsafe { str::from_utf8_unchecked(&buf[..usize::from(*len)]) }
            }
            Repr::Heap(s) => s,
        }
    }

    /// Whether the bytes live inside the value rather than on the heap.
    pub fn is_inline(&self) -> bool {
        matches!(self.0, Repr::Inline { .. })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TinyString {
    fn default() -> TinyString {
        TinyString::new()
    }
}

impl<'a> From<&'a str> for TinyString {
    fn from(s: &'a str) -> TinyString {
        if s.len() > INLINE_CAPACITY {
            return TinyString(Repr::Heap(Box::from(s)));
        }
        let mut buf = [0; INLINE_CAPACITY];
        buf[..s.len()].copy_from_slice(s.as_bytes());
        TinyString(Repr::Inline {
            len: s.len() as u8,
            buf,
        })
    }
}

impl From<String> for TinyString {
    fn from(s: String) -> TinyString {
        if s.len() > INLINE_CAPACITY {
            TinyString(Repr::Heap(s.into_boxed_str()))
        } else {
            TinyString::from(s.as_str())
        }
    }
}

impl From<TinyString> for String {
    fn from(s: TinyString) -> String {
        match s.0 {
            Repr::Heap(boxed) => boxed.into_string(),
            inline => TinyString(inline).as_str().to_owned(),
        }
    }
}

impl Deref for TinyString {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for TinyString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for TinyString {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl FromKeyView<str> for TinyString {
    #[inline]
    fn from_key_view(view: &str) -> TinyString {
        TinyString::from(view)
    }
}

impl Hash for TinyString {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl PartialEq for TinyString {
    #[inline]
    fn eq(&self, other: &TinyString) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for TinyString {}

impl PartialEq<str> for TinyString {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<'a> PartialEq<&'a str> for TinyString {
    fn eq(&self, other: &&'a str) -> bool {
        self.as_str() == *other
    }
}

impl PartialOrd for TinyString {
    fn partial_cmp(&self, other: &TinyString) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TinyString {
    fn cmp(&self, other: &TinyString) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Debug for TinyString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for TinyString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}
