use std::ops::Deref;
use std::str::FromStr;

use smallvec::SmallVec;

/// Values captured from pattern segments, keyed case-sensitively by capture name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Params {
    buf: SmallVec<[(Box<str>, String); 8]>,
}

impl Params {
    pub fn new() -> Self {
        Self {
            buf: SmallVec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.buf
            .iter()
            .find_map(|(k, v)| if name == &**k { Some(v.as_str()) } else { None })
    }

    pub fn parse<T: FromStr>(&self, name: &str) -> Option<Result<T, T::Err>> {
        self.get(name).map(T::from_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Inserts a value, overwriting an earlier value stored under the same name.
    pub fn insert(&mut self, name: &str, value: String) {
        match self.buf.iter_mut().find(|(k, _)| name == &**k) {
            Some((_, v)) => *v = value,
            None => self.buf.push((name.into(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.buf.iter().map(|(k, v)| (&**k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Deref for Params {
    type Target = [(Box<str>, String)];
    fn deref(&self) -> &Self::Target {
        &*self.buf
    }
}
