use std::borrow::Borrow;

/// Builds an owning key straight from a borrowed view of it.
///
/// `HashMap::get_or_insert_with` and `get_or_default` use this on a miss, so
/// a `TinyString` key looked up by `&str` is filled in place instead of going
/// through a temporary `String`.
pub trait FromKeyView<Q: ?Sized>: Borrow<Q> {
    fn from_key_view(view: &Q) -> Self;
}

impl<K: Clone> FromKeyView<K> for K {
    #[inline]
    fn from_key_view(view: &K) -> K {
        view.clone()
    }
}

impl FromKeyView<str> for String {
    #[inline]
    fn from_key_view(view: &str) -> String {
        view.to_owned()
    }
}

impl FromKeyView<str> for Box<str> {
    #[inline]
    fn from_key_view(view: &str) -> Box<str> {
        Box::from(view)
    }
}

impl<T: Clone> FromKeyView<[T]> for Vec<T> {
    #[inline]
    fn from_key_view(view: &[T]) -> Vec<T> {
        view.to_vec()
    }
}
