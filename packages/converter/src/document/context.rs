//! Position of an event in the document hierarchy.

use std::rc::Rc;

/// A heading-derived position in the document.
///
/// Keys are the whitespace-separated words of the heading, e.g.
/// `["Message", "NewOrderSingle", "type", "D"]`. The level follows heading
/// depth, with 1 for the document root. The parent, if any, always has a
/// strictly lower level.
#[derive(Debug, Clone, Default)]
pub struct Context {
    keys: Vec<String>,
    level: usize,
    parent: Option<Rc<Context>>,
}

impl Context {
    /// Create a context from heading keys.
    #[must_use]
    pub fn new(
        keys: impl IntoIterator<Item = impl Into<String>>,
        level: usize,
        parent: Option<Rc<Context>>,
    ) -> Self {
        debug_assert!(
            parent.as_ref().is_none_or(|p| p.level < level),
            "parent level must be below child level"
        );
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            level,
            parent,
        }
    }

    /// The synthetic root that owns content before the first heading.
    #[must_use]
    pub fn root() -> Self {
        Self {
            keys: Vec::new(),
            level: 1,
            parent: None,
        }
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    #[must_use]
    pub fn key(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    /// Return the token following `key` (compared case-insensitively).
    ///
    /// # Examples
    /// ```
    /// use mdorchestra_converter::document::Context;
    ///
    /// let ctx = Context::new(["Message", "NewOrderSingle", "type", "D"], 2, None);
    /// assert_eq!(ctx.get_key_value("type"), Some("D"));
    /// assert_eq!(ctx.get_key_value("scenario"), None);
    /// ```
    #[must_use]
    pub fn get_key_value(&self, key: &str) -> Option<&str> {
        self.key_value_from(0, key)
    }

    /// Like [`Context::get_key_value`] but only scans keys from `start` on.
    ///
    /// Headings that name an entity use position 1 for the name, so trailing
    /// key/value pairs are searched from position 2 to avoid matching a name
    /// that happens to equal a keyword.
    #[must_use]
    pub fn key_value_from(&self, start: usize, key: &str) -> Option<&str> {
        let keys = self.keys.get(start..)?;
        keys.iter()
            .position(|k| k.eq_ignore_ascii_case(key))
            .and_then(|i| keys.get(i + 1))
            .map(String::as_str)
    }

    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Rc<Context>> {
        self.parent.as_ref()
    }

    /// Append a key, for building contexts in the generation direction.
    pub fn add_key(&mut self, key: impl Into<String>) {
        self.keys.push(key.into());
    }

    /// Iterate over this context and then each ancestor, nearest first.
    #[must_use]
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Whether `other` is this exact context instance.
    #[must_use]
    pub fn is(&self, other: &Context) -> bool {
        std::ptr::eq(self, other)
    }
}

/// Iterator returned by [`Context::ancestors`].
pub struct Ancestors<'a> {
    next: Option<&'a Context>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Context;

    fn next(&mut self) -> Option<&'a Context> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_scans_from_start() {
        let ctx = Context::new(["Field", "Type", "type", "int"], 2, None);
        assert_eq!(ctx.get_key_value("type"), Some("type"));
        assert_eq!(ctx.key_value_from(2, "type"), Some("int"));
    }

    #[test]
    fn test_key_value_missing_trailing_value() {
        let ctx = Context::new(["Message", "Heartbeat", "scenario"], 2, None);
        assert_eq!(ctx.get_key_value("scenario"), None);
        assert_eq!(ctx.key_value_from(10, "scenario"), None);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let root = Rc::new(Context::new(["Protocol"], 1, None));
        let message = Rc::new(Context::new(["Message", "Order"], 2, Some(Rc::clone(&root))));
        let responses = Context::new(["Responses"], 3, Some(Rc::clone(&message)));

        let levels: Vec<usize> = responses.ancestors().map(Context::level).collect();
        assert_eq!(levels, vec![3, 2, 1]);
        assert!(responses.ancestors().nth(1).is_some_and(|c| c.is(&message)));
    }

    #[test]
    fn test_identity_not_content_equality() {
        let a = Context::new(["Fields"], 2, None);
        let b = a.clone();
        assert!(a.is(&a));
        assert!(!a.is(&b));
    }

    #[test]
    fn test_add_key() {
        let mut ctx = Context::root();
        ctx.add_key("Component");
        ctx.add_key("Instrument");
        assert_eq!(ctx.keys(), ["Component", "Instrument"]);
        assert_eq!(ctx.key(1), Some("Instrument"));
        assert_eq!(ctx.level(), 1);
    }
}
