/// Compiles a CSS selector once and hands out a `&'static` reference to it.
///
/// The pattern must be a literal known to be valid; an invalid one panics on first use.
#[macro_export]
macro_rules! selector {
    ($e: expr) => {{
        use $crate::__private::once_cell::sync::Lazy;
        use $crate::__private::scraper::Selector;
        static SELECTOR: Lazy<Selector> =
            Lazy::new(|| Selector::parse($e).expect("selector literal is valid"));
        &*SELECTOR
    }};
}

/// Same as [`selector!`], for regular expressions.
#[macro_export]
macro_rules! regex {
    ($e: expr) => {{
        use $crate::__private::once_cell::sync::Lazy;
        use $crate::__private::regex::Regex;
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new($e).expect("regex literal is valid"));
        &*PATTERN
    }};
}
