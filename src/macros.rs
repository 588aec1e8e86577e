/// Macro to build a payload [`Dict`](crate::Dict).
///
/// Every value must implement [`FieldValue`](crate::FieldValue). Values of
/// other shapes can be added afterwards through
/// [`Dict::any`](crate::Dict::any) or the typed setters.
///
/// # Examples
///
/// ```
/// use flaw::dict;
///
/// let payload = dict! {
///     "host" => "localhost",
///     "port" => 5643,
///     "tls" => false,
///     "sql" => dict! { "query" => "select * from artists" },
/// };
/// ```
#[macro_export]
macro_rules! dict {
    () => {
        $crate::Dict::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let dict = $crate::Dict::new();
        $(let dict = dict.field($key, &$value);)+
        dict
    }};
}
