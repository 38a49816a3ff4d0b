/// Builds a [`Value::List`](crate::Value::List).
///
/// Every element goes through `Value::from`.
///
/// ```rust,ignore
/// let yielded = list![deferred_a, deferred_b, 3];
/// ```
#[macro_export]
macro_rules! list {
    () => {
        $crate::Value::List(::std::vec::Vec::new())
    };

    ( $( $item:expr ),+ $(,)? ) => {
        $crate::Value::List(::std::vec![ $( $crate::Value::from($item) ),+ ])
    };
}

/// Builds a [`Value::Map`](crate::Value::Map).
///
/// Keys go through `ToString`, values through `Value::from`.
///
/// ```rust,ignore
/// let yielded = map! { "x" => deferred_a, "y" => deferred_b };
/// ```
#[macro_export]
macro_rules! map {
    () => {
        $crate::Value::Map($crate::Map::new())
    };

    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let mut map = $crate::Map::new();
        $(
            map.insert(::std::string::ToString::to_string(&$key), $crate::Value::from($value));
        )+
        $crate::Value::Map(map)
    }};
}
