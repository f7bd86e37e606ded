table! {
    cache_entries (key) {
        key -> Text,
        value -> Text,
    }
}
